use super::*;

#[test]
fn state_changed_envelope_carries_reason() {
    let now = DateTime::parse_from_rfc3339("2026-01-01T00:00:05Z").expect("parse").with_timezone(&Utc);
    let envelope = HubEvent::StateChanged { reason: "project_build_ready".into() }.into_envelope(now);
    assert_eq!(envelope.kind, "state_changed");
    assert_eq!(envelope.payload["reason"], "project_build_ready");
    assert_eq!(envelope.sent_at_iso(), "2026-01-01T00:00:05Z");
}

#[test]
fn project_build_log_envelope_carries_all_fields() {
    let now = Utc::now();
    let envelope = HubEvent::ProjectBuildLog {
        project_id: "prj-1".into(),
        text: "building...".into(),
        replace: false,
    }
    .into_envelope(now);
    assert_eq!(envelope.kind, "project_build_log");
    assert_eq!(envelope.payload["project_id"], "prj-1");
    assert_eq!(envelope.payload["replace"], false);
}

#[test]
fn envelope_serializes_with_type_payload_sent_at_keys() {
    let now = Utc::now();
    let envelope = HubEvent::AuthChanged { reason: "openai_connected".into() }.into_envelope(now);
    let json = serde_json::to_value(&envelope).expect("serialize");
    assert!(json.get("type").is_some());
    assert!(json.get("payload").is_some());
    assert!(json.get("sent_at").is_some());
}
