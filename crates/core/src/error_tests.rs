use super::*;

#[yare::parameterized(
    invalid_request = { HubError::invalid_request("bad"), 400, "invalid_request" },
    not_found = { HubError::not_found("missing"), 404, "not_found" },
    conflict = { HubError::conflict("busy"), 409, "conflict" },
    auth_failed = { HubError::auth_failed("nope"), 401, "auth_failed" },
    upstream = { HubError::upstream("down"), 502, "upstream" },
    internal = { HubError::internal("oops"), 500, "internal" },
)]
fn status_and_kind_match_taxonomy(err: HubError, status: u16, kind: &str) {
    assert_eq!(err.http_status(), status);
    assert_eq!(err.kind(), kind);
}

#[test]
fn error_payload_carries_message_verbatim() {
    let err = HubError::not_found("project prj-1 not found");
    let payload: ErrorPayload = (&err).into();
    assert_eq!(payload.status, 404);
    assert_eq!(payload.message, "project prj-1 not found");
}
