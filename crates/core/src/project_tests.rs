use super::*;
use chrono::TimeZone;

fn sample(now: DateTime<Utc>) -> Project {
    Project::new(
        ProjectId::new(),
        "demo",
        "https://example.test/repo.git",
        "echo setup",
        BaseImageRef::Tag { value: "ubuntu:22.04".into() },
        now,
    )
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
}

#[test]
fn new_project_starts_pending_with_empty_tag() {
    let project = sample(now());
    assert_eq!(project.build_status, BuildStatus::Pending);
    assert!(project.setup_snapshot_image.is_empty());
    assert!(!project.is_snapshot_current());
}

#[test]
fn identical_configuration_produces_identical_tag() {
    let a = sample(now());
    let mut b = sample(now());
    b.id = a.id;
    assert_eq!(a.deterministic_snapshot_tag(), b.deterministic_snapshot_tag());
}

#[test]
fn changing_setup_script_changes_tag() {
    let mut a = sample(now());
    let before = a.deterministic_snapshot_tag();
    a.set_setup_script("echo different", now());
    assert_ne!(before, a.deterministic_snapshot_tag());
}

#[test]
fn changing_base_image_changes_tag() {
    let a = sample(now());
    let mut b = sample(now());
    b.id = a.id;
    b.set_base_image(BaseImageRef::Tag { value: "ubuntu:24.04".into() }, now());
    assert_ne!(a.deterministic_snapshot_tag(), b.deterministic_snapshot_tag());
}

#[test]
fn mutating_snapshot_sensitive_field_resets_status_and_clears_tag() {
    let mut project = sample(now());
    project.mark_ready(project.deterministic_snapshot_tag(), now());
    assert!(project.is_snapshot_current());

    project.set_setup_script("echo other", now());
    assert_eq!(project.build_status, BuildStatus::Pending);
    assert!(project.setup_snapshot_image.is_empty());
}

#[test]
fn ready_status_requires_tag_to_match_current_configuration() {
    let mut project = sample(now());
    project.mark_ready("stale-tag", now());
    assert!(!project.is_snapshot_current());
}

#[test]
fn mark_building_then_ready_clears_error_and_sets_timestamps() {
    let mut project = sample(now());
    project.mark_failed("boom", now());
    assert!(project.build_error.is_some());

    project.mark_building(now());
    assert_eq!(project.build_status, BuildStatus::Building);
    assert!(project.build_error.is_none());

    let tag = project.deterministic_snapshot_tag();
    project.mark_ready(tag.clone(), now());
    assert_eq!(project.build_status, BuildStatus::Ready);
    assert_eq!(project.setup_snapshot_image, tag);
}
