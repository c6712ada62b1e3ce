use super::*;
use chrono::TimeZone;

#[test]
fn constructs_with_given_fields() {
    let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
    let artifact = Artifact::new(ArtifactId::new(), "report.txt", "reports/report.txt", 1024, now);
    assert_eq!(artifact.display_name, "report.txt");
    assert_eq!(artifact.relative_path, "reports/report.txt");
    assert_eq!(artifact.size_bytes, 1024);
}
