use super::*;

#[test]
fn system_clock_advances() {
    let clock = SystemClock;
    let a = clock.now();
    let b = clock.now();
    assert!(b >= a);
}

#[test]
fn fake_clock_holds_fixed_time_until_advanced() {
    let base = DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z").expect("parse").with_timezone(&Utc);
    let clock = FakeClock::new(base);
    assert_eq!(clock.now(), base);
    clock.advance(chrono::Duration::seconds(30));
    assert_eq!(clock.now(), base + chrono::Duration::seconds(30));
}

#[test]
fn fake_clock_set_overrides_time() {
    let base = DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z").expect("parse").with_timezone(&Utc);
    let later = base + chrono::Duration::days(1);
    let clock = FakeClock::new(base);
    clock.set(later);
    assert_eq!(clock.now(), later);
}
