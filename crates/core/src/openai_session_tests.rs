use super::*;
use chrono::TimeZone;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
}

#[test]
fn starting_a_session_populates_slot() {
    let mut slot = LoginSessionSlot::new();
    slot.start(LoginMethod::BrowserCallback, now());
    assert!(slot.current().is_some());
    assert_eq!(slot.current().unwrap().status, LoginStatus::Starting);
}

#[test]
fn starting_a_new_session_cancels_the_old_one() {
    let mut slot = LoginSessionSlot::new();
    slot.start(LoginMethod::BrowserCallback, now());
    slot.current_mut().unwrap().transition(LoginStatus::Running);

    slot.start(LoginMethod::DeviceAuth, now());
    assert_eq!(slot.current().unwrap().method, LoginMethod::DeviceAuth);
}

#[test]
fn cancel_marks_active_session_cancelled() {
    let mut slot = LoginSessionSlot::new();
    slot.start(LoginMethod::BrowserCallback, now());
    assert!(slot.cancel(now()).is_ok());
    assert_eq!(slot.current().unwrap().status, LoginStatus::Cancelled);
}

#[test]
fn cancel_without_active_session_errors() {
    let mut slot = LoginSessionSlot::new();
    assert!(slot.cancel(now()).is_err());
}

#[test]
fn cancel_on_already_terminal_session_errors() {
    let mut slot = LoginSessionSlot::new();
    slot.start(LoginMethod::BrowserCallback, now());
    slot.cancel(now()).unwrap();
    assert!(slot.cancel(now()).is_err());
}

#[test]
fn push_log_line_caps_tail() {
    let mut session = OpenAiAccountSession::new(LoginSessionId::new(), LoginMethod::DeviceAuth, now());
    for i in 0..(LOG_TAIL_CAP + 20) {
        session.push_log_line(format!("line {i}"));
    }
    assert_eq!(session.log_tail.len(), LOG_TAIL_CAP);
}
