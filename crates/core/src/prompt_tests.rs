use super::*;

#[test]
fn enter_key_submits_buffered_line() {
    let mut buf = PromptBuffer::new();
    let submitted = buf.feed("hello world\r");
    assert_eq!(submitted, vec!["hello world".to_string()]);
    assert_eq!(buf.pending(), "");
}

#[test]
fn crlf_counts_as_single_enter() {
    let mut buf = PromptBuffer::new();
    let submitted = buf.feed("hello\r\nworld\r\n");
    assert_eq!(submitted, vec!["hello".to_string(), "world".to_string()]);
}

#[test]
fn backspace_then_enter_submits_corrected_line() {
    let mut buf = PromptBuffer::new();
    let submitted = buf.feed("hellx\u{7f}o\r");
    assert_eq!(submitted, vec!["hello".to_string()]);
}

#[test]
fn ctrl_u_clears_current_line() {
    let mut buf = PromptBuffer::new();
    let submitted = buf.feed("garbage\u{15}fixed\r");
    assert_eq!(submitted, vec!["fixed".to_string()]);
}

#[test]
fn application_keypad_enter_submits_line() {
    let mut buf = PromptBuffer::new();
    let submitted = buf.feed("run tests\u{1b}OM");
    assert_eq!(submitted, vec!["run tests".to_string()]);
}

#[test]
fn xterm_keypad_enter_submits_line() {
    let mut buf = PromptBuffer::new();
    let submitted = buf.feed("run tests\u{1b}[13~");
    assert_eq!(submitted, vec!["run tests".to_string()]);
}

#[test]
fn unrelated_escape_sequence_is_dropped_not_submitted() {
    let mut buf = PromptBuffer::new();
    let submitted = buf.feed("abc\u{1b}[2Jdef\r");
    assert_eq!(submitted, vec!["abcdef".to_string()]);
}

#[test]
fn buffer_caps_at_max_chars() {
    let mut buf = PromptBuffer::new();
    let long_input = "x".repeat(3000);
    buf.feed(&long_input);
    assert_eq!(buf.pending().chars().count(), 2000);
}

#[test]
fn sanitize_collapses_whitespace_and_strips_control_chars() {
    assert_eq!(sanitize_submitted_prompt("  fix   the\tbug\u{07}  "), "fix the bug");
}

#[test]
fn sanitize_substitutes_embedded_osc_color_fragment() {
    assert_eq!(sanitize_submitted_prompt("fix the bug ]10;rgb:e7e7/eded/f7f7 please"), "fix the bug please");
}

#[test]
fn sanitize_trims_trailing_space_and_semicolon() {
    assert_eq!(sanitize_submitted_prompt("fix the bug ;"), "fix the bug");
}

#[test]
fn osc_color_response_fragment_is_flagged() {
    assert!(looks_like_terminal_control_payload("]10;rgb:e7e7/eded/f7f7\\"));
    assert!(looks_like_terminal_control_payload("]11;rgba:ffff/ffff/ffff"));
}

#[test]
fn empty_input_is_not_flagged() {
    assert!(!looks_like_terminal_control_payload(""));
    assert!(!looks_like_terminal_control_payload("   "));
}

#[test]
fn ordinary_prose_is_not_flagged() {
    assert!(!looks_like_terminal_control_payload("fix the login bug"));
    assert!(!looks_like_terminal_control_payload("\u{1b}\u{1b}\u{1b}\u{1b}x"));
}
