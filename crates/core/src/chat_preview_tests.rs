use super::*;

#[test]
fn classifies_marker_prefixed_lines_as_user_authored() {
    let log = "\u{203a} build me a todo app\nworking on it...\n";
    let lines = preview_lines(log);
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0], PreviewLine { role: PreviewRole::User, text: "build me a todo app".to_string() });
    assert_eq!(lines[1], PreviewLine { role: PreviewRole::Assistant, text: "working on it...".to_string() });
}

#[test]
fn strips_you_colon_prefix() {
    let lines = preview_lines("You: add a login page\n");
    assert_eq!(lines, vec![PreviewLine { role: PreviewRole::User, text: "add a login page".to_string() }]);
}

#[test]
fn drops_tip_lines_and_blank_lines() {
    let lines = preview_lines("Tip: press ctrl-c to exit\n\n  \nhello\n");
    assert_eq!(lines, vec![PreviewLine { role: PreviewRole::Assistant, text: "hello".to_string() }]);
}

#[test]
fn strips_ansi_and_folds_carriage_returns() {
    let lines = preview_lines("\u{1b}[2K\rfoo\u{1b}[0m\rbar\n");
    assert_eq!(
        lines,
        vec![
            PreviewLine { role: PreviewRole::Assistant, text: "foo".to_string() },
            PreviewLine { role: PreviewRole::Assistant, text: "bar".to_string() },
        ]
    );
}

#[test]
fn empty_input_yields_no_lines() {
    assert!(preview_lines("").is_empty());
}
