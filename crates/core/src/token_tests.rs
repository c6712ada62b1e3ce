use super::*;

#[test]
fn generated_token_is_48_hex_chars() {
    let token = generate_token();
    assert_eq!(token.len(), 48);
    assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
}

#[test]
fn successive_tokens_are_distinct() {
    assert_ne!(generate_token(), generate_token());
}

#[test]
fn verify_token_accepts_matching_token() {
    let token = generate_token();
    let stored = hash_token(&token);
    assert!(verify_token(&token, &stored));
}

#[test]
fn verify_token_rejects_wrong_token() {
    let token = generate_token();
    let stored = hash_token(&token);
    assert!(!verify_token("not-the-token", &stored));
}

#[test]
fn hash_token_is_deterministic() {
    assert_eq!(hash_token("same-input"), hash_token("same-input"));
}
