// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn chat_bound_session_is_not_temporary() {
    let session = AgentToolsSession::new(Some("cht-abc".to_string()), "hash", "guid");
    assert!(!session.is_temporary());
}

#[test]
fn session_without_chat_is_temporary() {
    let session = AgentToolsSession::new(None, "hash", "guid");
    assert!(session.is_temporary());
}

#[test]
fn ids_are_unique() {
    let a = SessionId::new();
    let b = SessionId::new();
    assert_ne!(a, b);
    assert!(a.as_str().starts_with("ats-"));
}
