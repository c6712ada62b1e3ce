// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::io::Read as _;

#[test]
fn default_size_matches_spec_geometry() {
    let size = PtySize::default();
    assert_eq!(size.cols, 160);
    assert_eq!(size.rows, 48);
}

#[test]
fn spawn_reports_a_pid_and_streams_output() {
    let command = CommandSpec { program: "echo".to_string(), args: vec!["hello-pty".to_string()], env: vec![] };
    let mut pty = PtyProcess::spawn(&command, PtySize::default()).unwrap();
    assert!(pty.pid().is_some());

    let mut reader = pty.reader().unwrap();
    let mut output = Vec::new();
    reader.read_to_end(&mut output).ok();
    let text = String::from_utf8_lossy(&output);
    assert!(text.contains("hello-pty"));

    pty.try_wait().unwrap();
}

#[test]
fn resize_does_not_error_on_a_live_pty() {
    let command = CommandSpec { program: "sleep".to_string(), args: vec!["1".to_string()], env: vec![] };
    let mut pty = PtyProcess::spawn(&command, PtySize::default()).unwrap();
    pty.resize(PtySize { cols: 100, rows: 30 }).unwrap();
    let _ = pty.kill();
}
