// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The PTY primitive (spec §4.E, §4.F), wrapping `portable_pty`.
//!
//! `portable_pty`'s unix backend starts the child as a new session
//! leader with the slave as its controlling terminal, so the chat's
//! PID doubles as its process group id — graceful shutdown signals the
//! whole group with one call.

use std::io::{Read, Write};

use portable_pty::{native_pty_system, Child, CommandBuilder, MasterPty, PtySize as NativePtySize};
use thiserror::Error;

use crate::container::CommandSpec;

#[derive(Debug, Error)]
pub enum PtyError {
    #[error("failed to open pty: {0}")]
    Open(#[source] anyhow::Error),
    #[error("failed to spawn child on pty: {0}")]
    Spawn(#[source] anyhow::Error),
    #[error("failed to clone pty reader: {0}")]
    Reader(#[source] anyhow::Error),
    #[error("failed to take pty writer: {0}")]
    Writer(#[source] anyhow::Error),
    #[error("failed to resize pty: {0}")]
    Resize(#[source] anyhow::Error),
    #[error("failed to signal process group: {0}")]
    Signal(#[from] nix::Error),
    #[error("child process io error: {0}")]
    ChildIo(#[from] std::io::Error),
    #[error("no pid available for this pty child")]
    NoPid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PtySize {
    pub rows: u16,
    pub cols: u16,
}

impl Default for PtySize {
    /// Spec §4.E's default terminal geometry.
    fn default() -> Self {
        Self { cols: 160, rows: 48 }
    }
}

impl From<PtySize> for NativePtySize {
    fn from(size: PtySize) -> Self {
        NativePtySize { rows: size.rows, cols: size.cols, pixel_width: 0, pixel_height: 0 }
    }
}

/// One PTY-attached child process: a chat's container or a project's
/// snapshot-build container, spawned as the foreground job of a
/// freshly opened pseudo-terminal.
pub struct PtyProcess {
    master: Box<dyn MasterPty + Send>,
    child: Box<dyn Child + Send + Sync>,
    pid: Option<u32>,
}

impl PtyProcess {
    pub fn spawn(command: &CommandSpec, size: PtySize) -> Result<Self, PtyError> {
        let pty_system = native_pty_system();
        let pair = pty_system.openpty(size.into()).map_err(PtyError::Open)?;

        let mut builder = CommandBuilder::new(&command.program);
        builder.args(&command.args);
        for (key, value) in &command.env {
            builder.env(key, value);
        }

        let child = pair.slave.spawn_command(builder).map_err(PtyError::Spawn)?;
        let pid = child.process_id();
        drop(pair.slave);

        Ok(Self { master: pair.master, child, pid })
    }

    pub fn reader(&self) -> Result<Box<dyn Read + Send>, PtyError> {
        self.master.try_clone_reader().map_err(PtyError::Reader)
    }

    pub fn writer(&self) -> Result<Box<dyn Write + Send>, PtyError> {
        self.master.take_writer().map_err(PtyError::Writer)
    }

    /// Resize the PTY's window; the kernel delivers `SIGWINCH` to the
    /// foreground process group on the next `TIOCSWINSZ` ioctl, so no
    /// separate signal call is needed here.
    pub fn resize(&self, size: PtySize) -> Result<(), PtyError> {
        self.master.resize(size.into()).map_err(PtyError::Resize)
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    pub fn try_wait(&mut self) -> Result<Option<portable_pty::ExitStatus>, PtyError> {
        Ok(self.child.try_wait()?)
    }

    /// Signal the whole process group (the child's pid, since
    /// `portable_pty` starts it as a session leader on unix).
    pub fn signal_group(&self, signal: nix::sys::signal::Signal) -> Result<(), PtyError> {
        let pid = self.pid.ok_or(PtyError::NoPid)?;
        let pgid = nix::unistd::Pid::from_raw(-(pid as i32));
        nix::sys::signal::kill(pgid, signal)?;
        Ok(())
    }

    pub fn kill(&mut self) -> Result<(), PtyError> {
        Ok(self.child.kill()?)
    }
}

#[cfg(test)]
#[path = "pty_tests.rs"]
mod tests;
