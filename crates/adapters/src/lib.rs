// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! agent-hub-adapters: everything that shells out or touches the
//! filesystem/network on the host.
//!
//! Each adapter is a trait with one real implementation (docker CLI,
//! git CLI, `portable-pty`, `reqwest`) plus a `test-support`-gated fake
//! so `agent-hub-engine`'s tests never spawn a real process or hit the
//! network.

pub mod container;
pub mod credential_vault;
pub mod git_workspace;
pub mod pty;

pub use container::{ContainerError, ContainerRuntime, DockerRuntime};
pub use credential_vault::{CredentialVault, CredentialVaultError, MaskedSecret, ProviderStatus};
pub use git_workspace::{GitError, GitWorkspace, LocalGitWorkspace};
pub use pty::{PtyError, PtyProcess, PtySize};

#[cfg(feature = "test-support")]
pub mod fakes;
#[cfg(feature = "test-support")]
pub use fakes::{FakeContainerRuntime, FakeGitWorkspace};
