// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Credential binding (spec section 3): which credentials a project's
//! chats receive at start time.

use serde::{Deserialize, Serialize};

use crate::define_id;

define_id! {
    pub struct CredentialId("crd-");
}

/// How a project selects credentials from the catalog at chat-start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum CredentialBinding {
    /// Pick whatever credentials are available automatically.
    Auto,
    /// Bind every credential in the catalog.
    All,
    /// Bind an explicit set of credential ids.
    Set { credential_ids: Vec<CredentialId> },
    /// Bind exactly one credential.
    Single { credential_ids: Vec<CredentialId> },
}

impl CredentialBinding {
    pub fn credential_ids(&self) -> &[CredentialId] {
        match self {
            CredentialBinding::Auto | CredentialBinding::All => &[],
            CredentialBinding::Set { credential_ids } | CredentialBinding::Single { credential_ids } => {
                credential_ids
            }
        }
    }

    /// `single` mode is only well-formed with exactly one bound id.
    pub fn is_well_formed(&self) -> bool {
        match self {
            CredentialBinding::Single { credential_ids } => credential_ids.len() == 1,
            _ => true,
        }
    }
}

#[cfg(test)]
#[path = "credential_tests.rs"]
mod tests;
