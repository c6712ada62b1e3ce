// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The credential vault adapter (spec §4.C): on-disk secrets files with
//! secure permissions, masked status payloads, and optional live
//! verification of an OpenAI API key.
//!
//! `auth.json` (the codex OAuth refresh token payload) is written by
//! the container's login flow, not by the hub; the vault only reads it
//! back for status reporting.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::info;

const OPENAI_ENV_FILE: &str = "openai.env";
const GITHUB_SSH_KEY_FILE: &str = "github_ssh_key";
const GITHUB_KNOWN_HOSTS_FILE: &str = "github_known_hosts";
const AUTH_JSON_FILE: &str = "auth.json";

const MIN_OPENAI_KEY_LEN: usize = 20;
const MAX_SSH_KEY_BYTES: usize = 32 * 1024;
const MAX_KNOWN_HOSTS_BYTES: usize = 256 * 1024;

#[derive(Debug, Error)]
pub enum CredentialVaultError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid input: {0}")]
    Validation(String),
    #[error("OpenAI rejected the key as unauthorized")]
    VerifyUnauthorized,
    #[error("failed to reach OpenAI for key verification: {0}")]
    VerifyTransport(#[from] reqwest::Error),
}

/// A secret masked for display: `prefix(6)…suffix(4)`, or all-asterisks
/// when the raw value is too short to mask without revealing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaskedSecret(pub String);

impl MaskedSecret {
    pub fn mask(raw: &str) -> Self {
        if raw.len() <= 10 {
            Self("*".repeat(raw.len()))
        } else {
            let prefix: String = raw.chars().take(6).collect();
            let suffix: String = raw.chars().rev().take(4).collect::<String>().chars().rev().collect();
            Self(format!("{prefix}…{suffix}"))
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProviderStatus {
    pub connected: bool,
    pub key_hint: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
    pub account_connected: bool,
    pub account_auth_mode: Option<String>,
    pub account_updated_at: Option<DateTime<Utc>>,
}

pub struct CredentialVault {
    root: PathBuf,
}

impl CredentialVault {
    /// `root` is the `<data>/secrets` directory; created with mode 0700
    /// on first use if it does not already exist.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Host path of the stored OpenAI credential file, for callers that
    /// mount it into a container rather than read the key into hub
    /// process memory (spec §4.E "credential file flag", property I2 —
    /// the raw key must never appear in a launched command vector).
    pub fn openai_env_file_path(&self) -> PathBuf {
        self.root.join(OPENAI_ENV_FILE)
    }

    pub fn github_ssh_key_file_path(&self) -> PathBuf {
        self.root.join(GITHUB_SSH_KEY_FILE)
    }

    pub fn github_known_hosts_file_path(&self) -> PathBuf {
        self.root.join(GITHUB_KNOWN_HOSTS_FILE)
    }

    pub async fn connect_openai(&self, key: &str, verify: bool) -> Result<ProviderStatus, CredentialVaultError> {
        validate_openai_key(key)?;
        if verify {
            verify_openai_key(key).await?;
        }
        self.ensure_root_dir().await?;
        let contents = format!("OPENAI_API_KEY={key:?}\n");
        write_secret_file(&self.root.join(OPENAI_ENV_FILE), contents.as_bytes()).await?;
        info!("openai credential connected");
        self.openai_status().await
    }

    pub async fn disconnect_openai(&self) -> Result<(), CredentialVaultError> {
        remove_secret_file(&self.root.join(OPENAI_ENV_FILE)).await?;
        info!("openai credential disconnected");
        Ok(())
    }

    pub async fn openai_status(&self) -> Result<ProviderStatus, CredentialVaultError> {
        let path = self.root.join(OPENAI_ENV_FILE);
        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => {
                let key = parse_openai_env(&contents).unwrap_or_default();
                let updated_at = file_modified_at(&path).await;
                Ok(ProviderStatus {
                    connected: true,
                    key_hint: Some(MaskedSecret::mask(&key).0),
                    updated_at,
                    ..self.github_account_fields().await
                })
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Ok(ProviderStatus { connected: false, ..Default::default() })
            }
            Err(err) => Err(err.into()),
        }
    }

    /// The raw OpenAI key, for callers that must present it to an
    /// external API (e.g. the title pipeline's bare-key path, spec
    /// §4.H) rather than just report whether one is connected.
    pub async fn openai_api_key(&self) -> Result<Option<String>, CredentialVaultError> {
        let path = self.root.join(OPENAI_ENV_FILE);
        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => Ok(parse_openai_env(&contents)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// The raw SSH private key and known_hosts content, for callers that
    /// must write them into a container's `~/.ssh` (the agent tools
    /// credential-resolve route, spec §4.G) rather than just report
    /// whether GitHub is connected.
    pub async fn github_ssh_credentials(&self) -> Result<Option<(String, Option<String>)>, CredentialVaultError> {
        let key_path = self.root.join(GITHUB_SSH_KEY_FILE);
        let private_key = match tokio::fs::read_to_string(&key_path).await {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let known_hosts = match tokio::fs::read_to_string(self.root.join(GITHUB_KNOWN_HOSTS_FILE)).await {
            Ok(contents) => Some(contents),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => None,
            Err(err) => return Err(err.into()),
        };
        Ok(Some((private_key, known_hosts)))
    }

    pub async fn connect_github(
        &self,
        private_key: &str,
        known_hosts: Option<&str>,
    ) -> Result<ProviderStatus, CredentialVaultError> {
        validate_ssh_key(private_key)?;
        if let Some(known_hosts) = known_hosts {
            validate_known_hosts(known_hosts)?;
        }
        self.ensure_root_dir().await?;
        write_secret_file(&self.root.join(GITHUB_SSH_KEY_FILE), private_key.as_bytes()).await?;
        if let Some(known_hosts) = known_hosts {
            let normalized = known_hosts.replace("\r\n", "\n");
            write_secret_file(&self.root.join(GITHUB_KNOWN_HOSTS_FILE), normalized.as_bytes()).await?;
        }
        info!("github credential connected");
        self.github_status().await
    }

    pub async fn disconnect_github(&self) -> Result<(), CredentialVaultError> {
        remove_secret_file(&self.root.join(GITHUB_SSH_KEY_FILE)).await?;
        remove_secret_file(&self.root.join(GITHUB_KNOWN_HOSTS_FILE)).await?;
        info!("github credential disconnected");
        Ok(())
    }

    pub async fn github_status(&self) -> Result<ProviderStatus, CredentialVaultError> {
        let path = self.root.join(GITHUB_SSH_KEY_FILE);
        match tokio::fs::metadata(&path).await {
            Ok(_) => {
                let updated_at = file_modified_at(&path).await;
                Ok(ProviderStatus { connected: true, key_hint: None, updated_at, ..self.github_account_fields().await })
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Ok(ProviderStatus { connected: false, ..Default::default() })
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Read back `auth.json`'s account-session fields for status
    /// reporting. Never written by the vault itself — the container's
    /// login flow owns this file.
    async fn github_account_fields(&self) -> ProviderStatus {
        let path = self.root.join(AUTH_JSON_FILE);
        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => match serde_json::from_str::<serde_json::Value>(&contents) {
                Ok(value) => ProviderStatus {
                    account_connected: true,
                    account_auth_mode: value.get("auth_mode").and_then(|v| v.as_str()).map(str::to_string),
                    account_updated_at: file_modified_at(&path).await,
                    ..Default::default()
                },
                Err(_) => ProviderStatus::default(),
            },
            Err(_) => ProviderStatus::default(),
        }
    }

    async fn ensure_root_dir(&self) -> Result<(), CredentialVaultError> {
        tokio::fs::create_dir_all(&self.root).await?;
        set_secure_mode(&self.root, 0o700).await?;
        Ok(())
    }
}

fn validate_openai_key(key: &str) -> Result<(), CredentialVaultError> {
    if key.is_empty() || key.chars().any(char::is_whitespace) {
        return Err(CredentialVaultError::Validation("openai key must be non-empty and whitespace-free".to_string()));
    }
    if key.len() < MIN_OPENAI_KEY_LEN {
        return Err(CredentialVaultError::Validation(format!("openai key must be at least {MIN_OPENAI_KEY_LEN} characters")));
    }
    Ok(())
}

fn validate_ssh_key(key: &str) -> Result<(), CredentialVaultError> {
    if key.as_bytes().len() > MAX_SSH_KEY_BYTES {
        return Err(CredentialVaultError::Validation("ssh key exceeds size cap".to_string()));
    }
    if key.contains('\0') {
        return Err(CredentialVaultError::Validation("ssh key must not contain NUL bytes".to_string()));
    }
    let has_begin = key.contains("-----BEGIN");
    let has_end = key.contains("-----END");
    if !has_begin || !has_end {
        return Err(CredentialVaultError::Validation("ssh key must have matching BEGIN/END markers".to_string()));
    }
    Ok(())
}

fn validate_known_hosts(known_hosts: &str) -> Result<(), CredentialVaultError> {
    if known_hosts.as_bytes().len() > MAX_KNOWN_HOSTS_BYTES {
        return Err(CredentialVaultError::Validation("known_hosts exceeds size cap".to_string()));
    }
    if known_hosts.contains('\0') {
        return Err(CredentialVaultError::Validation("known_hosts must not contain NUL bytes".to_string()));
    }
    Ok(())
}

async fn verify_openai_key(key: &str) -> Result<(), CredentialVaultError> {
    let client = reqwest::Client::new();
    let response = client.get("https://api.openai.com/v1/models").bearer_auth(key).send().await?;
    match response.status().as_u16() {
        200 => Ok(()),
        401 | 403 => Err(CredentialVaultError::VerifyUnauthorized),
        other => Err(CredentialVaultError::Validation(format!("unexpected OpenAI response status {other}"))),
    }
}

fn parse_openai_env(contents: &str) -> Option<String> {
    let line = contents.lines().find(|line| line.starts_with("OPENAI_API_KEY="))?;
    let value = line.strip_prefix("OPENAI_API_KEY=")?;
    Some(value.trim_matches('"').to_string())
}

async fn write_secret_file(path: &Path, contents: &[u8]) -> Result<(), CredentialVaultError> {
    tokio::fs::write(path, contents).await?;
    set_secure_mode(path, 0o600).await?;
    Ok(())
}

async fn remove_secret_file(path: &Path) -> Result<(), CredentialVaultError> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err.into()),
    }
}

#[cfg(unix)]
async fn set_secure_mode(path: &Path, mode: u32) -> Result<(), CredentialVaultError> {
    use std::os::unix::fs::PermissionsExt;
    let permissions = std::fs::Permissions::from_mode(mode);
    tokio::fs::set_permissions(path, permissions).await?;
    Ok(())
}

#[cfg(not(unix))]
async fn set_secure_mode(_path: &Path, _mode: u32) -> Result<(), CredentialVaultError> {
    Ok(())
}

async fn file_modified_at(path: &Path) -> Option<DateTime<Utc>> {
    let metadata = tokio::fs::metadata(path).await.ok()?;
    let modified = metadata.modified().ok()?;
    Some(DateTime::<Utc>::from(modified))
}

#[cfg(test)]
#[path = "credential_vault_tests.rs"]
mod tests;
