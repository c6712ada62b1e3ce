// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Configuration resolution (spec §11 ambient stack): an ordered
//! fallback chain — explicit CLI flag, then an optional TOML config
//! file, then a hardcoded default — mirroring the lineage daemon's
//! `env.rs` convention of one function per setting, except here every
//! setting is also reachable as a CLI flag (with an `env = "..."`
//! fallback) rather than bare environment variables.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use serde::Deserialize;

#[derive(Debug, Parser)]
#[command(name = "agent_hub", version, about = "Agent Hub supervisor")]
pub struct Args {
    /// Root directory for state, clones, logs and secrets.
    #[arg(long, env = "AGENT_HUB_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Optional TOML file supplying defaults for any unset flag.
    #[arg(long)]
    pub config_file: Option<PathBuf>,

    /// Agent config file forwarded verbatim to every `agent_cli`
    /// invocation's own `--config-file` flag. Opaque to the hub.
    #[arg(long, env = "AGENT_HUB_AGENT_CONFIG_FILE")]
    pub agent_config_file: Option<PathBuf>,

    #[arg(long, env = "AGENT_HUB_HOST")]
    pub host: Option<String>,

    #[arg(long, env = "AGENT_HUB_PORT")]
    pub port: Option<u16>,

    /// Base URL the hub advertises to containers it launches (the
    /// `AGENT_HUB_ARTIFACTS_URL` env var handed to each chat).
    #[arg(long, env = "AGENT_HUB_BASE_URL")]
    pub hub_base_url: Option<String>,

    #[arg(long, env = "AGENT_HUB_TITLE_MODEL")]
    pub title_model: Option<String>,

    /// Wipe every derived tree and reset every project's build before
    /// serving.
    #[arg(long)]
    pub clean_start: bool,

    #[arg(long, env = "AGENT_HUB_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Skip serving the built frontend bundle even if present.
    #[arg(long)]
    pub no_frontend_build: bool,
}

#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    data_dir: Option<PathBuf>,
    agent_config_file: Option<PathBuf>,
    host: Option<String>,
    port: Option<u16>,
    hub_base_url: Option<String>,
    title_model: Option<String>,
    log_level: Option<String>,
}

/// Fully resolved configuration, one value per setting.
#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub agent_config_file: PathBuf,
    pub host: String,
    pub port: u16,
    pub hub_base_url: String,
    pub title_model: String,
    pub clean_start: bool,
    pub log_level: String,
    pub no_frontend_build: bool,
}

impl Config {
    /// Resolve every setting in order: CLI flag, then config file, then
    /// hardcoded default. Config-file absence is not an error; a
    /// malformed one is.
    pub fn load(args: Args) -> anyhow::Result<Self> {
        let file = load_file_config(args.config_file.as_deref())?;

        let host = args.host.or(file.host).unwrap_or_else(|| "127.0.0.1".to_string());
        let port = args.port.or(file.port).unwrap_or(8765);
        let data_dir = args.data_dir.or(file.data_dir).unwrap_or_else(default_data_dir);
        let agent_config_file = args
            .agent_config_file
            .or(file.agent_config_file)
            .unwrap_or_else(|| data_dir.join("agent.config.toml"));
        Ok(Self {
            hub_base_url: args
                .hub_base_url
                .or(file.hub_base_url)
                .unwrap_or_else(|| format!("http://{host}:{port}")),
            title_model: args.title_model.or(file.title_model).unwrap_or_else(|| "gpt-4o-mini".to_string()),
            clean_start: args.clean_start,
            log_level: args.log_level.or(file.log_level).unwrap_or_else(|| "info".to_string()),
            no_frontend_build: args.no_frontend_build,
            host,
            port,
            data_dir,
            agent_config_file,
        })
    }
}

fn load_file_config(path: Option<&std::path::Path>) -> anyhow::Result<FileConfig> {
    let Some(path) = path else {
        return Ok(FileConfig::default());
    };
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&contents).with_context(|| format!("parsing config file {}", path.display()))
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir().unwrap_or_else(|| PathBuf::from(".")).join("agent-hub")
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
