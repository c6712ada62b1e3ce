use clap::Parser;

use super::*;

fn parse(argv: &[&str]) -> Args {
    Args::parse_from(std::iter::once(&"agent_hub").chain(argv).copied())
}

#[test]
fn defaults_apply_when_nothing_is_set() {
    let config = Config::load(parse(&[])).unwrap();
    assert_eq!(config.host, "127.0.0.1");
    assert_eq!(config.port, 8765);
    assert_eq!(config.title_model, "gpt-4o-mini");
    assert_eq!(config.log_level, "info");
    assert!(!config.clean_start);
    assert!(!config.no_frontend_build);
}

#[test]
fn cli_flags_override_defaults() {
    let config = Config::load(parse(&["--host", "0.0.0.0", "--port", "9000", "--clean-start"])).unwrap();
    assert_eq!(config.host, "0.0.0.0");
    assert_eq!(config.port, 9000);
    assert!(config.clean_start);
}

#[test]
fn config_file_fills_in_unset_flags_but_not_set_ones() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("agent-hub.toml");
    std::fs::write(&path, "host = \"10.0.0.1\"\nport = 9999\ntitle_model = \"gpt-4o\"\n").unwrap();

    let args = parse(&["--config-file", path.to_str().unwrap(), "--port", "7000"]);
    let config = Config::load(args).unwrap();

    assert_eq!(config.host, "10.0.0.1");
    assert_eq!(config.port, 7000);
    assert_eq!(config.title_model, "gpt-4o");
}

#[test]
fn missing_config_file_is_an_error_but_absence_of_the_flag_is_not() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("does-not-exist.toml");
    let args = parse(&["--config-file", missing.to_str().unwrap()]);
    assert!(Config::load(args).is_err());
}

#[test]
fn hub_base_url_defaults_from_resolved_host_and_port() {
    let config = Config::load(parse(&["--host", "0.0.0.0", "--port", "9000"])).unwrap();
    assert_eq!(config.hub_base_url, "http://0.0.0.0:9000");
}

#[test]
fn agent_config_file_defaults_under_the_data_dir() {
    let config = Config::load(parse(&["--data-dir", "/tmp/agent-hub-test-data"])).unwrap();
    assert_eq!(config.agent_config_file, std::path::PathBuf::from("/tmp/agent-hub-test-data/agent.config.toml"));
}

#[test]
fn agent_config_file_flag_overrides_the_default() {
    let config = Config::load(parse(&["--agent-config-file", "/etc/agent-hub/agent.toml"])).unwrap();
    assert_eq!(config.agent_config_file, std::path::PathBuf::from("/etc/agent-hub/agent.toml"));
}
