use super::*;

#[test]
fn validates_well_formed_mount() {
    let mount = Mount { host_path: "/host/data".into(), container_path: "/workspace/data".into() };
    assert!(validate_mount(&mount).is_ok());
}

#[test]
fn rejects_relative_container_path() {
    let mount = Mount { host_path: "/host/data".into(), container_path: "data".into() };
    assert!(validate_mount(&mount).is_err());
}

#[test]
fn rejects_empty_host_path() {
    let mount = Mount { host_path: "  ".into(), container_path: "/data".into() };
    assert!(validate_mount(&mount).is_err());
}

#[test]
fn rejects_reserved_env_key() {
    let entries = vec![EnvVar { key: "OPENAI_API_KEY".into(), value: "sk-whatever".into() }];
    assert!(validate_env_entries(&entries).is_err());
}

#[test]
fn accepts_non_reserved_env_keys() {
    let entries = vec![EnvVar { key: "LOG_LEVEL".into(), value: "debug".into() }];
    assert!(validate_env_entries(&entries).is_ok());
}

#[test]
fn rejects_empty_env_key() {
    let entries = vec![EnvVar { key: "".into(), value: "x".into() }];
    assert!(validate_env_entries(&entries).is_err());
}
