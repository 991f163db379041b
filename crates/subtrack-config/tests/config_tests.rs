use std::fs;

use subtrack_config::{Config, ConfigError, ConfigManager};
use tempfile::tempdir;

#[test]
fn default_config_points_at_public_rate_api() {
    let cfg = Config::default();

    assert!(cfg.rates_endpoint.starts_with("https://"));
    assert_eq!(cfg.request_timeout_secs, 10);
    assert!(cfg.data_dir.is_none());
}

#[test]
fn config_manager_persists_and_loads_config() {
    let dir = tempdir().expect("tempdir");
    let manager = ConfigManager::with_base_dir(dir.path().to_path_buf()).expect("manager");
    assert_eq!(manager.config_path(), dir.path().join("config").join("config.json"));

    assert_eq!(manager.load().expect("load defaults"), Config::default());

    let mut cfg = Config::default();
    cfg.set_value("ui_color_enabled", "off").unwrap();
    cfg.set_value("rates_endpoint", "http://127.0.0.1:9/latest").unwrap();
    manager.save(&cfg).expect("save config");

    let loaded = manager.load().expect("load config");
    assert_eq!(loaded, cfg);
    assert!(!manager.config_path().with_extension("json.tmp").exists());
}

#[test]
fn corrupt_config_is_a_serde_error() {
    let dir = tempdir().expect("tempdir");
    let manager = ConfigManager::with_base_dir(dir.path().to_path_buf()).expect("manager");
    fs::write(manager.config_path(), "{{").unwrap();
    assert!(matches!(manager.load(), Err(ConfigError::Serde(_))));
}
