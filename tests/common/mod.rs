use std::{
    fs,
    path::{Path, PathBuf},
    sync::Mutex,
};

use assert_cmd::Command;
use once_cell::sync::Lazy;
use tempfile::TempDir;

/// Holds TempDir guards so temporary folders live for the duration of the test run.
static TEST_DIRS: Lazy<Mutex<Vec<TempDir>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// Creates an isolated SubTrack home whose config never reaches the network.
pub fn offline_home() -> PathBuf {
    let temp = TempDir::new().expect("create temp dir");
    let base = temp.path().to_path_buf();
    TEST_DIRS.lock().expect("lock temp dir registry").push(temp);

    let config_dir = base.join("config");
    fs::create_dir_all(&config_dir).expect("create config dir");
    let config = serde_json::json!({
        "rates_endpoint": "http://127.0.0.1:9/latest",
        "request_timeout_secs": 2,
        "ui_color_enabled": false,
        "fetch_icons": false,
    });
    fs::write(
        config_dir.join("config.json"),
        serde_json::to_string_pretty(&config).expect("serialize config"),
    )
    .expect("write config");
    base
}

/// The CLI binary in script mode, rooted at `home`.
pub fn script_cli(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("subtrack_cli").expect("locate subtrack_cli binary");
    cmd.env("SUBTRACK_CLI_SCRIPT", "1")
        .env("SUBTRACK_HOME", home)
        .env_remove("RUST_LOG");
    cmd
}
