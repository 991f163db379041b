use std::{env, path::PathBuf};

/// Environment variable overriding the application base directory.
pub const HOME_ENV: &str = "SUBTRACK_HOME";

/// `$SUBTRACK_HOME`, else `~/.subtrack`, else `./.subtrack`.
pub fn base_dir() -> PathBuf {
    match env::var_os(HOME_ENV) {
        Some(value) if !value.is_empty() => PathBuf::from(value),
        _ => dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".subtrack"),
    }
}
