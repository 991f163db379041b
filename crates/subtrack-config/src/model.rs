use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::ConfigError;

pub const DEFAULT_RATES_ENDPOINT: &str = "https://api.exchangerate-api.com/v4/latest/USD";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// User-configurable settings for the SubTrack shell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Optional custom directory for persisted data. Defaults to `<base>/data`.
    pub data_dir: Option<PathBuf>,
    #[serde(default = "Config::default_rates_endpoint")]
    pub rates_endpoint: String,
    #[serde(default = "Config::default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "Config::default_true")]
    pub ui_color_enabled: bool,
    #[serde(default = "Config::default_true")]
    pub fetch_icons: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: None,
            rates_endpoint: Self::default_rates_endpoint(),
            request_timeout_secs: Self::default_request_timeout_secs(),
            ui_color_enabled: true,
            fetch_icons: true,
        }
    }
}

impl Config {
    pub const KEYS: [&'static str; 5] = [
        "data_dir",
        "rates_endpoint",
        "request_timeout_secs",
        "ui_color_enabled",
        "fetch_icons",
    ];

    pub fn default_rates_endpoint() -> String {
        DEFAULT_RATES_ENDPOINT.into()
    }

    pub fn default_request_timeout_secs() -> u64 {
        DEFAULT_REQUEST_TIMEOUT_SECS
    }

    fn default_true() -> bool {
        true
    }

    pub fn resolve_data_dir(&self, base: &Path) -> PathBuf {
        match &self.data_dir {
            Some(path) => path.clone(),
            None => base.join("data"),
        }
    }

    /// Key/value pairs in display order.
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        vec![
            (
                "data_dir",
                self.data_dir
                    .as_ref()
                    .map(|path| path.display().to_string())
                    .unwrap_or_else(|| "(default)".into()),
            ),
            ("rates_endpoint", self.rates_endpoint.clone()),
            ("request_timeout_secs", self.request_timeout_secs.to_string()),
            ("ui_color_enabled", self.ui_color_enabled.to_string()),
            ("fetch_icons", self.fetch_icons.to_string()),
        ]
    }

    /// Updates one field from its textual form.
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let value = value.trim();
        match key.trim().to_ascii_lowercase().as_str() {
            "data_dir" => {
                self.data_dir = match value {
                    "" | "default" => None,
                    path => Some(PathBuf::from(path)),
                };
            }
            "rates_endpoint" => {
                if !(value.starts_with("http://") || value.starts_with("https://")) {
                    return Err(ConfigError::InvalidValue {
                        key: "rates_endpoint".into(),
                        reason: "expected an http(s) URL".into(),
                    });
                }
                self.rates_endpoint = value.to_string();
            }
            "request_timeout_secs" => {
                self.request_timeout_secs = match value.parse::<u64>() {
                    Ok(secs) if secs > 0 => secs,
                    _ => {
                        return Err(ConfigError::InvalidValue {
                            key: "request_timeout_secs".into(),
                            reason: "expected a positive whole number of seconds".into(),
                        })
                    }
                };
            }
            "ui_color_enabled" => self.ui_color_enabled = parse_flag("ui_color_enabled", value)?,
            "fetch_icons" => self.fetch_icons = parse_flag("fetch_icons", value)?,
            other => return Err(ConfigError::UnknownKey(other.to_string())),
        }
        Ok(())
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Ok(true),
        "false" | "off" | "no" | "0" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.into(),
            reason: "expected on/off".into(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_value_parses_each_field() {
        let mut cfg = Config::default();
        cfg.set_value("fetch_icons", "off").unwrap();
        cfg.set_value("request_timeout_secs", "3").unwrap();
        cfg.set_value("data_dir", "/tmp/subs").unwrap();
        assert!(!cfg.fetch_icons);
        assert_eq!(cfg.request_timeout_secs, 3);
        assert_eq!(cfg.resolve_data_dir(Path::new("/base")), PathBuf::from("/tmp/subs"));

        cfg.set_value("data_dir", "default").unwrap();
        assert_eq!(cfg.resolve_data_dir(Path::new("/base")), PathBuf::from("/base/data"));
    }

    #[test]
    fn set_value_rejects_bad_input() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.set_value("request_timeout_secs", "0"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            cfg.set_value("rates_endpoint", "ftp://x"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            cfg.set_value("theme", "dark"),
            Err(ConfigError::UnknownKey(_))
        ));
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn missing_fields_take_defaults() {
        let cfg: Config = serde_json::from_str(r#"{"fetch_icons": false}"#).unwrap();
        assert!(!cfg.fetch_icons);
        assert_eq!(cfg.rates_endpoint, DEFAULT_RATES_ENDPOINT);
        assert_eq!(cfg.request_timeout_secs, 10);
        assert!(cfg.ui_color_enabled);
    }
}
