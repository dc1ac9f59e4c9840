use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::parking::poller::{DEFAULT_POLL_INTERVAL, DEFAULT_TIMEOUT};

const FILENAME: &str = "config.yaml";
const APP_DIR: &str = "parkmap";

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:5000";

/// Shortest poll interval accepted from config; shorter values are raised to it.
const MIN_POLL_INTERVAL_MS: u64 = 250;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<ServerConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub defaults: Option<DefaultsConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poll_interval_ms: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DefaultsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub windowed: Option<bool>,

    /// Facility file to load instead of the built-in map.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<PathBuf>,
}

impl Config {
    pub fn path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|d| d.join(APP_DIR).join(FILENAME))
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))
    }

    pub fn load() -> Result<Self> {
        let path = Self::path()?;
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                anyhow::anyhow!("No config found. Run `parkmap config init` to create one.")
            } else {
                anyhow::anyhow!("Failed to read config: {e}")
            }
        })?;
        let config: Config = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }

    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let yaml = serde_yaml::to_string(self)?;
        let contents = format!("# parkmap configuration\n{yaml}");
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "server.url" => {
                if !(value.starts_with("http://") || value.starts_with("https://")) {
                    anyhow::bail!("Invalid server URL: {value}. Must start with http:// or https://.");
                }
                self.server.get_or_insert_with(ServerConfig::default).url =
                    Some(value.trim_end_matches('/').to_string());
            }
            "server.poll_interval_ms" => {
                let ms: u64 = value
                    .parse()
                    .map_err(|_| anyhow::anyhow!("Invalid poll interval: {value}"))?;
                if ms < MIN_POLL_INTERVAL_MS {
                    anyhow::bail!(
                        "Poll interval too short: {ms} ms. Must be at least {MIN_POLL_INTERVAL_MS} ms."
                    );
                }
                self.server
                    .get_or_insert_with(ServerConfig::default)
                    .poll_interval_ms = Some(ms);
            }
            "server.timeout_ms" => {
                let ms: u64 = value
                    .parse()
                    .map_err(|_| anyhow::anyhow!("Invalid timeout: {value}"))?;
                if ms == 0 {
                    anyhow::bail!("Timeout must be greater than zero.");
                }
                self.server.get_or_insert_with(ServerConfig::default).timeout_ms = Some(ms);
            }
            "defaults.theme" => {
                match value {
                    "light" | "dark" => {}
                    _ => anyhow::bail!("Invalid theme: {value}. Must be 'light' or 'dark'."),
                }
                self.defaults
                    .get_or_insert_with(DefaultsConfig::default)
                    .theme = Some(value.to_string());
            }
            "defaults.windowed" => {
                let windowed = match value {
                    "true" | "yes" | "on" => true,
                    "false" | "no" | "off" => false,
                    _ => anyhow::bail!("Invalid value for defaults.windowed: {value}. Must be true or false."),
                };
                self.defaults
                    .get_or_insert_with(DefaultsConfig::default)
                    .windowed = Some(windowed);
            }
            "defaults.layout" => {
                self.defaults
                    .get_or_insert_with(DefaultsConfig::default)
                    .layout = Some(PathBuf::from(value));
            }
            _ => anyhow::bail!(
                "Unknown config key: {key}. Valid keys: server.url, server.poll_interval_ms, server.timeout_ms, defaults.theme, defaults.windowed, defaults.layout"
            ),
        }
        Ok(())
    }

    /// Server base URL: explicit override, then config, then the local default.
    pub fn server_url(&self, cli_override: Option<&str>) -> String {
        cli_override
            .map(str::to_string)
            .or_else(|| self.server.as_ref().and_then(|s| s.url.clone()))
            .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string())
    }

    pub fn poll_interval(&self) -> Duration {
        self.server
            .as_ref()
            .and_then(|s| s.poll_interval_ms)
            .map(|ms| Duration::from_millis(ms.max(MIN_POLL_INTERVAL_MS)))
            .unwrap_or(DEFAULT_POLL_INTERVAL)
    }

    /// A zero timeout in a hand-edited file counts as unset.
    pub fn timeout(&self) -> Duration {
        self.server
            .as_ref()
            .and_then(|s| s.timeout_ms)
            .filter(|&ms| ms > 0)
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_TIMEOUT)
    }

    pub fn theme_name(&self) -> &str {
        self.defaults
            .as_ref()
            .and_then(|d| d.theme.as_deref())
            .unwrap_or("light")
    }

    pub fn windowed(&self) -> bool {
        self.defaults
            .as_ref()
            .and_then(|d| d.windowed)
            .unwrap_or(true)
    }

    /// Facility file: explicit override, then config, else the built-in map.
    pub fn layout_path(&self, cli_override: Option<&Path>) -> Option<PathBuf> {
        cli_override
            .map(Path::to_path_buf)
            .or_else(|| self.defaults.as_ref().and_then(|d| d.layout.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_without_config() {
        let config = Config::default();
        assert_eq!(config.server_url(None), DEFAULT_SERVER_URL);
        assert_eq!(config.poll_interval(), Duration::from_millis(5000));
        assert_eq!(config.theme_name(), "light");
        assert!(config.windowed());
        assert_eq!(config.layout_path(None), None);
    }

    #[test]
    fn cli_override_beats_config() {
        let mut config = Config::default();
        config.set("server.url", "http://parking.local:8080/").unwrap();
        assert_eq!(config.server_url(None), "http://parking.local:8080");
        assert_eq!(
            config.server_url(Some("http://other:1")),
            "http://other:1"
        );
    }

    #[test]
    fn set_validates_values() {
        let mut config = Config::default();
        assert!(config.set("server.url", "parking.local").is_err());
        assert!(config.set("server.poll_interval_ms", "10").is_err());
        assert!(config.set("server.poll_interval_ms", "soon").is_err());
        assert!(config.set("server.timeout_ms", "0").is_err());
        assert!(config.set("defaults.theme", "neon").is_err());
        assert!(config.set("defaults.windowed", "maybe").is_err());
        assert!(config.set("nope", "1").is_err());

        config.set("server.poll_interval_ms", "2000").unwrap();
        config.set("defaults.windowed", "off").unwrap();
        assert_eq!(config.poll_interval(), Duration::from_millis(2000));
        assert!(!config.windowed());
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = std::env::temp_dir().join(format!("parkmap-config-{}", std::process::id()));
        let path = dir.join(FILENAME);
        let mut config = Config::default();
        config.set("server.url", "https://lot.example").unwrap();
        config.set("defaults.theme", "dark").unwrap();
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.server_url(None), "https://lot.example");
        assert_eq!(loaded.theme_name(), "dark");
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn hand_edited_zero_durations_are_sanitised() {
        let config: Config =
            serde_yaml::from_str("server:\n  poll_interval_ms: 0\n  timeout_ms: 0\n").unwrap();
        assert_eq!(
            config.poll_interval(),
            Duration::from_millis(MIN_POLL_INTERVAL_MS)
        );
        assert_eq!(config.timeout(), DEFAULT_TIMEOUT);

        let config: Config = serde_yaml::from_str("server:\n  poll_interval_ms: 40\n").unwrap();
        assert_eq!(
            config.poll_interval(),
            Duration::from_millis(MIN_POLL_INTERVAL_MS)
        );
    }

    #[test]
    fn missing_config_mentions_init() {
        let err = Config::load_from(Path::new("/nonexistent/parkmap/config.yaml")).unwrap_err();
        assert!(err.to_string().contains("config init"));
    }
}
