//! Client settings with defaults and RON persistence.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// File name of the configuration inside the config directory.
pub const CONFIG_FILE: &str = "config.ron";

/// Per-user configuration directory, e.g. `~/.config/hoo-client` on Linux.
pub fn default_config_dir() -> Result<PathBuf, ConfigError> {
    dirs::config_dir()
        .map(|dir| dir.join("hoo-client"))
        .ok_or(ConfigError::NoConfigDir)
}

/// Top-level client configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Server connection and session settings.
    pub network: NetworkConfig,
    /// Logging settings.
    pub debug: DebugConfig,
}

/// Server connection and session settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NetworkConfig {
    /// Game server host name or IP address.
    pub server_address: String,
    /// Game server port.
    pub server_port: u16,
    /// Upper bound on a single connect attempt, in milliseconds.
    pub connect_timeout_ms: u64,
    /// Unclaimed answers older than this are dropped.
    pub stale_answer_secs: u64,
    /// Largest accepted frame payload in bytes.
    pub max_payload_size: u32,
    /// Disable Nagle's algorithm.
    pub tcp_nodelay: bool,
    /// Keepalive idle time in seconds (0 disables keepalive).
    pub keepalive_secs: u64,
    /// Session ticks per second.
    pub tick_rate: u32,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log filter (e.g. "debug", "info,hoo_net=trace").
    pub log_level: String,
    /// Also write JSON logs next to the config file.
    pub file_logging: bool,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            server_address: "127.0.0.1".to_string(),
            server_port: 7777,
            connect_timeout_ms: 5000,
            stale_answer_secs: 10,
            max_payload_size: 1_048_576,
            tcp_nodelay: true,
            keepalive_secs: 60,
            tick_rate: 30,
        }
    }
}

impl NetworkConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn stale_after(&self) -> Duration {
        Duration::from_secs(self.stale_answer_secs)
    }

    /// `None` when keepalive is disabled.
    pub fn keepalive(&self) -> Option<Duration> {
        (self.keepalive_secs > 0).then(|| Duration::from_secs(self.keepalive_secs))
    }

    /// Duration of one session tick. A zero rate is treated as 1 Hz.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(1) / self.tick_rate.max(1)
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            file_logging: cfg!(debug_assertions),
        }
    }
}

// --- Load / Save / Reload ---

impl Config {
    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE);

        if config_path.exists() {
            let config = Self::read(&config_path)?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(|source| ConfigError::WriteError {
            path: config_dir.to_path_buf(),
            source,
        })?;

        let config_path = config_dir.join(CONFIG_FILE);
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(2)
            .enumerate_arrays(false);
        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;

        std::fs::write(&config_path, serialized).map_err(|source| ConfigError::WriteError {
            path: config_path,
            source,
        })
    }

    /// Re-read the file: `Some(new_config)` if it differs from `self`.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let new_config = Self::read(&config_dir.join(CONFIG_FILE))?;

        if &new_config != self {
            log::info!("Config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }

    fn read(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        ron::from_str(&contents).map_err(|source| ConfigError::ParseError {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_serializes() {
        let ron_str = ron::ser::to_string_pretty(
            &Config::default(),
            ron::ser::PrettyConfig::new().depth_limit(2),
        )
        .unwrap();
        assert!(ron_str.contains("server_port: 7777"));
        assert!(ron_str.contains("stale_answer_secs: 10"));
    }

    #[test]
    fn test_missing_section_uses_default() {
        let config: Config = ron::from_str("(network: (server_port: 9000))").unwrap();
        assert_eq!(config.network.server_port, 9000);
        assert_eq!(config.network.server_address, "127.0.0.1");
        assert_eq!(config.debug, DebugConfig::default());
    }

    #[test]
    fn test_unknown_field_ignored() {
        let result: Result<Config, _> = ron::from_str("(future_setting: true)");
        assert!(result.is_ok());
    }

    #[test]
    fn test_derived_durations() {
        let network = NetworkConfig {
            connect_timeout_ms: 250,
            stale_answer_secs: 3,
            tick_rate: 20,
            ..Default::default()
        };
        assert_eq!(network.connect_timeout(), Duration::from_millis(250));
        assert_eq!(network.stale_after(), Duration::from_secs(3));
        assert_eq!(network.tick_interval(), Duration::from_millis(50));
        assert_eq!(network.keepalive(), Some(Duration::from_secs(60)));
    }

    #[test]
    fn test_zero_keepalive_and_tick_rate() {
        let network = NetworkConfig {
            keepalive_secs: 0,
            tick_rate: 0,
            ..Default::default()
        };
        assert_eq!(network.keepalive(), None);
        assert_eq!(network.tick_interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_load_creates_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_create(dir.path()).unwrap();
        assert_eq!(config, Config::default());
        assert!(dir.path().join(CONFIG_FILE).exists());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.network.server_address = "hoo.example.net".to_string();
        config.network.server_port = 4242;
        config.debug.log_level = "debug".to_string();

        config.save(dir.path()).unwrap();
        let loaded = Config::load_or_create(dir.path()).unwrap();
        assert_eq!(config, loaded);
    }

    #[test]
    fn test_reload_detects_changes() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default();
        config.save(dir.path()).unwrap();

        let mut modified = config.clone();
        modified.network.tick_rate = 60;
        modified.save(dir.path()).unwrap();

        let reloaded = config.reload(dir.path()).unwrap();
        assert_eq!(reloaded.map(|c| c.network.tick_rate), Some(60));
    }

    #[test]
    fn test_reload_no_changes() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default();
        config.save(dir.path()).unwrap();
        assert!(config.reload(dir.path()).unwrap().is_none());
    }

    #[test]
    fn test_invalid_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "{{not valid}}").unwrap();

        let err = Config::load_or_create(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
        assert!(err.to_string().contains(CONFIG_FILE));
    }

    #[test]
    fn test_reload_missing_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::default().reload(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ReadError { .. }));
    }
}
