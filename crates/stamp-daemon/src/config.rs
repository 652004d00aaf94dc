//! Configuration file management.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use stamp_ledger::LedgerSettings;

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "STAMPD_DATA_DIR";

/// Complete daemon configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Storage settings.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Defaults for programme rows the ledger creates itself.
    #[serde(default)]
    pub ledger: LedgerConfig,
    /// JSON-RPC socket settings.
    #[serde(default)]
    pub rpc: RpcConfig,
    /// Advanced settings.
    #[serde(default)]
    pub advanced: AdvancedConfig,
}

/// Storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Data directory. Empty = platform default.
    #[serde(default)]
    pub data_dir: String,
    /// Database file name inside the data directory.
    #[serde(default = "default_db_file")]
    pub db_file: String,
}

/// Ledger defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Threshold of a freshly created default card.
    #[serde(default = "default_stamps_required")]
    pub default_stamps_required: u32,
    #[serde(default = "default_reward_description")]
    pub default_reward_description: String,
    /// Display name used when a bootstrap request gives none.
    #[serde(default = "default_business_name")]
    pub default_business_name: String,
}

/// RPC configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcConfig {
    /// Socket file name inside the data directory.
    #[serde(default = "default_socket_name")]
    pub socket_name: String,
    /// Per-subscriber event buffer before lagging subscribers drop events.
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
}

/// Advanced configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvancedConfig {
    /// Log level: "debug" | "info" | "warn" | "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// Default value functions

fn default_db_file() -> String {
    "stampd.db".to_string()
}

fn default_stamps_required() -> u32 {
    stamp_types::DEFAULT_STAMPS_REQUIRED
}

fn default_reward_description() -> String {
    stamp_types::DEFAULT_REWARD_DESCRIPTION.to_string()
}

fn default_business_name() -> String {
    LedgerSettings::default().default_business_name
}

fn default_socket_name() -> String {
    "stampd.sock".to_string()
}

fn default_event_buffer() -> usize {
    1000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: String::new(),
            db_file: default_db_file(),
        }
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            default_stamps_required: default_stamps_required(),
            default_reward_description: default_reward_description(),
            default_business_name: default_business_name(),
        }
    }
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            socket_name: default_socket_name(),
            event_buffer: default_event_buffer(),
        }
    }
}

impl Default for AdvancedConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl DaemonConfig {
    /// Load configuration from the default config file location.
    ///
    /// Falls back to defaults if file does not exist.
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path();
        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: DaemonConfig = toml::from_str(&content)?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.ledger.default_stamps_required == 0 {
            anyhow::bail!("ledger.default_stamps_required must be at least 1");
        }
        if self.rpc.event_buffer == 0 {
            anyhow::bail!("rpc.event_buffer must be at least 1");
        }
        Ok(())
    }

    /// Get the data directory path.
    pub fn data_dir(&self) -> PathBuf {
        if self.storage.data_dir.is_empty() {
            Self::default_data_dir()
        } else {
            PathBuf::from(&self.storage.data_dir)
        }
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir().join(&self.storage.db_file)
    }

    pub fn socket_path(&self) -> PathBuf {
        self.data_dir().join(&self.rpc.socket_name)
    }

    /// Ledger defaults derived from the `[ledger]` section.
    pub fn ledger_settings(&self) -> LedgerSettings {
        LedgerSettings {
            default_stamps_required: self.ledger.default_stamps_required,
            default_reward_description: self.ledger.default_reward_description.clone(),
            default_business_name: self.ledger.default_business_name.clone(),
        }
    }

    /// Get the config file path.
    fn config_path() -> PathBuf {
        Self::default_data_dir().join("config.toml")
    }

    /// Platform-specific default data directory.
    fn default_data_dir() -> PathBuf {
        if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
            return PathBuf::from(dir);
        }
        #[cfg(target_os = "macos")]
        {
            dirs_fallback("Library/Application Support/stampd")
        }
        #[cfg(not(target_os = "macos"))]
        {
            dirs_fallback(".stampd")
        }
    }
}

/// Fallback home directory resolution.
fn dirs_fallback(subpath: &str) -> PathBuf {
    std::env::var("HOME")
        .map(|h| PathBuf::from(h).join(subpath))
        .unwrap_or_else(|_| PathBuf::from("/tmp/stampd"))
}
