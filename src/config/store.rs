//! Durable settings store
//!
//! Persists the channel configuration as a TOML file with a `[serial_port]`
//! section for the seven transport parameters and a `[logging]` section for
//! the flush interval. The file is default-populated on first run, read once
//! at startup, and rewritten by the settings mutator whenever a `/set`
//! succeeds, so configuration survives restarts.
//!
//! The store lives in the platform-appropriate data directory:
//!
//! - **Linux**: `~/.local/share/seriallog-rs/settings.toml`
//! - **macOS**: `~/Library/Application Support/seriallog-rs/settings.toml`
//! - **Windows**: `%APPDATA%\seriallog-rs\settings.toml`

use crate::config::{
    ChannelConfig, Handshake, Parity, StopBits, BAUD_RATES, DATA_BITS_OPTIONS, MIN_LOG_INTERVAL_MS,
};
use crate::error::{Result, SerialLogError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application identifier for the data directory
pub const APP_ID: &str = "seriallog-rs";

/// Settings filename
pub const SETTINGS_FILE: &str = "settings.toml";

/// Get the application data directory path
pub fn app_data_dir() -> Option<PathBuf> {
    dirs_next::data_dir().map(|p| p.join(APP_ID))
}

/// On-disk settings layout
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct SettingsFile {
    #[serde(default)]
    serial_port: SerialPortSection,
    #[serde(default)]
    logging: LoggingSection,
}

/// `[serial_port]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SerialPortSection {
    port_name: String,
    baud_rate: u32,
    parity: Parity,
    data_bits: u8,
    stop_bits: StopBits,
    handshake: Handshake,
    read_timeout_ms: u64,
}

impl Default for SerialPortSection {
    fn default() -> Self {
        let config = ChannelConfig::default();
        Self {
            port_name: config.port_name,
            baud_rate: config.baud_rate,
            parity: config.parity,
            data_bits: config.data_bits,
            stop_bits: config.stop_bits,
            handshake: config.handshake,
            read_timeout_ms: config.read_timeout_ms,
        }
    }
}

/// `[logging]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingSection {
    log_interval_ms: u64,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            log_interval_ms: ChannelConfig::default().log_interval_ms,
        }
    }
}

impl SettingsFile {
    fn from_config(config: &ChannelConfig) -> Self {
        Self {
            serial_port: SerialPortSection {
                port_name: config.port_name.clone(),
                baud_rate: config.baud_rate,
                parity: config.parity,
                data_bits: config.data_bits,
                stop_bits: config.stop_bits,
                handshake: config.handshake,
                read_timeout_ms: config.read_timeout_ms,
            },
            logging: LoggingSection {
                log_interval_ms: config.log_interval_ms,
            },
        }
    }

    fn into_config(self) -> ChannelConfig {
        ChannelConfig {
            port_name: self.serial_port.port_name,
            baud_rate: self.serial_port.baud_rate,
            parity: self.serial_port.parity,
            data_bits: self.serial_port.data_bits,
            stop_bits: self.serial_port.stop_bits,
            handshake: self.serial_port.handshake,
            read_timeout_ms: self.serial_port.read_timeout_ms,
            log_interval_ms: self.logging.log_interval_ms,
        }
    }
}

/// Durable key/value settings backed by a TOML file
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    /// Create a store backed by the given file path.
    ///
    /// The file and its parent directory are created (default-populated) on
    /// the first [`SettingsStore::load`] or [`SettingsStore::save`].
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Create a store at the platform default location
    pub fn at_default_location() -> Result<Self> {
        let dir = app_data_dir().ok_or_else(|| {
            SerialLogError::Settings("could not determine app data directory".to_string())
        })?;
        Ok(Self::new(dir.join(SETTINGS_FILE)))
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the configuration, default-populating the file if it is absent.
    ///
    /// Values outside their field's domain (a hand-edited file) are reset to
    /// the default for that field with a warning.
    pub fn load(&self) -> Result<ChannelConfig> {
        if !self.path.exists() {
            let config = ChannelConfig::default();
            self.save(&config)?;
            tracing::info!("Settings file created at {:?}", self.path);
            return Ok(config);
        }

        let content = std::fs::read_to_string(&self.path).map_err(|e| {
            SerialLogError::Settings(format!("failed to read {:?}: {}", self.path, e))
        })?;

        let parsed: SettingsFile = toml::from_str(&content).map_err(|e| {
            SerialLogError::Settings(format!("failed to parse {:?}: {}", self.path, e))
        })?;

        Ok(sanitize(parsed.into_config()))
    }

    /// Load the configuration, falling back to defaults on any error
    pub fn load_or_default(&self) -> ChannelConfig {
        self.load().unwrap_or_else(|e| {
            tracing::warn!("Failed to load settings, using defaults: {}", e);
            ChannelConfig::default()
        })
    }

    /// Write the full configuration back to the file
    pub fn save(&self, config: &ChannelConfig) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                SerialLogError::Settings(format!("failed to create {:?}: {}", parent, e))
            })?;
        }

        let content = toml::to_string_pretty(&SettingsFile::from_config(config))
            .map_err(|e| SerialLogError::Settings(format!("failed to serialize settings: {}", e)))?;

        std::fs::write(&self.path, content).map_err(|e| {
            SerialLogError::Settings(format!("failed to write {:?}: {}", self.path, e))
        })
    }
}

/// Reset out-of-domain numeric fields to their defaults
fn sanitize(mut config: ChannelConfig) -> ChannelConfig {
    let defaults = ChannelConfig::default();

    if !BAUD_RATES.contains(&config.baud_rate) {
        tracing::warn!(
            "Stored baud rate {} is not available, using {}",
            config.baud_rate,
            defaults.baud_rate
        );
        config.baud_rate = defaults.baud_rate;
    }
    if !DATA_BITS_OPTIONS.contains(&config.data_bits) {
        tracing::warn!(
            "Stored data bits {} is not available, using {}",
            config.data_bits,
            defaults.data_bits
        );
        config.data_bits = defaults.data_bits;
    }
    if config.log_interval_ms < MIN_LOG_INTERVAL_MS {
        tracing::warn!(
            "Stored log interval {} ms is below the {} ms minimum, using {}",
            config.log_interval_ms,
            MIN_LOG_INTERVAL_MS,
            defaults.log_interval_ms
        );
        config.log_interval_ms = defaults.log_interval_ms;
    }
    if config.read_timeout_ms == 0 {
        tracing::warn!("Stored read timeout is zero, using {}", defaults.read_timeout_ms);
        config.read_timeout_ms = defaults.read_timeout_ms;
    }
    if config.port_name.is_empty() {
        config.port_name = defaults.port_name;
    }

    config
}
