//! Configuration management for CncLink
//!
//! Configuration is organized into logical sections:
//! - Transport settings (backend URL, session token, reply timeout)
//! - Machine preferences (units, jog defaults, machine kind)
//! - Data sources to open sessions for at start-up
//!
//! Files are JSON or TOML, chosen by extension.

use crate::error::{SettingsError, SettingsResult};
pub use cnclink_core::units::MeasurementSystem;
use cnclink_core::{DataSource, HeadType};
use cnclink_motion::{
    JogOptions, JogPanel, DEFAULT_JOG_SPEED, DISTANCE_MAX, DISTANCE_MIN, JOG_SPEED_MAX,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Transport settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportSettings {
    /// Backend address
    pub url: String,
    /// Session token presented on connect
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Default wait for a correlated reply in milliseconds
    pub reply_timeout_ms: u64,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            url: "http://localhost:8000".to_string(),
            token: None,
            reply_timeout_ms: 3000,
        }
    }
}

impl TransportSettings {
    /// Token to present, empty when none is configured
    pub fn token(&self) -> String {
        self.token.clone().unwrap_or_default()
    }

    /// Default wait for a correlated reply
    pub fn reply_timeout(&self) -> Duration {
        Duration::from_millis(self.reply_timeout_ms)
    }
}

/// Machine preference settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineSettings {
    /// Unit system
    pub units: MeasurementSystem,
    /// Jog speed in units/min
    pub jog_speed: f64,
    /// Base jog distance
    pub custom_distance: f64,
    /// Rotary four-axis machine
    pub is_four_axis: bool,
    /// Mounted tool head
    pub head_type: HeadType,
}

impl Default for MachineSettings {
    fn default() -> Self {
        Self {
            units: MeasurementSystem::Metric,
            jog_speed: DEFAULT_JOG_SPEED,
            custom_distance: 1.0,
            is_four_axis: false,
            head_type: HeadType::Printing,
        }
    }
}

impl MachineSettings {
    /// Jog panel initialized from these preferences
    pub fn jog_panel(&self) -> JogPanel {
        JogPanel::new(JogOptions {
            units: self.units,
            jog_speed: self.jog_speed,
            custom_distance: self.custom_distance,
            is_four_axis: self.is_four_axis,
            head_type: self.head_type,
        })
    }
}

/// Complete application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Data sources to create sessions for
    pub data_sources: Vec<DataSource>,
    /// Transport settings
    pub transport: TransportSettings,
    /// Machine preferences
    pub machine: MachineSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_sources: vec![DataSource::text_protocol()],
            transport: TransportSettings::default(),
            machine: MachineSettings::default(),
        }
    }
}

enum Format {
    Json,
    Toml,
}

fn format_of(path: &Path) -> SettingsResult<Format> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => Ok(Format::Json),
        Some("toml") => Ok(Format::Toml),
        other => Err(SettingsError::UnsupportedFormat(
            other.unwrap_or_default().to_string(),
        )),
    }
}

impl Config {
    /// Create new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let format = format_of(path)?;
        let content = std::fs::read_to_string(path)?;

        let config: Self = match format {
            Format::Json => serde_json::from_str(&content)?,
            Format::Toml => toml::from_str(&content)?,
        };

        config.validate()?;
        tracing::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Load config from file, falling back to defaults when the file is missing
    pub fn load_or_default(path: &Path) -> SettingsResult<Self> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            tracing::debug!("No configuration at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Save config to file (JSON or TOML)
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;

        let content = match format_of(path)? {
            Format::Json => serde_json::to_string_pretty(self)?,
            Format::Toml => toml::to_string_pretty(self)?,
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> SettingsResult<()> {
        if self.transport.url.trim().is_empty() {
            return Err(SettingsError::invalid("transport.url", "must not be empty"));
        }
        if self.transport.reply_timeout_ms == 0 {
            return Err(SettingsError::invalid(
                "transport.reply_timeout_ms",
                "must be > 0",
            ));
        }

        let jog_speed = self.machine.jog_speed;
        if !(jog_speed > 0.0 && jog_speed <= JOG_SPEED_MAX) {
            return Err(SettingsError::invalid(
                "machine.jog_speed",
                format!("must be in (0, {}]", JOG_SPEED_MAX),
            ));
        }
        let distance = self.machine.custom_distance;
        if !(DISTANCE_MIN..=DISTANCE_MAX).contains(&distance) {
            return Err(SettingsError::invalid(
                "machine.custom_distance",
                format!("must be in [{}, {}]", DISTANCE_MIN, DISTANCE_MAX),
            ));
        }

        if self.data_sources.iter().any(|ds| ds.as_str().is_empty()) {
            return Err(SettingsError::invalid(
                "data_sources",
                "keys must not be empty",
            ));
        }

        Ok(())
    }
}

/// Platform configuration file location
pub fn default_config_path() -> SettingsResult<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join("cnclink").join("config.toml"))
        .ok_or_else(|| {
            SettingsError::ConfigDirectory("no configuration directory on this platform".into())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.machine.jog_speed, 1500.0);
        assert_eq!(config.data_sources, vec![DataSource::text_protocol()]);
    }

    #[test]
    fn test_validation_rejects_out_of_range_jog() {
        let mut config = Config::default();
        config.machine.jog_speed = 7000.0;
        assert!(matches!(
            config.validate(),
            Err(SettingsError::InvalidSetting { ref key, .. }) if key == "machine.jog_speed"
        ));

        let mut config = Config::default();
        config.machine.custom_distance = 0.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.transport.reply_timeout_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_jog_panel_from_settings() {
        let settings = MachineSettings {
            units: MeasurementSystem::Imperial,
            custom_distance: 0.5,
            is_four_axis: true,
            head_type: HeadType::Cnc,
            ..MachineSettings::default()
        };
        let panel = settings.jog_panel();
        assert_eq!(panel.units(), MeasurementSystem::Imperial);
        assert_eq!(panel.distance(), 0.5);
        assert!(panel.is_four_axis());
        assert_eq!(panel.head_type(), HeadType::Cnc);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"machine": {"units": "imperial", "head_type": "laser"}}"#)
                .unwrap();
        assert_eq!(config.machine.units, MeasurementSystem::Imperial);
        assert_eq!(config.machine.head_type, HeadType::Laser);
        assert_eq!(config.transport, TransportSettings::default());
    }

    #[test]
    fn test_unknown_extension_is_rejected() {
        assert!(matches!(
            Config::default().save_to_file(Path::new("config.yaml")),
            Err(SettingsError::UnsupportedFormat(ext)) if ext == "yaml"
        ));
    }
}
