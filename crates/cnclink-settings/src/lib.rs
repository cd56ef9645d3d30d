//! CncLink Settings Crate
//!
//! Loads, validates and saves the transport and machine configuration.

pub mod config;
pub mod error;

pub use config::{
    default_config_path, Config, MachineSettings, MeasurementSystem, TransportSettings,
};
pub use error::{SettingsError, SettingsResult};
