//! Simulation configuration
//!
//! All tunable constants of the avatar simulation live in one immutable
//! [`SimulationSettings`] value that is loaded once (from TOML or defaults)
//! and shared by every avatar.

pub mod settings;

use thiserror::Error;

// Re-export commonly used types
pub use settings::{
    SimulationSettings, SettingsHandle, LocomotionSettings, GravitySettings, SpringSettings,
    CollisionSettings, HandSettings, HeadSettings, SensorSettings, NetworkSettings, WorldSettings,
    create_settings_handle, save_settings, load_settings, save_settings_to, load_settings_from,
    load_or_default,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse failed: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config serialize failed: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid setting {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("No platform config directory available")]
    NoConfigDir,
}

pub type ConfigResult<T> = Result<T, ConfigError>;
