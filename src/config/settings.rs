use super::{ConfigError, ConfigResult};
use crate::world::collision::StaticSphere;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

const SIMULATION_CONFIG_FILE: &str = "simulation.toml";

// =============================================================================
// Simulation Tunables
// =============================================================================

/// Body thrust, yaw and drag constants
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocomotionSettings {
    pub thrust_magnitude: f32,
    pub yaw_magnitude: f32,
    pub yaw_decay: f32,
    pub linear_decay: f32,
    /// `speed + |yaw rate|` above this selects walking mode
    pub walking_threshold: f32,
    pub initial_yaw_degrees: f32,
}

impl Default for LocomotionSettings {
    fn default() -> Self {
        Self {
            thrust_magnitude: 1200.0,
            yaw_magnitude: 500.0,
            yaw_decay: 5.0,
            linear_decay: 5.0,
            walking_threshold: 0.2,
            initial_yaw_degrees: -90.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GravitySettings {
    pub enabled: bool,
    pub scale: f32,
    /// Gravity only pulls while the avatar is within this distance of the origin
    pub field_radius: f32,
}

impl Default for GravitySettings {
    fn default() -> Self {
        Self {
            enabled: true,
            scale: 6.0,
            field_radius: 5.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpringSettings {
    /// Stiffness of the spring between a bone and its parent
    pub spring_force: f32,
    pub spring_decay: f32,
    /// Whether new avatars start with springs active rather than dormant
    pub start_active: bool,
}

impl Default for SpringSettings {
    fn default() -> Self {
        Self {
            spring_force: 6.0,
            spring_decay: 16.0,
            start_active: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionSettings {
    pub body_bounding_radius: f32,
    /// Sphere contact weight applied to the bone's spring velocity
    pub sphere_bone_push: f32,
    /// Sphere contact weight applied to whole-body velocity
    pub sphere_body_push: f32,
    /// Enlargement of the combined bone radius used as the avatar contact trigger
    pub radius_scalar: f32,
    pub ball_force: f32,
    pub ball_damping: f32,
    pub body_force: f32,
    pub body_friction: f32,
}

impl Default for CollisionSettings {
    fn default() -> Self {
        Self {
            body_bounding_radius: 1.0,
            sphere_bone_push: 30.0,
            sphere_body_push: 100.0,
            radius_scalar: 1.8,
            ball_force: 0.6,
            ball_damping: 0.9,
            body_force: 6.0,
            body_friction: 0.5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HandSettings {
    /// Weight of pointer y on the vertical axis (forward/back uses full weight)
    pub vertical_weight: f32,
    pub my_hand_holding_pull: f32,
    pub your_hand_holding_pull: f32,
    /// Fraction of the elbow-to-hand vector where the wrist sits
    pub wrist_fraction: f32,
}

impl Default for HandSettings {
    fn default() -> Self {
        Self {
            vertical_weight: 0.5,
            my_hand_holding_pull: 0.2,
            your_hand_holding_pull: 1.0,
            wrist_fraction: 0.7,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HeadSettings {
    pub decay: f32,
    pub return_to_center: bool,
    pub return_spring_scale: f32,
    pub noise_enabled: bool,
    pub noise_envelope: f32,
    /// Tick rate the per-tick event probabilities were tuned at
    pub reference_hz: f32,
    pub rng_seed: u64,
}

impl Default for HeadSettings {
    fn default() -> Self {
        Self {
            decay: 0.1,
            return_to_center: false,
            return_spring_scale: 1.0,
            noise_enabled: false,
            noise_envelope: 1.0,
            reference_hz: 60.0,
            rng_seed: 0x5eed,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorSettings {
    pub smoothing_time: f32,
    /// Packets between sample-rate measurements
    pub rate_window_packets: u32,
    pub max_yaw: f32,
    pub max_pitch: f32,
    pub max_roll: f32,
}

impl Default for SensorSettings {
    fn default() -> Self {
        Self {
            smoothing_time: 1.0,
            rate_window_packets: 100,
            max_yaw: 90.0,
            max_pitch: 85.0,
            max_roll: 90.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkSettings {
    pub snapshot_hz: f32,
}

impl Default for NetworkSettings {
    fn default() -> Self {
        Self { snapshot_hz: 20.0 }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldSettings {
    pub obstacles: Vec<StaticSphere>,
}

/// Every tunable the avatar simulation reads, fixed at construction
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    pub locomotion: LocomotionSettings,
    pub gravity: GravitySettings,
    pub springs: SpringSettings,
    pub collision: CollisionSettings,
    pub hand: HandSettings,
    pub head: HeadSettings,
    pub sensor: SensorSettings,
    pub network: NetworkSettings,
    pub world: WorldSettings,
}

impl SimulationSettings {
    /// Reject values that would make the integrator diverge or divide by zero
    pub fn validate(&self) -> ConfigResult<()> {
        if self.collision.radius_scalar < 1.0 {
            return Err(ConfigError::Invalid {
                field: "collision.radius_scalar",
                reason: format!("must be >= 1.0, got {}", self.collision.radius_scalar),
            });
        }
        if self.network.snapshot_hz <= 0.0 {
            return Err(ConfigError::Invalid {
                field: "network.snapshot_hz",
                reason: format!("must be positive, got {}", self.network.snapshot_hz),
            });
        }
        if self.sensor.smoothing_time <= 0.0 {
            return Err(ConfigError::Invalid {
                field: "sensor.smoothing_time",
                reason: format!("must be positive, got {}", self.sensor.smoothing_time),
            });
        }
        if self.sensor.rate_window_packets == 0 {
            return Err(ConfigError::Invalid {
                field: "sensor.rate_window_packets",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.head.reference_hz <= 0.0 {
            return Err(ConfigError::Invalid {
                field: "head.reference_hz",
                reason: format!("must be positive, got {}", self.head.reference_hz),
            });
        }
        if self.world.obstacles.iter().any(|s| s.radius < 0.0) {
            return Err(ConfigError::Invalid {
                field: "world.obstacles",
                reason: "obstacle radius must be non-negative".to_string(),
            });
        }
        Ok(())
    }
}

pub type SettingsHandle = Arc<SimulationSettings>;

pub fn create_settings_handle(settings: SimulationSettings) -> SettingsHandle {
    Arc::new(settings)
}

// Simulation configuration file management
fn simulation_config_path() -> Option<PathBuf> {
    ProjectDirs::from("com", "slv", "slv-avatar")
        .map(|proj| proj.config_dir().join(SIMULATION_CONFIG_FILE))
}

pub fn save_settings_to(path: &Path, settings: &SimulationSettings) -> ConfigResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let toml = toml::to_string_pretty(settings)?;
    fs::write(path, toml)?;
    debug!("Saved simulation settings to {}", path.display());
    Ok(())
}

pub fn load_settings_from(path: &Path) -> ConfigResult<SimulationSettings> {
    let data = fs::read_to_string(path)?;
    let settings: SimulationSettings = toml::from_str(&data)?;
    settings.validate()?;
    Ok(settings)
}

pub fn save_settings(settings: &SimulationSettings) -> ConfigResult<()> {
    match simulation_config_path() {
        Some(path) => save_settings_to(&path, settings),
        None => Err(ConfigError::NoConfigDir),
    }
}

/// Load the user's settings file, if one exists and parses
pub fn load_settings() -> Option<SimulationSettings> {
    let path = simulation_config_path()?;
    match load_settings_from(&path) {
        Ok(settings) => {
            info!("Loaded simulation settings from {}", path.display());
            Some(settings)
        }
        Err(e) => {
            debug!("No usable simulation settings at {}: {}", path.display(), e);
            None
        }
    }
}

/// User settings when available, defaults otherwise
pub fn load_or_default() -> SimulationSettings {
    load_settings().unwrap_or_default()
}
