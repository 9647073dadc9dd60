// SLV-Avatar: avatar skeleton, spring and collision simulation
// Deterministic per tick, renderer and transport agnostic

pub mod config;
pub mod networking;
pub mod rendering;
pub mod sensor;
pub mod utils;
pub mod world;

// Re-export commonly used types for convenience
pub use config::{SettingsHandle, SimulationSettings, create_settings_handle, load_or_default};
pub use networking::{AvatarSnapshot, SnapshotInbox, SnapshotScheduler};
pub use rendering::RenderSnapshot;
pub use world::{Avatar, AvatarId, AvatarMode, DriveKeys, Roster, Skeleton, StaticSphere};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
