pub mod arm_ik;
pub mod avatar;
pub mod collision;
pub mod events;
pub mod head;
pub mod locomotion;
pub mod pose;
pub mod roster;
pub mod skeleton;
pub mod springs;

pub use avatar::{Avatar, AvatarId};
pub use collision::StaticSphere;
pub use head::{EyeContactTarget, HeadState};
pub use locomotion::{AvatarMode, DriveKeys};
pub use pose::{BoneState, BoneStates};
pub use roster::Roster;
pub use skeleton::{
    BoneDef, BoneId, BoneSpec, Skeleton, SkeletonError, SkeletonTemplate, BONE_COUNT,
};
pub use springs::{SpringMode, SpringState};

// Re-export all event types for easier access
pub use events::*;
