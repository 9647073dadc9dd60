use crate::world::AvatarId;
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Replicated avatar state exchanged between peers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvatarSnapshot {
    pub id: AvatarId,
    pub position: Vec3,
    pub body_yaw: f32,
    pub body_pitch: f32,
    pub body_roll: f32,
    /// Head angles relative to the body, in degrees
    pub head_yaw: f32,
    pub head_pitch: f32,
    pub head_roll: f32,
    pub hand_position: Vec3,
    pub grasping: bool,
}

impl AvatarSnapshot {
    /// First field holding NaN or infinity, if any
    pub fn non_finite_field(&self) -> Option<&'static str> {
        let scalars = [
            ("body_yaw", self.body_yaw),
            ("body_pitch", self.body_pitch),
            ("body_roll", self.body_roll),
            ("head_yaw", self.head_yaw),
            ("head_pitch", self.head_pitch),
            ("head_roll", self.head_roll),
        ];

        if !self.position.is_finite() {
            Some("position")
        } else if !self.hand_position.is_finite() {
            Some("hand_position")
        } else {
            scalars.iter().find(|(_, v)| !v.is_finite()).map(|(name, _)| *name)
        }
    }
}
