//! Pose propagation
//!
//! Walks the skeleton root-to-leaf and recomputes every bone's rigid world
//! position and orientation from the avatar's root transform.

use super::skeleton::{BoneId, Skeleton, BONE_COUNT};
use crate::utils::math::Orientation;
use glam::Vec3;

/// Per-bone simulation state
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BoneState {
    /// World position from the hierarchy and root transform only
    pub rigid_position: Vec3,
    pub rigid_orientation: Orientation,
    /// Physically lagged position, carried across ticks
    pub spring_position: Vec3,
    pub spring_velocity: Vec3,
}

pub type BoneStates = [BoneState; BONE_COUNT];

/// Recompute rigid poses for all bones.
///
/// `hand_override` replaces the right hand's derived position, used for remote
/// replicas whose hand position is authoritative network data.
pub fn propagate(
    skeleton: &Skeleton,
    root_position: Vec3,
    body: Orientation,
    hand_override: Option<Vec3>,
    bones: &mut BoneStates,
) {
    for &id in skeleton.order() {
        let spec = skeleton.bone(id);

        let (base_position, orientation) = match spec.parent {
            None => (root_position, body),
            Some(parent) => {
                let parent_state = &bones[parent.index()];
                (parent_state.rigid_position, parent_state.rigid_orientation)
            }
        };

        let state = &mut bones[id.index()];
        state.rigid_orientation = orientation;
        state.rigid_position = base_position + orientation.project(spec.rest_offset);

        if id == BoneId::RightHand {
            if let Some(hand) = hand_override {
                state.rigid_position = hand;
            }
        }
    }
}
