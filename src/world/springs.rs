//! Spring layer
//!
//! Secondary motion: each bone carries a spring position and velocity that
//! lag behind its rigid position. Springs are integrated every tick; the
//! [`SpringState`] only decides whether renderers see the spring or the rigid
//! pose, and re-seeds the springs when it wakes up.

use super::pose::BoneStates;
use super::skeleton::Skeleton;
use crate::config::SpringSettings;
use crate::utils::math::{decay_factor, direction_and_length};
use glam::Vec3;
use std::fmt;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpringMode {
    /// Springs are not shown; bones render at their rigid pose
    #[default]
    Dormant,
    /// Springs drive the rendered pose
    Active,
}

impl fmt::Display for SpringMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpringMode::Dormant => write!(f, "Dormant"),
            SpringMode::Active => write!(f, "Active"),
        }
    }
}

/// Dormant/active state machine for the spring layer.
///
/// The only transition is dormant -> active, taken on any confirmed bone contact.
#[derive(Debug, Clone, Default)]
pub struct SpringState {
    mode: SpringMode,
    activation_count: u32,
}

impl SpringState {
    pub fn new(start_active: bool) -> Self {
        Self {
            mode: if start_active { SpringMode::Active } else { SpringMode::Dormant },
            activation_count: 0,
        }
    }

    pub fn mode(&self) -> SpringMode {
        self.mode
    }

    pub fn is_active(&self) -> bool {
        self.mode == SpringMode::Active
    }

    /// Number of dormant -> active transitions taken so far
    pub fn activation_count(&self) -> u32 {
        self.activation_count
    }

    /// Record a bone contact. Returns true when this woke the springs up.
    pub fn register_contact(&mut self, bones: &mut BoneStates) -> bool {
        match self.mode {
            SpringMode::Active => false,
            SpringMode::Dormant => {
                debug!("🦴 Spring state transition: {} -> {}", self.mode, SpringMode::Active);
                self.mode = SpringMode::Active;
                self.activation_count += 1;
                initialize_body_springs(bones);
                true
            }
        }
    }
}

/// Snap every spring to its rigid position and stop it
pub fn initialize_body_springs(bones: &mut BoneStates) {
    for bone in bones.iter_mut() {
        bone.spring_position = bone.rigid_position;
        bone.spring_velocity = Vec3::ZERO;
    }
}

/// Advance every bone's spring one tick, root to leaf.
///
/// Velocities carry the `dt` scaling from the force terms, so positions
/// integrate with an implicit unit step.
pub fn update_body_springs(
    skeleton: &Skeleton,
    root_position: Vec3,
    settings: &SpringSettings,
    dt: f32,
    bones: &mut BoneStates,
) {
    let decay = decay_factor(settings.spring_decay, dt);

    for &id in skeleton.order() {
        let spec = skeleton.bone(id);
        let index = id.index();

        let anchor = match spec.parent {
            None => root_position,
            Some(parent) => bones[parent.index()].spring_position,
        };

        let stretch = bones[index].spring_position - anchor;
        if let Some((direction, length)) = direction_and_length(stretch) {
            let force = (length - spec.length) * settings.spring_force * dt;
            bones[index].spring_velocity -= direction * force;

            // pulling the child back pulls the parent forward
            if let Some(parent) = spec.parent {
                bones[parent.index()].spring_velocity += direction * force;
            }
        }

        let bone = &mut bones[index];
        let pull = bone.rigid_position - bone.spring_position;
        bone.spring_velocity += pull * spec.spring_tightness * dt;
        bone.spring_velocity *= decay;
        bone.spring_position += bone.spring_velocity;
    }
}
