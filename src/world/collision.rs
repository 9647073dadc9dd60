//! Collision resolution
//!
//! Bone spheres are tested at their *spring* positions against static world
//! spheres and against another avatar's bones. Responses go into spring
//! velocities (per bone) and whole-body velocity.

use super::pose::BoneStates;
use super::skeleton::{BoneId, Skeleton};
use crate::config::{CollisionSettings, HandSettings};
use crate::utils::math::direction_and_length;
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Immovable sphere in the world
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StaticSphere {
    pub center: Vec3,
    pub radius: f32,
}

impl StaticSphere {
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }
}

/// Mutable view of the parts of an avatar a collision touches
pub struct CollisionBody<'a> {
    pub skeleton: &'a Skeleton,
    pub position: Vec3,
    pub velocity: &'a mut Vec3,
    pub bones: &'a mut BoneStates,
}

/// One overlapping bone pair between two avatars
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoneContact {
    pub mine: BoneId,
    pub other: BoneId,
    /// Unit vector from the other bone toward mine
    pub direction: Vec3,
    pub distance: f32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AvatarContactReport {
    pub contacts: Vec<BoneContact>,
    /// Accumulated push applied to my body (and subtracted from the other)
    pub body_push: Vec3,
    /// Velocity multiplier applied to both bodies after the pair loop
    pub body_momentum: f32,
}

impl AvatarContactReport {
    pub fn has_contact(&self) -> bool {
        !self.contacts.is_empty()
    }
}

/// Resolve contacts between an avatar's bones and one static sphere.
///
/// Returns the number of bones found overlapping the sphere.
pub fn collide_with_sphere(
    body: CollisionBody<'_>,
    sphere: &StaticSphere,
    settings: &CollisionSettings,
    dt: f32,
) -> usize {
    let to_sphere = (body.position - sphere.center).length();
    if to_sphere >= settings.body_bounding_radius + sphere.radius {
        return 0;
    }

    let mut contacts = 0;
    for id in BoneId::ALL {
        let combined_radius = body.skeleton.bone(id).radius + sphere.radius;
        let bone = &mut body.bones[id.index()];
        let from_center = bone.spring_position - sphere.center;

        if from_center.length() >= combined_radius {
            continue;
        }
        contacts += 1;

        if let Some((direction, distance)) = direction_and_length(from_center) {
            let penetration = 1.0 - distance / combined_radius;
            let force = from_center * penetration;

            bone.spring_velocity += force * settings.sphere_bone_push * dt;
            *body.velocity += force * settings.sphere_body_push * dt;
            bone.spring_position = sphere.center + direction * combined_radius;
        }
    }

    contacts
}

/// Resolve contacts between two avatars.
///
/// Per-bone impulses are applied pair by pair inside the loop; the body-level
/// push and momentum accumulate over every pair and are applied once at the end.
pub fn collide_avatars(
    mine: CollisionBody<'_>,
    other: CollisionBody<'_>,
    settings: &CollisionSettings,
    dt: f32,
) -> AvatarContactReport {
    let mut report = AvatarContactReport {
        contacts: Vec::new(),
        body_push: Vec3::ZERO,
        body_momentum: 1.0,
    };

    let bounding = mine.skeleton.height() * 0.5 + other.skeleton.height() * 0.5;
    if (mine.position - other.position).length() >= bounding {
        return report;
    }

    for a in BoneId::ALL {
        let mine_spec = mine.skeleton.bone(a);
        if !mine_spec.collidable {
            continue;
        }

        for b in BoneId::ALL {
            let other_spec = other.skeleton.bone(b);
            if !other_spec.collidable {
                continue;
            }

            let between =
                mine.bones[a.index()].spring_position - other.bones[b.index()].spring_position;
            let Some((direction, distance)) = direction_and_length(between) else {
                continue;
            };

            let combined_radius = mine_spec.radius + other_spec.radius;
            if distance >= combined_radius * settings.radius_scalar {
                continue;
            }

            let ball_push = direction * settings.ball_force * dt;
            mine.bones[a.index()].spring_velocity += ball_push;
            other.bones[b.index()].spring_velocity -= ball_push;
            mine.bones[a.index()].spring_velocity *= settings.ball_damping;
            other.bones[b.index()].spring_velocity *= settings.ball_damping;

            report.body_push += direction * settings.body_force * dt;
            report.body_momentum = (report.body_momentum - settings.body_friction * dt).max(0.0);

            report.contacts.push(BoneContact { mine: a, other: b, direction, distance });
        }
    }

    *mine.velocity += report.body_push;
    *other.velocity -= report.body_push;
    *mine.velocity *= report.body_momentum;
    *other.velocity *= report.body_momentum;

    report
}

/// Blend the hand-holding anchor toward the other hand (dominant) and my hand (minor)
pub fn hand_holding_anchor(
    anchor: Vec3,
    my_hand: Vec3,
    other_hand: Vec3,
    settings: &HandSettings,
) -> Vec3 {
    let mut anchor = anchor;
    anchor += (other_hand - anchor) * settings.your_hand_holding_pull;
    anchor += (my_hand - anchor) * settings.my_hand_holding_pull;
    anchor
}
