//! Whole-body locomotion
//!
//! Drive keys become thrust and yaw rate, gravity pulls toward the standing
//! height, and velocity integrates with exponential drag.

use crate::config::{GravitySettings, LocomotionSettings};
use crate::utils::math::{decay_factor, Orientation};
use bitflags::bitflags;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::fmt;

bitflags! {
    /// Keys currently held for driving the local avatar
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct DriveKeys: u8 {
        const FORWARD   = 0b0000_0001;
        const BACK      = 0b0000_0010;
        const LEFT      = 0b0000_0100;
        const RIGHT     = 0b0000_1000;
        const UP        = 0b0001_0000;
        const DOWN      = 0b0010_0000;
        const YAW_LEFT  = 0b0100_0000;
        const YAW_RIGHT = 0b1000_0000;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AvatarMode {
    #[default]
    Idle,
    Walking,
    Interacting,
}

impl fmt::Display for AvatarMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AvatarMode::Idle => write!(f, "Idle"),
            AvatarMode::Walking => write!(f, "Walking"),
            AvatarMode::Interacting => write!(f, "Interacting"),
        }
    }
}

/// Pick the mode for this tick's speed and yaw rate. No hysteresis.
pub fn mode_for(
    speed: f32,
    yaw_rate: f32,
    walking_threshold: f32,
    interacting_nearby: bool,
) -> AvatarMode {
    if speed + yaw_rate.abs() > walking_threshold {
        AvatarMode::Walking
    } else if interacting_nearby {
        AvatarMode::Interacting
    } else {
        AvatarMode::Idle
    }
}

/// Thrust for the held keys, rebuilt from zero every tick
pub fn drive_thrust(
    keys: DriveKeys,
    body: Orientation,
    settings: &LocomotionSettings,
    dt: f32,
) -> Vec3 {
    let step = settings.thrust_magnitude * dt;
    let mut thrust = Vec3::ZERO;

    if keys.contains(DriveKeys::FORWARD) {
        thrust += body.front() * step;
    }
    if keys.contains(DriveKeys::BACK) {
        thrust -= body.front() * step;
    }
    if keys.contains(DriveKeys::RIGHT) {
        thrust += body.right() * step;
    }
    if keys.contains(DriveKeys::LEFT) {
        thrust -= body.right() * step;
    }
    if keys.contains(DriveKeys::UP) {
        thrust += body.up() * step;
    }
    if keys.contains(DriveKeys::DOWN) {
        thrust -= body.up() * step;
    }

    thrust
}

/// Change in yaw rate (degrees per second) for the held yaw keys
pub fn drive_yaw(keys: DriveKeys, settings: &LocomotionSettings, dt: f32) -> f32 {
    let step = settings.yaw_magnitude * dt;
    let mut delta = 0.0;

    if keys.contains(DriveKeys::YAW_RIGHT) {
        delta -= step;
    }
    if keys.contains(DriveKeys::YAW_LEFT) {
        delta += step;
    }

    delta
}

/// Gravity direction at a point: down near the origin, nothing in open space
pub fn gravity_at(position: Vec3, settings: &GravitySettings) -> Vec3 {
    if position.length() < settings.field_radius {
        Vec3::NEG_Y
    } else {
        Vec3::ZERO
    }
}

/// Pull the body down while above standing height, clamp it onto the floor otherwise
pub fn apply_gravity(
    position: &mut Vec3,
    velocity: &mut Vec3,
    standing_height: f32,
    settings: &GravitySettings,
    dt: f32,
) {
    if !settings.enabled {
        return;
    }

    if position.y > standing_height {
        *velocity += gravity_at(*position, settings) * settings.scale * dt;
    } else {
        position.y = standing_height;
        velocity.y = 0.0;
    }
}

/// Add thrust, move, then apply drag
pub fn integrate_velocity(
    position: &mut Vec3,
    velocity: &mut Vec3,
    thrust: Vec3,
    settings: &LocomotionSettings,
    dt: f32,
) {
    *velocity += thrust * dt;
    *position += *velocity * dt;
    *velocity *= decay_factor(settings.linear_decay, dt);
}
