use glam::{Quat, Vec3};
use std::fmt;

/// Distances at or below this are treated as coincident points
pub const MIN_DISTANCE: f32 = 1.0e-6;

/// Body frame for avatars and bones, exposing the right/up/front basis
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Orientation {
    rotation: Quat,
}

impl Orientation {
    pub fn identity() -> Self {
        Self { rotation: Quat::IDENTITY }
    }

    /// Yaw-only rotation about the up axis, angle in degrees
    pub fn from_yaw(yaw_degrees: f32) -> Self {
        Self {
            rotation: Quat::from_rotation_y(yaw_degrees.to_radians()),
        }
    }

    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::X
    }

    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }

    pub fn front(&self) -> Vec3 {
        self.rotation * Vec3::Z
    }

    /// Project a vector onto this frame's right/up/front axes
    pub fn project(&self, v: Vec3) -> Vec3 {
        Vec3::new(v.dot(self.right()), v.dot(self.up()), v.dot(self.front()))
    }
}

impl Default for Orientation {
    fn default() -> Self {
        Self::identity()
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let front = self.front();
        write!(f, "[front r{:.3}, r{:.3}, r{:.3}]", front.x, front.y, front.z)
    }
}

/// Per-tick multiplier for an exponential decay, collapsing to zero instead of going negative
pub fn decay_factor(rate: f32, dt: f32) -> f32 {
    (1.0 - rate * dt).max(0.0)
}

/// Unit direction and length of `v`, or `None` when `v` is too short to normalize
pub fn direction_and_length(v: Vec3) -> Option<(Vec3, f32)> {
    let length = v.length();
    if length > MIN_DISTANCE {
        Some((v / length, length))
    } else {
        None
    }
}

/// Wrap an angle in degrees into [-180, 180]
pub fn wrap_degrees(mut angle: f32) -> f32 {
    if angle > 180.0 {
        angle -= 360.0;
    }
    if angle < -180.0 {
        angle += 360.0;
    }
    angle
}

/// Convert a per-tick probability observed at `reference_hz` into the probability
/// for a tick of length `dt`
pub fn rate_adjusted_probability(per_tick_probability: f32, reference_hz: f32, dt: f32) -> f64 {
    let p = per_tick_probability.clamp(0.0, 1.0) as f64;
    let ticks = (dt * reference_hz).max(0.0) as f64;
    1.0 - (1.0 - p).powf(ticks)
}
