//! Head behaviour
//!
//! Head-local yaw/pitch/roll on top of the body, lean, idle noise and the
//! eye-contact state machine. Random transitions are tuned as per-tick
//! probabilities at [`HeadSettings::reference_hz`] and rescaled for the actual
//! tick length, so behaviour does not change with frame rate.

use crate::config::{HeadSettings, SensorSettings};
use crate::utils::math::rate_adjusted_probability;
use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

const LEAN_DECAY_SCALE: f32 = 30.0;
const NOISE_FOLLOW_RATE: f32 = 10.0;
const NOISE_PITCH_JITTER: f32 = 0.2;
const NOISE_YAW_JITTER: f32 = 0.3;

const EYE_CONTACT_TOGGLE_CHANCE: f32 = 0.005;
const EYE_TARGET_CHANCE: f32 = 0.01;
const MOUTH_TARGET_CHANCE: f32 = 0.1;
const DEGREES_BETWEEN_VIEWER_EYES: f32 = 3.0;
const DEGREES_TO_VIEWER_MOUTH: f32 = 7.0;

const HEAD_TARGET_CHANCE: f32 = 0.005;
const HEAD_TARGET_PITCH_RANGE: f32 = 20.0;
const HEAD_TARGET_YAW_RANGE: f32 = 45.0;
const HEAD_TARGET_REACHED_DEGREES: f32 = 1.0;

const EYEBALL_WANDER_CHANCE: f32 = 0.01;
const BROW_CHANCE: f32 = 0.01;
const BROW_PITCH_CHOICES: [f32; 3] = [-70.0, -60.0, -50.0];
const BROW_ROLL_CHOICES: [f32; 5] = [0.0, 15.0, 30.0, -30.0, -15.0];

/// Where on the viewer's face the eyes are aimed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EyeContactTarget {
    #[default]
    LeftEye,
    RightEye,
    Mouth,
}

impl fmt::Display for EyeContactTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EyeContactTarget::LeftEye => write!(f, "LeftEye"),
            EyeContactTarget::RightEye => write!(f, "RightEye"),
            EyeContactTarget::Mouth => write!(f, "Mouth"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct HeadState {
    /// Head-local angles in degrees, relative to the body
    pub yaw: f32,
    pub pitch: f32,
    pub roll: f32,
    pub lean_forward: f32,
    pub lean_sideways: f32,
    pub return_to_center: bool,
    pub return_spring_scale: f32,
    pub noise_enabled: bool,
    pub noise_envelope: f32,
    pitch_target: f32,
    yaw_target: f32,
    eye_contact: bool,
    eye_contact_target: EyeContactTarget,
    eyeball_pitch: f32,
    eyeball_yaw: f32,
    eyebrow_pitch: f32,
    eyebrow_roll: f32,
    rng: StdRng,
}

impl HeadState {
    pub fn new(settings: &HeadSettings) -> Self {
        Self {
            yaw: 0.0,
            pitch: 0.0,
            roll: 0.0,
            lean_forward: 0.0,
            lean_sideways: 0.0,
            return_to_center: settings.return_to_center,
            return_spring_scale: settings.return_spring_scale,
            noise_enabled: settings.noise_enabled,
            noise_envelope: settings.noise_envelope,
            pitch_target: 0.0,
            yaw_target: 0.0,
            eye_contact: true,
            eye_contact_target: EyeContactTarget::LeftEye,
            eyeball_pitch: 0.0,
            eyeball_yaw: 0.0,
            eyebrow_pitch: BROW_PITCH_CHOICES[1],
            eyebrow_roll: 0.0,
            rng: StdRng::seed_from_u64(settings.rng_seed),
        }
    }

    /// Zero the head angles and lean
    pub fn reset(&mut self) {
        self.yaw = 0.0;
        self.pitch = 0.0;
        self.roll = 0.0;
        self.lean_forward = 0.0;
        self.lean_sideways = 0.0;
    }

    /// Add a lean impulse
    pub fn add_lean(&mut self, sideways: f32, forward: f32) {
        self.lean_sideways += sideways;
        self.lean_forward += forward;
    }

    pub fn set_target(&mut self, pitch: f32, yaw: f32) {
        self.pitch_target = pitch;
        self.yaw_target = yaw;
    }

    pub fn target(&self) -> (f32, f32) {
        (self.pitch_target, self.yaw_target)
    }

    pub fn eye_contact(&self) -> bool {
        self.eye_contact
    }

    pub fn eye_contact_target(&self) -> EyeContactTarget {
        self.eye_contact_target
    }

    /// Eyeball (pitch, yaw) in degrees relative to the head
    pub fn eyeballs(&self) -> (f32, f32) {
        (self.eyeball_pitch, self.eyeball_yaw)
    }

    /// Eyebrow (pitch, roll); the right brow mirrors the roll
    pub fn eyebrows(&self) -> (f32, f32) {
        (self.eyebrow_pitch, self.eyebrow_roll)
    }

    fn chance(&mut self, per_tick: f32, settings: &HeadSettings, dt: f32) -> bool {
        let p = rate_adjusted_probability(per_tick, settings.reference_hz, dt);
        self.rng.random_bool(p)
    }

    /// Uniform draw in [-0.5, 0.5)
    fn centered(&mut self) -> f32 {
        self.rng.random::<f32>() - 0.5
    }

    /// Advance the head one tick
    pub fn update(&mut self, settings: &HeadSettings, dt: f32) {
        if self.return_to_center {
            let factor = 1.0 - settings.decay * self.return_spring_scale * 2.0 * dt;
            self.pitch *= factor;
            self.yaw *= factor;
            self.roll *= factor;
        }

        if self.noise_enabled {
            self.pitch += (self.pitch_target - self.pitch) * NOISE_FOLLOW_RATE * dt;
            self.yaw += (self.yaw_target - self.yaw) * NOISE_FOLLOW_RATE * dt;
            self.roll *= 1.0 - settings.decay * dt;
        }

        let lean_factor = 1.0 - settings.decay * LEAN_DECAY_SCALE * dt;
        self.lean_forward *= lean_factor;
        self.lean_sideways *= lean_factor;

        self.update_eye_contact(settings, dt);

        if self.noise_enabled {
            self.update_noise(settings, dt);
        }
    }

    fn update_eye_contact(&mut self, settings: &HeadSettings, dt: f32) {
        if self.chance(EYE_CONTACT_TOGGLE_CHANCE, settings, dt) {
            self.eye_contact = !self.eye_contact;
            debug!("👀 Eye contact {}", if self.eye_contact { "made" } else { "broken" });

            if self.eye_contact {
                self.set_target(0.0, 0.0);
            } else {
                // glance markedly away
                let pitch_offset = 5.0 + self.centered() * 10.0;
                let yaw_offset = 5.0 + self.centered() * 5.0;
                self.eyeball_pitch += pitch_offset;
                self.eyeball_yaw += yaw_offset;
            }
        }

        if !self.eye_contact {
            return;
        }

        if self.chance(EYE_TARGET_CHANCE, settings, dt) {
            self.eye_contact_target = if self.rng.random::<f32>() < MOUTH_TARGET_CHANCE {
                EyeContactTarget::Mouth
            } else if self.rng.random_bool(0.5) {
                EyeContactTarget::LeftEye
            } else {
                EyeContactTarget::RightEye
            };
        }

        let (pitch_adjust, yaw_adjust) = match self.eye_contact_target {
            EyeContactTarget::LeftEye => (0.0, DEGREES_BETWEEN_VIEWER_EYES),
            EyeContactTarget::RightEye => (0.0, -DEGREES_BETWEEN_VIEWER_EYES),
            EyeContactTarget::Mouth => (DEGREES_TO_VIEWER_MOUTH, 0.0),
        };
        self.eyeball_pitch = -self.pitch + pitch_adjust;
        self.eyeball_yaw = -self.yaw + yaw_adjust;
    }

    fn update_noise(&mut self, settings: &HeadSettings, dt: f32) {
        let ticks = dt * settings.reference_hz;
        let pitch_jitter = self.centered() * NOISE_PITCH_JITTER;
        let yaw_jitter = self.centered() * NOISE_YAW_JITTER;
        self.pitch += pitch_jitter * self.noise_envelope * ticks;
        self.yaw += yaw_jitter * self.noise_envelope * ticks;

        if !self.eye_contact {
            if self.chance(EYEBALL_WANDER_CHANCE, settings, dt) {
                self.eyeball_pitch = self.centered() * 20.0;
            }
            if self.chance(EYEBALL_WANDER_CHANCE, settings, dt) {
                self.eyeball_yaw = self.centered() * 10.0;
            }
        }

        let reached = (self.pitch_target - self.pitch).abs() < HEAD_TARGET_REACHED_DEGREES
            && (self.yaw_target - self.yaw).abs() < HEAD_TARGET_REACHED_DEGREES;
        if reached && self.chance(HEAD_TARGET_CHANCE, settings, dt) {
            let pitch = self.centered() * HEAD_TARGET_PITCH_RANGE;
            let yaw = self.centered() * HEAD_TARGET_YAW_RANGE;
            self.set_target(pitch, yaw);
        }

        if self.chance(BROW_CHANCE, settings, dt) {
            let pitch = self.rng.random_range(0..BROW_PITCH_CHOICES.len());
            let roll = self.rng.random_range(0..BROW_ROLL_CHOICES.len());
            self.eyebrow_pitch = BROW_PITCH_CHOICES[pitch];
            self.eyebrow_roll = BROW_ROLL_CHOICES[roll];
        }
    }

    /// Blend gyro rates and absolute sensor angles into the head angles.
    ///
    /// Both vectors are (yaw, pitch, roll) in degrees and degrees per second.
    /// A zero `dt` snaps straight to the absolute reading.
    pub fn set_from_gyros(
        &mut self,
        euler: Vec3,
        angular_velocity: Vec3,
        dt: f32,
        settings: &SensorSettings,
    ) {
        if dt == 0.0 {
            self.yaw = euler.x;
            self.pitch = euler.y;
            self.roll = euler.z;
            return;
        }

        let blend = (dt / settings.smoothing_time).clamp(0.0, 1.0);
        let mut angles = Vec3::new(self.yaw, self.pitch, self.roll);
        angles += angular_velocity * dt;
        angles = angles * (1.0 - blend) + euler * blend;

        self.yaw = angles.x.clamp(-settings.max_yaw, settings.max_yaw);
        self.pitch = angles.y.clamp(-settings.max_pitch, settings.max_pitch);
        self.roll = angles.z.clamp(-settings.max_roll, settings.max_roll);
    }
}

impl Default for HeadState {
    fn default() -> Self {
        Self::new(&HeadSettings::default())
    }
}
