//! Avatar simulation
//!
//! One [`Avatar`] owns its bone states and per-avatar physics state. The local
//! avatar is driven by input and interacts with the others it is handed each
//! tick; remote replicas are driven by network snapshots and only run the
//! passive parts of the tick.

use super::arm_ik::{apply_hand_movement, update_arm_ik_and_constraints};
use super::collision::{
    collide_avatars, collide_with_sphere, hand_holding_anchor, CollisionBody, StaticSphere,
};
use super::events::{
    AvatarEvent, InteractionEndedEvent, InteractionStartedEvent, ModeChangedEvent,
    SpringsActivatedEvent,
};
use super::head::HeadState;
use super::locomotion::{
    apply_gravity, drive_thrust, drive_yaw, integrate_velocity, mode_for, AvatarMode, DriveKeys,
};
use super::pose::{propagate, BoneState, BoneStates};
use super::skeleton::{BoneId, Skeleton};
use super::springs::{initialize_body_springs, update_body_springs, SpringState};
use crate::config::{CollisionSettings, SettingsHandle, SimulationSettings};
use crate::networking::AvatarSnapshot;
use crate::rendering::{BoneRender, RenderSnapshot};
use crate::utils::math::{decay_factor, Orientation};
use glam::{Vec2, Vec3};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

pub type AvatarId = Uuid;

#[derive(Debug, Clone)]
pub struct Avatar {
    id: AvatarId,
    is_local: bool,
    skeleton: Arc<Skeleton>,
    settings: SettingsHandle,
    bones: BoneStates,

    position: Vec3,
    velocity: Vec3,
    thrust: Vec3,
    body_yaw: f32,
    body_pitch: f32,
    body_roll: f32,
    /// Degrees per second
    yaw_rate: f32,
    speed: f32,
    mode: AvatarMode,

    drive_keys: DriveKeys,
    hand_movement: Vec2,
    pointer_pressed: bool,
    grasping: bool,
    /// Hand position as published to (or received from) the network
    hand_position: Vec3,
    hand_holding_anchor: Vec3,
    interacting_other: Option<AvatarId>,
    interacting_nearby: bool,

    springs: SpringState,
    head: HeadState,
    events: Vec<AvatarEvent>,
}

impl Avatar {
    pub fn new(
        id: AvatarId,
        is_local: bool,
        skeleton: Arc<Skeleton>,
        settings: SettingsHandle,
    ) -> Self {
        let position = Vec3::new(0.0, skeleton.standing_height(), 0.0);
        let body_yaw = settings.locomotion.initial_yaw_degrees;

        let mut bones = BoneStates::default();
        propagate(&skeleton, position, Orientation::from_yaw(body_yaw), None, &mut bones);
        initialize_body_springs(&mut bones);
        let hand = bones[BoneId::RightHand.index()].rigid_position;

        Self {
            id,
            is_local,
            springs: SpringState::new(settings.springs.start_active),
            head: HeadState::new(&settings.head),
            skeleton,
            settings,
            bones,
            position,
            velocity: Vec3::ZERO,
            thrust: Vec3::ZERO,
            body_yaw,
            body_pitch: 0.0,
            body_roll: 0.0,
            yaw_rate: 0.0,
            speed: 0.0,
            mode: AvatarMode::Idle,
            drive_keys: DriveKeys::empty(),
            hand_movement: Vec2::ZERO,
            pointer_pressed: false,
            grasping: false,
            hand_position: hand,
            hand_holding_anchor: hand,
            interacting_other: None,
            interacting_nearby: false,
            events: Vec::new(),
        }
    }

    /// Locally controlled avatar with a fresh id
    pub fn local(skeleton: Arc<Skeleton>, settings: SettingsHandle) -> Self {
        Self::new(Uuid::new_v4(), true, skeleton, settings)
    }

    /// Replica of an avatar simulated elsewhere
    pub fn remote(id: AvatarId, skeleton: Arc<Skeleton>, settings: SettingsHandle) -> Self {
        Self::new(id, false, skeleton, settings)
    }

    pub fn id(&self) -> AvatarId {
        self.id
    }

    pub fn is_local(&self) -> bool {
        self.is_local
    }

    pub fn skeleton(&self) -> &Skeleton {
        &self.skeleton
    }

    pub fn settings(&self) -> &SimulationSettings {
        &self.settings
    }

    pub fn bones(&self) -> &BoneStates {
        &self.bones
    }

    pub fn bone(&self, id: BoneId) -> &BoneState {
        &self.bones[id.index()]
    }

    /// Position shown to renderers: spring position while springs are active
    pub fn display_position(&self, id: BoneId) -> Vec3 {
        let bone = self.bone(id);
        if self.springs.is_active() {
            bone.spring_position
        } else {
            bone.rigid_position
        }
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    /// Move to `position` at rest, re-posing the skeleton and settling the springs there
    pub fn teleport(&mut self, position: Vec3) {
        self.position = position;
        self.velocity = Vec3::ZERO;
        let body = self.body_orientation();
        let hand_override = (!self.is_local).then_some(self.hand_position);
        propagate(&self.skeleton, position, body, hand_override, &mut self.bones);
        initialize_body_springs(&mut self.bones);
        if self.is_local {
            self.hand_position = self.bones[BoneId::RightHand.index()].rigid_position;
        }
    }

    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    pub fn set_velocity(&mut self, velocity: Vec3) {
        self.velocity = velocity;
    }

    pub fn thrust(&self) -> Vec3 {
        self.thrust
    }

    pub fn body_yaw(&self) -> f32 {
        self.body_yaw
    }

    pub fn set_body_yaw(&mut self, yaw: f32) {
        self.body_yaw = yaw;
    }

    pub fn body_orientation(&self) -> Orientation {
        Orientation::from_yaw(self.body_yaw)
    }

    pub fn yaw_rate(&self) -> f32 {
        self.yaw_rate
    }

    pub fn set_yaw_rate(&mut self, yaw_rate: f32) {
        self.yaw_rate = yaw_rate;
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn mode(&self) -> AvatarMode {
        self.mode
    }

    pub fn drive_keys(&self) -> DriveKeys {
        self.drive_keys
    }

    pub fn set_drive_keys(&mut self, keys: DriveKeys) {
        self.drive_keys = keys;
    }

    /// Pointer offset moving the right hand away from its rest pose
    pub fn set_hand_movement(&mut self, movement: Vec2) {
        self.hand_movement = movement;
    }

    pub fn set_pointer_pressed(&mut self, pressed: bool) {
        self.pointer_pressed = pressed;
    }

    pub fn grasping(&self) -> bool {
        self.grasping
    }

    pub fn hand_position(&self) -> Vec3 {
        self.hand_position
    }

    pub fn set_hand_position(&mut self, hand: Vec3) {
        self.hand_position = hand;
    }

    pub fn hand_holding_anchor(&self) -> Vec3 {
        self.hand_holding_anchor
    }

    pub fn interacting_other(&self) -> Option<AvatarId> {
        self.interacting_other
    }

    pub fn interacting_nearby(&self) -> bool {
        self.interacting_nearby
    }

    pub fn springs(&self) -> &SpringState {
        &self.springs
    }

    pub fn head(&self) -> &HeadState {
        &self.head
    }

    pub fn head_mut(&mut self) -> &mut HeadState {
        &mut self.head
    }

    /// World yaw of the head: body yaw plus head-local yaw
    pub fn absolute_head_yaw(&self) -> f32 {
        self.body_yaw + self.head.yaw
    }

    /// Take every event emitted since the last drain
    pub fn drain_events(&mut self) -> Vec<AvatarEvent> {
        std::mem::take(&mut self.events)
    }

    /// Run one simulation tick.
    ///
    /// `others` is only consulted by the local avatar, for collisions and hand
    /// holding. Obstacles apply to every avatar.
    pub fn simulate(&mut self, dt: f32, others: &mut [&mut Avatar], obstacles: &[StaticSphere]) {
        let settings = Arc::clone(&self.settings);
        let skeleton = Arc::clone(&self.skeleton);
        let body = self.body_orientation();

        let hand_override = (!self.is_local).then_some(self.hand_position);
        propagate(&skeleton, self.position, body, hand_override, &mut self.bones);

        apply_hand_movement(body, self.hand_movement, &settings.hand, &mut self.bones);
        if self.is_local {
            self.grasping = self.pointer_pressed;
        }

        if !self.interacting_nearby {
            self.hand_holding_anchor = self.bones[BoneId::RightHand.index()].rigid_position;
        }
        self.interacting_nearby = false;
        let previous_other = self.interacting_other;

        if self.is_local {
            self.scan_others(dt, others, &settings);
            self.hand_position = self.bones[BoneId::RightHand.index()].rigid_position;
        }

        update_arm_ik_and_constraints(&skeleton, body, &settings.hand, &mut self.bones);

        if !self.interacting_nearby {
            self.interacting_other = None;
        }
        self.emit_interaction_change(previous_other);

        for sphere in obstacles {
            let contacts = collide_with_sphere(
                CollisionBody {
                    skeleton: &skeleton,
                    position: self.position,
                    velocity: &mut self.velocity,
                    bones: &mut self.bones,
                },
                sphere,
                &settings.collision,
                dt,
            );
            if contacts > 0 {
                self.register_contact();
            }
        }

        apply_gravity(
            &mut self.position,
            &mut self.velocity,
            skeleton.standing_height(),
            &settings.gravity,
            dt,
        );

        update_body_springs(&skeleton, self.position, &settings.springs, dt, &mut self.bones);

        if self.is_local {
            self.thrust = drive_thrust(self.drive_keys, body, &settings.locomotion, dt);
            self.yaw_rate += drive_yaw(self.drive_keys, &settings.locomotion, dt);
            self.body_yaw += self.yaw_rate * dt;
        }
        self.yaw_rate *= decay_factor(settings.locomotion.yaw_decay, dt);

        integrate_velocity(
            &mut self.position,
            &mut self.velocity,
            self.thrust,
            &settings.locomotion,
            dt,
        );

        self.head.update(&settings.head, dt);

        self.speed = self.velocity.length();
        let mode = mode_for(
            self.speed,
            self.yaw_rate,
            settings.locomotion.walking_threshold,
            self.interacting_other.is_some(),
        );
        if mode != self.mode {
            debug!("🚶 Avatar {} mode transition: {} -> {}", self.id, self.mode, mode);
            self.events.push(ModeChangedEvent::new(self.id, self.mode, mode).into());
            self.mode = mode;
        }
    }

    /// Collide with every other avatar and find the closest hand within reach
    fn scan_others(&mut self, dt: f32, others: &mut [&mut Avatar], settings: &SimulationSettings) {
        let reach = self.skeleton.max_arm_length() * 2.0;
        let mut closest = f32::MAX;

        for other in others.iter_mut() {
            let other = &mut **other;
            if other.id == self.id {
                continue;
            }

            self.collide_with_avatar(other, dt, &settings.collision);

            let shoulder = self.bones[BoneId::RightShoulder.index()].rigid_position;
            let distance = (shoulder - other.bone(BoneId::RightHand).rigid_position).length();
            if distance >= reach {
                continue;
            }

            self.interacting_nearby = true;
            if distance < closest {
                closest = distance;
                self.interacting_other = Some(other.id);
            }

            if self.grasping || other.grasping {
                let my_hand = self.bones[BoneId::RightHand.index()].rigid_position;
                self.hand_holding_anchor = hand_holding_anchor(
                    self.hand_holding_anchor,
                    my_hand,
                    other.hand_position,
                    &settings.hand,
                );
                self.bones[BoneId::RightHand.index()].rigid_position = self.hand_holding_anchor;
            }
        }
    }

    fn collide_with_avatar(&mut self, other: &mut Avatar, dt: f32, settings: &CollisionSettings) {
        let report = collide_avatars(
            CollisionBody {
                skeleton: &self.skeleton,
                position: self.position,
                velocity: &mut self.velocity,
                bones: &mut self.bones,
            },
            CollisionBody {
                skeleton: &other.skeleton,
                position: other.position,
                velocity: &mut other.velocity,
                bones: &mut other.bones,
            },
            settings,
            dt,
        );

        if report.has_contact() {
            debug!(
                "💥 Avatar {} touching {} at {} bone pairs",
                self.id,
                other.id,
                report.contacts.len()
            );
            self.register_contact();
            other.register_contact();
        }
    }

    fn register_contact(&mut self) {
        if self.springs.register_contact(&mut self.bones) {
            self.events.push(SpringsActivatedEvent::new(self.id).into());
        }
    }

    fn emit_interaction_change(&mut self, previous: Option<AvatarId>) {
        if previous == self.interacting_other {
            return;
        }
        if let Some(other) = previous {
            info!("🤝 Avatar {} stopped interacting with {}", self.id, other);
            self.events.push(InteractionEndedEvent::new(self.id, other).into());
        }
        if let Some(other) = self.interacting_other {
            info!("🤝 Avatar {} started interacting with {}", self.id, other);
            self.events.push(InteractionStartedEvent::new(self.id, other).into());
        }
    }

    /// Current state for broadcasting
    pub fn snapshot(&self) -> AvatarSnapshot {
        AvatarSnapshot {
            id: self.id,
            position: self.position,
            body_yaw: self.body_yaw,
            body_pitch: self.body_pitch,
            body_roll: self.body_roll,
            head_yaw: self.head.yaw,
            head_pitch: self.head.pitch,
            head_roll: self.head.roll,
            hand_position: self.hand_position,
            grasping: self.grasping,
        }
    }

    /// Overwrite replicated state from a received snapshot
    pub fn apply_snapshot(&mut self, snapshot: &AvatarSnapshot) {
        self.position = snapshot.position;
        self.body_yaw = snapshot.body_yaw;
        self.body_pitch = snapshot.body_pitch;
        self.body_roll = snapshot.body_roll;
        self.head.yaw = snapshot.head_yaw;
        self.head.pitch = snapshot.head_pitch;
        self.head.roll = snapshot.head_roll;
        self.hand_position = snapshot.hand_position;
        self.grasping = snapshot.grasping;
    }

    /// Read-only view for renderers
    pub fn render_snapshot(&self) -> RenderSnapshot {
        let bones = BoneId::ALL
            .iter()
            .map(|&id| {
                let spec = self.skeleton.bone(id);
                BoneRender {
                    id,
                    parent: spec.parent,
                    position: self.display_position(id),
                    radius: spec.radius,
                }
            })
            .collect();

        RenderSnapshot {
            avatar_id: self.id,
            is_local: self.is_local,
            bones,
            head_yaw: self.body_yaw + self.head.yaw,
            head_pitch: self.body_pitch + self.head.pitch,
            head_roll: self.body_roll + self.head.roll,
            grasping: self.grasping,
            mode: self.mode,
            springs_active: self.springs.is_active(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::create_settings_handle;
    use crate::world::events::AvatarEvent;

    const DT: f32 = 0.016;

    fn local_avatar() -> Avatar {
        let settings = create_settings_handle(SimulationSettings::default());
        Avatar::local(Arc::new(Skeleton::standard()), settings)
    }

    #[test]
    fn test_new_avatar_stands_at_standing_height() {
        let avatar = local_avatar();
        assert_eq!(avatar.position().y, avatar.skeleton().standing_height());
        assert_eq!(avatar.body_yaw(), -90.0);
        assert_eq!(avatar.mode(), AvatarMode::Idle);
        assert!(avatar.springs().is_active());
    }

    #[test]
    fn test_forward_key_walks_and_reports_mode_change() {
        let mut avatar = local_avatar();
        avatar.set_drive_keys(DriveKeys::FORWARD);
        let start = avatar.position();
        let front = avatar.body_orientation().front();

        for _ in 0..30 {
            avatar.simulate(DT, &mut [], &[]);
        }

        assert_eq!(avatar.mode(), AvatarMode::Walking);
        assert!((avatar.position() - start).dot(front) > 0.0);
        let events = avatar.drain_events();
        assert!(events.iter().any(|e| matches!(
            e,
            AvatarEvent::ModeChanged(m) if m.to == AvatarMode::Walking
        )));
        assert!(avatar.drain_events().is_empty());
    }

    #[test]
    fn test_yaw_keys_turn_local_avatar_only() {
        let settings = create_settings_handle(SimulationSettings::default());
        let skeleton = Arc::new(Skeleton::standard());
        let mut local = Avatar::local(skeleton.clone(), settings.clone());
        let mut remote = Avatar::remote(Uuid::new_v4(), skeleton, settings);

        local.set_drive_keys(DriveKeys::YAW_LEFT);
        remote.set_drive_keys(DriveKeys::YAW_LEFT);
        remote.set_yaw_rate(50.0);

        local.simulate(DT, &mut [], &[]);
        remote.simulate(DT, &mut [], &[]);

        assert!(local.body_yaw() > -90.0);
        assert_eq!(remote.body_yaw(), -90.0);
        // remote yaw rate still decays
        assert!((remote.yaw_rate() - 50.0 * (1.0 - 5.0 * DT)).abs() < 1.0e-4);
    }

    #[test]
    fn test_remote_hand_follows_network_position() {
        let settings = create_settings_handle(SimulationSettings::default());
        let mut remote = Avatar::remote(Uuid::new_v4(), Arc::new(Skeleton::standard()), settings);
        let shoulder = remote.bone(BoneId::RightShoulder).rigid_position;
        let hand = shoulder + Vec3::new(0.0, 0.0, 0.1);
        remote.set_hand_position(hand);

        remote.simulate(DT, &mut [], &[]);
        assert!((remote.bone(BoneId::RightHand).rigid_position - hand).length() < 1.0e-5);
    }

    #[test]
    fn test_snapshot_carries_state_to_replica() {
        let mut local = local_avatar();
        local.set_position(Vec3::new(1.0, 0.5, -2.0));
        local.set_body_yaw(30.0);
        local.head_mut().pitch = 12.0;

        let settings = create_settings_handle(SimulationSettings::default());
        let mut remote = Avatar::remote(local.id(), Arc::new(Skeleton::standard()), settings);
        remote.apply_snapshot(&local.snapshot());

        assert_eq!(remote.position(), local.position());
        assert_eq!(remote.body_yaw(), 30.0);
        assert_eq!(remote.head().pitch, 12.0);
        assert_eq!(remote.hand_position(), local.hand_position());
    }

    #[test]
    fn test_render_snapshot_uses_rigid_pose_when_springs_dormant() {
        let mut settings = SimulationSettings::default();
        settings.springs.start_active = false;
        let mut avatar =
            Avatar::local(Arc::new(Skeleton::standard()), create_settings_handle(settings));
        avatar.head_mut().yaw = 10.0;

        let snapshot = avatar.render_snapshot();
        assert!(!snapshot.springs_active);
        assert_eq!(snapshot.bones.len(), 23);
        let head = &snapshot.bones[BoneId::Head.index()];
        assert_eq!(head.position, avatar.bone(BoneId::Head).rigid_position);
        assert_eq!(head.parent, Some(BoneId::Neck));
        assert_eq!(snapshot.head_yaw, -80.0);
    }

    #[test]
    fn test_obstacle_contact_wakes_dormant_springs() {
        let mut settings = SimulationSettings::default();
        settings.springs.start_active = false;
        let mut avatar =
            Avatar::local(Arc::new(Skeleton::standard()), create_settings_handle(settings));

        let head = avatar.bone(BoneId::Head).spring_position;
        let sphere = StaticSphere::new(head + Vec3::new(0.0, 0.0, 0.2), 0.2);
        avatar.simulate(DT, &mut [], &[sphere]);

        assert!(avatar.springs().is_active());
        assert_eq!(avatar.springs().activation_count(), 1);
        assert!(avatar
            .drain_events()
            .iter()
            .any(|e| matches!(e, AvatarEvent::SpringsActivated(_))));
    }
}
