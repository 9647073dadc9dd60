//! Avatar roster
//!
//! The set of known avatars keyed by id. Iteration follows id order so every
//! tick visits avatars in the same sequence.

use super::avatar::{Avatar, AvatarId};
use super::collision::StaticSphere;
use super::events::AvatarEvent;
use super::skeleton::Skeleton;
use crate::config::SettingsHandle;
use crate::networking::{AvatarSnapshot, SnapshotInbox};
use crate::rendering::RenderSnapshot;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct Roster {
    avatars: BTreeMap<AvatarId, Avatar>,
    local_id: Option<AvatarId>,
    skeleton: Arc<Skeleton>,
    settings: SettingsHandle,
    obstacles: Vec<StaticSphere>,
    inbox: Option<SnapshotInbox>,
    events: Vec<AvatarEvent>,
    tick: u64,
}

impl Roster {
    pub fn new(skeleton: Arc<Skeleton>, settings: SettingsHandle) -> Self {
        let obstacles = settings.world.obstacles.clone();
        Self {
            avatars: BTreeMap::new(),
            local_id: None,
            skeleton,
            settings,
            obstacles,
            inbox: None,
            events: Vec::new(),
            tick: 0,
        }
    }

    /// Attach the channel snapshots arrive on
    pub fn with_inbox(mut self, inbox: SnapshotInbox) -> Self {
        self.inbox = Some(inbox);
        self
    }

    /// Create the locally controlled avatar, replacing any previous one
    pub fn spawn_local(&mut self) -> AvatarId {
        let avatar = Avatar::local(self.skeleton.clone(), self.settings.clone());
        let id = avatar.id();
        if let Some(previous) = self.local_id.take() {
            self.avatars.remove(&previous);
        }
        info!("🧍 Local avatar {} joined the roster", id);
        self.local_id = Some(id);
        self.avatars.insert(id, avatar);
        id
    }

    /// Add a pre-built avatar; a local one becomes the roster's local avatar
    pub fn insert(&mut self, avatar: Avatar) {
        let id = avatar.id();
        if avatar.is_local() {
            if let Some(previous) = self.local_id.replace(id) {
                if previous != id {
                    self.avatars.remove(&previous);
                }
            }
        }
        self.avatars.insert(id, avatar);
    }

    pub fn remove(&mut self, id: AvatarId) -> Option<Avatar> {
        if self.local_id == Some(id) {
            self.local_id = None;
        }
        self.avatars.remove(&id)
    }

    pub fn get(&self, id: AvatarId) -> Option<&Avatar> {
        self.avatars.get(&id)
    }

    pub fn get_mut(&mut self, id: AvatarId) -> Option<&mut Avatar> {
        self.avatars.get_mut(&id)
    }

    pub fn local_id(&self) -> Option<AvatarId> {
        self.local_id
    }

    pub fn local(&self) -> Option<&Avatar> {
        self.local_id.and_then(|id| self.avatars.get(&id))
    }

    pub fn local_mut(&mut self) -> Option<&mut Avatar> {
        match self.local_id {
            Some(id) => self.avatars.get_mut(&id),
            None => None,
        }
    }

    /// Avatars in id order
    pub fn iter(&self) -> impl Iterator<Item = &Avatar> {
        self.avatars.values()
    }

    pub fn len(&self) -> usize {
        self.avatars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.avatars.is_empty()
    }

    pub fn obstacles(&self) -> &[StaticSphere] {
        &self.obstacles
    }

    /// Completed ticks
    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    /// Apply a received snapshot, creating a replica for unknown ids.
    /// Snapshots carrying NaN or infinite values are dropped.
    pub fn apply_snapshot(&mut self, snapshot: &AvatarSnapshot) {
        if self.local_id == Some(snapshot.id) {
            debug!("🔁 Ignoring snapshot addressed to the local avatar {}", snapshot.id);
            return;
        }
        if let Some(field) = snapshot.non_finite_field() {
            warn!("📦 Dropping snapshot for {}: {} is not finite", snapshot.id, field);
            return;
        }

        let skeleton = &self.skeleton;
        let settings = &self.settings;
        let avatar = self.avatars.entry(snapshot.id).or_insert_with(|| {
            info!("👤 Remote avatar {} joined the roster", snapshot.id);
            Avatar::remote(snapshot.id, skeleton.clone(), settings.clone())
        });
        avatar.apply_snapshot(snapshot);
    }

    /// Apply every snapshot waiting in the inbox, returning how many were applied
    pub fn drain_inbox(&mut self) -> usize {
        let pending: Vec<AvatarSnapshot> = match &self.inbox {
            Some(inbox) => inbox.drain(),
            None => return 0,
        };
        for snapshot in &pending {
            self.apply_snapshot(snapshot);
        }
        pending.len()
    }

    /// Advance every avatar one tick.
    ///
    /// Snapshots are applied first. Remote replicas then run in id order, and
    /// the local avatar runs last against everyone else.
    pub fn tick(&mut self, dt: f32) {
        self.drain_inbox();

        let local_id = self.local_id;
        for (id, avatar) in self.avatars.iter_mut() {
            if Some(*id) != local_id {
                avatar.simulate(dt, &mut [], &self.obstacles);
            }
        }

        if let Some(id) = local_id {
            if let Some(mut local) = self.avatars.remove(&id) {
                let mut others: Vec<&mut Avatar> = self.avatars.values_mut().collect();
                local.simulate(dt, &mut others, &self.obstacles);
                self.avatars.insert(id, local);
            }
        }

        for avatar in self.avatars.values_mut() {
            self.events.extend(avatar.drain_events());
        }
        self.tick += 1;
    }

    /// Take the events collected since the last drain
    pub fn drain_events(&mut self) -> Vec<AvatarEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn local_snapshot(&self) -> Option<AvatarSnapshot> {
        self.local().map(Avatar::snapshot)
    }

    pub fn render_snapshots(&self) -> Vec<RenderSnapshot> {
        self.avatars.values().map(Avatar::render_snapshot).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{create_settings_handle, SimulationSettings};
    use crate::world::BoneId;
    use glam::Vec3;
    use uuid::Uuid;

    fn roster() -> Roster {
        Roster::new(
            Arc::new(Skeleton::standard()),
            create_settings_handle(SimulationSettings::default()),
        )
    }

    fn snapshot_for(id: AvatarId, position: Vec3) -> AvatarSnapshot {
        AvatarSnapshot {
            id,
            position,
            body_yaw: 0.0,
            body_pitch: 0.0,
            body_roll: 0.0,
            head_yaw: 0.0,
            head_pitch: 0.0,
            head_roll: 0.0,
            hand_position: position,
            grasping: false,
        }
    }

    #[test]
    fn test_snapshot_for_unknown_id_creates_replica() {
        let mut roster = roster();
        let id = Uuid::new_v4();
        roster.apply_snapshot(&snapshot_for(id, Vec3::new(3.0, 0.32, 0.0)));

        let replica = roster.get(id).unwrap();
        assert!(!replica.is_local());
        assert_eq!(replica.position(), Vec3::new(3.0, 0.32, 0.0));
    }

    #[test]
    fn test_snapshot_for_local_avatar_is_ignored() {
        let mut roster = roster();
        let id = roster.spawn_local();
        let before = roster.local().unwrap().position();

        roster.apply_snapshot(&snapshot_for(id, Vec3::new(9.0, 9.0, 9.0)));
        assert_eq!(roster.local().unwrap().position(), before);
        assert_eq!(roster.len(), 1);
    }

    #[test]
    fn test_iteration_is_in_id_order() {
        let mut roster = roster();
        for _ in 0..8 {
            roster.apply_snapshot(&snapshot_for(Uuid::new_v4(), Vec3::new(4.0, 0.32, 0.0)));
        }
        let ids: Vec<AvatarId> = roster.iter().map(Avatar::id).collect();
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
    }

    #[test]
    fn test_tick_keeps_local_avatar_in_roster() {
        let mut roster = roster();
        let id = roster.spawn_local();
        roster.apply_snapshot(&snapshot_for(Uuid::new_v4(), Vec3::new(4.0, 0.32, 0.0)));

        roster.tick(0.016);
        roster.tick(0.016);

        assert_eq!(roster.tick_count(), 2);
        assert_eq!(roster.len(), 2);
        assert_eq!(roster.local_id(), Some(id));
        assert!(roster.get(id).unwrap().is_local());
    }

    #[test]
    fn test_inbox_snapshots_apply_at_tick_start() {
        let (sender, inbox) = SnapshotInbox::channel();
        let mut roster = roster().with_inbox(inbox);
        let id = Uuid::new_v4();
        sender.send_snapshot(&snapshot_for(id, Vec3::new(2.0, 0.32, 0.0))).unwrap();

        assert!(roster.get(id).is_none());
        roster.tick(0.016);
        assert!(roster.get(id).is_some());
    }

    #[test]
    fn test_non_finite_snapshot_never_reaches_the_local_hand() {
        let mut roster = roster();
        let local_id = roster.spawn_local();
        let id = Uuid::new_v4();

        let mut poisoned = snapshot_for(id, Vec3::splat(f32::NAN));
        poisoned.grasping = true;
        roster.apply_snapshot(&poisoned);
        assert!(roster.get(id).is_none());

        for _ in 0..50 {
            roster.tick(0.016);
        }
        let local = roster.get(local_id).unwrap();
        assert!(local.interacting_other().is_none());
        for id in [BoneId::RightHand, BoneId::PelvisSpine] {
            assert!(local.bone(id).spring_position.is_finite());
            assert!(local.bone(id).rigid_position.is_finite());
        }
    }

    #[test]
    fn test_spawning_a_new_local_replaces_the_old_one() {
        let mut roster = roster();
        let first = roster.spawn_local();
        let second = roster.spawn_local();
        assert_ne!(first, second);
        assert!(roster.get(first).is_none());
        assert_eq!(roster.len(), 1);
    }
}
