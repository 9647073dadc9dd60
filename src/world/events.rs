use super::locomotion::AvatarMode;
use uuid::Uuid;
use std::time::SystemTime;

/// Events emitted by avatars during simulation
/// Drained by the roster once per tick

/// Avatar switched between idle, walking and interacting
#[derive(Debug, Clone)]
pub struct ModeChangedEvent {
    pub avatar_id: Uuid,
    pub from: AvatarMode,
    pub to: AvatarMode,
    pub timestamp: SystemTime,
}

/// Dormant springs woke up after a bone contact
#[derive(Debug, Clone)]
pub struct SpringsActivatedEvent {
    pub avatar_id: Uuid,
    pub timestamp: SystemTime,
}

/// Another avatar's hand came within reach
#[derive(Debug, Clone)]
pub struct InteractionStartedEvent {
    pub avatar_id: Uuid,
    pub other_id: Uuid,
    pub timestamp: SystemTime,
}

/// The interacting avatar moved out of reach
#[derive(Debug, Clone)]
pub struct InteractionEndedEvent {
    pub avatar_id: Uuid,
    pub other_id: Uuid,
    pub timestamp: SystemTime,
}

/// Any simulation event
#[derive(Debug, Clone)]
pub enum AvatarEvent {
    ModeChanged(ModeChangedEvent),
    SpringsActivated(SpringsActivatedEvent),
    InteractionStarted(InteractionStartedEvent),
    InteractionEnded(InteractionEndedEvent),
}

impl AvatarEvent {
    /// Avatar that emitted the event
    pub fn avatar_id(&self) -> Uuid {
        match self {
            AvatarEvent::ModeChanged(e) => e.avatar_id,
            AvatarEvent::SpringsActivated(e) => e.avatar_id,
            AvatarEvent::InteractionStarted(e) => e.avatar_id,
            AvatarEvent::InteractionEnded(e) => e.avatar_id,
        }
    }

    pub fn timestamp(&self) -> SystemTime {
        match self {
            AvatarEvent::ModeChanged(e) => e.timestamp,
            AvatarEvent::SpringsActivated(e) => e.timestamp,
            AvatarEvent::InteractionStarted(e) => e.timestamp,
            AvatarEvent::InteractionEnded(e) => e.timestamp,
        }
    }
}

impl ModeChangedEvent {
    pub fn new(avatar_id: Uuid, from: AvatarMode, to: AvatarMode) -> Self {
        Self {
            avatar_id,
            from,
            to,
            timestamp: SystemTime::now(),
        }
    }
}

impl SpringsActivatedEvent {
    pub fn new(avatar_id: Uuid) -> Self {
        Self {
            avatar_id,
            timestamp: SystemTime::now(),
        }
    }
}

impl InteractionStartedEvent {
    pub fn new(avatar_id: Uuid, other_id: Uuid) -> Self {
        Self {
            avatar_id,
            other_id,
            timestamp: SystemTime::now(),
        }
    }
}

impl InteractionEndedEvent {
    pub fn new(avatar_id: Uuid, other_id: Uuid) -> Self {
        Self {
            avatar_id,
            other_id,
            timestamp: SystemTime::now(),
        }
    }
}

impl From<ModeChangedEvent> for AvatarEvent {
    fn from(event: ModeChangedEvent) -> Self {
        AvatarEvent::ModeChanged(event)
    }
}

impl From<SpringsActivatedEvent> for AvatarEvent {
    fn from(event: SpringsActivatedEvent) -> Self {
        AvatarEvent::SpringsActivated(event)
    }
}

impl From<InteractionStartedEvent> for AvatarEvent {
    fn from(event: InteractionStartedEvent) -> Self {
        AvatarEvent::InteractionStarted(event)
    }
}

impl From<InteractionEndedEvent> for AvatarEvent {
    fn from(event: InteractionEndedEvent) -> Self {
        AvatarEvent::InteractionEnded(event)
    }
}
