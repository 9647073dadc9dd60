use crate::config::NetworkSettings;

/// Decides when the local snapshot goes out, at a fixed rate independent of frame rate
#[derive(Debug, Clone)]
pub struct SnapshotScheduler {
    interval: f32,
    accumulated: f32,
}

impl SnapshotScheduler {
    pub fn new(hz: f32) -> Self {
        Self {
            interval: 1.0 / hz,
            accumulated: 0.0,
        }
    }

    pub fn from_settings(settings: &NetworkSettings) -> Self {
        Self::new(settings.snapshot_hz)
    }

    pub fn interval(&self) -> f32 {
        self.interval
    }

    /// Add frame time; returns true when a snapshot is due.
    ///
    /// At most one snapshot is due per call. Backlog from a long frame is dropped
    /// rather than sent as a burst.
    pub fn advance(&mut self, dt: f32) -> bool {
        self.accumulated += dt.max(0.0);
        if self.accumulated < self.interval {
            return false;
        }

        self.accumulated -= self.interval;
        if self.accumulated >= self.interval {
            self.accumulated %= self.interval;
        }
        true
    }
}

impl Default for SnapshotScheduler {
    fn default() -> Self {
        Self::from_settings(&NetworkSettings::default())
    }
}
