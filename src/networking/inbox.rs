//! Thread-safe hand-off of received snapshot frames to the simulation thread

use super::{decode_snapshot, encode_snapshot, AvatarSnapshot, NetworkError, NetworkResult};
use bytes::Bytes;
use crossbeam_channel::{unbounded, Receiver, Sender};
use tracing::warn;

/// Network-side handle; cheap to clone into receive threads
#[derive(Debug, Clone)]
pub struct SnapshotSender {
    tx: Sender<Bytes>,
}

impl SnapshotSender {
    /// Queue a raw frame as it came off the wire
    pub fn send_frame(&self, frame: Bytes) -> NetworkResult<()> {
        self.tx.send(frame).map_err(|_| NetworkError::ChannelClosed)
    }

    pub fn send_snapshot(&self, snapshot: &AvatarSnapshot) -> NetworkResult<()> {
        self.send_frame(encode_snapshot(snapshot)?)
    }
}

/// Simulation-side end, drained at the start of each tick
#[derive(Debug)]
pub struct SnapshotInbox {
    rx: Receiver<Bytes>,
}

impl SnapshotInbox {
    pub fn channel() -> (SnapshotSender, SnapshotInbox) {
        let (tx, rx) = unbounded();
        (SnapshotSender { tx }, SnapshotInbox { rx })
    }

    /// Decode every queued frame without blocking. Malformed frames are dropped.
    pub fn drain(&self) -> Vec<AvatarSnapshot> {
        self.rx
            .try_iter()
            .filter_map(|frame| match decode_snapshot(&frame) {
                Ok(snapshot) => Some(snapshot),
                Err(e) => {
                    warn!("📦 Dropping malformed snapshot frame ({} bytes): {}", frame.len(), e);
                    None
                }
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}
