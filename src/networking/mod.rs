//! Avatar snapshot networking
//!
//! The simulation never touches sockets. It produces encoded snapshots of the
//! local avatar at a fixed cadence and consumes snapshots of remote avatars
//! through a thread-safe inbox fed by whatever transport the host runs.

pub mod codec;
pub mod inbox;
pub mod scheduler;
pub mod snapshot;

// Re-export main types for convenience
pub use codec::{decode_snapshot, encode_snapshot, SNAPSHOT_MAGIC, SNAPSHOT_VERSION};
pub use inbox::{SnapshotInbox, SnapshotSender};
pub use scheduler::SnapshotScheduler;
pub use snapshot::AvatarSnapshot;

// Error types
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum NetworkError {
    #[error("Bad snapshot magic {found:02x?}")]
    BadMagic { found: [u8; 2] },

    #[error("Unsupported snapshot version {version}")]
    UnsupportedVersion { version: u8 },

    #[error("Frame truncated: {len} bytes is shorter than the header")]
    Truncated { len: usize },

    #[error("Packet decode failed: {reason}")]
    PacketDecode { reason: String },

    #[error("Packet encode failed: {reason}")]
    PacketEncode { reason: String },

    #[error("Snapshot field {field} is not finite")]
    NonFinite { field: &'static str },

    #[error("Snapshot channel closed")]
    ChannelClosed,
}

pub type NetworkResult<T> = Result<T, NetworkError>;
