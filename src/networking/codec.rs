//! Snapshot wire format
//!
//! A frame is a 2-byte magic, a 1-byte version and a bincode payload.

use super::{AvatarSnapshot, NetworkError, NetworkResult};
use bytes::{Buf, BufMut, Bytes, BytesMut};

pub const SNAPSHOT_MAGIC: [u8; 2] = [0xA7, 0x5A];
pub const SNAPSHOT_VERSION: u8 = 1;

const HEADER_LEN: usize = 3;

/// Encode a snapshot into a complete frame
pub fn encode_snapshot(snapshot: &AvatarSnapshot) -> NetworkResult<Bytes> {
    let payload = bincode::serialize(snapshot).map_err(|e| NetworkError::PacketEncode {
        reason: format!("Failed to serialize snapshot: {}", e),
    })?;

    let mut buffer = BytesMut::with_capacity(HEADER_LEN + payload.len());
    buffer.put_slice(&SNAPSHOT_MAGIC);
    buffer.put_u8(SNAPSHOT_VERSION);
    buffer.extend_from_slice(&payload);

    Ok(buffer.freeze())
}

/// Decode a frame produced by [`encode_snapshot`]
pub fn decode_snapshot(frame: &[u8]) -> NetworkResult<AvatarSnapshot> {
    if frame.len() < HEADER_LEN {
        return Err(NetworkError::Truncated { len: frame.len() });
    }

    let mut cursor = frame;
    let found = [cursor.get_u8(), cursor.get_u8()];
    if found != SNAPSHOT_MAGIC {
        return Err(NetworkError::BadMagic { found });
    }

    let version = cursor.get_u8();
    if version != SNAPSHOT_VERSION {
        return Err(NetworkError::UnsupportedVersion { version });
    }

    let snapshot: AvatarSnapshot =
        bincode::deserialize(cursor).map_err(|e| NetworkError::PacketDecode {
            reason: format!("Failed to deserialize snapshot: {}", e),
        })?;

    match snapshot.non_finite_field() {
        Some(field) => Err(NetworkError::NonFinite { field }),
        None => Ok(snapshot),
    }
}
