//! Head-tracking sensor input
//!
//! Parses text packets from a phone-style transmitter and turns them into
//! smoothed head angles.

pub mod tracker;
pub mod transmitter;

pub use tracker::{HeadReading, HeadTracker};
pub use transmitter::TransmitterPacket;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SensorError {
    #[error("Transmitter packet is not valid text")]
    NotText,

    #[error("Transmitter packet is missing section '{section}'")]
    MissingSection { section: &'static str },

    #[error("Bad number '{value}' in section '{section}'")]
    BadNumber { section: &'static str, value: String },

    #[error("Non-finite value '{value}' in section '{section}'")]
    NonFinite { section: &'static str, value: String },
}

pub type SensorResult<T> = Result<T, SensorError>;
