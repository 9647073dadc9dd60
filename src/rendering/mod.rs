//! Render boundary
//!
//! Renderers never see live avatar state; they read a [`RenderSnapshot`]
//! taken after the tick.

pub mod snapshot;

// Re-export the snapshot types as the main interface
pub use snapshot::{BoneRender, RenderSnapshot};
