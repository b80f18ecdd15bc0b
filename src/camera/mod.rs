//! Viewing: a look-at camera with a fixed projection, and the turntable
//! that rotates models under mouse drags.

/// Look-at camera and projection.
pub mod core;
/// Drag-driven model rotation.
pub mod turntable;

pub use self::core::{Camera, Projection};
pub use turntable::Turntable;
