//! GPU side of the toolkit.
//!
//! Provides wgpu device/surface initialization and the backend that turns
//! a [`Context`](crate::context::Context)'s recorded commands into render
//! passes.

/// Resource mirroring and command replay.
pub mod backend;
/// Splitting a command stream into render passes.
pub mod frame_plan;
/// Descriptor helpers shared by every pipeline the backend builds.
pub mod pipeline_helpers;
/// wgpu device, surface, and queue initialization.
pub mod render_context;
/// GPU realization of registered textures.
pub mod texture;
/// Packed per-frame uniform snapshots.
pub mod uniform_block;

pub use backend::GpuBackend;
pub use render_context::{RenderContext, RenderContextError};
