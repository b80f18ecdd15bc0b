//! Render passes, framebuffers and shader programs on wgpu, with real-time
//! volume rendering demos.
//!
//! volren models the state of an immediate-mode graphics API (capability
//! flags, bound render target, current program, viewport, clear color) as
//! an explicit [`context::Context`]. Render passes, programs and
//! framebuffers operate on that context, which records a frame command
//! stream; the [`gpu::GpuBackend`] replays the stream into wgpu render
//! passes. Everything above the backend runs without a GPU.
//!
//! # Key entry points
//!
//! - [`render_pass::RenderPass`] - one pipeline step with declarative
//!   capability toggling
//! - [`shader::ShaderProgram`] - linked WGSL stages with reflected outputs
//!   and uniforms
//! - [`context::Framebuffer`] - off-screen targets with lazily added color
//!   attachments
//! - [`importer`] - raw volume slice stacks and single-file volumes
//! - [`demos`] - the MIP, depth peeling and reflection pipelines
//! - `Viewer` - a winit window running one demo (feature `viewer`)
//!
//! # Frame flow
//!
//! Each frame a demo updates its matrices from the camera and turntable,
//! builds [`shader::Parameters`] snapshots and renders its passes in
//! pipeline order. The viewer then hands the recorded commands to the
//! backend, which realizes new textures, caches pipelines by program and
//! fixed-function state, and submits one encoder.

pub mod camera;
pub mod context;
pub mod demos;
pub mod error;
pub mod gpu;
pub mod importer;
pub mod input;
pub mod mesh;
pub mod options;
pub mod render_pass;
pub mod shader;
pub mod util;
#[cfg(feature = "viewer")]
pub mod viewer;

pub use context::Context;
pub use error::VolrenError;
pub use render_pass::RenderPass;
pub use shader::{Parameters, ShaderProgram};
#[cfg(feature = "viewer")]
pub use viewer::Viewer;
