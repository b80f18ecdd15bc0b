//! Small helpers shared by the demos: elapsed-time accumulators, the
//! indented setup log, and frame pacing.

/// Indent-aware setup trace.
pub mod debug_log;
/// Frame pacing and the FPS readout.
pub mod frame_timing;
/// Elapsed-time accumulators.
pub mod timer;

pub use debug_log::{DebugLog, LogValue};
pub use frame_timing::FrameTiming;
pub use timer::{ClockTimer, Timer, Updatable};
