use web_time::{Duration, Instant};

/// How often [`FrameTiming::fps_report`] yields a new reading.
pub const FPS_REPORT_INTERVAL: Duration = Duration::from_millis(500);

/// Caps the redraw rate and counts frames for an FPS readout.
#[derive(Debug, Clone)]
pub struct FrameTiming {
    /// Shortest allowed frame; `None` renders as fast as presentation
    /// allows.
    budget: Option<Duration>,
    last_frame: Instant,
    window_start: Instant,
    window_frames: u32,
}

impl FrameTiming {
    /// Pacing for `target_fps` frames per second (0 = uncapped).
    #[must_use]
    pub fn new(target_fps: u32) -> Self {
        Self::starting_at(target_fps, Instant::now())
    }

    fn starting_at(target_fps: u32, now: Instant) -> Self {
        Self {
            budget: (target_fps > 0).then(|| Duration::from_secs_f64(1.0 / f64::from(target_fps))),
            last_frame: now,
            window_start: now,
            window_frames: 0,
        }
    }

    /// Whether the frame budget since the last frame has been used up.
    #[must_use]
    pub fn should_render(&self) -> bool {
        self.budget
            .is_none_or(|budget| self.last_frame.elapsed() >= budget)
    }

    /// Start a frame; returns the seconds since the previous one.
    pub fn begin_frame(&mut self) -> f32 {
        self.begin_frame_at(Instant::now())
    }

    fn begin_frame_at(&mut self, now: Instant) -> f32 {
        let dt = now.saturating_duration_since(self.last_frame);
        self.last_frame = now;
        self.window_frames += 1;
        dt.as_secs_f32()
    }

    /// Average FPS over the frames since the last report, once
    /// [`FPS_REPORT_INTERVAL`] has passed.
    pub fn fps_report(&mut self) -> Option<f32> {
        self.fps_report_at(Instant::now())
    }

    fn fps_report_at(&mut self, now: Instant) -> Option<f32> {
        let elapsed = now.saturating_duration_since(self.window_start);
        if elapsed < FPS_REPORT_INTERVAL {
            return None;
        }
        let fps = self.window_frames as f32 / elapsed.as_secs_f32();
        self.window_start = now;
        self.window_frames = 0;
        Some(fps)
    }
}
