//! Elapsed-time accumulators.

use web_time::Instant;

/// Anything stepped once per frame by a time delta in seconds.
pub trait Updatable {
    /// Advance by `dt` seconds.
    fn update(&mut self, dt: f32);
}

/// Accumulates the deltas it is stepped with while running.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Timer {
    saved: Vec<f64>,
    elapsed: f64,
    running: bool,
}

impl Timer {
    /// Timer at zero, optionally already running.
    #[must_use]
    pub fn new(running: bool) -> Self {
        Self {
            saved: Vec::new(),
            elapsed: 0.0,
            running,
        }
    }

    /// Set the elapsed time back to zero. Saved times are kept.
    pub fn reset(&mut self) {
        self.elapsed = 0.0;
    }

    /// Flip between running and paused.
    pub fn toggle_running(&mut self) {
        self.running = !self.running;
    }

    /// Pause or resume.
    pub fn set_running(&mut self, running: bool) {
        self.running = running;
    }

    /// Whether deltas are being accumulated.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Seconds accumulated so far.
    #[must_use]
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Record the current elapsed time.
    pub fn save_elapsed(&mut self) {
        self.saved.push(self.elapsed);
    }

    /// Forget every recorded time.
    pub fn clear_saved(&mut self) {
        self.saved.clear();
    }

    /// Recorded times in save order.
    #[must_use]
    pub fn saved(&self) -> &[f64] {
        &self.saved
    }
}

impl Updatable for Timer {
    fn update(&mut self, dt: f32) {
        if self.running {
            self.elapsed += f64::from(dt);
        }
    }
}

/// A [`Timer`] that ignores the delta it is given and measures wall-clock
/// time between updates instead.
///
/// The first update after starting only records a reference instant, so
/// time spent paused is never counted.
#[derive(Debug, Clone, Default)]
pub struct ClockTimer {
    timer: Timer,
    last: Option<Instant>,
}

impl ClockTimer {
    /// Clock timer at zero.
    #[must_use]
    pub fn new(running: bool) -> Self {
        Self {
            timer: Timer::new(running),
            last: None,
        }
    }

    /// Flip between running and paused. Resuming starts measuring from now.
    pub fn toggle_running(&mut self) {
        self.timer.toggle_running();
        self.last = self.timer.is_running().then(Instant::now);
    }

    /// Step using an explicit "now", so the measurement is deterministic.
    pub fn update_at(&mut self, now: Instant) {
        if !self.timer.is_running() {
            return;
        }
        if let Some(last) = self.last {
            self.timer.elapsed += now.saturating_duration_since(last).as_secs_f64();
        }
        self.last = Some(now);
    }

    /// The underlying accumulator.
    #[must_use]
    pub fn timer(&self) -> &Timer {
        &self.timer
    }

    /// Mutable access for reset and saved times.
    pub fn timer_mut(&mut self) -> &mut Timer {
        &mut self.timer
    }

    /// Seconds measured so far.
    #[must_use]
    pub fn elapsed(&self) -> f64 {
        self.timer.elapsed()
    }
}

impl Updatable for ClockTimer {
    fn update(&mut self, _dt: f32) {
        self.update_at(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use web_time::Duration;

    use super::*;

    #[test]
    fn accumulates_only_while_running() {
        let mut timer = Timer::new(false);
        timer.update(0.5);
        assert_eq!(timer.elapsed(), 0.0);
        timer.toggle_running();
        timer.update(0.5);
        timer.update(0.25);
        assert_eq!(timer.elapsed(), 0.75);
        timer.set_running(false);
        timer.update(1.0);
        assert_eq!(timer.elapsed(), 0.75);
    }

    #[test]
    fn saved_times_survive_reset() {
        let mut timer = Timer::new(true);
        timer.update(1.0);
        timer.save_elapsed();
        timer.reset();
        timer.update(2.0);
        timer.save_elapsed();
        assert_eq!(timer.saved(), &[1.0, 2.0]);
        timer.clear_saved();
        assert!(timer.saved().is_empty());
    }

    #[test]
    fn clock_timer_skips_first_update_and_pauses() {
        let start = Instant::now();
        let mut clock = ClockTimer::new(true);
        clock.update_at(start);
        assert_eq!(clock.elapsed(), 0.0);
        clock.update_at(start + Duration::from_millis(500));
        assert!((clock.elapsed() - 0.5).abs() < 1e-9);

        clock.toggle_running();
        assert!(!clock.timer().is_running());
        clock.update_at(start + Duration::from_secs(10));
        assert!((clock.elapsed() - 0.5).abs() < 1e-9);
    }
}
