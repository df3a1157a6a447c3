//! Monotonic time and redraw pacing.

use std::time::{Duration, Instant};

/// Monotonic clock whose epoch is the moment it was created.
///
/// Every world owns one; all timestamps handed to [`compute_wait_time`] and
/// [`FpsPrinter`] should come from the same clock.
#[derive(Debug, Clone, Copy)]
pub struct Clock {
    start: Instant,
}

impl Clock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Time elapsed since the clock was created.
    #[inline]
    pub fn now(&self) -> Duration {
        self.start.elapsed()
    }

    /// Converts a timestamp from this clock back into an `Instant`.
    #[inline]
    pub fn instant_at(&self, time: Duration) -> Instant {
        self.start + time
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

/// Calculates how long to wait for input before the next redraw.
///
/// Drawing as early as possible hurts input latency: events that arrive while
/// a frame is already in flight have to wait a whole period. This estimates how
/// long the last draw took and returns the time left until a redraw started now
/// would still finish on the next frame boundary, minus a margin of an eighth
/// of a period. Returns zero if that point has already passed.
///
/// `last_update` is when the last update event was received, `last_frame_end`
/// when the last frame finished drawing, and `current` the time right before
/// waiting. All three must come from the same [`Clock`].
pub fn compute_wait_time(
    last_update: Duration,
    last_frame_end: Duration,
    current: Duration,
    frame_period: Duration,
) -> Duration {
    let fuzz = frame_period / 8;

    let last_draw_duration = last_frame_end.saturating_sub(last_update);
    let ideal_next_end = last_frame_end + frame_period;
    let ideal_next_update = ideal_next_end
        .saturating_sub(last_draw_duration)
        .saturating_sub(fuzz);

    ideal_next_update.saturating_sub(current)
}

/// A frame rate measurement emitted by [`FpsPrinter`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FpsReport {
    pub fps: f64,
    pub frames: u32,
    pub interval: Duration,
}

/// Periodically reports the frame rate.
#[derive(Debug, Clone)]
pub struct FpsPrinter {
    last_report_time: Duration,
    interval: Duration,
}

impl FpsPrinter {
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5);

    pub fn new() -> Self {
        Self::with_interval(Self::DEFAULT_INTERVAL)
    }

    pub fn with_interval(interval: Duration) -> Self {
        Self {
            last_report_time: Duration::ZERO,
            interval,
        }
    }

    pub fn last_report_time(&self) -> Duration {
        self.last_report_time
    }

    /// Logs and returns the frame rate once more than the interval has passed.
    ///
    /// Resets `frames_drawn` whenever a report is produced.
    pub fn report(&mut self, now: Duration, frames_drawn: &mut u32) -> Option<FpsReport> {
        if now <= self.last_report_time + self.interval {
            return None;
        }

        let elapsed = now - self.last_report_time;
        let fps = f64::from(*frames_drawn) / elapsed.as_secs_f64();
        tracing::info!(
            "FPS: {:.2} ({} frames in {:.0} seconds)",
            fps,
            *frames_drawn,
            elapsed.as_secs_f64()
        );

        let report = FpsReport {
            fps,
            frames: *frames_drawn,
            interval: elapsed,
        };

        self.last_report_time = now;
        *frames_drawn = 0;
        Some(report)
    }
}

impl Default for FpsPrinter {
    fn default() -> Self {
        Self::new()
    }
}
