use std::time::{Duration, Instant};

use tessera_core::profiling::profile_function;
use tessera_core::timing::{Clock, FpsPrinter, FpsReport, compute_wait_time};

/// Decides when the next redraw should start.
///
/// The runner records when it sends an update and when a frame finishes; the
/// pacer turns those into the deadline for the next `ControlFlow::WaitUntil`.
/// All timestamps come from the world's [`Clock`].
#[derive(Debug)]
pub struct FramePacer {
    frame_period: Duration,
    last_update: Duration,
    last_frame_end: Duration,
    frames_drawn: u32,
    fps: Option<FpsPrinter>,
}

impl FramePacer {
    pub fn new(frame_period: Duration) -> Self {
        Self {
            frame_period,
            last_update: Duration::ZERO,
            last_frame_end: Duration::ZERO,
            frames_drawn: 0,
            fps: None,
        }
    }

    /// Enables periodic FPS logging.
    pub fn with_fps_report(mut self, interval: Duration) -> Self {
        self.fps = Some(FpsPrinter::with_interval(interval));
        self
    }

    pub fn frame_period(&self) -> Duration {
        self.frame_period
    }

    pub fn begin_update(&mut self, now: Duration) {
        self.last_update = now;
    }

    pub fn end_frame(&mut self, now: Duration) {
        self.last_frame_end = now;
        self.frames_drawn = self.frames_drawn.saturating_add(1);
    }

    /// Frames drawn since the last FPS report.
    pub fn frames_drawn(&self) -> u32 {
        self.frames_drawn
    }

    /// How long to keep waiting for input at `now`.
    pub fn wait_time(&self, now: Duration) -> Duration {
        compute_wait_time(self.last_update, self.last_frame_end, now, self.frame_period)
    }

    /// The instant the next redraw should start.
    pub fn next_deadline(&self, clock: &Clock, now: Duration) -> Instant {
        profile_function!();
        clock.instant_at(now + self.wait_time(now))
    }

    /// Logs and returns the frame rate if a report is due.
    pub fn report_fps(&mut self, now: Duration) -> Option<FpsReport> {
        let printer = self.fps.as_mut()?;
        printer.report(now, &mut self.frames_drawn)
    }
}
