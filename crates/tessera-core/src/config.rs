use std::time::Duration;

use crate::platform::{WorldFlags, WorldType};
use crate::timing::FpsPrinter;

/// Configuration for a Tessera world and its driving loop.
#[derive(Debug, Clone)]
pub struct Config {
    pub world_type: WorldType,
    pub world_flags: WorldFlags,
    /// Application class name handed to the windowing system.
    pub class_name: Option<String>,
    /// Inverse of the display refresh rate, used for redraw pacing.
    pub frame_period: Duration,
    /// How often to log the frame rate, `None` to stay quiet.
    pub fps_report_interval: Option<Duration>,
    pub profiling: ProfilingMode,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            world_type: WorldType::Program,
            world_flags: WorldFlags::empty(),
            class_name: None,
            frame_period: Duration::from_secs(1) / 60,
            fps_report_interval: Some(FpsPrinter::DEFAULT_INTERVAL),
            profiling: ProfilingMode::Off,
        }
    }
}

impl Config {
    pub fn with_class_name(mut self, name: impl Into<String>) -> Self {
        self.class_name = Some(name.into());
        self
    }

    /// Sets the frame period from a refresh rate in Hz. Zero is ignored.
    pub fn with_refresh_rate(mut self, hz: u32) -> Self {
        if hz > 0 {
            self.frame_period = Duration::from_secs(1) / hz;
        }
        self
    }

    pub fn with_fps_report(mut self, interval: Duration) -> Self {
        self.fps_report_interval = Some(interval);
        self
    }

    pub fn without_fps_report(mut self) -> Self {
        self.fps_report_interval = None;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfilingMode {
    /// Profiling is disabled
    Off,
    /// Scopes are collected but not served
    On,
    /// Scopes are collected and served to 'puffin_viewer' over HTTP
    WithWebServer,
}
