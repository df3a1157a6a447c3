//! Tessera Winit
//!
//! A [`Platform`](tessera_core::Platform) backend on top of `winit`, with the
//! event translation and the application runner that drives a world on the
//! event loop thread.

pub mod app;
pub mod event;
pub mod platform;
pub mod time;
pub mod window;

// Re-export WindowId for convenience
pub use winit::window::WindowId;

pub use app::{App, AppCtx, AppError, AppFactory, run_app};
pub use platform::WinitPlatform;
pub use time::FramePacer;
pub use window::ViewDescriptor;
