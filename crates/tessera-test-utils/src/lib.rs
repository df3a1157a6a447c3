//! Test utilities for Tessera.
//!
//! This crate provides a headless platform backend that records every call
//! the dispatcher makes into it, so the graphics-context discipline of the
//! core can be checked without a display.
//!
//! # Overview
//!
//! - `MockPlatform` - [`Platform`](tessera_core::Platform) implementation with no native state
//! - `ContextMonitor` - shared log of platform calls and context depth
//! - `RecordingHandler` - event handler that records each delivery and whether
//!   it happened inside a graphics context
//!
//! # Example
//!
//! ```rust
//! # #[cfg(feature = "mock")]
//! # {
//! use tessera_core::{Event, World, WorldFlags, WorldType};
//! use tessera_test_utils::{MockPlatform, RecordingHandler};
//!
//! let mut world = World::<MockPlatform>::new(WorldType::Program, WorldFlags::empty()).unwrap();
//! let monitor = world.internals().monitor().clone();
//! let handler = RecordingHandler::new(monitor.clone());
//! let view = world.create_view(handler.clone()).unwrap();
//!
//! world.dispatch_event(view, &Event::Close).unwrap();
//!
//! assert_eq!(handler.deliveries().len(), 1);
//! assert_eq!(monitor.enter_count(), 0);
//! # }
//! ```

#[cfg(feature = "mock")]
pub mod mock;

#[cfg(feature = "mock")]
pub use mock::*;
