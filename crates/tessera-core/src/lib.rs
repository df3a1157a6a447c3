//! Tessera Core
//!
//! This crate contains the platform-independent half of Tessera: the generic
//! event model, the event dispatcher with its graphics-context bookkeeping, and
//! the small utilities the platform glue relies on (UTF-8 decoding, frame
//! pacing, owned blob storage).
//!
//! Platform backends implement [`platform::Platform`] and feed translated
//! events into a [`world::World`].

pub mod alloc;
pub mod blob;
pub mod config;
pub mod context;
pub mod error;
pub mod event;
pub mod geometry;
pub mod logging;
pub mod platform;
pub mod profiling;
pub mod queue;
pub mod timing;
pub mod utf8;
pub mod view;
pub mod world;

pub use error::{Error, HandlerError, HandlerResult, Result, Severity};
pub use event::{Event, EventType};
pub use platform::{Platform, WorldFlags, WorldType};
pub use view::{EventHandler, View, ViewCtx, ViewId};
pub use world::World;
