//! The contract every platform backend implements.
//!
//! A backend owns the native application and window handles. The core only
//! ever touches them through this trait: to create and free the per-world and
//! per-view internals, and to enter and leave the graphics context around
//! configure and expose delivery.

use crate::error::Result;
use crate::event::ExposeEvent;

/// What kind of program owns the world.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum WorldType {
    /// A standalone application that owns the process event loop.
    #[default]
    Program,
    /// A plugin or module embedded in some host application.
    Module,
}

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct WorldFlags: u32 {
        /// Set up the native system for use from multiple threads.
        const THREADS = 1 << 0;
    }
}

/// Platform internals, implemented once per native windowing system.
///
/// All methods are called from the thread driving the world. Backends that
/// receive native notifications on other threads must marshal them onto that
/// thread before dispatching.
pub trait Platform: Sized + 'static {
    /// Native application state shared by every view of a world.
    type WorldInternals;
    /// Native window state of a single view.
    type ViewInternals;

    fn init_world_internals(
        world_type: WorldType,
        flags: WorldFlags,
    ) -> Result<Self::WorldInternals>;

    /// Releases world internals. Every view has been freed already.
    fn free_world_internals(internals: Self::WorldInternals) {
        drop(internals);
    }

    fn init_view_internals(world: &mut Self::WorldInternals) -> Result<Self::ViewInternals>;

    fn free_view_internals(internals: Self::ViewInternals) {
        drop(internals);
    }

    /// Makes the view's graphics context current.
    ///
    /// `expose` is set when the context is entered to draw.
    fn enter(view: &mut Self::ViewInternals, expose: Option<&ExposeEvent>) -> Result<()>;

    /// Releases the view's graphics context, presenting if `expose` is set.
    fn leave(view: &mut Self::ViewInternals, expose: Option<&ExposeEvent>) -> Result<()>;
}
