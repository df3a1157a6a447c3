//! [`Platform`] implementation backed by winit windows.

use std::sync::Arc;

use tessera_core::alloc::HashMap;
use tessera_core::error::{ContextStage, Error, Result};
use tessera_core::event::ExposeEvent;
use tessera_core::platform::{Platform, WorldFlags, WorldType};
use tessera_core::view::ViewId;
use winit::window::{Window, WindowId};

/// Platform backend for winit.
///
/// winit owns no graphics context of its own, so entering only checks that
/// the view has a window. Leaving after an expose tells the windowing system
/// that a frame is about to be presented.
#[derive(Debug)]
pub struct WinitPlatform;

/// World internals: which view each native window belongs to.
#[derive(Debug, Default)]
pub struct WinitWorld {
    world_type: WorldType,
    flags: WorldFlags,
    views: HashMap<WindowId, ViewId>,
}

impl WinitWorld {
    pub fn world_type(&self) -> WorldType {
        self.world_type
    }

    pub fn flags(&self) -> WorldFlags {
        self.flags
    }

    pub fn register(&mut self, window: WindowId, view: ViewId) {
        self.views.insert(window, view);
    }

    pub fn unregister(&mut self, window: WindowId) -> Option<ViewId> {
        self.views.remove(&window)
    }

    pub fn view_for(&self, window: WindowId) -> Option<ViewId> {
        self.views.get(&window).copied()
    }
}

/// View internals: the native window, once realized.
#[derive(Debug, Default)]
pub struct WinitView {
    window: Option<Arc<Window>>,
    frames_presented: u64,
}

impl WinitView {
    pub fn window(&self) -> Option<&Arc<Window>> {
        self.window.as_ref()
    }

    pub fn attach(&mut self, window: Arc<Window>) {
        self.window = Some(window);
    }

    pub fn detach(&mut self) -> Option<Arc<Window>> {
        self.window.take()
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }
}

impl Platform for WinitPlatform {
    type WorldInternals = WinitWorld;
    type ViewInternals = WinitView;

    fn init_world_internals(world_type: WorldType, flags: WorldFlags) -> Result<WinitWorld> {
        if flags.contains(WorldFlags::THREADS) {
            tracing::debug!("winit delivers events on the main thread only, THREADS has no effect");
        }
        Ok(WinitWorld {
            world_type,
            flags,
            views: HashMap::default(),
        })
    }

    fn init_view_internals(_world: &mut WinitWorld) -> Result<WinitView> {
        Ok(WinitView::default())
    }

    fn free_view_internals(mut internals: WinitView) {
        if let Some(window) = internals.detach() {
            tracing::debug!(window = ?window.id(), "releasing native window");
        }
    }

    fn enter(view: &mut WinitView, _expose: Option<&ExposeEvent>) -> Result<()> {
        if view.window.is_none() {
            return Err(Error::context(ContextStage::Enter, "view has no native window"));
        }
        Ok(())
    }

    fn leave(view: &mut WinitView, expose: Option<&ExposeEvent>) -> Result<()> {
        let Some(window) = &view.window else {
            return Err(Error::context(ContextStage::Leave, "view has no native window"));
        };
        if expose.is_some() {
            window.pre_present_notify();
            view.frames_presented += 1;
        }
        Ok(())
    }
}
