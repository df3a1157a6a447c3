use std::fmt;

use tessera_core::World;
use tessera_core::alloc::HashMap;
use tessera_core::config::{Config, ProfilingMode};
use tessera_core::error::{Error, Result};
use tessera_core::event::{ConfigureEvent, Event, EventType, ViewStyle};
use tessera_core::geometry::Rect;
use tessera_core::logging;
use tessera_core::profiling::{self, ProfilingBackend, profile_function};
use tessera_core::view::{EventHandler, ViewId};
pub use winit::error::EventLoopError;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::WindowId;

use crate::event::{Translation, translate};
use crate::platform::WinitPlatform;
use crate::time::FramePacer;
use crate::window::ViewDescriptor;

pub struct AppCtx<'a> {
    event_loop: &'a ActiveEventLoop,
    world: &'a mut World<WinitPlatform>,
    translations: &'a mut HashMap<ViewId, Translation>,
}

impl AppCtx<'_> {
    /// Creates a view with a native window and realizes it.
    ///
    /// The view receives a realize event right away, then an initial configure
    /// and a first expose once the loop goes idle.
    pub fn create_view<H>(&mut self, descriptor: &ViewDescriptor, handler: H) -> Result<ViewId>
    where
        H: EventHandler + 'static,
    {
        let window = descriptor
            .create_window(self.event_loop)
            .map_err(|err| Error::platform(err.to_string()))?;
        let window_id = window.id();
        let size = window.inner_size();
        let position = window.outer_position().unwrap_or_default();
        let frame = Rect::new(position.x, position.y, size.width, size.height);

        let id = self.world.create_view_with(handler, |view| {
            view.set_title(Some(descriptor.title.as_str()))?;
            view.set_default_size(descriptor.default_size);
            view.internals_mut().attach(window);
            view.post_redisplay();
            Ok(())
        })?;

        self.world.internals_mut().register(window_id, id);
        self.translations.insert(id, Translation::new(frame));

        self.world.dispatch_simple_event(id, EventType::Realize)?;
        self.world.post_event(
            id,
            Event::Configure(ConfigureEvent::new(frame, ViewStyle::MAPPED)),
        )?;

        tracing::debug!(view = ?id, window = ?window_id, "view realized");
        Ok(id)
    }

    /// Unrealizes and destroys a view, closing its window.
    pub fn destroy_view(&mut self, id: ViewId) -> Result<()> {
        let window_id = self
            .world
            .view(id)
            .and_then(|view| view.internals().window().map(|window| window.id()));
        if let Some(window_id) = window_id {
            self.world.internals_mut().unregister(window_id);
        }
        self.translations.remove(&id);
        self.world.destroy_view(id)
    }

    pub fn world(&self) -> &World<WinitPlatform> {
        self.world
    }

    pub fn world_mut(&mut self) -> &mut World<WinitPlatform> {
        self.world
    }

    pub fn view_for_window(&self, window: WindowId) -> Option<ViewId> {
        self.world.internals().view_for(window)
    }

    pub fn exit(&self) {
        self.event_loop.exit();
    }
}

pub trait App {
    /// Called once when the event loop starts. Create views here.
    fn on_start(&mut self, ctx: &mut AppCtx<'_>) -> Result<()>;

    /// Called after each batch of native events has been dispatched.
    #[allow(unused_variables)]
    fn idle(&mut self, ctx: &mut AppCtx<'_>) {}

    /// Called when the app is about to exit.
    #[allow(unused_variables)]
    fn on_exit(&mut self, ctx: &mut AppCtx<'_>) {}
}

pub type AppFactory = fn() -> Box<dyn App>;

/// Why [`run_app`] stopped abnormally.
#[derive(Debug)]
pub enum AppError {
    EventLoop(EventLoopError),
    World(Error),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::EventLoop(err) => write!(f, "Event loop failed: {}", err),
            AppError::World(err) => write!(f, "World failed: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::EventLoop(err) => Some(err),
            AppError::World(err) => Some(err),
        }
    }
}

impl From<EventLoopError> for AppError {
    fn from(err: EventLoopError) -> Self {
        AppError::EventLoop(err)
    }
}

impl From<Error> for AppError {
    fn from(err: Error) -> Self {
        AppError::World(err)
    }
}

struct AppProxy {
    app: Box<dyn App>,
    world: World<WinitPlatform>,
    translations: HashMap<ViewId, Translation>,
    pacer: FramePacer,
    started: bool,
    failure: Option<Error>,
}

impl AppProxy {
    fn with_ctx<R>(
        &mut self,
        event_loop: &ActiveEventLoop,
        f: impl FnOnce(&mut dyn App, &mut AppCtx<'_>) -> R,
    ) -> R {
        let mut ctx = AppCtx {
            event_loop,
            world: &mut self.world,
            translations: &mut self.translations,
        };
        f(self.app.as_mut(), &mut ctx)
    }

    /// Handles the outcome of a dispatch. Returns false once the loop is stopping.
    fn check(&mut self, event_loop: &ActiveEventLoop, result: Result<()>) -> bool {
        match result {
            Ok(()) => true,
            Err(Error::Handler(err)) if err.is_fatal() => {
                tracing::info!("Exit requested by handler: {}", err.message);
                event_loop.exit();
                false
            }
            Err(err) if err.is_fatal() => {
                tracing::error!(%err, "stopping event loop");
                self.failure.get_or_insert(err);
                event_loop.exit();
                false
            }
            Err(err) => {
                tracing::warn!(%err, "event dispatch failed");
                true
            }
        }
    }

    /// Sends update, delivers anything still queued, then exposes the view.
    fn redraw(&mut self, event_loop: &ActiveEventLoop, view: ViewId) {
        profile_function!();
        self.pacer.begin_update(self.world.time());

        let result = self.world.dispatch_simple_event(view, EventType::Update);
        if !self.check(event_loop, result) {
            return;
        }
        let result = self.world.flush(view);
        if !self.check(event_loop, result) {
            return;
        }

        let Some(translation) = self.translations.get(&view) else {
            return;
        };
        for event in translate(&WindowEvent::RedrawRequested, translation) {
            let result = self.world.dispatch_event(view, &event);
            if !self.check(event_loop, result) {
                return;
            }
        }

        let now = self.world.time();
        self.pacer.end_frame(now);
        self.pacer.report_fps(now);
    }

    /// Requests redraws for views that asked for one, once the pacer allows it.
    fn schedule_redraws(&mut self, event_loop: &ActiveEventLoop) {
        let pending: Vec<ViewId> = self
            .world
            .views()
            .filter(|(_, view)| view.redisplay_requested())
            .map(|(id, _)| id)
            .collect();

        if pending.is_empty() {
            event_loop.set_control_flow(ControlFlow::Wait);
            return;
        }

        let now = self.world.time();
        if !self.pacer.wait_time(now).is_zero() {
            let deadline = self.pacer.next_deadline(self.world.clock(), now);
            event_loop.set_control_flow(ControlFlow::WaitUntil(deadline));
            return;
        }

        for id in pending {
            if let Some(view) = self.world.view_mut(id) {
                view.take_redisplay();
                if let Some(window) = view.internals().window() {
                    window.request_redraw();
                }
            }
        }
        event_loop.set_control_flow(ControlFlow::Wait);
    }
}

impl winit::application::ApplicationHandler for AppProxy {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.started {
            return;
        }
        self.started = true;

        let result = self.with_ctx(event_loop, |app, ctx| app.on_start(ctx));
        self.check(event_loop, result);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(view) = self.world.internals().view_for(window_id) else {
            return;
        };
        let Some(translation) = self.translations.get_mut(&view) else {
            return;
        };
        translation.time = self.world.time();
        translation.observe(&event);

        if let WindowEvent::RedrawRequested = event {
            self.redraw(event_loop, view);
            return;
        }

        for event in translate(&event, translation) {
            if let Err(err) = self.world.post_event(view, event) {
                tracing::warn!(%err, "dropping event for missing view");
            }
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        profiling::new_frame();

        let result = self.world.flush_all();
        if !self.check(event_loop, result) {
            return;
        }

        self.with_ctx(event_loop, |app, ctx| app.idle(ctx));
        self.schedule_redraws(event_loop);
    }

    fn exiting(&mut self, event_loop: &ActiveEventLoop) {
        self.with_ctx(event_loop, |app, ctx| app.on_exit(ctx));
    }
}

/// Runs the application until a handler asks to stop or a fatal error occurs.
///
/// Handlers stop the loop by returning a fatal
/// [`HandlerError`](tessera_core::HandlerError); that is a normal exit.
/// Logging is set up with [`logging::init`] unless a global subscriber
/// already exists.
pub fn run_app(config: Config, factory: AppFactory) -> std::result::Result<(), AppError> {
    // No-op when the application installed a subscriber first.
    logging::init();

    match config.profiling {
        ProfilingMode::Off => {}
        ProfilingMode::On => profiling::set_enabled(true),
        ProfilingMode::WithWebServer => profiling::init_profiling(ProfilingBackend::PuffinHttp),
    }

    let world = World::from_config(&config)?;
    let mut pacer = FramePacer::new(config.frame_period);
    if let Some(interval) = config.fps_report_interval {
        pacer = pacer.with_fps_report(interval);
    }

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut proxy = AppProxy {
        app: factory(),
        world,
        translations: HashMap::default(),
        pacer,
        started: false,
        failure: None,
    };
    event_loop.run_app(&mut proxy)?;

    match proxy.failure.take() {
        Some(err) => Err(AppError::World(err)),
        None => Ok(()),
    }
}
