//! Mock platform backend for testing.
//!
//! [`MockPlatform`] has no native windows. Every call the core makes into it
//! is recorded by a [`ContextMonitor`] shared between the world and its views,
//! and context depth is tracked per view so tests can assert that entering and
//! leaving stay balanced.

use std::sync::Arc;

use parking_lot::Mutex;
use tessera_core::error::{ContextStage, Error, HandlerError, HandlerResult, Result, Severity};
use tessera_core::event::{Event, EventType, ExposeEvent};
use tessera_core::geometry::Rect;
use tessera_core::platform::{Platform, WorldFlags, WorldType};
use tessera_core::view::{EventHandler, ViewCtx};

/// Records a platform call for verification in tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformCall {
    InitWorld {
        world_type: WorldType,
        flags: WorldFlags,
    },
    FreeWorld,
    InitView {
        view: usize,
    },
    FreeView {
        view: usize,
    },
    Enter {
        view: usize,
        expose: Option<Rect>,
    },
    Leave {
        view: usize,
        expose: Option<Rect>,
    },
}

#[derive(Debug, Default)]
struct MonitorState {
    calls: Vec<PlatformCall>,
    depths: Vec<u32>,
    max_depth: u32,
    violations: Vec<String>,
}

impl MonitorState {
    fn violation(&mut self, message: String) {
        tracing::error!("{}", message);
        self.violations.push(message);
    }
}

/// Shared log of everything a [`MockPlatform`] world was asked to do.
///
/// Cloning is cheap; every clone observes the same log.
#[derive(Debug, Clone, Default)]
pub struct ContextMonitor {
    state: Arc<Mutex<MonitorState>>,
}

impl ContextMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every recorded call, in order.
    pub fn calls(&self) -> Vec<PlatformCall> {
        self.state.lock().calls.clone()
    }

    pub fn enter_count(&self) -> usize {
        self.count(|call| matches!(call, PlatformCall::Enter { .. }))
    }

    pub fn leave_count(&self) -> usize {
        self.count(|call| matches!(call, PlatformCall::Leave { .. }))
    }

    /// Current context depth of a view.
    pub fn depth(&self, view: usize) -> u32 {
        self.state.lock().depths.get(view).copied().unwrap_or(0)
    }

    /// Whether any view is inside its graphics context right now.
    pub fn any_entered(&self) -> bool {
        self.state.lock().depths.iter().any(|&depth| depth > 0)
    }

    /// Deepest nesting seen for any view. Anything above one is a bug.
    pub fn max_depth(&self) -> u32 {
        self.state.lock().max_depth
    }

    /// Nesting errors observed so far: leaves without an enter, nested enters,
    /// and views freed while entered.
    pub fn violations(&self) -> Vec<String> {
        self.state.lock().violations.clone()
    }

    /// No view is entered and no violation was seen.
    pub fn is_balanced(&self) -> bool {
        let state = self.state.lock();
        state.violations.is_empty() && state.depths.iter().all(|&depth| depth == 0)
    }

    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    fn count(&self, predicate: impl Fn(&PlatformCall) -> bool) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|call| predicate(call))
            .count()
    }

    fn record(&self, call: PlatformCall) {
        self.state.lock().calls.push(call);
    }

    fn register_view(&self) -> usize {
        let mut state = self.state.lock();
        let view = state.depths.len();
        state.depths.push(0);
        state.calls.push(PlatformCall::InitView { view });
        view
    }

    fn free_view(&self, view: usize) {
        let mut state = self.state.lock();
        if state.depths.get(view).copied().unwrap_or(0) != 0 {
            state.violation(format!("view {view} freed inside its graphics context"));
        }
        state.calls.push(PlatformCall::FreeView { view });
    }

    fn enter(&self, view: usize, expose: Option<Rect>) {
        let mut state = self.state.lock();
        state.calls.push(PlatformCall::Enter { view, expose });
        let depth = {
            let depth = &mut state.depths[view];
            *depth += 1;
            *depth
        };
        state.max_depth = state.max_depth.max(depth);
        if depth > 1 {
            state.violation(format!("view {view} entered at depth {depth}"));
        }
    }

    fn leave(&self, view: usize, expose: Option<Rect>) {
        let mut state = self.state.lock();
        state.calls.push(PlatformCall::Leave { view, expose });
        if state.depths[view] == 0 {
            state.violation(format!("view {view} left without entering"));
        } else {
            state.depths[view] -= 1;
        }
    }
}

/// Headless platform backend that records instead of drawing.
#[derive(Debug)]
pub struct MockPlatform;

/// World internals of [`MockPlatform`].
#[derive(Debug)]
pub struct MockWorld {
    monitor: ContextMonitor,
}

impl MockWorld {
    pub fn monitor(&self) -> &ContextMonitor {
        &self.monitor
    }
}

/// View internals of [`MockPlatform`].
#[derive(Debug)]
pub struct MockView {
    index: usize,
    monitor: ContextMonitor,
    fail_enter: Option<String>,
    fail_leave: Option<String>,
}

impl MockView {
    /// Index of this view in the monitor's log.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn monitor(&self) -> &ContextMonitor {
        &self.monitor
    }

    /// Makes the next enter fail with `message`.
    pub fn fail_next_enter(&mut self, message: impl Into<String>) {
        self.fail_enter = Some(message.into());
    }

    /// Makes the next leave fail with `message`. The context is still released.
    pub fn fail_next_leave(&mut self, message: impl Into<String>) {
        self.fail_leave = Some(message.into());
    }
}

impl Platform for MockPlatform {
    type WorldInternals = MockWorld;
    type ViewInternals = MockView;

    fn init_world_internals(world_type: WorldType, flags: WorldFlags) -> Result<MockWorld> {
        let monitor = ContextMonitor::new();
        monitor.record(PlatformCall::InitWorld { world_type, flags });
        Ok(MockWorld { monitor })
    }

    fn free_world_internals(internals: MockWorld) {
        internals.monitor.record(PlatformCall::FreeWorld);
    }

    fn init_view_internals(world: &mut MockWorld) -> Result<MockView> {
        let index = world.monitor.register_view();
        Ok(MockView {
            index,
            monitor: world.monitor.clone(),
            fail_enter: None,
            fail_leave: None,
        })
    }

    fn free_view_internals(internals: MockView) {
        internals.monitor.free_view(internals.index);
    }

    fn enter(view: &mut MockView, expose: Option<&ExposeEvent>) -> Result<()> {
        if let Some(message) = view.fail_enter.take() {
            return Err(Error::context(ContextStage::Enter, message));
        }
        view.monitor.enter(view.index, expose.map(ExposeEvent::region));
        Ok(())
    }

    fn leave(view: &mut MockView, expose: Option<&ExposeEvent>) -> Result<()> {
        view.monitor.leave(view.index, expose.map(ExposeEvent::region));
        match view.fail_leave.take() {
            Some(message) => Err(Error::context(ContextStage::Leave, message)),
            None => Ok(()),
        }
    }
}

/// One event as seen by a [`RecordingHandler`].
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub event: Event,
    /// A graphics context was entered when the event arrived.
    pub in_context: bool,
    /// The view's reshaped flag at the time of delivery.
    pub reshaped: bool,
}

#[derive(Debug, Default)]
struct HandlerState {
    deliveries: Vec<Delivery>,
    failures: Vec<(EventType, Severity)>,
}

/// Event handler that records every delivery.
///
/// Clones share the same record, so keep one clone in the test and hand the
/// other to [`World::create_view`](tessera_core::World::create_view).
#[derive(Debug, Clone)]
pub struct RecordingHandler {
    monitor: ContextMonitor,
    state: Arc<Mutex<HandlerState>>,
}

impl RecordingHandler {
    pub fn new(monitor: ContextMonitor) -> Self {
        Self {
            monitor,
            state: Arc::default(),
        }
    }

    /// Makes the handler fail every event of `event_type`.
    pub fn fail_on(&self, event_type: EventType, severity: Severity) {
        self.state.lock().failures.push((event_type, severity));
    }

    pub fn deliveries(&self) -> Vec<Delivery> {
        self.state.lock().deliveries.clone()
    }

    pub fn event_types(&self) -> Vec<EventType> {
        self.state
            .lock()
            .deliveries
            .iter()
            .map(|delivery| delivery.event.event_type())
            .collect()
    }

    pub fn clear(&self) {
        self.state.lock().deliveries.clear();
    }
}

impl EventHandler for RecordingHandler {
    fn on_event(&mut self, ctx: &mut ViewCtx<'_>, event: &Event) -> HandlerResult {
        let mut state = self.state.lock();
        state.deliveries.push(Delivery {
            event: event.clone(),
            in_context: self.monitor.any_entered(),
            reshaped: ctx.state().is_reshaped(),
        });

        let event_type = event.event_type();
        match state.failures.iter().find(|(ty, _)| *ty == event_type) {
            Some((_, Severity::Fatal)) => Err(HandlerError::fatal(format!("{event_type:?} refused"))),
            Some((_, Severity::Recoverable)) => {
                Err(HandlerError::recoverable(format!("{event_type:?} refused")))
            }
            None => Ok(()),
        }
    }
}
