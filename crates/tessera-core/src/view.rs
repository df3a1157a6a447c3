//! Views and the event dispatcher.
//!
//! A [`View`] is one on-screen surface. Its dispatcher routes every generic
//! event to the application handler and guarantees that configure and expose
//! are only ever delivered inside the view's graphics context.

use std::mem::ManuallyDrop;

use crate::alloc::slots::SlotKey;
use crate::blob::{Clipboard, set_string};
use crate::context::{ContextGuard, ContextState, close_scope};
use crate::error::{Error, HandlerResult, Result};
use crate::event::{ConfigureEvent, Event, EventType, ExposeEvent, Modifiers, ViewStyle};
use crate::geometry::{Rect, Size};
use crate::platform::Platform;
use crate::profiling::profile_function;
use crate::queue::{EventQueue, EventStats};

/// Handle to a view owned by a [`World`](crate::world::World).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ViewId(pub(crate) SlotKey);

/// Lifecycle stage of a view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ViewStage {
    /// Internals exist but there is no native window.
    #[default]
    Allocated,
    /// The native window exists but has not been configured yet.
    Realized,
    /// At least one configure has been delivered.
    Configured,
}

/// Mouse cursor shape shown over a view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Cursor {
    #[default]
    Arrow,
    Caret,
    Crosshair,
    Hand,
    NotAllowed,
    LeftRight,
    UpDown,
    UpLeftDownRight,
    UpRightDownLeft,
    AllScroll,
}

/// Platform-independent state of a view.
#[derive(Debug, Default)]
pub struct ViewState {
    frame: Rect,
    default_size: Size<u32>,
    style: ViewStyle,
    stage: ViewStage,
    reshaped: bool,
    modifiers: Modifiers,
    pointer_tracked: bool,
    focused: bool,
    cursor: Cursor,
    title: Option<Box<str>>,
    last_configure: Option<ConfigureEvent>,
    clipboard: Clipboard,
    redisplay: bool,
}

impl ViewState {
    pub fn frame(&self) -> Rect {
        self.frame
    }

    pub fn default_size(&self) -> Size<u32> {
        self.default_size
    }

    pub fn style(&self) -> ViewStyle {
        self.style
    }

    pub fn stage(&self) -> ViewStage {
        self.stage
    }

    /// A configure was delivered that no expose has confirmed yet.
    pub fn is_reshaped(&self) -> bool {
        self.reshaped
    }

    /// Modifier keys held as of the last input event.
    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    /// The pointer is inside the view.
    pub fn is_pointer_tracked(&self) -> bool {
        self.pointer_tracked
    }

    pub fn has_focus(&self) -> bool {
        self.focused
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn redisplay_requested(&self) -> bool {
        self.redisplay
    }

    pub fn internal_clipboard(&self) -> Option<(&str, &[u8])> {
        self.clipboard.get()
    }

    /// Records state carried by events that do not need the graphics context.
    fn observe(&mut self, event: &Event) {
        if let Some(modifiers) = event.modifiers() {
            self.modifiers = modifiers;
        }

        match event {
            Event::Realize => {
                if self.stage == ViewStage::Allocated {
                    self.stage = ViewStage::Realized;
                }
            }
            Event::Unrealize => {
                self.stage = ViewStage::Allocated;
                self.last_configure = None;
                self.pointer_tracked = false;
                self.focused = false;
            }
            Event::FocusIn(_) => self.focused = true,
            Event::FocusOut(_) => self.focused = false,
            Event::PointerIn(_) => self.pointer_tracked = true,
            Event::PointerOut(_) => self.pointer_tracked = false,
            _ => {}
        }
    }
}

/// What an event handler can see and do while handling an event.
pub struct ViewCtx<'a> {
    state: &'a mut ViewState,
}

impl ViewCtx<'_> {
    pub fn state(&self) -> &ViewState {
        self.state
    }

    /// Asks for the whole view to be exposed again.
    pub fn post_redisplay(&mut self) {
        self.state.redisplay = true;
    }

    /// Stores data in the view's internal clipboard.
    pub fn set_internal_clipboard(&mut self, mime_type: &str, data: &[u8]) -> Result<()> {
        self.state.clipboard.set(mime_type, data)
    }
}

/// Receives every event dispatched to a view.
pub trait EventHandler {
    fn on_event(&mut self, ctx: &mut ViewCtx<'_>, event: &Event) -> HandlerResult;
}

impl<F> EventHandler for F
where
    F: FnMut(&mut ViewCtx<'_>, &Event) -> HandlerResult,
{
    fn on_event(&mut self, ctx: &mut ViewCtx<'_>, event: &Event) -> HandlerResult {
        self(ctx, event)
    }
}

pub struct View<P: Platform> {
    state: ViewState,
    internals: ManuallyDrop<P::ViewInternals>,
    handler: Box<dyn EventHandler>,
    queue: EventQueue,
    pub(crate) context: ContextState,
}

impl<P: Platform> View<P> {
    pub(crate) fn new(internals: P::ViewInternals, handler: Box<dyn EventHandler>) -> Self {
        Self {
            state: ViewState::default(),
            internals: ManuallyDrop::new(internals),
            handler,
            queue: EventQueue::new(),
            context: ContextState::Idle,
        }
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn frame(&self) -> Rect {
        self.state.frame
    }

    pub fn is_reshaped(&self) -> bool {
        self.state.reshaped
    }

    pub fn modifiers(&self) -> Modifiers {
        self.state.modifiers
    }

    pub fn is_pointer_tracked(&self) -> bool {
        self.state.pointer_tracked
    }

    pub fn stage(&self) -> ViewStage {
        self.state.stage
    }

    pub fn in_context(&self) -> bool {
        self.context == ContextState::Entered
    }

    pub fn internals(&self) -> &P::ViewInternals {
        &self.internals
    }

    pub fn internals_mut(&mut self) -> &mut P::ViewInternals {
        &mut self.internals
    }

    pub fn cursor(&self) -> Cursor {
        self.state.cursor
    }

    pub fn set_cursor(&mut self, cursor: Cursor) {
        self.state.cursor = cursor;
    }

    pub fn title(&self) -> Option<&str> {
        self.state.title()
    }

    pub fn set_title(&mut self, title: Option<&str>) -> Result<()> {
        set_string(&mut self.state.title, title)
    }

    /// Size used before the first configure.
    pub fn set_default_size(&mut self, size: Size<u32>) {
        self.state.default_size = size;
        if self.state.stage != ViewStage::Configured {
            self.state.frame.width = size.width;
            self.state.frame.height = size.height;
        }
    }

    pub fn post_redisplay(&mut self) {
        self.state.redisplay = true;
    }

    pub fn redisplay_requested(&self) -> bool {
        self.state.redisplay
    }

    /// Returns and clears the pending redisplay request.
    pub fn take_redisplay(&mut self) -> bool {
        std::mem::take(&mut self.state.redisplay)
    }

    pub fn set_internal_clipboard(&mut self, mime_type: &str, data: &[u8]) -> Result<()> {
        self.state.clipboard.set(mime_type, data)
    }

    pub fn internal_clipboard(&self) -> Option<(&str, &[u8])> {
        self.state.clipboard.get()
    }

    /// Enters the graphics context outside of event delivery.
    pub fn enter_context(&mut self) -> Result<ContextGuard<'_, P>> {
        ContextGuard::enter(self, None)
    }

    /// Dispatches an event that carries nothing but its type.
    pub fn dispatch_simple_event(&mut self, event_type: EventType) -> Result<()> {
        self.dispatch_event(&Event::simple(event_type))
    }

    /// Dispatches `event`, entering the graphics context for configure and expose.
    ///
    /// Every other type goes straight to the handler. A handler failure is
    /// returned after the context has been left; if leaving fails as well, the
    /// handler failure wins.
    pub fn dispatch_event(&mut self, event: &Event) -> Result<()> {
        profile_function!();
        tracing::trace!(event_type = ?event.event_type(), "dispatching event");

        match event {
            Event::Nothing => Ok(()),

            Event::Configure(configure) => {
                if self.in_context() {
                    return Err(self.invalid_state(
                        "dispatch_event",
                        "configure dispatched while the graphics context is entered",
                    ));
                }
                let mut guard = ContextGuard::enter(self, None)?;
                let status = guard.configure(configure);
                close_scope(guard, status)
            }

            Event::Expose(expose) => {
                if self.in_context() {
                    return Err(self.invalid_state(
                        "dispatch_event",
                        "expose dispatched while the graphics context is entered",
                    ));
                }
                let mut guard = ContextGuard::enter(self, Some(*expose))?;
                let status = guard.expose(expose);
                close_scope(guard, status)
            }

            _ => {
                self.state.observe(event);
                self.deliver(event)
            }
        }
    }

    /// Processes a configure while already inside the graphics context.
    ///
    /// Stores the new frame and marks the view reshaped before forwarding. A
    /// configure identical to the last delivered one is dropped.
    pub fn configure(&mut self, event: &ConfigureEvent) -> Result<()> {
        if !self.in_context() {
            return Err(self.invalid_state("configure", "graphics context is not entered"));
        }

        if self.state.stage == ViewStage::Configured && self.state.last_configure == Some(*event) {
            tracing::trace!("dropping redundant configure");
            return Ok(());
        }

        self.state.frame = event.frame();
        self.state.style = event.style;
        self.state.reshaped = true;
        self.state.stage = ViewStage::Configured;
        self.state.last_configure = Some(*event);

        self.deliver(&Event::Configure(*event))
    }

    /// Processes an expose while already inside the graphics context.
    ///
    /// Empty regions are dropped. Otherwise the event is forwarded and the
    /// pending reshape, if any, is considered seen.
    pub fn expose(&mut self, event: &ExposeEvent) -> Result<()> {
        if !self.in_context() {
            return Err(self.invalid_state("expose", "graphics context is not entered"));
        }

        if event.is_empty() {
            tracing::trace!("dropping empty expose");
            return Ok(());
        }

        if self.state.stage != ViewStage::Configured {
            tracing::warn!("expose delivered to a view that was never configured");
        }

        let status = self.deliver(&Event::Expose(*event));
        self.state.reshaped = false;
        self.state.redisplay = false;
        status
    }

    /// Queues `event` for coalesced delivery on the next [`flush`](Self::flush).
    pub fn post_event(&mut self, event: Event) {
        self.queue.push(event);
    }

    pub fn has_queued_events(&self) -> bool {
        !self.queue.is_empty()
    }

    pub fn queue_stats(&self) -> &EventStats {
        self.queue.stats()
    }

    /// Dispatches every queued event.
    ///
    /// Recoverable failures are logged and delivery continues. A fatal failure
    /// stops delivery; the rest of the batch is discarded and the error returned.
    pub fn flush(&mut self) -> Result<()> {
        profile_function!();
        let batch = self.queue.drain();
        let total = batch.len();

        for (delivered, event) in batch.into_iter().enumerate() {
            match self.dispatch_event(&event) {
                Ok(()) => {}
                Err(err) if err.is_fatal() => {
                    let discarded = total - delivered - 1;
                    if discarded > 0 {
                        tracing::warn!(discarded, "discarding queued events after fatal error");
                    }
                    return Err(err);
                }
                Err(err) => {
                    tracing::warn!(%err, event_type = ?event.event_type(), "event dispatch failed");
                }
            }
        }

        Ok(())
    }

    fn deliver(&mut self, event: &Event) -> Result<()> {
        let mut ctx = ViewCtx {
            state: &mut self.state,
        };
        self.handler.on_event(&mut ctx, event).map_err(Error::Handler)
    }

    pub(crate) fn invalid_state(&self, operation: &'static str, reason: &'static str) -> Error {
        tracing::error!(operation, reason, "invalid view state, this is a platform glue bug");
        Error::InvalidState { operation, reason }
    }
}

impl<P: Platform> Drop for View<P> {
    fn drop(&mut self) {
        // SAFETY: `internals` is never touched again after this point.
        let internals = unsafe { ManuallyDrop::take(&mut self.internals) };
        P::free_view_internals(internals);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HandlerError;
    use crate::event::{CrossingEvent, KeyEvent};
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Counts context transitions without any native state.
    struct CountingPlatform;

    #[derive(Default)]
    struct Counters {
        enters: usize,
        leaves: usize,
        fail_enter: bool,
    }

    impl Platform for CountingPlatform {
        type WorldInternals = ();
        type ViewInternals = Counters;

        fn init_world_internals(
            _: crate::platform::WorldType,
            _: crate::platform::WorldFlags,
        ) -> Result<()> {
            Ok(())
        }

        fn init_view_internals(_: &mut ()) -> Result<Counters> {
            Ok(Counters::default())
        }

        fn enter(view: &mut Counters, _: Option<&ExposeEvent>) -> Result<()> {
            if view.fail_enter {
                return Err(Error::context(crate::error::ContextStage::Enter, "refused"));
            }
            view.enters += 1;
            Ok(())
        }

        fn leave(view: &mut Counters, _: Option<&ExposeEvent>) -> Result<()> {
            view.leaves += 1;
            Ok(())
        }
    }

    fn view_with<H: EventHandler + 'static>(handler: H) -> View<CountingPlatform> {
        View::new(Counters::default(), Box::new(handler))
    }

    fn recording_view() -> (View<CountingPlatform>, Rc<RefCell<Vec<Event>>>) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let view = view_with(move |_: &mut ViewCtx<'_>, event: &Event| -> HandlerResult {
            sink.borrow_mut().push(event.clone());
            Ok(())
        });
        (view, seen)
    }

    fn configure(width: u32, height: u32) -> Event {
        Event::Configure(ConfigureEvent::new(
            Rect::new(0, 0, width, height),
            ViewStyle::MAPPED,
        ))
    }

    fn expose() -> Event {
        Event::Expose(ExposeEvent::new(Rect::new(0, 0, 10, 10)))
    }

    #[test]
    fn test_configure_updates_frame_and_reshapes() {
        let (mut view, seen) = recording_view();
        view.dispatch_event(&configure(640, 480)).unwrap();

        assert_eq!(view.frame(), Rect::new(0, 0, 640, 480));
        assert!(view.is_reshaped());
        assert_eq!(view.stage(), ViewStage::Configured);
        assert_eq!(seen.borrow().len(), 1);
        assert_eq!(view.internals().enters, 1);
        assert_eq!(view.internals().leaves, 1);
    }

    #[test]
    fn test_expose_clears_reshape() {
        let (mut view, _) = recording_view();
        view.dispatch_event(&configure(640, 480)).unwrap();
        view.dispatch_event(&configure(800, 600)).unwrap();
        assert!(view.is_reshaped());

        view.dispatch_event(&expose()).unwrap();
        assert!(!view.is_reshaped());
    }

    #[test]
    fn test_configure_outside_context_fails() {
        let (mut view, seen) = recording_view();
        let Event::Configure(event) = configure(1, 1) else {
            unreachable!()
        };
        let err = view.configure(&event).unwrap_err();
        assert!(matches!(err, Error::InvalidState { operation: "configure", .. }));
        assert!(seen.borrow().is_empty());
        assert!(!view.is_reshaped());
    }

    #[test]
    fn test_expose_outside_context_fails() {
        let (mut view, _) = recording_view();
        let err = view
            .expose(&ExposeEvent::new(Rect::new(0, 0, 1, 1)))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidState { operation: "expose", .. }));
    }

    #[test]
    fn test_redundant_configure_is_dropped() {
        let (mut view, seen) = recording_view();
        view.dispatch_event(&configure(640, 480)).unwrap();
        view.dispatch_event(&expose()).unwrap();
        view.dispatch_event(&configure(640, 480)).unwrap();

        assert!(!view.is_reshaped());
        assert_eq!(seen.borrow().len(), 2);
        // The context is still entered and left for the dropped configure.
        assert_eq!(view.internals().enters, 3);
        assert_eq!(view.internals().leaves, 3);
    }

    #[test]
    fn test_empty_expose_is_dropped() {
        let (mut view, seen) = recording_view();
        view.dispatch_event(&configure(640, 480)).unwrap();
        view.dispatch_event(&Event::Expose(ExposeEvent::default())).unwrap();

        assert!(view.is_reshaped());
        assert_eq!(seen.borrow().len(), 1);
    }

    #[test]
    fn test_close_skips_context() {
        let (mut view, seen) = recording_view();
        view.dispatch_simple_event(EventType::Close).unwrap();

        assert_eq!(view.internals().enters, 0);
        assert_eq!(*seen.borrow(), vec![Event::Close]);
    }

    #[test]
    fn test_nothing_is_ignored() {
        let (mut view, seen) = recording_view();
        view.dispatch_event(&Event::Nothing).unwrap();
        assert!(seen.borrow().is_empty());
    }

    #[test]
    fn test_handler_failure_still_leaves() {
        let mut view = view_with(|_: &mut ViewCtx<'_>, _: &Event| -> HandlerResult {
            Err(HandlerError::recoverable("nope"))
        });
        let err = view.dispatch_event(&configure(10, 10)).unwrap_err();

        assert!(matches!(err, Error::Handler(_)));
        assert_eq!(view.internals().enters, 1);
        assert_eq!(view.internals().leaves, 1);
        assert!(!view.in_context());
    }

    #[test]
    fn test_enter_failure_leaves_view_idle() {
        let (mut view, seen) = recording_view();
        view.internals_mut().fail_enter = true;

        let err = view.dispatch_event(&expose()).unwrap_err();
        assert!(matches!(err, Error::Context { .. }));
        assert!(!view.in_context());
        assert_eq!(view.internals().leaves, 0);
        assert!(seen.borrow().is_empty());
    }

    #[test]
    fn test_reentrant_dispatch_is_rejected() {
        let (mut view, seen) = recording_view();
        let mut guard = view.enter_context().unwrap();

        let err = guard.dispatch_event(&configure(5, 5)).unwrap_err();
        assert!(matches!(err, Error::InvalidState { .. }));

        guard.expose(&ExposeEvent::new(Rect::new(0, 0, 5, 5))).unwrap();
        guard.finish().unwrap();

        assert_eq!(seen.borrow().len(), 1);
        assert_eq!(view.internals().enters, 1);
        assert_eq!(view.internals().leaves, 1);
    }

    #[test]
    fn test_guard_keeps_expose_region() {
        let (mut view, seen) = recording_view();
        let region = ExposeEvent::new(Rect::new(2, 3, 4, 5));

        let mut guard = ContextGuard::enter(&mut view, Some(region)).unwrap();
        assert_eq!(guard.expose_region(), Some(&region));
        guard.expose(&region).unwrap();
        guard.finish().unwrap();

        assert_eq!(seen.borrow().as_slice(), &[Event::Expose(region)]);
        assert!(view.enter_context().unwrap().expose_region().is_none());
    }

    #[test]
    fn test_input_updates_state() {
        let (mut view, _) = recording_view();
        view.dispatch_event(&Event::PointerIn(CrossingEvent::default()))
            .unwrap();
        assert!(view.is_pointer_tracked());

        view.dispatch_event(&Event::KeyPress(KeyEvent {
            state: Modifiers::SHIFT,
            ..Default::default()
        }))
        .unwrap();
        assert_eq!(view.modifiers(), Modifiers::SHIFT);

        view.dispatch_event(&Event::PointerOut(CrossingEvent::default()))
            .unwrap();
        assert!(!view.is_pointer_tracked());
        assert_eq!(view.modifiers(), Modifiers::empty());
    }

    #[test]
    fn test_handler_can_post_redisplay_and_copy() {
        let mut view = view_with(|ctx: &mut ViewCtx<'_>, event: &Event| -> HandlerResult {
            if let Event::KeyPress(_) = event {
                ctx.post_redisplay();
                ctx.set_internal_clipboard("text/plain", b"copied")
                    .map_err(|e| HandlerError::recoverable(e.to_string()))?;
            }
            Ok(())
        });

        view.dispatch_simple_event(EventType::KeyPress).unwrap();
        assert!(view.redisplay_requested());
        assert_eq!(
            view.internal_clipboard(),
            Some(("text/plain", &b"copied"[..]))
        );
        assert!(view.take_redisplay());
        assert!(!view.redisplay_requested());
    }

    #[test]
    fn test_flush_coalesces() {
        let (mut view, seen) = recording_view();
        view.post_event(configure(100, 100));
        view.post_event(configure(200, 200));
        view.post_event(expose());
        view.post_event(expose());
        view.flush().unwrap();

        let types: Vec<_> = seen.borrow().iter().map(Event::event_type).collect();
        assert_eq!(types, vec![EventType::Configure, EventType::Expose]);
        assert_eq!(view.frame(), Rect::new(0, 0, 200, 200));
        assert!(!view.is_reshaped());
        assert!(!view.has_queued_events());
    }

    #[test]
    fn test_flush_stops_on_fatal() {
        let seen = Rc::new(RefCell::new(0usize));
        let sink = seen.clone();
        let mut view = view_with(move |_: &mut ViewCtx<'_>, event: &Event| -> HandlerResult {
            *sink.borrow_mut() += 1;
            match event {
                Event::Close => Err(HandlerError::fatal("quit")),
                _ => Ok(()),
            }
        });

        view.post_event(Event::KeyPress(KeyEvent::default()));
        view.post_event(Event::Close);
        view.post_event(Event::KeyRelease(KeyEvent::default()));
        let err = view.flush().unwrap_err();
        assert!(err.is_fatal());
        // Input queued before the close is delivered; the release after it is discarded.
        assert_eq!(*seen.borrow(), 2);
        assert!(!view.has_queued_events());
    }

    #[test]
    fn test_title_and_cursor() {
        let (mut view, _) = recording_view();
        view.set_title(Some("Hello")).unwrap();
        assert_eq!(view.title(), Some("Hello"));
        view.set_title(None).unwrap();
        assert_eq!(view.title(), None);

        view.set_cursor(Cursor::Hand);
        assert_eq!(view.cursor(), Cursor::Hand);
    }
}
