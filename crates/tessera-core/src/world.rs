//! The world: owner of the platform's application state and of every view.

use std::mem::ManuallyDrop;
use std::time::Duration;

use crate::alloc::slots::SlotMap;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::event::{Event, EventType};
use crate::platform::{Platform, WorldFlags, WorldType};
use crate::profiling::profile_function;
use crate::timing::Clock;
use crate::view::{EventHandler, View, ViewId};

pub struct World<P: Platform> {
    world_type: WorldType,
    flags: WorldFlags,
    class_name: Option<String>,
    clock: Clock,
    views: SlotMap<View<P>>,
    internals: ManuallyDrop<P::WorldInternals>,
}

impl<P: Platform> World<P> {
    pub fn new(world_type: WorldType, flags: WorldFlags) -> Result<Self> {
        let internals = P::init_world_internals(world_type, flags)?;
        tracing::debug!(?world_type, ?flags, "world created");

        Ok(Self {
            world_type,
            flags,
            class_name: None,
            clock: Clock::new(),
            views: SlotMap::new(),
            internals: ManuallyDrop::new(internals),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let mut world = Self::new(config.world_type, config.world_flags)?;
        world.class_name = config.class_name.clone();
        Ok(world)
    }

    pub fn world_type(&self) -> WorldType {
        self.world_type
    }

    pub fn flags(&self) -> WorldFlags {
        self.flags
    }

    pub fn class_name(&self) -> Option<&str> {
        self.class_name.as_deref()
    }

    pub fn set_class_name(&mut self, name: impl Into<String>) {
        self.class_name = Some(name.into());
    }

    /// Seconds since the world was created, as a duration.
    pub fn time(&self) -> Duration {
        self.clock.now()
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    pub fn internals(&self) -> &P::WorldInternals {
        &self.internals
    }

    pub fn internals_mut(&mut self) -> &mut P::WorldInternals {
        &mut self.internals
    }

    /// Creates a view whose events are delivered to `handler`.
    pub fn create_view<H>(&mut self, handler: H) -> Result<ViewId>
    where
        H: EventHandler + 'static,
    {
        let internals = P::init_view_internals(&mut self.internals)?;
        let id = ViewId(self.views.insert(View::new(internals, Box::new(handler))));
        tracing::debug!(?id, "view created");
        Ok(id)
    }

    /// Creates a view and runs `setup` on it before handing out its id.
    ///
    /// If `setup` fails the view is freed again and the error returned, so a
    /// half-initialized view never stays in the world.
    pub fn create_view_with<H, F>(&mut self, handler: H, setup: F) -> Result<ViewId>
    where
        H: EventHandler + 'static,
        F: FnOnce(&mut View<P>) -> Result<()>,
    {
        let id = self.create_view(handler)?;
        let view = self.views.get_mut(id.0).ok_or(Error::UnknownView)?;
        if let Err(err) = setup(view) {
            self.views.remove(id.0);
            tracing::debug!(?id, %err, "view setup failed");
            return Err(err);
        }
        Ok(id)
    }

    /// Destroys a view and frees its internals.
    ///
    /// The view receives an unrealize event first if it was realized.
    pub fn destroy_view(&mut self, id: ViewId) -> Result<()> {
        let view = self.views.get_mut(id.0).ok_or(Error::UnknownView)?;
        if view.in_context() {
            return Err(view.invalid_state(
                "destroy_view",
                "view is inside its graphics context",
            ));
        }

        let status = if view.stage() != crate::view::ViewStage::Allocated {
            view.dispatch_simple_event(EventType::Unrealize)
        } else {
            Ok(())
        };

        self.views.remove(id.0);
        tracing::debug!(?id, "view destroyed");
        status
    }

    pub fn view(&self, id: ViewId) -> Option<&View<P>> {
        self.views.get(id.0)
    }

    pub fn view_mut(&mut self, id: ViewId) -> Option<&mut View<P>> {
        self.views.get_mut(id.0)
    }

    pub fn contains_view(&self, id: ViewId) -> bool {
        self.views.contains(id.0)
    }

    pub fn views(&self) -> impl Iterator<Item = (ViewId, &View<P>)> {
        self.views.iter().map(|(key, view)| (ViewId(key), view))
    }

    pub fn view_ids(&self) -> Vec<ViewId> {
        self.views.keys().map(ViewId).collect()
    }

    pub fn view_count(&self) -> usize {
        self.views.len()
    }

    /// Dispatches an event to a view immediately.
    pub fn dispatch_event(&mut self, id: ViewId, event: &Event) -> Result<()> {
        self.views
            .get_mut(id.0)
            .ok_or(Error::UnknownView)?
            .dispatch_event(event)
    }

    pub fn dispatch_simple_event(&mut self, id: ViewId, event_type: EventType) -> Result<()> {
        self.dispatch_event(id, &Event::simple(event_type))
    }

    /// Queues an event for a view, to be dispatched on the next flush.
    pub fn post_event(&mut self, id: ViewId, event: Event) -> Result<()> {
        self.views
            .get_mut(id.0)
            .ok_or(Error::UnknownView)?
            .post_event(event);
        Ok(())
    }

    pub fn flush(&mut self, id: ViewId) -> Result<()> {
        self.views.get_mut(id.0).ok_or(Error::UnknownView)?.flush()
    }

    /// Flushes every view's queue. Stops at the first fatal failure.
    pub fn flush_all(&mut self) -> Result<()> {
        profile_function!();
        for (key, view) in self.views.iter_mut() {
            if let Err(err) = view.flush() {
                if err.is_fatal() {
                    return Err(err);
                }
                tracing::warn!(view = ?ViewId(key), %err, "flush failed");
            }
        }
        Ok(())
    }
}

impl<P: Platform> Drop for World<P> {
    fn drop(&mut self) {
        let count = self.views.len();
        for view in self.views.drain() {
            drop(view);
        }
        // SAFETY: `internals` is never touched again after this point.
        let internals = unsafe { ManuallyDrop::take(&mut self.internals) };
        P::free_world_internals(internals);
        tracing::debug!(views = count, "world destroyed");
    }
}
