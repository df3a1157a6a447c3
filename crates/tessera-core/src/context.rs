//! Scoped graphics-context entry.
//!
//! A [`ContextGuard`] is the only way the dispatcher enters a view's graphics
//! context. The context is left exactly once: explicitly through
//! [`ContextGuard::finish`], or on drop if a scope ends early.

use std::ops::{Deref, DerefMut};

use crate::error::Result;
use crate::event::ExposeEvent;
use crate::platform::Platform;
use crate::profiling::profile_function;
use crate::view::View;

/// Whether a view is currently inside its graphics context.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ContextState {
    #[default]
    Idle,
    Entered,
}

/// Holds a view's graphics context entered for as long as it lives.
///
/// Dereferences to the view, so configure and expose can be processed through
/// it.
pub struct ContextGuard<'a, P: Platform> {
    view: &'a mut View<P>,
    expose: Option<ExposeEvent>,
    active: bool,
}

impl<'a, P: Platform> ContextGuard<'a, P> {
    /// Enters the context. On failure the view stays idle.
    pub(crate) fn enter(view: &'a mut View<P>, expose: Option<ExposeEvent>) -> Result<Self> {
        profile_function!();
        if view.context == ContextState::Entered {
            return Err(view.invalid_state(
                "enter_context",
                "graphics context is already entered",
            ));
        }

        P::enter(view.internals_mut(), expose.as_ref())?;
        view.context = ContextState::Entered;

        Ok(Self {
            view,
            expose,
            active: true,
        })
    }

    /// The expose region this scope was entered for, if any.
    pub fn expose_region(&self) -> Option<&ExposeEvent> {
        self.expose.as_ref()
    }

    /// Leaves the context, reporting a leave failure.
    pub fn finish(mut self) -> Result<()> {
        self.release()
    }

    fn release(&mut self) -> Result<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;
        self.view.context = ContextState::Idle;
        P::leave(self.view.internals_mut(), self.expose.as_ref())
    }
}

impl<P: Platform> Deref for ContextGuard<'_, P> {
    type Target = View<P>;

    fn deref(&self) -> &Self::Target {
        self.view
    }
}

impl<P: Platform> DerefMut for ContextGuard<'_, P> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.view
    }
}

impl<P: Platform> Drop for ContextGuard<'_, P> {
    fn drop(&mut self) {
        if let Err(err) = self.release() {
            tracing::error!(%err, "failed to leave graphics context");
        }
    }
}

/// Leaves `guard` and combines the result with the status of the work done
/// inside it. The inner status wins; a leave failure after an inner failure is
/// only logged.
pub(crate) fn close_scope<P: Platform>(guard: ContextGuard<'_, P>, status: Result<()>) -> Result<()> {
    let left = guard.finish();
    match (status, left) {
        (Err(err), Err(leave_err)) => {
            tracing::error!(%leave_err, "failed to leave graphics context after error");
            Err(err)
        }
        (Err(err), Ok(())) => Err(err),
        (Ok(()), left) => left,
    }
}
