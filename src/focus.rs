//! Focus arbitration.

use crate::id::ObjectId;
use core::fmt;
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use tracing::debug;

/// Passed to [`Focusable`] hooks; only [`Focus`] can make one, so the hooks can't be called
/// around it.
#[derive(Debug)]
pub struct Arbiter(());

/// Something that can hold focus.
///
/// Focus moves through [`Focus::set`]; the hooks here apply the result.
pub trait Focusable: Send + Sync {
    fn object_id(&self) -> ObjectId;

    /// Applies focus styling.
    fn focus(&self, arbiter: Arbiter);

    /// Removes focus styling and commits any edited value.
    fn blur(&self, arbiter: Arbiter);
}

struct FocusState {
    last: Option<Weak<dyn Focusable>>,
    generation: u64,
}

/// Keeps track of the one control that has focus.
///
/// Focusing a control blurs the previous holder first. Blur handlers may focus something else
/// in turn; the most recent request wins and no control is blurred twice.
pub struct Focus {
    state: Mutex<FocusState>,
}

impl Focus {
    pub fn new() -> Focus {
        Focus {
            state: Mutex::new(FocusState {
                last: None,
                generation: 0,
            }),
        }
    }

    /// Moves focus to `control`, or clears it.
    pub fn set(&self, control: Option<Arc<dyn Focusable>>) {
        let (previous, generation) = {
            let mut state = self.state.lock();
            state.generation += 1;
            (
                state.last.take().and_then(|last| last.upgrade()),
                state.generation,
            )
        };

        let new_id = control.as_ref().map(|c| c.object_id());
        if let Some(previous) = previous {
            if Some(previous.object_id()) != new_id {
                previous.blur(Arbiter(()));
            }
        }

        if self.state.lock().generation != generation {
            // a blur handler moved focus elsewhere
            return;
        }

        if let Some(control) = control {
            debug!(control = ?control.object_id(), "focus");
            control.focus(Arbiter(()));
            let mut state = self.state.lock();
            if state.generation == generation {
                state.last = Some(Arc::downgrade(&control));
            }
        }
    }

    /// The control that currently has focus.
    pub fn get(&self) -> Option<Arc<dyn Focusable>> {
        self.state
            .lock()
            .last
            .as_ref()
            .and_then(|last| last.upgrade())
    }

    /// Re-applies focus to the current holder.
    pub fn refresh(&self) {
        let current = self.get();
        self.set(current);
    }

    /// Blurs the current holder.
    pub fn clear(&self) {
        self.set(None);
    }

    /// Blurs `control` after the platform took focus away from it, dropping it as holder.
    pub fn release(&self, control: Arc<dyn Focusable>) {
        self.forget(control.object_id());
        control.blur(Arbiter(()));
    }

    /// Drops the holder without blurring it, if it is `id`.
    pub fn forget(&self, id: ObjectId) {
        let mut state = self.state.lock();
        let holds = state
            .last
            .as_ref()
            .and_then(|last| last.upgrade())
            .map_or(false, |last| last.object_id() == id);
        if holds {
            state.last = None;
            state.generation += 1;
        }
    }
}

impl Default for Focus {
    fn default() -> Self {
        Focus::new()
    }
}

impl fmt::Debug for Focus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Focus")
            .field("holder", &self.get().map(|c| c.object_id()))
            .finish()
    }
}
