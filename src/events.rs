//! Events.
//!
//! Input listeners are registered per surface and event kind. [`Events::dispatch`] routes an
//! event through the surface tree in two phases: capturing listeners from the root down to the
//! target, then bubbling listeners from the target back up to the root.

use crate::id::SurfaceId;
use crate::surface::Document;
use cgmath::Point2;
use core::fmt;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::trace;

/// List of event kinds.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    PointerDown = 0,
    PointerMove = 1,
    PointerUp = 2,
    PointerCancel = 3,
    Click = 4,
    Focus = 5,
    Blur = 6,
    /// A CSS-style transition on the surface has finished.
    TransitionEnd = 7,
}

/// Types of pointing devices or mechanisms.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerDevice {
    /// Touch input from a finger or something of the sort; is expected to be imprecise.
    Touch = 0,

    /// Any indirect input mechanism, such as a mouse.
    Cursor = 1,
}

/// An input event being dispatched.
#[derive(Debug, Clone)]
pub struct InputEvent {
    pub kind: EventKind,

    /// The surface the event was aimed at.
    pub target: SurfaceId,

    /// The surface whose listeners are currently running.
    pub current_target: SurfaceId,

    /// Event location in document coordinates.
    pub location: Point2<f64>,

    pub device: PointerDevice,

    stopped: bool,
    default_prevented: bool,
}

impl InputEvent {
    pub fn new(kind: EventKind, target: SurfaceId) -> InputEvent {
        InputEvent::pointer(kind, target, Point2::new(0., 0.), PointerDevice::Cursor)
    }

    pub fn pointer(
        kind: EventKind,
        target: SurfaceId,
        location: Point2<f64>,
        device: PointerDevice,
    ) -> InputEvent {
        InputEvent {
            kind,
            target,
            current_target: target,
            location,
            device,
            stopped: false,
            default_prevented: false,
        }
    }

    /// Prevents the event from reaching any further surface.
    pub fn stop_propagation(&mut self) {
        self.stopped = true;
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented
    }
}

/// An input listener.
pub struct EventHandler(Arc<dyn Fn(&mut InputEvent) + Send + Sync>);

impl EventHandler {
    pub fn new<F: 'static + Fn(&mut InputEvent) + Send + Sync>(handler: F) -> Self {
        EventHandler(Arc::new(handler))
    }
}

impl Clone for EventHandler {
    fn clone(&self) -> Self {
        EventHandler(Arc::clone(&self.0))
    }
}

impl fmt::Debug for EventHandler {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "EventHandler")
    }
}

/// Identifies a registered listener, for removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

#[derive(Clone)]
struct Listener {
    id: ListenerId,
    handler: EventHandler,
    capture: bool,
}

/// The input listener registry.
pub struct Events {
    next_id: AtomicU64,
    listeners: Mutex<HashMap<(SurfaceId, EventKind), Vec<Listener>>>,
}

impl Events {
    pub fn new() -> Events {
        Events {
            next_id: AtomicU64::new(1),
            listeners: Mutex::new(HashMap::new()),
        }
    }

    fn add(
        &self,
        surface: Option<SurfaceId>,
        kind: EventKind,
        handler: EventHandler,
        capture: bool,
    ) -> Option<ListenerId> {
        let surface = surface?;
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners
            .lock()
            .entry((surface, kind))
            .or_insert_with(Vec::new)
            .push(Listener {
                id,
                handler,
                capture,
            });
        Some(id)
    }

    /// Adds a bubbling listener.
    ///
    /// Returns `None` if there is no surface to listen on.
    pub fn on(
        &self,
        surface: Option<SurfaceId>,
        kind: EventKind,
        handler: EventHandler,
    ) -> Option<ListenerId> {
        self.add(surface, kind, handler, false)
    }

    /// Adds a capturing listener, which runs before any listener on descendant surfaces.
    pub fn capture(
        &self,
        surface: Option<SurfaceId>,
        kind: EventKind,
        handler: EventHandler,
    ) -> Option<ListenerId> {
        self.add(surface, kind, handler, true)
    }

    /// Removes a listener. Returns false if it wasn't registered.
    pub fn remove(&self, surface: SurfaceId, kind: EventKind, id: ListenerId) -> bool {
        let mut listeners = self.listeners.lock();
        if let Some(list) = listeners.get_mut(&(surface, kind)) {
            let len = list.len();
            list.retain(|listener| listener.id != id);
            let removed = list.len() != len;
            if list.is_empty() {
                listeners.remove(&(surface, kind));
            }
            removed
        } else {
            false
        }
    }

    /// Stops an event from propagating further.
    pub fn stop(&self, event: &mut InputEvent) {
        event.stop_propagation();
    }

    pub fn listener_count(&self, surface: SurfaceId, kind: EventKind) -> usize {
        self.listeners
            .lock()
            .get(&(surface, kind))
            .map_or(0, Vec::len)
    }

    fn snapshot(&self, surface: SurfaceId, kind: EventKind, capture: bool) -> Vec<EventHandler> {
        self.listeners
            .lock()
            .get(&(surface, kind))
            .map(|list| {
                list.iter()
                    .filter(|l| l.capture == capture)
                    .map(|l| l.handler.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Dispatches an event: capture listeners root to target, then bubble listeners target to
    /// root. Propagation stops after the surface on which the event was stopped.
    pub fn dispatch(&self, document: &Document, mut event: InputEvent) -> InputEvent {
        let path = document.ancestors(event.target);
        trace!(kind = ?event.kind, depth = path.len(), "dispatch");

        for surface in path.iter().rev() {
            event.current_target = *surface;
            for handler in self.snapshot(*surface, event.kind, true) {
                (handler.0)(&mut event);
            }
            if event.stopped {
                return event;
            }
        }
        for surface in &path {
            event.current_target = *surface;
            for handler in self.snapshot(*surface, event.kind, false) {
                (handler.0)(&mut event);
            }
            if event.stopped {
                return event;
            }
        }
        event
    }
}

impl Default for Events {
    fn default() -> Self {
        Events::new()
    }
}

impl fmt::Debug for Events {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Events")
            .field("listeners", &self.listeners.lock().len())
            .finish()
    }
}

/// Raw platform input, before normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawKind {
    Down,
    Move,
    Up,
    Cancel,
    Click,
    Focus,
    Blur,
}

/// Mouse or touch input as reported by a platform.
#[derive(Debug, Clone)]
pub struct RawInput {
    pub target: SurfaceId,
    pub kind: RawKind,
    pub device: PointerDevice,
    pub location: Point2<f64>,
    /// Active touch points, for touch input.
    pub touches: Vec<Point2<f64>>,
}

impl RawInput {
    pub fn new(target: SurfaceId, kind: RawKind, location: Point2<f64>) -> RawInput {
        RawInput {
            target,
            kind,
            device: PointerDevice::Cursor,
            location,
            touches: Vec::new(),
        }
    }

    pub fn touch(target: SurfaceId, kind: RawKind, touches: Vec<Point2<f64>>) -> RawInput {
        RawInput {
            target,
            kind,
            device: PointerDevice::Touch,
            location: touches.first().copied().unwrap_or(Point2::new(0., 0.)),
            touches,
        }
    }
}

/// Touch input is normalized to a single pointer at the first touch point.
impl From<RawInput> for InputEvent {
    fn from(raw: RawInput) -> InputEvent {
        let kind = match raw.kind {
            RawKind::Down => EventKind::PointerDown,
            RawKind::Move => EventKind::PointerMove,
            RawKind::Up => EventKind::PointerUp,
            RawKind::Cancel => EventKind::PointerCancel,
            RawKind::Click => EventKind::Click,
            RawKind::Focus => EventKind::Focus,
            RawKind::Blur => EventKind::Blur,
        };
        let location = raw.touches.first().copied().unwrap_or(raw.location);
        InputEvent::pointer(kind, raw.target, location, raw.device)
    }
}
