//! Flick scrolling.
//!
//! A [`Scroller`] manages the vertical offset of its first child. Dragging moves the child
//! with the pointer (up to `bump` points past either end); releasing after a fast drag
//! flings it further, proportionally to how much taller the content is than the viewport.
//! When the fling's transition ends, the content snaps back into range.
//!
//! Geometry comes from the layout bounds the host reports for the scroller surface (the
//! viewport) and its first child (the content).

use crate::container::{draw_content, Container};
use crate::context::Context;
use crate::events::{EventHandler, EventKind, InputEvent, ListenerId};
use crate::id::SurfaceId;
use crate::value::Value;
use crate::view::Renderable;
use cgmath::Point2;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tracing::trace;

/// Something to scroll to.
#[derive(Clone)]
pub enum ScrollTarget {
    /// A content offset; 0 is the top, more negative is further down.
    Offset(f64),
    /// A surface inside the content.
    Surface(SurfaceId),
    /// A widget inside the content.
    View(Arc<dyn Renderable>),
}

impl From<f64> for ScrollTarget {
    fn from(offset: f64) -> ScrollTarget {
        ScrollTarget::Offset(offset)
    }
}

impl From<SurfaceId> for ScrollTarget {
    fn from(surface: SurfaceId) -> ScrollTarget {
        ScrollTarget::Surface(surface)
    }
}

/// A pointer sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub point: Point2<f64>,
    /// Scheduler time at which the sample was taken.
    pub at: Duration,
}

struct ScrollState {
    /// Newest first.
    points: VecDeque<Sample>,
    in_motion: bool,
    moved: bool,
    quick_snap: bool,
    move_listener: Option<ListenerId>,
    settle_listener: Option<(SurfaceId, ListenerId)>,
    drag_generation: u64,
}

pub struct Scroller {
    container: Container,
    this: Weak<Scroller>,
    state: Mutex<ScrollState>,
}

impl Scroller {
    pub fn new(ctx: &Context, data: Value) -> Arc<Scroller> {
        let scroller = Arc::new_cyclic(|this| Scroller {
            container: Container::core(ctx, "joscroller"),
            this: this.clone(),
            state: Mutex::new(ScrollState {
                points: VecDeque::new(),
                in_motion: false,
                moved: false,
                quick_snap: false,
                move_listener: None,
                settle_listener: None,
                drag_generation: 0,
            }),
        });
        scroller.set_events();
        if !data.is_empty() {
            scroller.set_data(data);
        }
        scroller
    }

    /// The scrolled content surface.
    fn node(&self) -> Option<SurfaceId> {
        let surface = self.container.view.surface()?;
        self.container.view.context().document().first_child(surface)
    }

    /// Content height and viewport height.
    fn extent(&self, node: SurfaceId) -> (f64, f64) {
        let doc = self.container.view.context().document();
        let viewport = self
            .container
            .view
            .surface()
            .map_or(0., |surface| doc.bounds(surface).height());
        (doc.bounds(node).height(), viewport)
    }

    /// Current content offset.
    pub fn top(&self) -> f64 {
        self.node().map_or(0., |node| {
            self.container.view.context().document().translate_y(node)
        })
    }

    fn set_top(&self, node: SurfaceId, y: f64) {
        self.container
            .view
            .context()
            .document()
            .set_translate_y(node, y);
    }

    /// Whether a drag is in progress.
    pub fn in_motion(&self) -> bool {
        self.state.lock().in_motion
    }

    /// Pointer samples of the current drag, newest first.
    pub fn samples(&self) -> Vec<Sample> {
        self.state.lock().points.iter().copied().collect()
    }

    fn on_click(&self, event: &mut InputEvent) {
        let mut state = self.state.lock();
        if state.moved {
            state.moved = false;
            event.stop_propagation();
            event.prevent_default();
        }
    }

    fn reset(state: &mut ScrollState) {
        state.points.clear();
        state.quick_snap = false;
        state.moved = false;
        state.in_motion = false;
        state.drag_generation += 1;
    }

    fn on_down(&self, event: &mut InputEvent) {
        event.stop_propagation();
        let ctx = self.container.view.context();
        let now = ctx.scheduler().now();

        if let Some(node) = self.node() {
            let doc = ctx.document();
            doc.remove_class(node, "flick");
            doc.remove_class(node, "flickback");
            doc.remove_class(node, "flickfast");
        }

        let needs_listener = {
            let mut state = self.state.lock();
            Scroller::reset(&mut state);
            state.points.push_front(Sample {
                point: event.location,
                at: now,
            });
            state.in_motion = true;
            state.move_listener.is_none()
        };

        if needs_listener {
            let this = self.this.clone();
            let listener = self.container.view.listen(
                EventKind::PointerMove,
                EventHandler::new(move |event| {
                    if let Some(scroller) = this.upgrade() {
                        scroller.on_move(event);
                    }
                }),
                false,
            );
            self.state.lock().move_listener = listener;
        }
    }

    fn on_move(&self, event: &mut InputEvent) {
        let ctx = self.container.view.context();
        let config = &ctx.config().scroller;
        let (dy, generation) = {
            let mut state = self.state.lock();
            if !state.in_motion {
                return;
            }
            event.stop_propagation();
            event.prevent_default();

            let last = match state.points.front() {
                Some(sample) => sample.point,
                None => return,
            };
            let dy = event.location.y - last.y;
            if dy == 0. {
                return;
            }
            state.points.push_front(Sample {
                point: event.location,
                at: ctx.scheduler().now(),
            });
            while state.points.len() > config.max_samples {
                state.points.pop_back();
            }
            (dy, state.drag_generation)
        };

        // drop stale samples during slow drags so they don't count towards a flick
        let this = self.this.clone();
        ctx.scheduler().yield_after(config.trim_delay(), move || {
            if let Some(scroller) = this.upgrade() {
                scroller.trim(generation);
            }
        });

        self.scroll(dy, true);

        let mut state = self.state.lock();
        if !state.moved && state.points.len() > 3 {
            state.moved = true;
        }
    }

    fn trim(&self, generation: u64) {
        let mut state = self.state.lock();
        if state.drag_generation == generation && state.points.len() > 1 {
            state.points.pop_back();
        }
    }

    fn on_up(&self, event: &mut InputEvent) {
        let (dy, quick_snap, move_listener) = {
            let mut state = self.state.lock();
            if !state.in_motion {
                return;
            }
            state.in_motion = false;
            let dy: f64 = state
                .points
                .iter()
                .zip(state.points.iter().skip(1))
                .map(|(newer, older)| newer.point.y - older.point.y)
                .sum();
            (dy, state.quick_snap, state.move_listener.take())
        };
        if let Some(listener) = move_listener {
            self.container.view.unlisten(EventKind::PointerMove, listener);
        }

        let node = match self.node() {
            Some(node) => node,
            None => return,
        };
        event.stop_propagation();

        let ctx = self.container.view.context();
        let config = &ctx.config().scroller;
        let top = self.top();
        let (content, viewport) = self.extent(node);
        let max = viewport - content - config.bump;

        if dy.abs() > config.flick_threshold && !quick_snap {
            let ratio = if viewport > 0. { content / viewport } else { 1. };
            let flick = dy * (config.velocity * ratio);
            let class = if flick + top < max || flick + top > 0. {
                "flickfast"
            } else {
                "flick"
            };
            trace!(dy, flick, class, "flick");
            ctx.document().add_class(node, class);
            self.scroll(flick, false);
        } else {
            self.snap_back();
        }
    }

    /// Moves the content by `dy`, allowing up to `bump` points of overscroll.
    pub fn scroll_by(&self, dy: f64) {
        self.scroll(dy, false);
    }

    fn scroll(&self, y: f64, test: bool) {
        let node = match self.node() {
            Some(node) => node,
            None => return,
        };
        let ctx = self.container.view.context();
        let bump = ctx.config().scroller.bump;
        let top = self.top();
        let mut dy = (top + y).floor();

        let (content, viewport) = self.extent(node);
        if content <= viewport {
            return;
        }

        let max = viewport - content;
        let unclamped = dy;
        if dy > bump {
            dy = bump;
        } else if dy < max - bump {
            dy = max - bump;
        }

        let this = self.this.clone();
        let listener = ctx.events().on(
            Some(node),
            EventKind::TransitionEnd,
            EventHandler::new(move |_| {
                if let Some(scroller) = this.upgrade() {
                    scroller.snap_back();
                }
            }),
        );
        let previous = {
            let mut state = self.state.lock();
            if test {
                state.quick_snap = unclamped != dy;
            }
            std::mem::replace(&mut state.settle_listener, listener.map(|id| (node, id)))
        };
        if let Some((surface, id)) = previous {
            ctx.events().remove(surface, EventKind::TransitionEnd, id);
        }

        if top != dy {
            self.set_top(node, dy);
        }
    }

    /// Brings overscrolled content back into range.
    pub fn snap_back(&self) {
        let node = match self.node() {
            Some(node) => node,
            None => return,
        };
        let ctx = self.container.view.context();
        let top = self.top();
        let (content, viewport) = self.extent(node);
        let max = (viewport - content).min(0.);

        let settle_listener = self.state.lock().settle_listener.take();
        if let Some((surface, id)) = settle_listener {
            ctx.events().remove(surface, EventKind::TransitionEnd, id);
        }

        let doc = ctx.document();
        doc.remove_class(node, "flick");
        doc.add_class(node, "flickback");

        if top > 0. {
            self.set_top(node, 0.);
        } else if top < max {
            self.set_top(node, max);
        }
    }

    /// Scrolls so that `target` is visible; `instant` skips the animation class.
    pub fn scroll_to(&self, target: ScrollTarget, instant: bool) {
        let node = match self.node() {
            Some(node) => node,
            None => return,
        };
        let ctx = self.container.view.context();
        let doc = ctx.document();
        let (content, viewport) = self.extent(node);

        let mut y = match target {
            ScrollTarget::Offset(y) => y,
            ScrollTarget::Surface(surface) => self.reveal(node, surface, viewport),
            ScrollTarget::View(view) => match view.surface() {
                Some(surface) => self.reveal(node, surface, viewport),
                None => return,
            },
        };

        let min = (viewport - content).min(0.);
        if y < min {
            y = min;
        } else if y > 0. {
            y = 0.;
        }

        if instant {
            doc.remove_class(node, "flick");
            doc.remove_class(node, "flickback");
        } else {
            doc.add_class(node, "flick");
        }
        self.set_top(node, y);
    }

    /// The offset at which `element` is fully in view, moving as little as possible.
    fn reveal(&self, node: SurfaceId, element: SurfaceId, viewport: f64) -> f64 {
        let doc = self.container.view.context().document();
        let offset: f64 = doc
            .ancestors(element)
            .into_iter()
            .take_while(|surface| *surface != node)
            .map(|surface| doc.bounds(surface).top())
            .sum();
        let t = -offset;
        let h = doc.bounds(element).height();

        let top = self.top();
        let bottom = top - viewport;
        let mut y = top;
        if t - h < bottom {
            y = (t - h) + viewport;
        }
        if y < t {
            y = t;
        }
        y
    }
}

impl_renderable! {
    Scroller => container.view;

    fn draw(&self) {
        draw_content(&self.container.view);
    }

    fn set_events(&self) {
        let view = &self.container.view;

        let this = self.this.clone();
        view.listen(
            EventKind::Click,
            EventHandler::new(move |event| {
                if let Some(scroller) = this.upgrade() {
                    scroller.on_click(event);
                }
            }),
            true,
        );

        let this = self.this.clone();
        view.listen(
            EventKind::PointerDown,
            EventHandler::new(move |event| {
                if let Some(scroller) = this.upgrade() {
                    scroller.on_down(event);
                }
            }),
            false,
        );

        for kind in [EventKind::PointerUp, EventKind::PointerCancel] {
            let this = self.this.clone();
            view.listen(
                kind,
                EventHandler::new(move |event| {
                    if let Some(scroller) = this.upgrade() {
                        scroller.on_up(event);
                    }
                }),
                false,
            );
        }

        // rebinding drops every listener, including an in-progress drag's
        self.state.lock().move_listener = None;
    }
}

impl Drop for Scroller {
    fn drop(&mut self) {
        if let Some((surface, id)) = self.state.get_mut().settle_listener.take() {
            self.container
                .view
                .context()
                .events()
                .remove(surface, EventKind::TransitionEnd, id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rect::Rect;

    fn scroller_with_content(ctx: &Context, content: f64, viewport: f64) -> (Arc<Scroller>, SurfaceId) {
        let page = crate::view::View::new(ctx, "content".into());
        let scroller = Scroller::new(ctx, Value::from(page.clone()));
        let doc = ctx.document();
        doc.set_bounds(scroller.surface().unwrap(), Rect::from_xywh(0., 0., 320., viewport));
        let node = page.surface().unwrap();
        doc.set_bounds(node, Rect::from_xywh(0., 0., 320., content));
        // the page view is kept alive by the scroller's data
        (scroller, node)
    }

    #[test]
    fn scroll_by_clamps_to_bump() {
        let ctx = Context::default();
        let (scroller, _) = scroller_with_content(&ctx, 1000., 400.);
        scroller.scroll_by(120.);
        assert_eq!(scroller.top(), 50.);
        scroller.scroll_by(-2000.);
        assert_eq!(scroller.top(), -650.);
        scroller.snap_back();
        assert_eq!(scroller.top(), -600.);
    }

    #[test]
    fn short_content_never_scrolls() {
        let ctx = Context::default();
        let (scroller, _) = scroller_with_content(&ctx, 300., 400.);
        scroller.scroll_by(-100.);
        assert_eq!(scroller.top(), 0.);
        scroller.scroll_to(ScrollTarget::Offset(-100.), true);
        assert_eq!(scroller.top(), 0.);
    }

    #[test]
    fn settle_listener_is_replaced() {
        let ctx = Context::default();
        let (scroller, node) = scroller_with_content(&ctx, 1000., 400.);
        scroller.scroll_by(-10.);
        scroller.scroll_by(-10.);
        scroller.scroll_by(-10.);
        assert_eq!(ctx.events().listener_count(node, EventKind::TransitionEnd), 1);

        scroller.scroll_by(100.);
        ctx.dispatch(InputEvent::new(EventKind::TransitionEnd, node));
        assert_eq!(scroller.top(), 0.);
        assert!(ctx.document().has_class(node, "flickback"));
        assert_eq!(ctx.events().listener_count(node, EventKind::TransitionEnd), 0);
    }

    #[test]
    fn scroll_to_reveals_element() {
        let ctx = Context::default();
        let doc = ctx.document();
        let content = crate::container::Container::new(&ctx, Value::Empty);
        let item = doc.create("div", None).unwrap();
        doc.append_child(content.surface().unwrap(), item);
        let scroller = Scroller::new(&ctx, Value::from(content.clone()));
        doc.set_bounds(scroller.surface().unwrap(), Rect::from_xywh(0., 0., 320., 400.));
        doc.set_bounds(content.surface().unwrap(), Rect::from_xywh(0., 0., 320., 1000.));
        doc.set_bounds(item, Rect::from_xywh(0., 700., 320., 50.));

        scroller.scroll_to(ScrollTarget::Surface(item), false);
        assert_eq!(scroller.top(), -350.);
        assert!(doc.has_class(content.surface().unwrap(), "flick"));

        scroller.scroll_to(ScrollTarget::Offset(-5000.), true);
        assert_eq!(scroller.top(), -600.);
        assert!(!doc.has_class(content.surface().unwrap(), "flick"));
    }
}
