//! Navigation stacks.
//!
//! A [`Stack`] shows one page at a time out of an ordered list of pages. Moving to another
//! page runs a transition: the incoming page is inserted with a `next` (moving forward) or
//! `prev` (moving back) class, and shortly after, that class is removed while the outgoing
//! page receives the opposite one. The host animates between these states and reports the end
//! of the animation with a transition-end event; a timeout covers hosts that never do. Only
//! then is the outgoing page removed.
//!
//! With the scrolling layout, each page is loaded into one of two alternating
//! [`Scroller`]s, and the scrollers are what transition.

use crate::container::Container;
use crate::context::Context;
use crate::events::{EventHandler, EventKind};
use crate::id::SurfaceId;
use crate::scroller::{ScrollTarget, Scroller};
use crate::subject::Subject;
use crate::transition::{Direction, Phase, Settled, Transition};
use crate::value::Value;
use crate::view::Renderable;
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use tracing::debug;

/// How pages are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackLayout {
    /// Pages are children of the stack surface.
    Fixed,
    /// Pages are loaded into alternating scrollers.
    Scrolling,
}

/// Widgets that navigate between pages.
pub trait Navigable {
    fn push(&self, page: Value);
    fn pop(&self);
    fn home(&self);
    fn forward(&self);
    fn back(&self);
}

struct StackState {
    pages: Vec<Value>,
    index: usize,
    last_index: usize,
    last_node: Option<SurfaceId>,
    locked: bool,
    visible: bool,
    transition: Transition,
    active_scroller: usize,
}

impl StackState {
    fn switch_scroller(&mut self) {
        self.active_scroller = 1 - self.active_scroller;
    }
}

pub struct Stack {
    container: Container,
    this: Weak<Stack>,
    layout: StackLayout,
    state: Mutex<StackState>,
    scrollers: Option<[Arc<Scroller>; 2]>,
    push_event: Subject<Value>,
    pop_event: Subject<()>,
    home_event: Subject<()>,
    show_event: Subject<()>,
    hide_event: Subject<()>,
}

impl Stack {
    /// Creates a stack with pages as direct children.
    ///
    /// Only the first item of `initial` is kept, as the bottom page.
    pub fn new(ctx: &Context, initial: Value) -> Arc<Stack> {
        Stack::with_layout(ctx, StackLayout::Fixed, initial)
    }

    /// Creates a stack whose pages scroll.
    pub fn scrolling(ctx: &Context, initial: Value) -> Arc<Stack> {
        Stack::with_layout(ctx, StackLayout::Scrolling, initial)
    }

    pub fn with_layout(ctx: &Context, layout: StackLayout, initial: Value) -> Arc<Stack> {
        let scrollers = match layout {
            StackLayout::Fixed => None,
            StackLayout::Scrolling => Some([
                Scroller::new(ctx, Value::Empty),
                Scroller::new(ctx, Value::Empty),
            ]),
        };
        let stack = Arc::new_cyclic(|this| {
            let container = Container::core(ctx, "jostack");
            let id = container.view.object_id();
            Stack {
                container,
                this: this.clone(),
                layout,
                state: Mutex::new(StackState {
                    pages: Vec::new(),
                    index: 0,
                    last_index: 0,
                    last_node: None,
                    locked: ctx.config().stack.locked,
                    visible: false,
                    transition: Transition::new(),
                    active_scroller: 0,
                }),
                scrollers,
                push_event: Subject::named(Some(id), "push"),
                pop_event: Subject::named(Some(id), "pop"),
                home_event: Subject::named(Some(id), "home"),
                show_event: Subject::named(Some(id), "show"),
                hide_event: Subject::named(Some(id), "hide"),
            }
        });
        if !initial.is_empty() {
            stack.set_data(initial);
        }
        stack
    }

    pub fn layout(&self) -> StackLayout {
        self.layout
    }

    pub fn push_event(&self) -> &Subject<Value> {
        &self.push_event
    }

    pub fn pop_event(&self) -> &Subject<()> {
        &self.pop_event
    }

    pub fn home_event(&self) -> &Subject<()> {
        &self.home_event
    }

    pub fn show_event(&self) -> &Subject<()> {
        &self.show_event
    }

    pub fn hide_event(&self) -> &Subject<()> {
        &self.hide_event
    }

    pub fn index(&self) -> usize {
        self.state.lock().index
    }

    /// Number of pages.
    pub fn len(&self) -> usize {
        self.state.lock().pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The page at the current index.
    pub fn current(&self) -> Option<Value> {
        let state = self.state.lock();
        state.pages.get(state.index).cloned()
    }

    pub fn transition_phase(&self) -> Phase {
        self.state.lock().transition.phase()
    }

    /// When locked, `pop` always leaves the first page in place.
    pub fn set_locked(&self, locked: bool) -> &Self {
        self.state.lock().locked = locked;
        self
    }

    pub fn is_locked(&self) -> bool {
        self.state.lock().locked
    }

    pub fn is_visible(&self) -> bool {
        self.state.lock().visible
    }

    /// The scroller holding the current page, for the scrolling layout.
    pub fn scroller(&self) -> Option<Arc<Scroller>> {
        let active = self.state.lock().active_scroller;
        self.scrollers
            .as_ref()
            .map(|scrollers| Arc::clone(&scrollers[active]))
    }

    pub fn scroll_to(&self, target: ScrollTarget, instant: bool) {
        if let Some(scroller) = self.scroller() {
            scroller.scroll_to(target, instant);
        }
    }

    pub fn scroll_by(&self, dy: f64) {
        if let Some(scroller) = self.scroller() {
            scroller.scroll_by(dy);
        }
    }

    /// Adds a page on top and moves to it.
    pub fn push(&self, page: Value) {
        {
            let mut state = self.state.lock();
            if self.scrollers.is_some() {
                state.switch_scroller();
            }
            state.pages.push(page.clone());
            state.index = state.pages.len() - 1;
        }
        self.draw_page(true);
        self.push_event.fire(&page);
    }

    /// Removes the top page and moves to the one below.
    pub fn pop(&self) {
        let (removed, remaining) = {
            let mut state = self.state.lock();
            let floor = if state.locked { 1 } else { 0 };
            if state.pages.len() > floor {
                if self.scrollers.is_some() {
                    state.switch_scroller();
                }
                let removed = state.pages.pop();
                state.index = state.pages.len().saturating_sub(1);
                (removed, state.pages.len())
            } else {
                (None, state.pages.len())
            }
        };

        if let Some(removed) = removed {
            if remaining > 0 {
                self.draw_page(false);
            } else {
                self.clear_pages();
            }
            if let Value::View(page) = &removed {
                page.deactivate();
            }
            if remaining == 0 {
                self.hide();
            }
        }

        if remaining > 0 {
            self.pop_event.fire(&());
        }
    }

    /// Drops every page but the first and moves to it.
    pub fn home(&self) {
        let dropped = {
            let mut state = self.state.lock();
            if state.pages.is_empty() {
                return;
            }
            if self.scrollers.is_some() {
                state.switch_scroller();
            }
            let dropped = state.pages.split_off(1);
            state.index = 0;
            dropped
        };
        self.draw_page(false);
        for page in dropped.iter().rev() {
            if let Value::View(page) = page {
                page.deactivate();
            }
        }
        self.home_event.fire(&());
    }

    /// Goes home and shows the stack right away.
    pub fn show_home(&self) {
        self.home();
        let shown = {
            let mut state = self.state.lock();
            !std::mem::replace(&mut state.visible, true)
        };
        if shown {
            self.set_show_class(true);
            self.show_event.fire(&());
        }
    }

    pub fn forward(&self) {
        let moved = {
            let mut state = self.state.lock();
            if state.index + 1 < state.pages.len() {
                if self.scrollers.is_some() {
                    state.switch_scroller();
                }
                state.index += 1;
                true
            } else {
                false
            }
        };
        if moved {
            self.draw_page(false);
        }
    }

    pub fn back(&self) {
        let moved = {
            let mut state = self.state.lock();
            if state.index > 0 {
                if self.scrollers.is_some() {
                    state.switch_scroller();
                }
                state.index -= 1;
                true
            } else {
                false
            }
        };
        if moved {
            self.draw_page(false);
        }
    }

    /// Adds the `show` class; the show event follows once the host had time to animate.
    pub fn show(&self) {
        let shown = {
            let mut state = self.state.lock();
            !std::mem::replace(&mut state.visible, true)
        };
        if shown {
            self.set_show_class(true);
            self.defer(|stack| stack.show_event.fire(&()));
        }
    }

    pub fn hide(&self) {
        let hidden = {
            let mut state = self.state.lock();
            std::mem::replace(&mut state.visible, false)
        };
        if hidden {
            self.set_show_class(false);
            self.defer(|stack| stack.hide_event.fire(&()));
        }
    }

    fn set_show_class(&self, show: bool) {
        if let Some(surface) = self.container.view.surface() {
            let doc = self.container.view.context().document();
            if show {
                doc.add_class(surface, "show");
            } else {
                doc.remove_class(surface, "show");
            }
        }
    }

    fn defer<F: 'static + FnOnce(&Stack) + Send>(&self, f: F) {
        let ctx = self.container.view.context();
        let this = self.this.clone();
        ctx.scheduler()
            .yield_after(ctx.config().stack.visibility_delay(), move || {
                if let Some(stack) = this.upgrade() {
                    f(&stack);
                }
            });
    }

    /// Removes the last shown page after the final pop.
    fn clear_pages(&self) {
        let (settled, last_node) = {
            let mut state = self.state.lock();
            state.index = 0;
            state.last_index = 0;
            (state.transition.settle(), state.last_node.take())
        };
        if let Some(settled) = settled {
            self.cleanup(settled);
        }
        if let (Some(surface), Some(node)) = (self.container.view.surface(), last_node) {
            let doc = self.container.view.context().document();
            doc.remove_child(surface, node);
        }
    }

    /// Shows the page at the current index, transitioning from the last one.
    fn draw_page(&self, pushed: bool) {
        let surface = match self.container.view.surface() {
            Some(surface) => surface,
            None => return,
        };
        let (page, index, last_index, last_node, active, settled) = {
            let mut state = self.state.lock();
            let page = match state.pages.get(state.index) {
                Some(page) => page.clone(),
                None => return,
            };
            (
                page,
                state.index,
                state.last_index,
                state.last_node,
                state.active_scroller,
                state.transition.settle(),
            )
        };
        if let Some(settled) = settled {
            self.cleanup(settled);
        }

        let new_child = match &self.scrollers {
            None => page.surface(),
            Some(scrollers) => {
                let scroller = &scrollers[active];
                scroller.set_data(page.clone());
                if pushed {
                    scroller.scroll_to(ScrollTarget::Offset(0.), true);
                }
                scroller.surface()
            }
        };
        let new_child = match new_child {
            Some(child) => child,
            None => return,
        };

        let ctx = self.container.view.context();
        let doc = ctx.document();
        let direction = Direction::between(index, last_index);
        let old_child = last_node.filter(|node| *node != new_child);
        if let Some(class) = direction.incoming_class() {
            doc.add_class(new_child, class);
        }
        doc.append_child(surface, new_child);

        let generation = {
            let mut state = self.state.lock();
            state.last_index = index;
            state.last_node = Some(new_child);
            state.transition.begin(direction, new_child, old_child)
        };
        debug!(index, last_index, ?direction, generation, "stack transition");

        let this = self.this.clone();
        ctx.scheduler()
            .yield_after(ctx.config().stack.animate_delay(), move || {
                if let Some(stack) = this.upgrade() {
                    stack.animate(generation);
                }
            });

        if let Value::View(page) = &page {
            page.activate();
        }
    }

    /// Swaps the transition classes and waits for the host to finish animating.
    fn animate(&self, generation: u64) {
        let (direction, incoming, outgoing) = {
            let state = self.state.lock();
            let transition = &state.transition;
            if !transition.is_current(generation) || transition.phase() != Phase::Entering {
                return;
            }
            match transition.incoming() {
                Some(incoming) => (transition.direction(), incoming, transition.outgoing()),
                None => return,
            }
        };

        let ctx = self.container.view.context();
        let this = self.this.clone();
        let listener = ctx.events().on(
            Some(incoming),
            EventKind::TransitionEnd,
            EventHandler::new(move |_| {
                if let Some(stack) = this.upgrade() {
                    stack.finish(generation);
                }
            }),
        );
        let this = self.this.clone();
        let timer = ctx
            .scheduler()
            .yield_after(ctx.config().stack.transition_timeout(), move || {
                if let Some(stack) = this.upgrade() {
                    stack.finish(generation);
                }
            });

        let doc = ctx.document();
        if let Some(class) = direction.incoming_class() {
            doc.remove_class(incoming, class);
        }
        if let (Some(class), Some(outgoing)) = (direction.outgoing_class(), outgoing) {
            doc.add_class(outgoing, class);
        }

        let mut state = self.state.lock();
        if state.transition.start_settling(generation) {
            state.transition.timer = Some(timer);
            state.transition.listener = listener;
        }
    }

    /// Ends transition `generation`, unless it has been superseded or already finished.
    fn finish(&self, generation: u64) {
        let settled = {
            let mut state = self.state.lock();
            if !state.transition.is_current(generation) {
                return;
            }
            state.transition.settle()
        };
        if let Some(settled) = settled {
            debug!(generation, "stack transition finished");
            self.cleanup(settled);
        }
    }

    fn cleanup(&self, settled: Settled) {
        let ctx = self.container.view.context();
        let doc = ctx.document();
        if let Some(timer) = settled.timer {
            ctx.scheduler().cancel(timer);
        }
        if let (Some(incoming), Some(listener)) = (settled.incoming, settled.listener) {
            ctx.events()
                .remove(incoming, EventKind::TransitionEnd, listener);
        }
        if let Some(outgoing) = settled.outgoing {
            if let Some(surface) = self.container.view.surface() {
                doc.remove_child(surface, outgoing);
            }
            doc.remove_class(outgoing, "next");
            doc.remove_class(outgoing, "prev");
        }
        if let Some(incoming) = settled.incoming {
            doc.remove_class(incoming, "next");
            doc.remove_class(incoming, "prev");
        }
    }
}

impl_renderable! {
    Stack => container.view;

    /// Keeps the first item as the only page.
    fn set_data(&self, data: Value) {
        let first = data.into_list().into_iter().next();
        {
            let mut state = self.state.lock();
            state.pages = first.into_iter().collect();
            state.index = 0;
        }
        self.refresh();
    }

    /// Adopts `existing` and clears out whatever it contained.
    fn set_container(&self, existing: Option<SurfaceId>) {
        let settled = {
            let mut state = self.state.lock();
            state.last_node = None;
            state.transition.settle()
        };
        if let Some(settled) = settled {
            self.cleanup(settled);
        }
        self.container.view.rebind(existing);
        self.container.view.clear_surface();
        self.set_events();
    }

    fn refresh(&self) {
        self.draw();
        self.container.view.change_event().fire(&self.data());
    }

    /// Drops every page, whether or not the stack is locked, and hides the stack.
    fn clear(&self) {
        let (settled, pages) = {
            let mut state = self.state.lock();
            state.index = 0;
            state.last_index = 0;
            state.last_node = None;
            (state.transition.settle(), std::mem::take(&mut state.pages))
        };
        if let Some(settled) = settled {
            self.cleanup(settled);
        }
        self.container.view.clear_surface();
        if let Some(scrollers) = &self.scrollers {
            for scroller in scrollers {
                scroller.clear();
            }
        }
        for page in pages.iter().rev() {
            if let Value::View(page) = page {
                page.deactivate();
            }
        }
        self.hide();
        self.container.view.change_event().fire_empty();
    }

    fn draw(&self) {
        self.draw_page(false);
    }

    fn data(&self) -> Value {
        let state = self.state.lock();
        if state.pages.is_empty() {
            Value::Empty
        } else {
            Value::List(state.pages.clone())
        }
    }
}

impl Navigable for Stack {
    fn push(&self, page: Value) {
        Stack::push(self, page);
    }

    fn pop(&self) {
        Stack::pop(self);
    }

    fn home(&self) {
        Stack::home(self);
    }

    fn forward(&self) {
        Stack::forward(self);
    }

    fn back(&self) {
        Stack::back(self);
    }
}
