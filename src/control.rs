//! Interactive widgets.

use crate::context::Context;
use crate::data_source::DataSource;
use crate::events::{EventHandler, EventKind, InputEvent};
use crate::focus::{Arbiter, Focusable};
use crate::id::ObjectId;
use crate::subject::{Handler, Subject};
use crate::value::Value;
use crate::view::{Renderable, View};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tracing::debug;

/// Widgets that publish a selection.
pub trait Selectable {
    type Selection;

    fn select_event(&self) -> &Subject<Self::Selection>;
}

/// Widgets that can take their data from a [`DataSource`].
pub trait DataBound {
    /// Subscribes to the source's changes, replacing any previous binding.
    fn set_data_source(&self, source: &Arc<DataSource>);

    fn data_source(&self) -> Option<Arc<DataSource>>;
}

struct SourceBinding {
    source: Weak<DataSource>,
    handler: Handler<Value>,
}

/// State shared by all controls: enabled flag, selection event and data-source binding.
pub struct ControlCore<S> {
    pub(crate) view: View,
    enabled: AtomicBool,
    select_event: Subject<S>,
    binding: Mutex<Option<SourceBinding>>,
}

impl<S> ControlCore<S> {
    pub fn new(ctx: &Context, tag: &'static str) -> ControlCore<S> {
        let view = View::core(ctx, tag);
        let id = view.object_id();
        ControlCore {
            view,
            enabled: AtomicBool::new(true),
            select_event: Subject::named(Some(id), "select"),
            binding: Mutex::new(None),
        }
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn select_event(&self) -> &Subject<S> {
        &self.select_event
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    pub fn enable(&self) {
        self.set_enabled(true);
    }

    pub fn disable(&self) {
        self.set_enabled(false);
    }

    fn set_enabled(&self, enabled: bool) {
        if let Some(surface) = self.view.surface() {
            let doc = self.view.context().document();
            if enabled {
                doc.remove_class(surface, "disabled");
            } else {
                doc.add_class(surface, "disabled");
            }
            doc.set_editable(surface, enabled);
        }
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    /// Routes the source's change events to `target.set_data`.
    pub fn bind(&self, source: &Arc<DataSource>, target: Weak<dyn Renderable>) {
        self.unbind();
        let handler = Handler::new(move |data: &Value, _, _| {
            if let Some(target) = target.upgrade() {
                target.set_data(data.clone());
            }
        });
        source
            .change_event()
            .subscribe(&handler, Some(self.view.object_id()), None);
        *self.binding.lock() = Some(SourceBinding {
            source: Arc::downgrade(source),
            handler,
        });
    }

    /// Drops the data-source binding, if any.
    pub fn unbind(&self) {
        let binding = self.binding.lock().take();
        if let Some(binding) = binding {
            if let Some(source) = binding.source.upgrade() {
                source
                    .change_event()
                    .unsubscribe(&binding.handler, Some(self.view.object_id()));
            }
        }
    }

    pub fn data_source(&self) -> Option<Arc<DataSource>> {
        self.binding
            .lock()
            .as_ref()
            .and_then(|binding| binding.source.upgrade())
    }

    pub(crate) fn apply_focus(&self) {
        if let Some(surface) = self.view.surface() {
            self.view.context().document().add_class(surface, "focus");
        }
    }

    /// Removes focus styling, then reads the surface's live value back into the data.
    pub(crate) fn commit_blur(&self) {
        let surface = match self.view.surface() {
            Some(surface) => surface,
            None => return,
        };
        let doc = self.view.context().document();
        doc.remove_class(surface, "focus");
        let value = doc.value(surface).unwrap_or_else(|| doc.text(surface));
        let data = Value::Text(value);
        self.view.store(data.clone());
        self.view.change_event().fire(&data);
    }
}

impl<S> Drop for ControlCore<S> {
    fn drop(&mut self) {
        self.unbind();
    }
}

/// A focusable, selectable widget.
///
/// Clicking selects it (firing the select event with its data); focus is arbitrated by the
/// context's [`Focus`](crate::Focus) service.
pub struct Control {
    core: ControlCore<Value>,
    this: Weak<Control>,
}

impl Control {
    pub fn new(ctx: &Context, data: Value) -> Arc<Control> {
        Control::with_tag(ctx, "jocontrol", data)
    }

    pub fn with_tag(ctx: &Context, tag: &'static str, data: Value) -> Arc<Control> {
        let control = Arc::new_cyclic(|this| Control {
            core: ControlCore::new(ctx, tag),
            this: this.clone(),
        });
        control.set_events();
        if !data.is_empty() {
            control.set_data(data);
        }
        control
    }

    /// Creates a control that takes its data from `source`.
    pub fn with_source(ctx: &Context, source: &Arc<DataSource>) -> Arc<Control> {
        let control = Control::new(ctx, Value::Empty);
        control.set_data_source(source);
        control
    }

    pub fn core(&self) -> &ControlCore<Value> {
        &self.core
    }

    /// Fires the select event with the current data, stopping the originating event.
    pub fn select(&self, origin: Option<&mut InputEvent>) {
        if let Some(event) = origin {
            event.stop_propagation();
        }
        self.core.select_event.fire(&self.core.view.data());
    }

    pub fn enable(&self) {
        self.core.enable();
    }

    pub fn disable(&self) {
        self.core.disable();
    }

    pub fn is_enabled(&self) -> bool {
        self.core.is_enabled()
    }

    /// Asks the context's focus service to focus this control.
    pub fn focus(&self) {
        if let Some(control) = self.this.upgrade() {
            let ctx = self.core.view.context().clone();
            ctx.focus().set(Some(control));
        }
    }

    /// Blurs this control if it holds focus.
    pub fn blur(&self) {
        let focus = self.core.view.context().focus();
        let holds = focus
            .get()
            .map_or(false, |holder| holder.object_id() == self.core.view.object_id());
        if holds {
            focus.clear();
        }
    }
}

impl_renderable! {
    Control => core.view;

    fn set_events(&self) {
        let view = &self.core.view;

        let this = self.this.clone();
        view.listen(
            EventKind::Click,
            EventHandler::new(move |event| {
                if let Some(control) = this.upgrade() {
                    control.select(Some(event));
                }
            }),
            false,
        );

        let this = self.this.clone();
        view.listen(
            EventKind::Focus,
            EventHandler::new(move |event| {
                event.stop_propagation();
                if let Some(control) = this.upgrade() {
                    let ctx = control.core.view.context().clone();
                    ctx.focus().set(Some(control));
                }
            }),
            false,
        );

        let this = self.this.clone();
        view.listen(
            EventKind::Blur,
            EventHandler::new(move |event| {
                event.stop_propagation();
                if let Some(control) = this.upgrade() {
                    let ctx = control.core.view.context().clone();
                    ctx.focus().release(control);
                }
            }),
            false,
        );
    }
}

impl Focusable for Control {
    fn object_id(&self) -> ObjectId {
        self.core.view.object_id()
    }

    fn focus(&self, _: Arbiter) {
        debug!(tag = self.core.view.tag(), "control focused");
        self.core.apply_focus();
    }

    fn blur(&self, _: Arbiter) {
        self.core.commit_blur();
    }
}

impl Selectable for Control {
    type Selection = Value;

    fn select_event(&self) -> &Subject<Value> {
        &self.core.select_event
    }
}

impl DataBound for Control {
    fn set_data_source(&self, source: &Arc<DataSource>) {
        let target: Weak<dyn Renderable> = self.this.clone();
        self.core.bind(source, target);
    }

    fn data_source(&self) -> Option<Arc<DataSource>> {
        self.core.data_source()
    }
}
