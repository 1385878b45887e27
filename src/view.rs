use crate::context::Context;
use crate::events::{EventHandler, EventKind, ListenerId};
use crate::id::{ObjectId, SurfaceId};
use crate::subject::Subject;
use crate::surface::Style;
use crate::value::Value;
use core::any::Any;
use core::fmt;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::trace;

/// Implements the `Renderable` trait for a widget struct that embeds a [`View`].
///
/// Syntax:
///
/// ```text
/// impl_renderable! {
///     StructName => path.to.view;
///     (put overridden items like draw() here, using normal rust syntax)
/// }
/// ```
#[macro_export]
macro_rules! impl_renderable {
    (
        $(#[$attr:meta])*
        $struct:ty => $($field:ident).+;
        $($extra:tt)*
    ) => {
        $(#[$attr])*
        impl $crate::Renderable for $struct {
            fn view(&self) -> &$crate::View {
                &self.$($field).+
            }

            fn as_any(&self) -> &dyn ::core::any::Any {
                self
            }

            fn into_any(
                self: ::std::sync::Arc<Self>,
            ) -> ::std::sync::Arc<dyn ::core::any::Any + Send + Sync> {
                self
            }

            $($extra)*
        }
    };
}

/// Widgets: anything that renders into a surface through a [`View`].
///
/// The provided methods form the widget lifecycle. Widgets override `draw` to render their
/// data and `set_events` to wire up input; the rest usually stays as is.
///
/// This trait should probably be implemented using the [`impl_renderable`] macro.
pub trait Renderable: Any + Send + Sync {
    /// The embedded view core.
    fn view(&self) -> &View;

    /// For downcasting.
    fn as_any(&self) -> &dyn Any;

    /// For downcasting shared handles.
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;

    /// Renders the current data into the (already cleared) surface.
    fn draw(&self) {
        self.view().draw_data();
    }

    /// Clears the surface, redraws, and fires the change event.
    fn refresh(&self) {
        refresh_view(self);
    }

    /// Replaces the data and refreshes.
    fn set_data(&self, data: Value) {
        self.view().store(data);
        self.refresh();
    }

    /// Empties data and surface, and fires the change event with `Value::Empty`.
    fn clear(&self) {
        let view = self.view();
        view.store(Value::Empty);
        view.clear_surface();
        view.change_event().fire_empty();
    }

    /// Registers input listeners on the surface.
    fn set_events(&self) {}

    /// Rebinds this widget to an existing surface (or keeps its own if `None`) and rewires
    /// input.
    fn set_container(&self, existing: Option<SurfaceId>) {
        self.view().rebind(existing);
        self.set_events();
    }

    /// Called by a stack when this widget becomes the current page.
    fn activate(&self) {}

    /// Called by a stack when this widget stops being a page.
    fn deactivate(&self) {}

    fn data(&self) -> Value {
        self.view().data()
    }

    fn surface(&self) -> Option<SurfaceId> {
        self.view().surface()
    }

    fn attach(&self, parent: Option<SurfaceId>) {
        self.view().attach(parent);
    }

    fn detach(&self, parent: Option<SurfaceId>) {
        self.view().detach(parent);
    }
}

impl dyn Renderable {
    pub fn downcast_ref<T: Renderable>(&self) -> Option<&T> {
        self.as_any().downcast_ref()
    }
}

/// The default refresh: clear, draw, fire change. A widget without a surface does nothing.
pub fn refresh_view<R: Renderable + ?Sized>(widget: &R) {
    let view = widget.view();
    if view.surface().is_none() {
        return;
    }
    view.clear_surface();
    widget.draw();
    view.change_event().fire(&view.data());
}

/// The core shared by all widgets: one surface, one payload, one change event.
///
/// A view owns the surface it created and releases it when dropped. A surface adopted through
/// [`Renderable::set_container`] stays in the document.
pub struct View {
    ctx: Context,
    id: ObjectId,
    tag: &'static str,
    surface: Mutex<Option<SurfaceId>>,
    owns_surface: AtomicBool,
    data: Mutex<Value>,
    change_event: Subject<Value>,
    listeners: Mutex<Vec<(SurfaceId, EventKind, ListenerId)>>,
}

impl View {
    /// Creates a plain view that renders its data as text.
    pub fn new(ctx: &Context, data: Value) -> Arc<View> {
        let view = Arc::new(View::core(ctx, "joview"));
        if !data.is_empty() {
            view.set_data(data);
        }
        view
    }

    /// Creates a view core with a fresh surface, for embedding in a widget.
    pub fn core(ctx: &Context, tag: &'static str) -> View {
        let id = ObjectId::new();
        let surface = ctx.document().create(tag, None);
        View {
            ctx: ctx.clone(),
            id,
            tag,
            surface: Mutex::new(surface),
            owns_surface: AtomicBool::new(surface.is_some()),
            data: Mutex::new(Value::Empty),
            change_event: Subject::named(Some(id), "change"),
            listeners: Mutex::new(Vec::new()),
        }
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    pub fn object_id(&self) -> ObjectId {
        self.id
    }

    pub fn tag(&self) -> &'static str {
        self.tag
    }

    pub fn surface(&self) -> Option<SurfaceId> {
        *self.surface.lock()
    }

    pub fn data(&self) -> Value {
        self.data.lock().clone()
    }

    /// Replaces the data without refreshing.
    pub fn store(&self, data: Value) {
        *self.data.lock() = data;
    }

    /// Fired with the new data whenever the view is refreshed or cleared.
    pub fn change_event(&self) -> &Subject<Value> {
        &self.change_event
    }

    pub fn clear_surface(&self) {
        if let Some(surface) = self.surface() {
            self.ctx.document().clear(surface);
        }
    }

    /// Renders the data: views, surfaces and lists are pushed as children, anything else
    /// becomes the surface's text.
    pub fn draw_data(&self) {
        let surface = match self.surface() {
            Some(surface) => surface,
            None => return,
        };
        let data = self.data();
        let doc = self.ctx.document();
        match &data {
            Value::View(_) | Value::Surface(_) | Value::List(_) => {
                crate::container::push_value(doc, surface, &data)
            }
            other => doc.set_html(surface, &other.to_html()),
        }
    }

    /// Adds an input listener on the surface; it's removed when the surface is rebound or the
    /// view dropped.
    pub fn listen(&self, kind: EventKind, handler: EventHandler, capture: bool) -> Option<ListenerId> {
        let surface = self.surface()?;
        let events = self.ctx.events();
        let id = if capture {
            events.capture(Some(surface), kind, handler)
        } else {
            events.on(Some(surface), kind, handler)
        }?;
        self.listeners.lock().push((surface, kind, id));
        Some(id)
    }

    /// Removes one listener added through [`listen`](View::listen).
    pub fn unlisten(&self, kind: EventKind, id: ListenerId) {
        let mut listeners = self.listeners.lock();
        if let Some(i) = listeners.iter().position(|(_, k, l)| *k == kind && *l == id) {
            let (surface, _, _) = listeners.remove(i);
            drop(listeners);
            self.ctx.events().remove(surface, kind, id);
        }
    }

    /// Removes every listener added through [`listen`](View::listen).
    pub fn unlisten_all(&self) {
        let listeners = std::mem::take(&mut *self.listeners.lock());
        let events = self.ctx.events();
        for (surface, kind, id) in listeners {
            events.remove(surface, kind, id);
        }
    }

    /// Adopts an existing surface, releasing the one this view created. Without one, makes
    /// sure the view has a surface at all.
    pub fn rebind(&self, existing: Option<SurfaceId>) {
        self.unlisten_all();
        let doc = self.ctx.document();
        let mut surface = self.surface.lock();
        match existing {
            Some(new) if doc.contains(new) => {
                if let Some(old) = *surface {
                    if old != new && self.owns_surface.load(Ordering::SeqCst) {
                        doc.release(old);
                    }
                }
                trace!(tag = self.tag, "adopt surface");
                *surface = Some(new);
                self.owns_surface.store(false, Ordering::SeqCst);
            }
            _ => {
                if surface.is_none() {
                    *surface = doc.create(self.tag, None);
                    self.owns_surface.store(surface.is_some(), Ordering::SeqCst);
                }
            }
        }
    }

    /// Appends the surface to `parent` (default: the document root) unless it's already there.
    pub fn attach(&self, parent: Option<SurfaceId>) {
        let surface = match self.surface() {
            Some(surface) => surface,
            None => return,
        };
        let doc = self.ctx.document();
        let parent = parent.unwrap_or_else(|| doc.root());
        if doc.parent(surface) != Some(parent) {
            doc.append_child(parent, surface);
        }
    }

    /// Removes the surface from `parent` (default: the document root) if it's a child there.
    pub fn detach(&self, parent: Option<SurfaceId>) {
        if let Some(surface) = self.surface() {
            let doc = self.ctx.document();
            let parent = parent.unwrap_or_else(|| doc.root());
            doc.remove_child(parent, surface);
        }
    }

    pub fn set_style(&self, style: &Style) {
        if let Some(surface) = self.surface() {
            self.ctx.document().set_style(surface, style);
        }
    }
}

impl Drop for View {
    fn drop(&mut self) {
        self.unlisten_all();
        if let Some(surface) = *self.surface.get_mut() {
            if self.owns_surface.load(Ordering::SeqCst) {
                let doc = self.ctx.document();
                if doc.parent(surface).is_some() {
                    doc.orphan(surface);
                } else {
                    doc.release(surface);
                }
            }
        }
    }
}

impl Renderable for View {
    fn view(&self) -> &View {
        self
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

impl fmt::Debug for View {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("View")
            .field("id", &self.id)
            .field("tag", &self.tag)
            .field("surface", &self.surface())
            .field("data", &self.data())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::subject::Handler;

    #[test]
    fn set_data_renders_text_and_fires_change() {
        let ctx = Context::default();
        let view = View::new(&ctx, Value::Empty);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = Arc::clone(&seen);
        view.change_event()
            .subscribe(&Handler::from_fn(move |v: &Value| s.lock().push(v.clone())), None, None);

        view.set_data("hello".into());
        let surface = view.surface().unwrap();
        assert_eq!(ctx.document().html(surface).as_deref(), Some("hello"));
        assert_eq!(*seen.lock(), vec![Value::from("hello")]);

        view.clear();
        assert_eq!(ctx.document().html(surface).as_deref(), Some(""));
        assert_eq!(view.data(), Value::Empty);
        assert_eq!(seen.lock().last(), Some(&Value::Empty));
    }

    #[test]
    fn attach_and_detach_are_idempotent() {
        let ctx = Context::default();
        let doc = ctx.document();
        let view = View::new(&ctx, "x".into());
        view.attach(None);
        view.attach(None);
        assert_eq!(doc.children(doc.root()).len(), 1);
        view.detach(None);
        view.detach(None);
        assert!(doc.children(doc.root()).is_empty());
    }

    #[test]
    fn set_container_adopts_existing_surface() {
        let ctx = Context::default();
        let doc = ctx.document();
        let existing = doc.create("div", None).unwrap();
        let view = View::new(&ctx, Value::Empty);
        let own = view.surface().unwrap();

        view.set_container(Some(existing));
        assert_eq!(view.surface(), Some(existing));
        assert!(!doc.contains(own));

        drop(view);
        assert!(doc.contains(existing));
    }

    #[test]
    fn dropping_releases_owned_surface() {
        let ctx = Context::default();
        let view = View::new(&ctx, "x".into());
        let surface = view.surface().unwrap();
        drop(view);
        assert!(!ctx.document().contains(surface));
    }

    #[test]
    fn disabled_rendering_is_neutral() {
        let mut config = Config::default();
        config.document.rendering_enabled = false;
        let ctx = Context::new(config);
        let view = View::new(&ctx, "data".into());
        assert_eq!(view.surface(), None);
        assert_eq!(view.data(), Value::from("data"));
        view.attach(None);
        view.refresh();
        view.clear();
        assert_eq!(view.data(), Value::Empty);
    }
}
