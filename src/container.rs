//! Composite widgets.

use crate::context::Context;
use crate::id::SurfaceId;
use crate::subject::Subject;
use crate::surface::Document;
use crate::value::Value;
use crate::view::{Renderable, View};
use std::slice;
use std::sync::Arc;

/// Appends a value's surfaces to `target`, flattening nested lists.
///
/// Views and surfaces are moved under `target` (never `target` itself), scalars are wrapped in
/// `div` text leaves, and `Empty` is skipped.
pub(crate) fn push_value(doc: &Document, target: SurfaceId, value: &Value) {
    let mut stack: Vec<slice::Iter<'_, Value>> = vec![slice::from_ref(value).iter()];
    while let Some(iter) = stack.last_mut() {
        let item = match iter.next() {
            Some(item) => item,
            None => {
                stack.pop();
                continue;
            }
        };
        match item {
            Value::List(items) => stack.push(items.iter()),
            Value::Empty => {}
            Value::View(_) | Value::Surface(_) => {
                if let Some(surface) = item.surface() {
                    if surface != target {
                        doc.append_child(target, surface);
                    }
                }
            }
            scalar => {
                if let Some(leaf) = doc.create_leaf("div", &scalar.to_html()) {
                    doc.append_child(target, leaf);
                }
            }
        }
    }
}

/// Pushes a view's data into its surface.
pub fn draw_content(view: &View) {
    if let Some(surface) = view.surface() {
        push_value(view.context().document(), surface, &view.data());
    }
}

/// A widget whose data is a tree of other widgets, surfaces and text.
pub struct Container {
    pub(crate) view: View,
}

impl Container {
    pub fn new(ctx: &Context, data: Value) -> Arc<Container> {
        let container = Arc::new(Container::core(ctx, "jocontainer"));
        if !data.is_empty() {
            container.set_data(data);
        }
        container
    }

    /// Creates a container core with a fresh surface, for embedding in a widget.
    pub fn core(ctx: &Context, tag: &'static str) -> Container {
        Container {
            view: View::core(ctx, tag),
        }
    }

    /// Appends content without touching the data.
    pub fn push(&self, value: &Value) -> &Self {
        if let Some(surface) = self.view.surface() {
            push_value(self.view.context().document(), surface, value);
        }
        self
    }

    /// The child surfaces currently rendered.
    pub fn content(&self) -> Vec<SurfaceId> {
        self.view
            .surface()
            .map(|surface| self.view.context().document().children(surface))
            .unwrap_or_default()
    }
}

impl_renderable! {
    Container => view;

    fn draw(&self) {
        draw_content(&self.view);
    }
}

/// A container meant to be a stack page; it announces when it's shown and dismissed.
pub struct Card {
    pub(crate) container: Container,
    activate_event: Subject<()>,
    deactivate_event: Subject<()>,
}

impl Card {
    pub fn new(ctx: &Context, data: Value) -> Arc<Card> {
        let container = Container::core(ctx, "jocard");
        let id = container.view.object_id();
        let card = Arc::new(Card {
            container,
            activate_event: Subject::named(Some(id), "activate"),
            deactivate_event: Subject::named(Some(id), "deactivate"),
        });
        if !data.is_empty() {
            card.set_data(data);
        }
        card
    }

    pub fn push(&self, value: &Value) -> &Self {
        self.container.push(value);
        self
    }

    pub fn activate_event(&self) -> &Subject<()> {
        &self.activate_event
    }

    pub fn deactivate_event(&self) -> &Subject<()> {
        &self.deactivate_event
    }
}

impl_renderable! {
    Card => container.view;

    fn draw(&self) {
        draw_content(&self.container.view);
    }

    fn activate(&self) {
        self.activate_event.fire(&());
    }

    fn deactivate(&self) {
        self.deactivate_event.fire(&());
    }
}
