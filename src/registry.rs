//! Building widgets from an existing surface tree.
//!
//! A host may hand the toolkit a document that already contains markup, e.g. a `jocard`
//! node with a `jolist` inside it. [`Interface::build`] walks such a tree bottom-up and turns
//! every node whose tag is registered in a [`TagRegistry`] into the corresponding widget,
//! bound to that node. Nodes with an `id` attribute can then be looked up by name.

use crate::container::{Card, Container};
use crate::context::Context;
use crate::control::Control;
use crate::id::SurfaceId;
use crate::list::List;
use crate::scroller::Scroller;
use crate::stack::Stack;
use crate::value::Value;
use crate::view::{Renderable, View};
use core::fmt;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Creates an empty widget.
pub type Factory = fn(&Context) -> Arc<dyn Renderable>;

fn make_view(ctx: &Context) -> Arc<dyn Renderable> {
    View::new(ctx, Value::Empty)
}

fn make_container(ctx: &Context) -> Arc<dyn Renderable> {
    Container::new(ctx, Value::Empty)
}

fn make_card(ctx: &Context) -> Arc<dyn Renderable> {
    Card::new(ctx, Value::Empty)
}

fn make_control(ctx: &Context) -> Arc<dyn Renderable> {
    Control::new(ctx, Value::Empty)
}

fn make_list(ctx: &Context) -> Arc<dyn Renderable> {
    List::new(ctx, Value::Empty)
}

fn make_stack(ctx: &Context) -> Arc<dyn Renderable> {
    Stack::new(ctx, Value::Empty)
}

fn make_scroller(ctx: &Context) -> Arc<dyn Renderable> {
    Scroller::new(ctx, Value::Empty)
}

/// Maps surface tags to widget factories.
#[derive(Clone, Default)]
pub struct TagRegistry {
    factories: HashMap<String, Factory>,
}

impl fmt::Debug for TagRegistry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut tags: Vec<&String> = self.factories.keys().collect();
        tags.sort();
        f.debug_struct("TagRegistry").field("tags", &tags).finish()
    }
}

impl TagRegistry {
    /// An empty registry.
    pub fn new() -> TagRegistry {
        TagRegistry::default()
    }

    /// A registry with every built-in widget under its own tag.
    pub fn with_defaults() -> TagRegistry {
        let mut registry = TagRegistry::new();
        registry
            .register("joview", make_view)
            .register("jocontainer", make_container)
            .register("jocard", make_card)
            .register("jocontrol", make_control)
            .register("jolist", make_list)
            .register("jostack", make_stack)
            .register("joscroller", make_scroller);
        registry
    }

    pub fn register(&mut self, tag: &str, factory: Factory) -> &mut Self {
        self.factories.insert(tag.to_string(), factory);
        self
    }

    pub fn get(&self, tag: &str) -> Option<Factory> {
        self.factories.get(tag).copied()
    }
}

/// The widgets built from a surface tree.
pub struct Interface {
    widgets: HashMap<String, Arc<dyn Renderable>>,
    surfaces: HashMap<String, SurfaceId>,
    created: Vec<Arc<dyn Renderable>>,
}

impl Interface {
    /// Builds widgets for the tree under `root` (default: the document root).
    pub fn build(ctx: &Context, registry: &TagRegistry, root: Option<SurfaceId>) -> Interface {
        let mut interface = Interface {
            widgets: HashMap::new(),
            surfaces: HashMap::new(),
            created: Vec::new(),
        };
        let root = root.unwrap_or_else(|| ctx.document().root());
        interface.parse(ctx, registry, root);
        debug!(
            widgets = interface.created.len(),
            named = interface.surfaces.len(),
            "interface built"
        );
        interface
    }

    fn parse(&mut self, ctx: &Context, registry: &TagRegistry, node: SurfaceId) -> Option<Value> {
        let doc = ctx.document();
        let tag = doc.tag(node)?;
        let children = doc.children(node);

        if children.is_empty() && doc.is_anonymous(node) {
            return doc.html(node).map(Value::Text);
        }

        let mut kids: Vec<Value> = children
            .into_iter()
            .filter_map(|child| self.parse(ctx, registry, child))
            .collect();

        let value = match registry.get(&tag) {
            Some(factory) => {
                let args = match kids.len() {
                    0 => {
                        let text = doc.value(node).unwrap_or_else(|| doc.text(node));
                        if text.is_empty() {
                            Value::Empty
                        } else {
                            Value::Text(text)
                        }
                    }
                    1 => kids.remove(0),
                    _ => Value::List(kids),
                };
                let widget = factory(ctx);
                widget.set_container(Some(node));
                widget.set_data(args);
                self.created.push(Arc::clone(&widget));
                if let Some(name) = doc.attribute(node, "id") {
                    self.widgets.insert(name, Arc::clone(&widget));
                }
                Value::View(widget)
            }
            None => Value::Surface(node),
        };

        if let Some(name) = doc.attribute(node, "id") {
            self.surfaces.insert(name, node);
        }
        Some(value)
    }

    /// The widget built for the node with this id.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Renderable>> {
        self.widgets.get(name).cloned()
    }

    /// The widget built for the node with this id, if it has type `T`.
    pub fn get_as<T: Renderable>(&self, name: &str) -> Option<Arc<T>> {
        self.get(name)?.into_any().downcast::<T>().ok()
    }

    /// The node with this id, whether or not it became a widget.
    pub fn surface(&self, name: &str) -> Option<SurfaceId> {
        self.surfaces.get(name).copied()
    }

    /// Every widget created, children before parents.
    pub fn widgets(&self) -> &[Arc<dyn Renderable>] {
        &self.created
    }
}
