//! The retained surface tree.
//!
//! A [`Document`] holds every surface a widget can draw into, much like a native-view tree
//! mirrors a backend. Surfaces carry a tag, a class list, inline style properties,
//! attributes, html text and an ordered list of child surfaces. Layout is performed by the
//! host, which reports each surface's bounds back through [`Document::set_bounds`].
//!
//! Surfaces created on behalf of widgets belong to those widgets. Anonymous surfaces (text
//! leaves wrapped by containers, list rows) belong to their parent and are destroyed when
//! the parent's content is cleared.

use crate::error::StyleError;
use crate::id::SurfaceId;
use crate::rect::Rect;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::convert::TryFrom;
use std::fmt;
use tracing::warn;

/// A style descriptor.
#[derive(Debug, Clone, PartialEq)]
pub enum Style {
    /// Replaces the class list (whitespace separated).
    Class(String),
    /// Sets inline properties. `id` and `className` are applied as the surface id and
    /// class list instead.
    Props(Vec<(String, String)>),
}

impl From<&str> for Style {
    fn from(class: &str) -> Style {
        Style::Class(class.to_string())
    }
}

impl TryFrom<toml::Value> for Style {
    type Error = StyleError;

    fn try_from(value: toml::Value) -> Result<Style, StyleError> {
        match value {
            toml::Value::String(class) => Ok(Style::Class(class)),
            toml::Value::Table(table) => {
                let mut props = Vec::with_capacity(table.len());
                for (property, value) in table {
                    let value = match value {
                        toml::Value::String(s) => s,
                        toml::Value::Integer(i) => i.to_string(),
                        toml::Value::Float(f) => f.to_string(),
                        toml::Value::Boolean(b) => b.to_string(),
                        other => {
                            return Err(StyleError::InvalidProperty {
                                property,
                                found: other.type_str(),
                            })
                        }
                    };
                    props.push((property, value));
                }
                Ok(Style::Props(props))
            }
            other => Err(StyleError::Unrecognized {
                found: other.type_str(),
            }),
        }
    }
}

#[derive(Debug)]
struct Node {
    tag: String,
    classes: Vec<String>,
    style: BTreeMap<String, String>,
    attributes: BTreeMap<String, String>,
    html: String,
    children: Vec<SurfaceId>,
    parent: Option<SurfaceId>,
    /// Owned by the parent rather than by a widget.
    anonymous: bool,
    bounds: Rect,
    translate_y: f64,
    value: Option<String>,
    editable: bool,
}

impl Node {
    fn new(tag: &str, anonymous: bool) -> Node {
        Node {
            tag: tag.to_string(),
            classes: Vec::new(),
            style: BTreeMap::new(),
            attributes: BTreeMap::new(),
            html: String::new(),
            children: Vec::new(),
            parent: None,
            anonymous,
            bounds: Rect::zero(),
            translate_y: 0.,
            value: None,
            editable: false,
        }
    }
}

struct Tree {
    enabled: bool,
    root: SurfaceId,
    nodes: HashMap<SurfaceId, Node>,
}

impl Tree {
    fn detach(&mut self, id: SurfaceId) {
        let parent = match self.nodes.get_mut(&id) {
            Some(node) => node.parent.take(),
            None => return,
        };
        if let Some(parent) = parent.and_then(|p| self.nodes.get_mut(&p)) {
            parent.children.retain(|child| *child != id);
        }
    }

    /// Removes a node. Widget-owned children are orphaned, anonymous ones destroyed too.
    fn destroy(&mut self, id: SurfaceId) {
        self.detach(id);
        if let Some(node) = self.nodes.remove(&id) {
            for child in node.children {
                self.drop_child(child);
            }
        }
    }

    fn drop_child(&mut self, child: SurfaceId) {
        let anonymous = match self.nodes.get_mut(&child) {
            Some(node) => {
                node.parent = None;
                node.anonymous
            }
            None => return,
        };
        if anonymous {
            self.destroy(child);
        }
    }

    fn is_ancestor(&self, ancestor: SurfaceId, mut id: SurfaceId) -> bool {
        loop {
            if id == ancestor {
                return true;
            }
            match self.nodes.get(&id).and_then(|node| node.parent) {
                Some(parent) => id = parent,
                None => return false,
            }
        }
    }

    fn apply_style(node: &mut Node, style: &Style) {
        match style {
            Style::Class(class) => {
                node.classes = class.split_whitespace().map(str::to_string).collect();
            }
            Style::Props(props) => {
                for (property, value) in props {
                    match property.as_str() {
                        "id" => {
                            node.attributes.insert("id".to_string(), value.clone());
                        }
                        "className" => {
                            node.classes = value.split_whitespace().map(str::to_string).collect();
                        }
                        _ => {
                            node.style.insert(property.clone(), value.clone());
                        }
                    }
                }
            }
        }
    }
}

/// The retained tree of surfaces.
///
/// All operations on unknown surfaces are no-ops that return a neutral value.
pub struct Document {
    tree: Mutex<Tree>,
}

impl Document {
    /// Creates a document with a `body` root surface.
    ///
    /// With `enabled` false, [`create`](Document::create) never returns a surface.
    pub fn new(enabled: bool) -> Document {
        let root = SurfaceId::new();
        let mut nodes = HashMap::new();
        nodes.insert(root, Node::new("body", false));
        Document {
            tree: Mutex::new(Tree {
                enabled,
                root,
                nodes,
            }),
        }
    }

    /// The root surface.
    pub fn root(&self) -> SurfaceId {
        self.tree.lock().root
    }

    pub fn is_enabled(&self) -> bool {
        self.tree.lock().enabled
    }

    /// Creates a detached surface.
    ///
    /// Returns `None` if rendering is disabled.
    pub fn create(&self, tag: &str, style: Option<&Style>) -> Option<SurfaceId> {
        let mut tree = self.tree.lock();
        if !tree.enabled {
            warn!(tag, "rendering disabled; no surface created");
            return None;
        }
        let id = SurfaceId::new();
        let mut node = Node::new(tag, false);
        if let Some(style) = style {
            Tree::apply_style(&mut node, style);
        }
        tree.nodes.insert(id, node);
        Some(id)
    }

    /// Creates an anonymous leaf holding html text; it's destroyed along with its parent's
    /// content.
    pub fn create_leaf(&self, tag: &str, html: &str) -> Option<SurfaceId> {
        let mut tree = self.tree.lock();
        if !tree.enabled {
            return None;
        }
        let id = SurfaceId::new();
        let mut node = Node::new(tag, true);
        node.html = html.to_string();
        tree.nodes.insert(id, node);
        Some(id)
    }

    /// Destroys a surface. Widget-owned children are detached, anonymous ones destroyed.
    pub fn release(&self, id: SurfaceId) {
        let mut tree = self.tree.lock();
        if id != tree.root {
            tree.destroy(id);
        }
    }

    /// Hands an attached surface over to its parent; it's destroyed when the parent's
    /// content is cleared.
    pub fn orphan(&self, id: SurfaceId) {
        if let Some(node) = self.tree.lock().nodes.get_mut(&id) {
            node.anonymous = true;
        }
    }

    /// Returns true for surfaces owned by their parent rather than by a widget.
    pub fn is_anonymous(&self, id: SurfaceId) -> bool {
        self.tree
            .lock()
            .nodes
            .get(&id)
            .map_or(false, |node| node.anonymous)
    }

    pub fn contains(&self, id: SurfaceId) -> bool {
        self.tree.lock().nodes.contains_key(&id)
    }

    /// Number of live surfaces, including the root.
    pub fn len(&self) -> usize {
        self.tree.lock().nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn tag(&self, id: SurfaceId) -> Option<String> {
        self.tree.lock().nodes.get(&id).map(|node| node.tag.clone())
    }

    /// Appends a child, moving it from its current parent if necessary.
    ///
    /// Returns false if either surface is unknown or the append would create a cycle.
    pub fn append_child(&self, parent: SurfaceId, child: SurfaceId) -> bool {
        let mut tree = self.tree.lock();
        if !tree.nodes.contains_key(&parent) || !tree.nodes.contains_key(&child) {
            return false;
        }
        if tree.is_ancestor(child, parent) {
            return false;
        }
        tree.detach(child);
        if let Some(node) = tree.nodes.get_mut(&child) {
            node.parent = Some(parent);
        }
        if let Some(node) = tree.nodes.get_mut(&parent) {
            node.children.push(child);
        }
        true
    }

    /// Removes a child from a parent. No-op unless `child` is currently a child of `parent`.
    ///
    /// Anonymous children have no other owner and are destroyed.
    pub fn remove_child(&self, parent: SurfaceId, child: SurfaceId) -> bool {
        let mut tree = self.tree.lock();
        let is_child = tree.nodes.get(&child).and_then(|node| node.parent) == Some(parent);
        if is_child {
            tree.detach(child);
            tree.drop_child(child);
        }
        is_child
    }

    /// Removes a surface from whatever parent it has.
    pub fn detach(&self, id: SurfaceId) {
        self.tree.lock().detach(id);
    }

    /// Empties a surface's content: html text and children.
    pub fn clear(&self, id: SurfaceId) {
        let mut tree = self.tree.lock();
        let children = match tree.nodes.get_mut(&id) {
            Some(node) => {
                node.html.clear();
                std::mem::take(&mut node.children)
            }
            None => return,
        };
        for child in children {
            tree.drop_child(child);
        }
    }

    /// Replaces a surface's content with html text.
    pub fn set_html(&self, id: SurfaceId, html: &str) {
        self.clear(id);
        if let Some(node) = self.tree.lock().nodes.get_mut(&id) {
            node.html = html.to_string();
        }
    }

    pub fn html(&self, id: SurfaceId) -> Option<String> {
        self.tree.lock().nodes.get(&id).map(|node| node.html.clone())
    }

    pub fn parent(&self, id: SurfaceId) -> Option<SurfaceId> {
        self.tree.lock().nodes.get(&id).and_then(|node| node.parent)
    }

    pub fn children(&self, id: SurfaceId) -> Vec<SurfaceId> {
        self.tree
            .lock()
            .nodes
            .get(&id)
            .map(|node| node.children.clone())
            .unwrap_or_default()
    }

    pub fn first_child(&self, id: SurfaceId) -> Option<SurfaceId> {
        self.tree
            .lock()
            .nodes
            .get(&id)
            .and_then(|node| node.children.first().copied())
    }

    /// The surface followed by its ancestors, nearest first.
    pub fn ancestors(&self, id: SurfaceId) -> Vec<SurfaceId> {
        let tree = self.tree.lock();
        let mut path = Vec::new();
        let mut current = Some(id);
        while let Some(id) = current {
            match tree.nodes.get(&id) {
                Some(node) => {
                    path.push(id);
                    current = node.parent;
                }
                None => break,
            }
        }
        path
    }

    /// Returns true if the surface is connected to the root.
    pub fn is_attached(&self, id: SurfaceId) -> bool {
        let root = self.root();
        self.ancestors(id).last() == Some(&root)
    }

    /// Finds an attached surface by its `id` attribute.
    pub fn element_by_id(&self, name: &str) -> Option<SurfaceId> {
        let candidates: Vec<SurfaceId> = {
            let tree = self.tree.lock();
            tree.nodes
                .iter()
                .filter(|(_, node)| node.attributes.get("id").map(String::as_str) == Some(name))
                .map(|(id, _)| *id)
                .collect()
        };
        candidates.into_iter().find(|id| self.is_attached(*id))
    }

    pub fn add_class(&self, id: SurfaceId, class: &str) {
        if let Some(node) = self.tree.lock().nodes.get_mut(&id) {
            if !node.classes.iter().any(|c| c == class) {
                node.classes.push(class.to_string());
            }
        }
    }

    /// Removes every occurrence of a class.
    pub fn remove_class(&self, id: SurfaceId, class: &str) {
        if let Some(node) = self.tree.lock().nodes.get_mut(&id) {
            node.classes.retain(|c| c != class);
        }
    }

    pub fn toggle_class(&self, id: SurfaceId, class: &str) {
        if let Some(node) = self.tree.lock().nodes.get_mut(&id) {
            if node.classes.iter().any(|c| c == class) {
                node.classes.retain(|c| c != class);
            } else {
                node.classes.push(class.to_string());
            }
        }
    }

    pub fn has_class(&self, id: SurfaceId, class: &str) -> bool {
        self.tree
            .lock()
            .nodes
            .get(&id)
            .map_or(false, |node| node.classes.iter().any(|c| c == class))
    }

    pub fn classes(&self, id: SurfaceId) -> Vec<String> {
        self.tree
            .lock()
            .nodes
            .get(&id)
            .map(|node| node.classes.clone())
            .unwrap_or_default()
    }

    pub fn set_style(&self, id: SurfaceId, style: &Style) {
        if let Some(node) = self.tree.lock().nodes.get_mut(&id) {
            Tree::apply_style(node, style);
        }
    }

    /// Sets one inline style property; an empty value removes it.
    pub fn set_style_property(&self, id: SurfaceId, property: &str, value: &str) {
        if let Some(node) = self.tree.lock().nodes.get_mut(&id) {
            if value.is_empty() {
                node.style.remove(property);
            } else {
                node.style.insert(property.to_string(), value.to_string());
            }
        }
    }

    pub fn style_property(&self, id: SurfaceId, property: &str) -> Option<String> {
        self.tree
            .lock()
            .nodes
            .get(&id)
            .and_then(|node| node.style.get(property).cloned())
    }

    pub fn set_attribute(&self, id: SurfaceId, name: &str, value: &str) {
        if let Some(node) = self.tree.lock().nodes.get_mut(&id) {
            node.attributes.insert(name.to_string(), value.to_string());
        }
    }

    pub fn attribute(&self, id: SurfaceId, name: &str) -> Option<String> {
        self.tree
            .lock()
            .nodes
            .get(&id)
            .and_then(|node| node.attributes.get(name).cloned())
    }

    /// Layout bounds as reported by the host; zero until then.
    pub fn bounds(&self, id: SurfaceId) -> Rect {
        self.tree
            .lock()
            .nodes
            .get(&id)
            .map(|node| node.bounds)
            .unwrap_or_default()
    }

    pub fn set_bounds(&self, id: SurfaceId, bounds: Rect) {
        if let Some(node) = self.tree.lock().nodes.get_mut(&id) {
            node.bounds = bounds;
        }
    }

    /// Vertical translation applied on top of layout (used for scrolling).
    pub fn translate_y(&self, id: SurfaceId) -> f64 {
        self.tree
            .lock()
            .nodes
            .get(&id)
            .map_or(0., |node| node.translate_y)
    }

    pub fn set_translate_y(&self, id: SurfaceId, y: f64) {
        let transform = if y == 0. {
            String::new()
        } else {
            format!("translate3d(0, {}px, 0)", y)
        };
        if let Some(node) = self.tree.lock().nodes.get_mut(&id) {
            node.translate_y = y;
        }
        self.set_style_property(id, "transform", &transform);
    }

    /// The live value of an input surface, as last reported by the host.
    pub fn value(&self, id: SurfaceId) -> Option<String> {
        self.tree
            .lock()
            .nodes
            .get(&id)
            .and_then(|node| node.value.clone())
    }

    pub fn set_value(&self, id: SurfaceId, value: Option<String>) {
        if let Some(node) = self.tree.lock().nodes.get_mut(&id) {
            node.value = value;
        }
    }

    pub fn is_editable(&self, id: SurfaceId) -> bool {
        self.tree
            .lock()
            .nodes
            .get(&id)
            .map_or(false, |node| node.editable)
    }

    pub fn set_editable(&self, id: SurfaceId, editable: bool) {
        if let Some(node) = self.tree.lock().nodes.get_mut(&id) {
            node.editable = editable;
        }
    }

    /// Concatenated html text of a surface and its descendants, in tree order.
    pub fn text(&self, id: SurfaceId) -> String {
        let tree = self.tree.lock();
        let mut text = String::new();
        let mut stack = vec![id];
        while let Some(id) = stack.pop() {
            if let Some(node) = tree.nodes.get(&id) {
                text.push_str(&node.html);
                stack.extend(node.children.iter().rev().copied());
            }
        }
        text
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let tree = self.tree.lock();
        f.debug_struct("Document")
            .field("enabled", &tree.enabled)
            .field("root", &tree.root)
            .field("nodes", &tree.nodes.len())
            .finish()
    }
}
