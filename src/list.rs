//! Selectable lists.

use crate::context::Context;
use crate::control::{ControlCore, DataBound, Selectable};
use crate::data_source::DataSource;
use crate::events::{EventHandler, EventKind, InputEvent};
use crate::id::SurfaceId;
use crate::subject::Subject;
use crate::value::{self, Value};
use crate::view::{refresh_view, Renderable};
use parking_lot::Mutex;
use std::cmp::Ordering;
use std::sync::{Arc, Weak};
use tracing::trace;

/// Orders two items.
pub type CompareFn = Arc<dyn Fn(&Value, &Value) -> Ordering + Send + Sync>;

/// Turns an item and its position into something to render, or `None` to skip it.
pub type FormatFn = Arc<dyn Fn(&Value, usize) -> Option<Value> + Send + Sync>;

#[derive(Debug, Clone, Copy)]
struct Row {
    /// Position of the item in the data.
    position: usize,
    surface: SurfaceId,
}

struct ListState {
    index: Option<usize>,
    last_node: Option<SurfaceId>,
    auto_sort: bool,
    default_message: Value,
    compare: CompareFn,
    formatter: Option<FormatFn>,
    rows: Vec<Row>,
}

/// A list of items, one row each, with a single selected row.
///
/// Rows and data positions differ when the formatter skips items. [`index`](List::index) is the
/// selected row; the select event carries the data position of that row's item.
pub struct List {
    core: ControlCore<usize>,
    this: Weak<List>,
    state: Mutex<ListState>,
}

impl List {
    pub fn new(ctx: &Context, data: Value) -> Arc<List> {
        let list = Arc::new_cyclic(|this| List {
            core: ControlCore::new(ctx, "jolist"),
            this: this.clone(),
            state: Mutex::new(ListState {
                index: None,
                last_node: None,
                auto_sort: false,
                default_message: Value::Empty,
                compare: Arc::new(value::compare),
                formatter: None,
                rows: Vec::new(),
            }),
        });
        list.set_events();
        if !data.is_empty() {
            list.set_data(data);
        }
        list
    }

    pub fn core(&self) -> &ControlCore<usize> {
        &self.core
    }

    /// The selected row.
    pub fn index(&self) -> Option<usize> {
        self.state.lock().index
    }

    /// Number of rendered rows.
    pub fn len(&self) -> usize {
        self.state.lock().rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The data position of a rendered row.
    pub fn position(&self, row: usize) -> Option<usize> {
        self.state.lock().rows.get(row).map(|r| r.position)
    }

    /// The item at a data position.
    pub fn item(&self, position: usize) -> Option<Value> {
        self.items().get(position).cloned()
    }

    pub fn items(&self) -> Vec<Value> {
        self.core.view.data().into_list()
    }

    /// Selects a row, firing the select event with its item's position unless `silent`. A
    /// row that isn't rendered clears the selection.
    pub fn set_index(&self, row: usize, silent: bool) {
        let doc = self.core.view.context().document();
        let position = {
            let mut state = self.state.lock();
            let (surface, position) = match state.rows.get(row).map(|r| (r.surface, r.position)) {
                Some(found) => found,
                None => {
                    drop(state);
                    self.deselect();
                    return;
                }
            };
            if let Some(last) = state.last_node.take() {
                doc.remove_class(last, "selected");
            }
            doc.add_class(surface, "selected");
            state.last_node = Some(surface);
            state.index = Some(row);
            position
        };
        trace!(row, position, silent, "list selection");
        if !silent {
            self.core.select_event().fire(&position);
        }
    }

    /// Clears the selection.
    pub fn deselect(&self) {
        let mut state = self.state.lock();
        if let Some(last) = state.last_node.take() {
            self.core.view.context().document().remove_class(last, "selected");
        }
        state.index = None;
    }

    /// Selects the next row; with nothing selected, the first.
    pub fn next(&self) {
        let (index, len) = {
            let state = self.state.lock();
            (state.index, state.rows.len())
        };
        match index {
            None if len > 0 => self.set_index(0, false),
            Some(i) if i + 1 < len => self.set_index(i + 1, false),
            _ => {}
        }
    }

    pub fn prev(&self) {
        let index = self.state.lock().index;
        if let Some(i) = index {
            if i > 0 {
                self.set_index(i - 1, false);
            }
        }
    }

    /// Sorts the data in place (stable).
    pub fn sort(&self) {
        let compare = self.state.lock().compare.clone();
        let mut items = self.items();
        items.sort_by(|a, b| compare(a, b));
        self.core.view.store(Value::List(items));
    }

    pub fn set_auto_sort(&self, auto_sort: bool) -> &Self {
        self.state.lock().auto_sort = auto_sort;
        self
    }

    /// Sets what to show when there are no items.
    pub fn set_default(&self, message: Value) -> &Self {
        self.state.lock().default_message = message;
        if self.items().is_empty() {
            self.refresh();
        }
        self
    }

    pub fn set_compare<F>(&self, compare: F) -> &Self
    where
        F: 'static + Fn(&Value, &Value) -> Ordering + Send + Sync,
    {
        self.state.lock().compare = Arc::new(compare);
        self
    }

    pub fn set_formatter<F>(&self, formatter: F) -> &Self
    where
        F: 'static + Fn(&Value, usize) -> Option<Value> + Send + Sync,
    {
        self.state.lock().formatter = Some(Arc::new(formatter));
        self
    }

    pub fn enable(&self) {
        self.core.enable();
    }

    pub fn disable(&self) {
        self.core.disable();
    }

    /// Resolves a click anywhere inside a row to that row.
    fn on_click(&self, event: &mut InputEvent) {
        let own = match self.core.view.surface() {
            Some(surface) => surface,
            None => return,
        };
        let doc = self.core.view.context().document();
        let position = doc
            .ancestors(event.target)
            .into_iter()
            .take_while(|surface| *surface != own)
            .find_map(|surface| doc.attribute(surface, "index"))
            .and_then(|index| index.parse::<usize>().ok());
        let row = position.and_then(|position| {
            self.state
                .lock()
                .rows
                .iter()
                .position(|row| row.position == position)
        });
        if let Some(row) = row {
            event.stop_propagation();
            self.set_index(row, false);
        }
    }

    fn render_item(&self, formatted: &Value) -> Option<SurfaceId> {
        match formatted {
            Value::View(_) | Value::Surface(_) => formatted.surface(),
            other => self
                .core
                .view
                .context()
                .document()
                .create_leaf("jolistitem", &other.to_html()),
        }
    }
}

impl_renderable! {
    List => core.view;

    fn set_data(&self, data: Value) {
        self.core.view.store(Value::List(data.into_list()));
        self.refresh();
    }

    fn refresh(&self) {
        let auto_sort = {
            let mut state = self.state.lock();
            state.index = None;
            state.last_node = None;
            state.auto_sort
        };
        if auto_sort {
            self.sort();
        }
        refresh_view(self);
    }

    /// Drops the data, the rows and the selection, then shows the default message.
    fn clear(&self) {
        {
            let mut state = self.state.lock();
            state.index = None;
            state.last_node = None;
            state.rows.clear();
        }
        let view = &self.core.view;
        view.store(Value::Empty);
        view.clear_surface();
        self.draw();
        view.change_event().fire_empty();
    }

    fn draw(&self) {
        let surface = match self.core.view.surface() {
            Some(surface) => surface,
            None => return,
        };
        let doc = self.core.view.context().document();
        let items = self.items();
        let (default_message, formatter) = {
            let mut state = self.state.lock();
            state.rows.clear();
            (state.default_message.clone(), state.formatter.clone())
        };

        if items.is_empty() && !default_message.is_empty() {
            match &default_message {
                Value::View(_) | Value::Surface(_) | Value::List(_) => {
                    crate::container::push_value(doc, surface, &default_message)
                }
                other => doc.set_html(surface, &other.to_html()),
            }
            return;
        }

        let mut rows = Vec::with_capacity(items.len());
        for (position, item) in items.iter().enumerate() {
            let formatted = match &formatter {
                Some(format) => format(item, position),
                None => Some(item.clone()),
            };
            let leaf = match formatted.and_then(|formatted| self.render_item(&formatted)) {
                Some(leaf) => leaf,
                None => continue,
            };
            doc.set_attribute(leaf, "index", &position.to_string());
            doc.append_child(surface, leaf);
            rows.push(Row {
                position,
                surface: leaf,
            });
        }
        self.state.lock().rows = rows;
    }

    fn set_events(&self) {
        let this = self.this.clone();
        self.core.view.listen(
            EventKind::Click,
            EventHandler::new(move |event| {
                if let Some(list) = this.upgrade() {
                    list.on_click(event);
                }
            }),
            false,
        );
    }
}

impl Selectable for List {
    type Selection = usize;

    fn select_event(&self) -> &Subject<usize> {
        self.core.select_event()
    }
}

impl DataBound for List {
    fn set_data_source(&self, source: &Arc<DataSource>) {
        let target: Weak<dyn Renderable> = self.this.clone();
        self.core.bind(source, target);
    }

    fn data_source(&self) -> Option<Arc<DataSource>> {
        self.core.data_source()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subject::Handler;

    fn rendered(ctx: &Context, list: &List) -> Vec<String> {
        let doc = ctx.document();
        doc.children(list.surface().unwrap())
            .into_iter()
            .map(|row| doc.text(row))
            .collect()
    }

    #[test]
    fn rows_carry_their_position() {
        let ctx = Context::default();
        let list = List::new(&ctx, Value::from(vec!["a", "b"]));
        let doc = ctx.document();
        let rows = doc.children(list.surface().unwrap());
        assert_eq!(rows.len(), 2);
        assert_eq!(doc.attribute(rows[1], "index").as_deref(), Some("1"));
        assert_eq!(doc.tag(rows[0]).as_deref(), Some("jolistitem"));
    }

    #[test]
    fn selection_moves_class_and_fires() {
        let ctx = Context::default();
        let list = List::new(&ctx, Value::from(vec!["a", "b", "c"]));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = Arc::clone(&seen);
        list.select_event()
            .subscribe(&Handler::from_fn(move |row: &usize| s.lock().push(*row)), None, None);

        let doc = ctx.document();
        let rows = doc.children(list.surface().unwrap());
        list.set_index(1, false);
        list.set_index(2, false);
        list.set_index(0, true);
        assert!(doc.has_class(rows[0], "selected"));
        assert!(!doc.has_class(rows[2], "selected"));
        assert_eq!(*seen.lock(), vec![1, 2]);

        list.set_index(7, false);
        assert_eq!(list.index(), None);
        assert!(!doc.has_class(rows[0], "selected"));
    }

    #[test]
    fn next_and_prev_clamp() {
        let ctx = Context::default();
        let list = List::new(&ctx, Value::from(vec!["a", "b"]));
        list.prev();
        assert_eq!(list.index(), None);
        list.next();
        assert_eq!(list.index(), Some(0));
        list.next();
        list.next();
        assert_eq!(list.index(), Some(1));
        list.prev();
        list.prev();
        assert_eq!(list.index(), Some(0));
    }

    #[test]
    fn formatter_can_skip_items() {
        let ctx = Context::default();
        let list = List::new(&ctx, Value::Empty);
        list.set_formatter(|item, _| {
            if item.to_html() == "skip" {
                None
            } else {
                Some(Value::from(format!("<{}>", item.to_html())))
            }
        });
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = Arc::clone(&seen);
        list.select_event()
            .subscribe(&Handler::from_fn(move |pos: &usize| s.lock().push(*pos)), None, None);
        list.set_data(Value::from(vec!["a", "skip", "b"]));
        assert_eq!(rendered(&ctx, &list), vec!["<a>", "<b>"]);
        assert_eq!(list.position(1), Some(2));
        assert_eq!(list.position(2), None);

        let doc = ctx.document();
        let rows = doc.children(list.surface().unwrap());
        let leaf = doc.create_leaf("span", "inner").unwrap();
        doc.append_child(rows[1], leaf);
        ctx.dispatch(InputEvent::new(EventKind::Click, leaf));
        assert_eq!(list.index(), Some(1));
        assert_eq!(*seen.lock(), vec![2]);
        assert_eq!(list.item(seen.lock()[0]), Some(Value::from("b")));
    }

    #[test]
    fn clear_drops_rows_and_selection() {
        let ctx = Context::default();
        let doc = ctx.document();
        let list = List::new(&ctx, Value::from(vec!["a", "b"]));
        list.set_default("Empty".into());
        list.set_index(1, true);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = Arc::clone(&seen);
        list.select_event()
            .subscribe(&Handler::from_fn(move |pos: &usize| s.lock().push(*pos)), None, None);

        list.clear();
        assert_eq!(list.len(), 0);
        assert_eq!(list.index(), None);
        assert!(list.items().is_empty());
        let surface = list.surface().unwrap();
        assert!(doc.children(surface).is_empty());
        assert_eq!(doc.html(surface).as_deref(), Some("Empty"));

        list.set_index(0, false);
        assert_eq!(list.index(), None);
        assert!(seen.lock().is_empty());
    }

    #[test]
    fn default_message_when_empty() {
        let ctx = Context::default();
        let list = List::new(&ctx, Value::Empty);
        list.set_default("Nothing here".into());
        let surface = list.surface().unwrap();
        assert_eq!(ctx.document().html(surface).as_deref(), Some("Nothing here"));
        assert!(list.is_empty());

        list.set_data(Value::from(vec!["x"]));
        assert_eq!(rendered(&ctx, &list), vec!["x"]);
    }

    #[test]
    fn auto_sort_on_refresh() {
        let ctx = Context::default();
        let list = List::new(&ctx, Value::Empty);
        list.set_auto_sort(true);
        list.set_data(Value::from(vec!["a", "c", "b"]));
        assert_eq!(rendered(&ctx, &list), vec!["a", "b", "c"]);

        list.set_compare(|a, b| value::compare(b, a));
        list.refresh();
        assert_eq!(rendered(&ctx, &list), vec!["c", "b", "a"]);
    }

    #[test]
    fn bound_list_follows_source() {
        let ctx = Context::default();
        let source = DataSource::new(Value::Empty);
        let list = List::new(&ctx, Value::Empty);
        list.set_data_source(&source);
        source.set_data(Value::from(vec!["one", "two"]));
        assert_eq!(list.len(), 2);
        assert!(list.data_source().is_some());
    }
}
