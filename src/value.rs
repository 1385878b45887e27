//! Widget payloads.

use crate::id::SurfaceId;
use crate::view::Renderable;
use core::fmt;
use std::cmp::Ordering;
use std::iter::FromIterator;
use std::sync::Arc;

/// The data a widget displays.
///
/// Views and surfaces are carried by handle, so a value can describe a whole subtree; scalars
/// render as text.
#[derive(Clone)]
pub enum Value {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    List(Vec<Value>),
    View(Arc<dyn Renderable>),
    Surface(SurfaceId),
}

impl Value {
    /// Wraps a widget handle.
    pub fn from_view(view: Arc<dyn Renderable>) -> Value {
        Value::View(view)
    }

    /// Returns true for `Empty`, empty text and empty lists.
    pub fn is_empty(&self) -> bool {
        match self {
            Value::Empty => true,
            Value::Text(text) => text.is_empty(),
            Value::List(items) => items.is_empty(),
            _ => false,
        }
    }

    /// The text rendering of this value.
    ///
    /// Integral numbers are printed without a fractional part. Views and surfaces have no
    /// text rendering of their own.
    pub fn to_html(&self) -> String {
        match self {
            Value::Empty | Value::View(_) | Value::Surface(_) => String::new(),
            Value::Text(text) => text.clone(),
            Value::Number(n) => format_number(*n),
            Value::Bool(b) => b.to_string(),
            Value::List(items) => items.iter().map(Value::to_html).collect(),
        }
    }

    /// The surface this value renders to, if it is a view or a surface.
    pub fn surface(&self) -> Option<SurfaceId> {
        match self {
            Value::View(view) => view.surface(),
            Value::Surface(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_view(&self) -> Option<&Arc<dyn Renderable>> {
        match self {
            Value::View(view) => Some(view),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Turns this value into a list: lists as-is, `Empty` as no items, anything else as a
    /// single item.
    pub fn into_list(self) -> Vec<Value> {
        match self {
            Value::List(items) => items,
            Value::Empty => Vec::new(),
            other => vec![other],
        }
    }
}

fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0. && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// Default item ordering: numerically for two numbers, by text rendering otherwise.
pub fn compare(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
        _ => a.to_html().cmp(&b.to_html()),
    }
}

impl Default for Value {
    fn default() -> Value {
        Value::Empty
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Empty, Value::Empty) => true,
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::View(a), Value::View(b)) => {
                Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
            }
            (Value::Surface(a), Value::Surface(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Empty => write!(f, "Empty"),
            Value::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Value::Number(n) => f.debug_tuple("Number").field(n).finish(),
            Value::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Value::List(items) => f.debug_tuple("List").field(items).finish(),
            Value::View(view) => write!(f, "View({}, {:?})", view.view().tag(), view.surface()),
            Value::Surface(id) => f.debug_tuple("Surface").field(id).finish(),
        }
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Value {
        Value::Text(text.to_string())
    }
}

impl From<String> for Value {
    fn from(text: String) -> Value {
        Value::Text(text)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Value {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Value {
        Value::Bool(b)
    }
}

impl From<SurfaceId> for Value {
    fn from(id: SurfaceId) -> Value {
        Value::Surface(id)
    }
}

impl<T: Renderable> From<Arc<T>> for Value {
    fn from(view: Arc<T>) -> Value {
        Value::View(view)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Value {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> FromIterator<T> for Value {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Value {
        Value::List(iter.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn html_rendering() {
        assert_eq!(Value::Number(3.).to_html(), "3");
        assert_eq!(Value::Number(2.5).to_html(), "2.5");
        assert_eq!(Value::from(vec!["a", "b"]).to_html(), "ab");
        assert_eq!(Value::Empty.to_html(), "");
        assert_eq!(Value::Bool(true).to_html(), "true");
    }

    #[test]
    fn emptiness() {
        assert!(Value::Empty.is_empty());
        assert!(Value::from("").is_empty());
        assert!(Value::List(Vec::new()).is_empty());
        assert!(!Value::Number(0.).is_empty());
    }

    #[test]
    fn default_ordering() {
        assert_eq!(compare(&Value::Number(10.), &Value::Number(9.)), Ordering::Greater);
        assert_eq!(compare(&"10".into(), &"9".into()), Ordering::Less);
        assert_eq!(compare(&"a".into(), &"a".into()), Ordering::Equal);
    }

    #[test]
    fn into_list_wraps_scalars() {
        assert_eq!(Value::Empty.into_list(), Vec::<Value>::new());
        assert_eq!(Value::from("x").into_list(), vec![Value::from("x")]);
        let list: Value = vec![1., 2.].into_iter().collect();
        assert_eq!(list.into_list().len(), 2);
    }
}
