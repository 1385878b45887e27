//! Bindable data.

use crate::id::ObjectId;
use crate::subject::Subject;
use crate::value::Value;
use core::fmt;
use parking_lot::Mutex;
use std::sync::Arc;

struct SourceState {
    data: Value,
    query: Option<String>,
    page_size: usize,
}

/// An in-memory data source that controls can bind to.
///
/// Bound controls receive the data through the change event whenever it's replaced or
/// refreshed.
pub struct DataSource {
    id: ObjectId,
    state: Mutex<SourceState>,
    change_event: Subject<Value>,
    error_event: Subject<String>,
}

impl DataSource {
    pub fn new(data: Value) -> Arc<DataSource> {
        let id = ObjectId::new();
        Arc::new(DataSource {
            id,
            state: Mutex::new(SourceState {
                data,
                query: None,
                page_size: 0,
            }),
            change_event: Subject::named(Some(id), "source change"),
            error_event: Subject::named(Some(id), "source error"),
        })
    }

    pub fn object_id(&self) -> ObjectId {
        self.id
    }

    pub fn change_event(&self) -> &Subject<Value> {
        &self.change_event
    }

    pub fn error_event(&self) -> &Subject<String> {
        &self.error_event
    }

    /// Replaces the data and notifies bound controls.
    pub fn set_data(&self, data: Value) {
        self.state.lock().data = data.clone();
        self.change_event.fire(&data);
    }

    pub fn data(&self) -> Value {
        self.state.lock().data.clone()
    }

    /// Number of records: list length, 0 for no data, 1 for a single value.
    pub fn data_count(&self) -> usize {
        match &self.state.lock().data {
            Value::List(items) => items.len(),
            Value::Empty => 0,
            _ => 1,
        }
    }

    /// Sets the page size; 0 disables paging.
    pub fn set_page_size(&self, size: usize) {
        self.state.lock().page_size = size;
    }

    pub fn page_size(&self) -> usize {
        self.state.lock().page_size
    }

    pub fn page_count(&self) -> usize {
        let size = self.page_size();
        if size == 0 {
            1
        } else {
            self.data_count() / size + 1
        }
    }

    /// The records on one page. Out-of-range pages are empty.
    pub fn page(&self, index: usize) -> Value {
        let state = self.state.lock();
        let items: &[Value] = match &state.data {
            Value::List(items) => items.as_slice(),
            Value::Empty => &[],
            single => std::slice::from_ref(single),
        };
        if state.page_size == 0 {
            return if index == 0 {
                Value::List(items.to_vec())
            } else {
                Value::List(Vec::new())
            };
        }
        let start = index.saturating_mul(state.page_size).min(items.len());
        let end = start.saturating_add(state.page_size).min(items.len());
        Value::List(items[start..end].to_vec())
    }

    pub fn set_query(&self, query: &str) {
        self.state.lock().query = Some(query.to_string());
    }

    pub fn query(&self) -> Option<String> {
        self.state.lock().query.clone()
    }

    /// Re-sends the current data to bound controls.
    pub fn refresh(&self) {
        let data = self.data();
        self.change_event.fire(&data);
    }

    pub fn report_error(&self, message: &str) {
        self.error_event.fire(&message.to_string());
    }
}

impl fmt::Debug for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("DataSource")
            .field("id", &self.id)
            .field("records", &self.data_count())
            .finish()
    }
}
