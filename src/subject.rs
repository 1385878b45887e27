//! Publish/subscribe.
//!
//! Every widget event (`change_event`, `select_event`, `push_event`, ...) is a [`Subject`].
//! Subscribers are [`Handler`]s, compared by identity, so the same handle that subscribed is
//! needed to unsubscribe.

use crate::id::ObjectId;
use crate::value::Value;
use core::fmt;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::trace;

type HandlerFn<T> = dyn Fn(&T, Option<ObjectId>, Option<&Value>) + Send + Sync;

/// A subscriber callback.
///
/// Called with the payload, the subject owner and the data given at subscription time.
pub struct Handler<T>(Arc<HandlerFn<T>>);

impl<T> Handler<T> {
    pub fn new<F>(handler: F) -> Handler<T>
    where
        F: 'static + Fn(&T, Option<ObjectId>, Option<&Value>) + Send + Sync,
    {
        Handler(Arc::new(handler))
    }

    /// Creates a handler that only looks at the payload.
    pub fn from_fn<F>(handler: F) -> Handler<T>
    where
        F: 'static + Fn(&T) + Send + Sync,
        T: 'static,
    {
        Handler::new(move |payload: &T, _: Option<ObjectId>, _: Option<&Value>| handler(payload))
    }

    fn call(&self, payload: &T, owner: Option<ObjectId>, data: Option<&Value>) {
        (self.0)(payload, owner, data)
    }
}

impl<T> Clone for Handler<T> {
    fn clone(&self) -> Self {
        Handler(Arc::clone(&self.0))
    }
}

impl<T> PartialEq for Handler<T> {
    fn eq(&self, other: &Handler<T>) -> bool {
        Arc::as_ptr(&self.0) as *const () == Arc::as_ptr(&other.0) as *const ()
    }
}

impl<T> fmt::Debug for Handler<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Handler({:p})", Arc::as_ptr(&self.0) as *const ())
    }
}

struct Subscription<T> {
    handler: Handler<T>,
    context: Option<ObjectId>,
    data: Option<Value>,
    exclusive: bool,
}

impl<T> Clone for Subscription<T> {
    fn clone(&self) -> Self {
        Subscription {
            handler: self.handler.clone(),
            context: self.context,
            data: self.data.clone(),
            exclusive: self.exclusive,
        }
    }
}

/// An observable event.
pub struct Subject<T> {
    owner: Option<ObjectId>,
    name: &'static str,
    subscriptions: Mutex<Vec<Subscription<T>>>,
}

impl<T> Subject<T> {
    pub fn new(owner: Option<ObjectId>) -> Subject<T> {
        Subject::named(owner, "subject")
    }

    /// Creates a subject with a name, used in log output.
    pub fn named(owner: Option<ObjectId>, name: &'static str) -> Subject<T> {
        Subject {
            owner,
            name,
            subscriptions: Mutex::new(Vec::new()),
        }
    }

    pub fn owner(&self) -> Option<ObjectId> {
        self.owner
    }

    /// Adds a subscriber after all existing ones.
    pub fn subscribe(
        &self,
        handler: &Handler<T>,
        context: Option<ObjectId>,
        data: Option<Value>,
    ) -> &Self {
        self.subscriptions.lock().push(Subscription {
            handler: handler.clone(),
            context,
            data,
            exclusive: false,
        });
        self
    }

    /// Adds an exclusive subscriber in front of all others.
    ///
    /// While it is subscribed, no later subscriber will be notified. Captures nest: the most
    /// recent capture wins until it's released.
    pub fn capture(
        &self,
        handler: &Handler<T>,
        context: Option<ObjectId>,
        data: Option<Value>,
    ) -> &Self {
        self.subscriptions.lock().insert(
            0,
            Subscription {
                handler: handler.clone(),
                context,
                data,
                exclusive: true,
            },
        );
        self
    }

    /// Removes the first subscription of `handler` whose context is `context` or unset.
    pub fn unsubscribe(&self, handler: &Handler<T>, context: Option<ObjectId>) {
        let mut subscriptions = self.subscriptions.lock();
        let position = subscriptions.iter().position(|sub| {
            sub.handler == *handler && (sub.context.is_none() || sub.context == context)
        });
        if let Some(i) = position {
            subscriptions.remove(i);
        }
    }

    /// Releases a capture. Same as [`unsubscribe`](Subject::unsubscribe).
    pub fn release(&self, handler: &Handler<T>, context: Option<ObjectId>) {
        self.unsubscribe(handler, context);
    }

    /// Notifies subscribers in order, stopping after the first exclusive one.
    pub fn fire(&self, payload: &T) {
        let snapshot: Vec<Subscription<T>> = self.subscriptions.lock().clone();
        trace!(subject = self.name, subscribers = snapshot.len(), "fire");
        for sub in &snapshot {
            sub.handler.call(payload, self.owner, sub.data.as_ref());
            if sub.exclusive {
                break;
            }
        }
    }

    pub fn len(&self) -> usize {
        self.subscriptions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Default> Subject<T> {
    /// Fires the empty payload.
    pub fn fire_empty(&self) {
        self.fire(&T::default());
    }
}

impl<T> fmt::Debug for Subject<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Subject")
            .field("name", &self.name)
            .field("owner", &self.owner)
            .field("subscribers", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counter() -> (Arc<AtomicUsize>, Handler<String>) {
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        let handler = Handler::from_fn(move |_: &String| {
            c.fetch_add(1, Ordering::SeqCst);
        });
        (count, handler)
    }

    #[test]
    fn subscribers_receive_owner_and_data() {
        let owner = ObjectId::new();
        let subject = Subject::<String>::new(Some(owner));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = Arc::clone(&seen);
        let handler = Handler::new(move |payload: &String, o, data: Option<&Value>| {
            s.lock().push((payload.clone(), o, data.cloned()));
        });
        subject
            .subscribe(&handler, None, None)
            .subscribe(&handler, None, Some(Value::from("extra")));

        subject.fire(&"x".to_string());
        let seen = seen.lock();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0], ("x".to_string(), Some(owner), None));
        assert_eq!(seen[1].2, Some(Value::from("extra")));
    }

    #[test]
    fn unsubscribe_respects_context() {
        let subject = Subject::<String>::new(None);
        let (count, handler) = counter();
        let a = ObjectId::new();
        let b = ObjectId::new();
        subject.subscribe(&handler, Some(a), None);

        subject.unsubscribe(&handler, Some(b));
        assert_eq!(subject.len(), 1);
        subject.unsubscribe(&handler, Some(a));
        assert!(subject.is_empty());

        subject.fire(&String::new());
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn unset_context_matches_any() {
        let subject = Subject::<String>::new(None);
        let (_, handler) = counter();
        subject.subscribe(&handler, None, None);
        subject.unsubscribe(&handler, Some(ObjectId::new()));
        assert!(subject.is_empty());
    }

    #[test]
    fn capture_is_exclusive_and_nests() {
        let subject = Subject::<String>::new(None);
        let (plain, plain_handler) = counter();
        let (outer, outer_handler) = counter();
        let (inner, inner_handler) = counter();

        subject.subscribe(&plain_handler, None, None);
        subject.capture(&outer_handler, None, None);
        subject.capture(&inner_handler, None, None);
        subject.fire(&String::new());
        assert_eq!(inner.load(Ordering::SeqCst), 1);
        assert_eq!(outer.load(Ordering::SeqCst), 0);
        assert_eq!(plain.load(Ordering::SeqCst), 0);

        subject.release(&inner_handler, None);
        subject.fire(&String::new());
        assert_eq!(outer.load(Ordering::SeqCst), 1);

        subject.release(&outer_handler, None);
        subject.fire(&String::new());
        assert_eq!(plain.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn handlers_may_unsubscribe_while_firing() {
        let subject = Arc::new(Subject::<String>::new(None));
        let slot: Arc<Mutex<Option<Handler<String>>>> = Arc::new(Mutex::new(None));
        let (s, sl) = (Arc::clone(&subject), Arc::clone(&slot));
        let handler = Handler::from_fn(move |_: &String| {
            if let Some(h) = sl.lock().clone() {
                s.unsubscribe(&h, None);
            }
        });
        *slot.lock() = Some(handler.clone());
        subject.subscribe(&handler, None, None);

        subject.fire(&String::new());
        assert!(subject.is_empty());
    }

    #[test]
    fn fire_empty_uses_default() {
        let subject = Subject::<Value>::new(None);
        let seen = Arc::new(Mutex::new(None));
        let s = Arc::clone(&seen);
        subject.subscribe(
            &Handler::from_fn(move |v: &Value| *s.lock() = Some(v.clone())),
            None,
            None,
        );
        subject.fire_empty();
        assert_eq!(*seen.lock(), Some(Value::Empty));
    }
}
