//! # Observer Graph
//!
//! Explicit subscribe/notify cells and memoized derivations. Values flow
//! from an [`Observable`] to its subscribers when they change; a [`Memo`]
//! recomputes only when its input differs from the last one it saw.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

type Callback<T> = Rc<dyn Fn(&T)>;

struct Inner<T> {
    value: RefCell<T>,
    subscribers: RefCell<Vec<(u64, Callback<T>)>>,
    next_id: Cell<u64>,
}

/// Single-threaded value cell that notifies subscribers on change
pub struct Observable<T> {
    inner: Rc<Inner<T>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observable")
            .field("value", &self.inner.value.borrow())
            .field("subscribers", &self.inner.subscribers.borrow().len())
            .finish()
    }
}

impl<T: Clone + PartialEq + 'static> Observable<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(Inner {
                value: RefCell::new(value),
                subscribers: RefCell::new(Vec::new()),
                next_id: Cell::new(0),
            }),
        }
    }

    pub fn get(&self) -> T {
        self.inner.value.borrow().clone()
    }

    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.value.borrow())
    }

    /// Store a new value; subscribers run only if it differs from the old one.
    pub fn set(&self, value: T) -> bool {
        {
            let mut current = self.inner.value.borrow_mut();
            if *current == value {
                return false;
            }
            *current = value;
        }
        self.notify();
        true
    }

    pub fn update(&self, f: impl FnOnce(&mut T)) -> bool {
        let mut next = self.get();
        f(&mut next);
        self.set(next)
    }

    fn notify(&self) {
        // Subscribers may subscribe or unsubscribe while being notified.
        let subscribers: Vec<_> = self
            .inner
            .subscribers
            .borrow()
            .iter()
            .map(|(_, cb)| Rc::clone(cb))
            .collect();
        let value = self.get();
        for callback in subscribers {
            callback(&value);
        }
    }

    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        let id = self.inner.next_id.get() + 1;
        self.inner.next_id.set(id);
        self.inner
            .subscribers
            .borrow_mut()
            .push((id, Rc::new(callback)));

        let weak: Weak<Inner<T>> = Rc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.subscribers.borrow_mut().retain(|(sid, _)| *sid != id);
            }
        })
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.borrow().len()
    }
}

/// Handle that tears a subscription down when dropped or cancelled
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    teardown: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn new(teardown: impl FnOnce() + 'static) -> Self {
        Self {
            teardown: Some(Box::new(teardown)),
        }
    }

    /// Subscription that owns nothing
    pub fn empty() -> Self {
        Self { teardown: None }
    }

    pub fn cancel(mut self) {
        self.run();
    }

    pub fn is_active(&self) -> bool {
        self.teardown.is_some()
    }

    fn run(&mut self) {
        if let Some(teardown) = self.teardown.take() {
            teardown();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.run();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}

/// Derived value memoized on the last-seen input
pub struct Memo<I, O> {
    compute: Box<dyn Fn(&I) -> O>,
    last: RefCell<Option<(I, Rc<O>)>>,
    computations: Cell<usize>,
}

impl<I: Clone + PartialEq, O> Memo<I, O> {
    pub fn new(compute: impl Fn(&I) -> O + 'static) -> Self {
        Self {
            compute: Box::new(compute),
            last: RefCell::new(None),
            computations: Cell::new(0),
        }
    }

    pub fn get(&self, input: &I) -> Rc<O> {
        if let Some((seen, output)) = self.last.borrow().as_ref() {
            if seen == input {
                return Rc::clone(output);
            }
        }
        let output = Rc::new((self.compute)(input));
        self.computations.set(self.computations.get() + 1);
        *self.last.borrow_mut() = Some((input.clone(), Rc::clone(&output)));
        output
    }

    pub fn invalidate(&self) {
        self.last.borrow_mut().take();
    }

    /// How many times the derivation actually ran
    pub fn computations(&self) -> usize {
        self.computations.get()
    }
}

impl<I, O> fmt::Debug for Memo<I, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Memo")
            .field("computations", &self.computations.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notifies_only_on_change() {
        let cell = Observable::new(0);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let _sub = cell.subscribe(move |v| sink.borrow_mut().push(*v));

        assert!(cell.set(1));
        assert!(!cell.set(1));
        assert!(cell.set(2));

        assert_eq!(*seen.borrow(), vec![1, 2]);
    }

    #[test]
    fn test_drop_unsubscribes() {
        let cell = Observable::new("a".to_string());
        let sub = cell.subscribe(|_| {});
        assert_eq!(cell.subscriber_count(), 1);

        drop(sub);
        assert_eq!(cell.subscriber_count(), 0);
    }

    #[test]
    fn test_memo_recomputes_on_new_input() {
        let memo = Memo::new(|term: &String| term.to_lowercase());

        assert_eq!(*memo.get(&"Jo".to_string()), "jo");
        assert_eq!(*memo.get(&"Jo".to_string()), "jo");
        assert_eq!(memo.computations(), 1);

        memo.get(&"Joe".to_string());
        assert_eq!(memo.computations(), 2);

        memo.invalidate();
        memo.get(&"Joe".to_string());
        assert_eq!(memo.computations(), 3);
    }
}
