//! Change and dirty notifications.
//!
//! Callbacks are registered per property and identified by a
//! [`SubscriptionId`]. Registering the same `Arc` twice yields the
//! original subscription instead of a second one.

use crate::graph::PropertyKey;
use std::sync::Arc;

/// Payload of a value-changed notification.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueChanged {
    /// The property whose final value moved.
    pub key: PropertyKey,
    /// Final value before the recomputation.
    pub old: f64,
    /// Final value after the recomputation.
    pub new: f64,
}

/// Callback fired when a property is marked dirty.
pub type DirtyCallback = dyn Fn(PropertyKey) + Send + Sync;

/// Callback fired when a property's final value changes beyond epsilon.
pub type ValueChangedCallback = dyn Fn(&ValueChanged) + Send + Sync;

/// Handle returned by a subscription, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

/// Ordered list of callbacks with set-like registration.
pub(crate) struct Subscribers<F: ?Sized> {
    entries: Vec<(SubscriptionId, Arc<F>)>,
}

impl<F: ?Sized> Default for Subscribers<F> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<F: ?Sized> Subscribers<F> {
    /// Register `callback`, or return the existing id if this exact
    /// callback is already registered.
    pub(crate) fn subscribe(&mut self, next_id: &mut u64, callback: Arc<F>) -> SubscriptionId {
        if let Some((id, _)) = self
            .entries
            .iter()
            .find(|(_, existing)| Arc::ptr_eq(existing, &callback))
        {
            return *id;
        }
        let id = SubscriptionId(*next_id);
        *next_id += 1;
        self.entries.push((id, callback));
        id
    }

    /// Remove at most one registration. Returns whether one was removed.
    pub(crate) fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        match self.entries.iter().position(|(existing, _)| *existing == id) {
            Some(pos) => {
                self.entries.remove(pos);
                true
            }
            None => false,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Arc<F>> {
        self.entries.iter().map(|(_, cb)| cb)
    }
}

impl<F: ?Sized> std::fmt::Debug for Subscribers<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscribers")
            .field("len", &self.entries.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_subscribe_is_idempotent_per_callback() {
        let mut subs: Subscribers<DirtyCallback> = Subscribers::default();
        let mut next = 0;
        let cb: Arc<DirtyCallback> = Arc::new(|_: PropertyKey| {});

        let first = subs.subscribe(&mut next, cb.clone());
        let second = subs.subscribe(&mut next, cb);
        assert_eq!(first, second);
        assert_eq!(subs.len(), 1);
    }

    #[test]
    fn test_distinct_callbacks_get_distinct_ids() {
        let mut subs: Subscribers<DirtyCallback> = Subscribers::default();
        let mut next = 0;
        let a = subs.subscribe(&mut next, Arc::new(|_: PropertyKey| {}));
        let b = subs.subscribe(&mut next, Arc::new(|_: PropertyKey| {}));
        assert_ne!(a, b);
        assert_eq!(subs.len(), 2);
    }

    #[test]
    fn test_unsubscribe_removes_once() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let mut subs: Subscribers<DirtyCallback> = Subscribers::default();
        let mut next = 0;
        let id = subs.subscribe(
            &mut next,
            Arc::new(move |_: PropertyKey| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );

        assert!(subs.unsubscribe(id));
        assert!(!subs.unsubscribe(id));
        assert_eq!(subs.iter().count(), 0);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }
}
