use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use dashmap::DashMap;

type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;
type Subscribers<T> = DashMap<u64, Callback<T>>;

/// Hot multicast channel.
///
/// Subscribers only see values published after they subscribed; nothing is
/// buffered. Cloning yields another handle to the same subscriber list.
pub struct Broadcast<T> {
    subscribers: Arc<Subscribers<T>>,
    next_id: Arc<AtomicU64>,
}

impl<T> Clone for Broadcast<T> {
    fn clone(&self) -> Self {
        Self {
            subscribers: Arc::clone(&self.subscribers),
            next_id: Arc::clone(&self.next_id),
        }
    }
}

impl<T> Default for Broadcast<T> {
    fn default() -> Self {
        Self {
            subscribers: Arc::new(DashMap::new()),
            next_id: Arc::new(AtomicU64::new(0)),
        }
    }
}

impl<T> fmt::Debug for Broadcast<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Broadcast")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl<T: 'static> Broadcast<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `callback` until the returned [`Subscription`] is released.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.subscribers.insert(id, Arc::new(callback));
        tracing::debug!(subscription = id, "Subscribed");

        let subscribers: Weak<Subscribers<T>> = Arc::downgrade(&self.subscribers);
        Subscription {
            id,
            release: Some(Box::new(move || {
                if let Some(subscribers) = subscribers.upgrade() {
                    subscribers.remove(&id);
                }
            })),
        }
    }

    /// Delivers `value` to every current subscriber and returns how many were notified.
    pub fn publish(&self, value: &T) -> usize {
        // Snapshot first: callbacks may subscribe or unsubscribe while running.
        let callbacks: Vec<Callback<T>> = self
            .subscribers
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();

        for callback in &callbacks {
            callback(value);
        }
        callbacks.len()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

/// Handle to a registered callback. Releasing it, explicitly or by dropping it,
/// removes the callback.
pub struct Subscription {
    id: u64,
    release: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn unsubscribe(mut self) {
        self.release_now();
    }

    fn release_now(&mut self) {
        if let Some(release) = self.release.take() {
            release();
            tracing::debug!(subscription = self.id, "Unsubscribed");
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.release.is_some())
            .finish()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release_now();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    fn recorder() -> (Arc<Mutex<Vec<i32>>>, impl Fn(&i32) + Send + Sync + 'static) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        (seen, move |value: &i32| sink.lock().unwrap().push(*value))
    }

    #[test]
    fn test_publish_reaches_every_subscriber() {
        let broadcast = Broadcast::new();
        let (first, first_callback) = recorder();
        let (second, second_callback) = recorder();
        let _a = broadcast.subscribe(first_callback);
        let _b = broadcast.subscribe(second_callback);

        assert_eq!(broadcast.publish(&1), 2);

        assert_eq!(*first.lock().unwrap(), vec![1]);
        assert_eq!(*second.lock().unwrap(), vec![1]);
    }

    #[test]
    fn test_late_subscriber_misses_earlier_values() {
        let broadcast = Broadcast::new();
        broadcast.publish(&1);

        let (seen, callback) = recorder();
        let _subscription = broadcast.subscribe(callback);
        broadcast.publish(&2);

        assert_eq!(*seen.lock().unwrap(), vec![2]);
    }

    #[test]
    fn test_unsubscribe_releases_callback() {
        let broadcast = Broadcast::new();
        let (seen, callback) = recorder();
        let subscription = broadcast.subscribe(callback);

        subscription.unsubscribe();
        broadcast.publish(&1);

        assert!(seen.lock().unwrap().is_empty());
        assert_eq!(broadcast.subscriber_count(), 0);
        // Only the test's handle keeps the recorder alive once the callback is gone.
        assert_eq!(Arc::strong_count(&seen), 1);
    }

    #[test]
    fn test_drop_releases_callback() {
        let broadcast = Broadcast::new();
        let (_, callback) = recorder();
        {
            let _subscription = broadcast.subscribe(callback);
            assert_eq!(broadcast.subscriber_count(), 1);
        }
        assert_eq!(broadcast.subscriber_count(), 0);
    }

    #[test]
    fn test_subscription_outliving_broadcast_is_harmless() {
        let broadcast = Broadcast::<i32>::new();
        let subscription = broadcast.subscribe(|_| {});
        drop(broadcast);
        subscription.unsubscribe();
    }

    #[test]
    fn test_callback_may_unsubscribe_during_publish() {
        let broadcast = Broadcast::<i32>::new();
        let slot: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));
        let inner = Arc::clone(&slot);
        let subscription = broadcast.subscribe(move |_| {
            inner.lock().unwrap().take();
        });
        *slot.lock().unwrap() = Some(subscription);

        assert_eq!(broadcast.publish(&1), 1);
        assert_eq!(broadcast.subscriber_count(), 0);
        assert_eq!(broadcast.publish(&2), 0);
    }
}
