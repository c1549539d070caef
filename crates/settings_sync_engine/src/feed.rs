//! Topic-based publish/subscribe.

use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Handler invoked with each payload published on its topic.
pub type Subscriber<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// Identifies a subscription for later removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Subscription<T> {
    id: SubscriptionId,
    topic: String,
    handler: Subscriber<T>,
}

/// Distributes payloads to the subscribers of a topic.
///
/// Handlers run synchronously on the publishing task, in subscription order.
/// They may subscribe or unsubscribe from inside a callback.
pub struct TopicFeed<T> {
    subscribers: RwLock<Vec<Subscription<T>>>,
    next_id: AtomicU64,
}

impl<T> TopicFeed<T> {
    /// Creates a feed with no subscribers.
    pub fn new() -> Self {
        Self {
            subscribers: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Subscribes to a topic.
    pub fn subscribe<F>(&self, topic: impl Into<String>, handler: F) -> SubscriptionId
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.subscribers.write().push(Subscription {
            id,
            topic: topic.into(),
            handler: Arc::new(handler),
        });
        id
    }

    /// Removes a subscription. Returns false if it was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.subscribers.write();
        let before = subscribers.len();
        subscribers.retain(|s| s.id != id);
        subscribers.len() != before
    }

    /// Publishes a payload, returning the number of handlers invoked.
    pub fn publish(&self, topic: &str, payload: &T) -> usize {
        let handlers: Vec<Subscriber<T>> = self
            .subscribers
            .read()
            .iter()
            .filter(|s| s.topic == topic)
            .map(|s| Arc::clone(&s.handler))
            .collect();

        for handler in &handlers {
            handler(payload);
        }
        handlers.len()
    }

    /// Number of subscribers on a topic.
    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.subscribers
            .read()
            .iter()
            .filter(|s| s.topic == topic)
            .count()
    }
}

impl<T> Default for TopicFeed<T> {
    fn default() -> Self {
        Self::new()
    }
}
