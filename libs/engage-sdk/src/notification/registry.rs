//! Subscriber registry owned by a [`crate::Service`].
//!
//! Subscriptions are keyed by [`NotificationKind`]. Publication reads a
//! snapshot of the handlers, so handlers run without holding the lock and may
//! subscribe or unsubscribe while being invoked.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use crate::customer::Customer;
use crate::models::DataValue;
use crate::notification::{Acknowledger, Notification, NotificationKind};

/// What a subscriber receives for one notification.
#[derive(Debug, Clone)]
pub struct NotificationEvent {
    pub kind: NotificationKind,
    pub notification: Notification,
    /// Handle bound to the owning service; built without a remote lookup.
    pub customer: Customer,
    pub notification_id: String,
    pub created_at: Option<DateTime<Utc>>,
    pub app_data: Option<DataValue>,
}

/// A subscriber callback.
///
/// Errors are logged and counted by the dispatcher; they never stop
/// dispatch to the remaining subscribers.
#[async_trait]
pub trait NotificationHandler: Send + Sync {
    async fn handle(&self, event: NotificationEvent, ack: Acknowledger) -> anyhow::Result<()>;
}

struct FnHandler<F>(F);

#[async_trait]
impl<F, Fut> NotificationHandler for FnHandler<F>
where
    F: Fn(NotificationEvent, Acknowledger) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    async fn handle(&self, event: NotificationEvent, ack: Acknowledger) -> anyhow::Result<()> {
        (self.0)(event, ack).await
    }
}

/// Adapt an async closure into a handler.
#[must_use]
pub fn handler_fn<F, Fut>(f: F) -> Arc<dyn NotificationHandler>
where
    F: Fn(NotificationEvent, Acknowledger) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Arc::new(FnHandler(f))
}

/// Identity of a subscription, used to remove it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

#[derive(Clone)]
struct Subscription {
    id: SubscriptionId,
    handler: Arc<dyn NotificationHandler>,
}

#[derive(Default)]
pub struct SubscriberRegistry {
    next_id: AtomicU64,
    subscriptions: RwLock<HashMap<NotificationKind, Vec<Subscription>>>,
}

impl SubscriberRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `handler` to the subscribers of `kind`.
    pub fn subscribe(
        &self,
        kind: NotificationKind,
        handler: Arc<dyn NotificationHandler>,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.subscriptions
            .write()
            .entry(kind)
            .or_default()
            .push(Subscription { id, handler });
        tracing::debug!(%kind, subscription = %id, "subscriber added");
        id
    }

    /// Remove a subscription; returns `false` if it was not registered.
    #[must_use]
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscriptions = self.subscriptions.write();
        for (kind, subs) in subscriptions.iter_mut() {
            if let Some(pos) = subs.iter().position(|s| s.id == id) {
                subs.remove(pos);
                tracing::debug!(%kind, subscription = %id, "subscriber removed");
                return true;
            }
        }
        false
    }

    /// Snapshot of the handlers of `kind`, in registration order.
    #[must_use]
    pub fn handlers(&self, kind: NotificationKind) -> Vec<Arc<dyn NotificationHandler>> {
        self.subscriptions
            .read()
            .get(&kind)
            .map(|subs| subs.iter().map(|s| Arc::clone(&s.handler)).collect())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn subscriber_count(&self, kind: NotificationKind) -> usize {
        self.subscriptions.read().get(&kind).map_or(0, Vec::len)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.subscriptions.read().values().map(Vec::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.subscriptions.write().clear();
    }
}

impl fmt::Debug for SubscriberRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let subscriptions = self.subscriptions.read();
        let mut counts: Vec<_> = subscriptions
            .iter()
            .map(|(kind, subs)| (*kind, subs.len()))
            .collect();
        counts.sort_unstable();
        f.debug_struct("SubscriberRegistry")
            .field("subscriptions", &counts)
            .finish_non_exhaustive()
    }
}
