//! Routing of classified frames to subscribers.

use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures::FutureExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::api::EngageApi;
use crate::customer::Customer;
use crate::error::ConversionError;
use crate::notification::{
    Acknowledger, InboundNotification, NotificationEvent, NotificationKind, NotificationReplySink,
    SubscriberRegistry, classify,
};
use crate::proto;

/// Result of dispatching one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Published to `handlers` subscribers (possibly zero).
    Delivered {
        kind: NotificationKind,
        handlers: usize,
    },
    /// The frame had no populated variant.
    DroppedEmpty,
    /// The frame could not be converted and was skipped.
    ConversionFailed(ConversionError),
}

/// Counters kept across the lifetime of a service.
#[derive(Debug, Default)]
pub struct DispatchStats {
    frames_received: AtomicU64,
    dispatched: AtomicU64,
    dropped_empty: AtomicU64,
    conversion_failures: AtomicU64,
    handler_failures: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DispatchStatsSnapshot {
    pub frames_received: u64,
    pub dispatched: u64,
    pub dropped_empty: u64,
    pub conversion_failures: u64,
    pub handler_failures: u64,
}

impl DispatchStats {
    #[must_use]
    pub fn snapshot(&self) -> DispatchStatsSnapshot {
        DispatchStatsSnapshot {
            frames_received: self.frames_received.load(Ordering::Relaxed),
            dispatched: self.dispatched.load(Ordering::Relaxed),
            dropped_empty: self.dropped_empty.load(Ordering::Relaxed),
            conversion_failures: self.conversion_failures.load(Ordering::Relaxed),
            handler_failures: self.handler_failures.load(Ordering::Relaxed),
        }
    }

    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

/// Classifies frames and publishes them to the registry's subscribers.
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<SubscriberRegistry>,
    api: Arc<dyn EngageApi>,
    replies: Arc<dyn NotificationReplySink>,
    stats: Arc<DispatchStats>,
}

impl Dispatcher {
    #[must_use]
    pub fn new(
        registry: Arc<SubscriberRegistry>,
        api: Arc<dyn EngageApi>,
        replies: Arc<dyn NotificationReplySink>,
        stats: Arc<DispatchStats>,
    ) -> Self {
        Self {
            registry,
            api,
            replies,
            stats,
        }
    }

    #[must_use]
    pub fn stats(&self) -> DispatchStatsSnapshot {
        self.stats.snapshot()
    }

    /// Classify `frame` and publish it to the subscribers of its kind.
    pub async fn dispatch(&self, frame: proto::WebhookRequest) -> DispatchOutcome {
        match self.admit(frame) {
            Ok(inbound) => {
                let kind = inbound.kind;
                let handlers = self.publish(inbound).await;
                DispatchOutcome::Delivered { kind, handlers }
            }
            Err(outcome) => outcome,
        }
    }

    /// Classification step of [`Dispatcher::dispatch`], with accounting.
    pub(crate) fn admit(
        &self,
        frame: proto::WebhookRequest,
    ) -> Result<InboundNotification, DispatchOutcome> {
        DispatchStats::bump(&self.stats.frames_received);
        let notification_id = frame.notification_id.clone();

        match classify(frame) {
            Ok(Some(inbound)) => Ok(inbound),
            Ok(None) => {
                DispatchStats::bump(&self.stats.dropped_empty);
                tracing::debug!(%notification_id, "dropping frame without notification");
                Err(DispatchOutcome::DroppedEmpty)
            }
            Err(err) => {
                DispatchStats::bump(&self.stats.conversion_failures);
                tracing::warn!(%notification_id, error = %err, "skipping unconvertible frame");
                Err(DispatchOutcome::ConversionFailed(err))
            }
        }
    }

    /// Invoke every subscriber of the notification's kind in registration
    /// order; returns how many were invoked.
    ///
    /// A subscriber that fails or panics is counted in `handler_failures`;
    /// the remaining subscribers still run.
    pub async fn publish(&self, inbound: InboundNotification) -> usize {
        let kind = inbound.kind;
        let span = tracing::debug_span!(
            "dispatch",
            %kind,
            notification_id = %inbound.notification_id
        );

        async move {
            let handlers = self.registry.handlers(kind);
            let customer_id = inbound.customer.id().map(ToOwned::to_owned);
            let event = NotificationEvent {
                kind,
                notification: inbound.notification,
                customer: Customer::new(inbound.customer, Arc::clone(&self.api)),
                notification_id: inbound.notification_id,
                created_at: inbound.created_at,
                app_data: inbound.app_data,
            };

            for (index, handler) in handlers.iter().enumerate() {
                let ack = Acknowledger::new(
                    Arc::clone(&self.replies),
                    event.notification_id.clone(),
                    customer_id.clone(),
                );
                match AssertUnwindSafe(handler.handle(event.clone(), ack))
                    .catch_unwind()
                    .await
                {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => {
                        DispatchStats::bump(&self.stats.handler_failures);
                        tracing::warn!(
                            subscriber = index,
                            error = %format!("{e:#}"),
                            "subscriber failed"
                        );
                    }
                    Err(payload) => {
                        DispatchStats::bump(&self.stats.handler_failures);
                        tracing::warn!(
                            subscriber = index,
                            panic = panic_message(&*payload),
                            "subscriber panicked"
                        );
                    }
                }
            }

            DispatchStats::bump(&self.stats.dispatched);
            tracing::debug!(handlers = handlers.len(), "notification dispatched");
            handlers.len()
        }
        .instrument(span)
        .await
    }
}

/// One ordered lane per kind, used in per-kind dispatch mode.
///
/// Lanes are created on first use. Frames still queued when `cancel` fires
/// are dropped; the frame being published finishes.
pub(crate) struct Lanes {
    dispatcher: Dispatcher,
    capacity: usize,
    cancel: CancellationToken,
    senders: HashMap<NotificationKind, mpsc::Sender<InboundNotification>>,
    tasks: Vec<JoinHandle<()>>,
}

impl Lanes {
    pub(crate) fn new(dispatcher: Dispatcher, capacity: usize, cancel: CancellationToken) -> Self {
        Self {
            dispatcher,
            capacity: capacity.max(1),
            cancel,
            senders: HashMap::new(),
            tasks: Vec::new(),
        }
    }

    /// Queue `inbound` on its kind's lane, waiting while the lane is full.
    pub(crate) async fn submit(&mut self, inbound: InboundNotification) {
        let kind = inbound.kind;
        let sender = self.lane(kind);
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => {}
            sent = sender.send(inbound) => {
                if sent.is_err() {
                    tracing::warn!(%kind, "notification lane closed, frame dropped");
                }
            }
        }
    }

    fn lane(&mut self, kind: NotificationKind) -> mpsc::Sender<InboundNotification> {
        if let Some(sender) = self.senders.get(&kind) {
            return sender.clone();
        }

        let (tx, mut rx) = mpsc::channel::<InboundNotification>(self.capacity);
        let dispatcher = self.dispatcher.clone();
        let cancel = self.cancel.clone();
        self.tasks.push(tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    next = rx.recv() => match next {
                        Some(inbound) => {
                            dispatcher.publish(inbound).await;
                        }
                        None => break,
                    },
                }
            }
            tracing::debug!(%kind, "notification lane stopped");
        }));
        tracing::debug!(%kind, capacity = self.capacity, "notification lane started");
        self.senders.insert(kind, tx.clone());
        tx
    }

    /// Close every lane and wait for the lane tasks to finish.
    pub(crate) async fn shutdown(self) {
        drop(self.senders);
        for task in self.tasks {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "notification lane task failed");
            }
        }
    }
}
