//! Notification stream intake.
//!
//! A single worker task owns the server stream: it reads frames in order,
//! hands them to the [`Dispatcher`] and reopens the stream after transport
//! failures according to the [`ReconnectPolicy`]. Transport conditions are
//! reported on a bounded side channel of [`StreamError`]s.

use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::config::{DispatchMode, ReconnectPolicy};
use crate::error::{SdkError, StreamError};
use crate::notification::dispatcher::Lanes;
use crate::notification::Dispatcher;
use crate::proto;

/// Frames as delivered by the server stream.
pub type FrameStream =
    Pin<Box<dyn Stream<Item = Result<proto::WebhookRequest, tonic::Status>> + Send>>;

/// Opens the notification stream for an application.
#[async_trait]
pub trait NotificationSource: Send + Sync {
    async fn open(&self, app_id: &str) -> Result<FrameStream, SdkError>;
}

enum StreamEnd {
    Cancelled,
    Failed(StreamError),
}

pub(crate) struct IntakeWorker {
    pub(crate) source: Arc<dyn NotificationSource>,
    pub(crate) app_id: String,
    pub(crate) dispatcher: Dispatcher,
    pub(crate) mode: DispatchMode,
    pub(crate) lane_capacity: usize,
    pub(crate) reconnect: ReconnectPolicy,
    pub(crate) errors: mpsc::Sender<StreamError>,
    pub(crate) cancel: CancellationToken,
}

impl IntakeWorker {
    pub(crate) async fn run(self) {
        let span = tracing::info_span!("notification_intake", app_id = %self.app_id);
        async move {
            let mut lanes = match self.mode {
                DispatchMode::Sequential => None,
                DispatchMode::PerKindLanes => Some(Lanes::new(
                    self.dispatcher.clone(),
                    self.lane_capacity,
                    self.cancel.child_token(),
                )),
            };

            self.read_until_stopped(&mut lanes).await;

            if let Some(lanes) = lanes {
                lanes.shutdown().await;
            }
            tracing::info!("notification worker stopped");
        }
        .instrument(span)
        .await;
    }

    async fn read_until_stopped(&self, lanes: &mut Option<Lanes>) {
        // Consecutive failures since the last frame was received.
        let mut failures: u32 = 0;

        loop {
            if failures > 0 {
                if !self.reconnect.allows(failures) {
                    self.report(StreamError::ReconnectExhausted {
                        attempts: failures - 1,
                    });
                    return;
                }
                let backoff = self.reconnect.backoff(failures);
                tracing::info!(
                    attempt = failures,
                    backoff_ms = u64::try_from(backoff.as_millis()).unwrap_or(u64::MAX),
                    "reopening notification stream after backoff"
                );
                tokio::select! {
                    biased;
                    () = self.cancel.cancelled() => return,
                    () = tokio::time::sleep(backoff) => {}
                }
            }

            let opened = tokio::select! {
                biased;
                () = self.cancel.cancelled() => return,
                opened = self.source.open(&self.app_id) => opened,
            };
            let mut stream = match opened {
                Ok(stream) => stream,
                Err(e) => {
                    self.report(StreamError::Open(e.to_string()));
                    failures += 1;
                    continue;
                }
            };
            tracing::info!("notification stream opened");

            let end = self.pump(&mut stream, lanes, &mut failures).await;
            drop(stream);

            match end {
                StreamEnd::Cancelled => return,
                StreamEnd::Failed(err) => {
                    self.report(err);
                    failures += 1;
                }
            }
        }
    }

    async fn pump(
        &self,
        stream: &mut FrameStream,
        lanes: &mut Option<Lanes>,
        failures: &mut u32,
    ) -> StreamEnd {
        loop {
            let next = tokio::select! {
                biased;
                () = self.cancel.cancelled() => return StreamEnd::Cancelled,
                next = stream.next() => next,
            };

            match next {
                Some(Ok(frame)) => {
                    *failures = 0;
                    match lanes {
                        Some(lanes) => {
                            if let Ok(inbound) = self.dispatcher.admit(frame) {
                                lanes.submit(inbound).await;
                            }
                        }
                        None => {
                            self.dispatcher.dispatch(frame).await;
                        }
                    }
                }
                Some(Err(status)) => return StreamEnd::Failed(status.into()),
                None => return StreamEnd::Failed(StreamError::Ended),
            }
        }
    }

    fn report(&self, err: StreamError) {
        tracing::warn!(error = %err, "notification stream error");
        if let Err(TrySendError::Full(err)) = self.errors.try_send(err) {
            tracing::warn!(error = %err, "stream error channel full, error dropped");
        }
    }
}
