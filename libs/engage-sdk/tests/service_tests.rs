#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Service lifecycle: the notification worker, reconnects, cancellation,
//! per-kind lanes and unary delegation.

mod common;

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{Notify, Semaphore};
use tracing_test::traced_test;

use common::{FakeBackend, config, eventually, message_status_frame, reminder_frame};
use engage_sdk::{
    Cash, CustomerNumber, CustomerNumberProvider, CustomerRef, DispatchMode, MessagingChannel,
    MessagingChannelNumber, NotificationHandler, NotificationKind, OutboundMessage,
    PaymentChannel, PaymentChannelNumber, PaymentCounterParty, ReconnectPolicy, SdkError,
    Service, StreamError, handler_fn,
};

type Log = Arc<Mutex<Vec<String>>>;

fn recorder(log: &Log) -> Arc<dyn NotificationHandler> {
    let log = Arc::clone(log);
    handler_fn(move |event, _ack| {
        let log = Arc::clone(&log);
        async move {
            log.lock().push(event.notification_id.clone());
            Ok(())
        }
    })
}

fn number() -> CustomerNumber {
    CustomerNumber::new("+254700000001", CustomerNumberProvider::Cellular)
}

fn sms_channel() -> MessagingChannelNumber {
    MessagingChannelNumber::new(MessagingChannel::Sms, "21000")
}

#[tokio::test]
async fn frames_from_the_stream_reach_subscribers() {
    let backend = FakeBackend::new();
    let feed = backend.push_stream();
    let service = Service::with_backend(config(), backend.clone());
    let log = Log::default();
    service.on(NotificationKind::MessageStatus, recorder(&log));

    let _errors = service.start_notifications().unwrap();
    assert!(service.is_receiving_notifications());

    feed.send(message_status_frame("n-1", "m-1")).await;
    feed.send(message_status_frame("n-2", "m-2")).await;
    eventually(|| log.lock().len() == 2).await;

    assert_eq!(*log.lock(), vec!["n-1", "n-2"]);
    assert_eq!(backend.opened_for(), vec!["app-1"]);
    service.stop_notifications().await.unwrap();
}

#[tokio::test]
async fn stopping_releases_the_stream_exactly_once() {
    let backend = FakeBackend::new();
    let feed = backend.push_stream();
    let service = Service::with_backend(config(), backend.clone());
    let log = Log::default();
    service.on(NotificationKind::MessageStatus, recorder(&log));

    let _errors = service.start_notifications().unwrap();
    feed.send(message_status_frame("n-1", "m-1")).await;
    eventually(|| log.lock().len() == 1).await;

    service.stop_notifications().await.unwrap();

    assert!(!service.is_receiving_notifications());
    assert_eq!(feed.drop_count(), 1);
    // The worker no longer holds the stream, so nothing more is admitted.
    assert!(
        feed.frames
            .send(Ok(message_status_frame("n-2", "m-2")))
            .await
            .is_err()
    );
    assert_eq!(*log.lock(), vec!["n-1"]);
    assert_eq!(backend.open_count.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn in_flight_dispatch_finishes_on_stop() {
    let backend = FakeBackend::new();
    let feed = backend.push_stream();
    let service = Arc::new(Service::with_backend(config(), backend.clone()));
    let entered = Arc::new(Notify::new());
    let release = Arc::new(Semaphore::new(0));
    let finished = Log::default();

    {
        let entered = Arc::clone(&entered);
        let release = Arc::clone(&release);
        let finished = Arc::clone(&finished);
        service.on(
            NotificationKind::Reminder,
            handler_fn(move |event, _ack| {
                let entered = Arc::clone(&entered);
                let release = Arc::clone(&release);
                let finished = Arc::clone(&finished);
                async move {
                    entered.notify_one();
                    release.acquire().await?.forget();
                    finished.lock().push(event.notification_id.clone());
                    Ok(())
                }
            }),
        );
    }

    let _errors = service.start_notifications().unwrap();
    feed.send(reminder_frame("n-1", "k", "p")).await;
    entered.notified().await;

    let stopper = {
        let service = Arc::clone(&service);
        tokio::spawn(async move { service.stop_notifications().await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(!stopper.is_finished());

    release.add_permits(1);
    stopper.await.unwrap().unwrap();

    assert_eq!(*finished.lock(), vec!["n-1"]);
    assert_eq!(feed.drop_count(), 1);
}

#[tokio::test]
async fn lifecycle_errors_are_reported() {
    let backend = FakeBackend::new();
    let service = Service::with_backend(config(), backend.clone());

    assert!(matches!(
        service.stop_notifications().await,
        Err(SdkError::NotStarted)
    ));

    let _errors = service.start_notifications().unwrap();
    assert!(matches!(
        service.start_notifications(),
        Err(SdkError::AlreadyStarted)
    ));

    service.stop_notifications().await.unwrap();
    let _errors = service.start_notifications().unwrap();
    service.stop_notifications().await.unwrap();
}

#[tokio::test]
async fn empty_app_id_is_rejected() {
    let backend = FakeBackend::new();
    let mut cfg = config();
    cfg.app_id = String::new();
    let service = Service::with_backend(cfg, backend.clone());

    assert!(matches!(
        service.start_notifications(),
        Err(SdkError::InvalidArgument(_))
    ));
    assert_eq!(backend.open_count.load(Ordering::SeqCst), 0);
}

#[tokio::test]
#[traced_test]
async fn transport_failure_is_reported_and_the_stream_reopened() {
    let backend = FakeBackend::new();
    let first = backend.push_stream();
    let second = backend.push_stream();
    let service = Service::with_backend(config(), backend.clone());
    let log = Log::default();
    service.on(NotificationKind::MessageStatus, recorder(&log));

    let mut errors = service.start_notifications().unwrap();
    first.send(message_status_frame("n-1", "m-1")).await;
    first.fail(tonic::Status::unavailable("connection reset")).await;

    let err = errors.recv().await.unwrap();
    assert_eq!(
        err,
        StreamError::Transport {
            code: tonic::Code::Unavailable,
            message: "connection reset".to_owned()
        }
    );

    second.send(message_status_frame("n-2", "m-2")).await;
    eventually(|| log.lock().len() == 2).await;

    assert_eq!(*log.lock(), vec!["n-1", "n-2"]);
    assert_eq!(first.drop_count(), 1);
    assert_eq!(backend.open_count.load(Ordering::SeqCst), 2);
    assert!(logs_contain("reopening notification stream after backoff"));

    service.stop_notifications().await.unwrap();
    assert_eq!(second.drop_count(), 1);
}

#[tokio::test]
async fn open_failure_is_reported_then_retried() {
    let backend = FakeBackend::new();
    backend.push_open_failure("connection refused");
    let feed = backend.push_stream();
    let service = Service::with_backend(config(), backend.clone());
    let log = Log::default();
    service.on(NotificationKind::Reminder, recorder(&log));

    let mut errors = service.start_notifications().unwrap();
    let err = errors.recv().await.unwrap();
    assert!(matches!(err, StreamError::Open(ref m) if m.contains("connection refused")));

    feed.send(reminder_frame("n-1", "k", "p")).await;
    eventually(|| log.lock().len() == 1).await;
    service.stop_notifications().await.unwrap();
}

#[tokio::test]
async fn exhausted_reconnects_stop_the_worker() {
    let backend = FakeBackend::new();
    let feed = backend.push_stream();
    let mut cfg = config();
    cfg.notifications.reconnect = ReconnectPolicy::disabled();
    let service = Service::with_backend(cfg, backend.clone());

    let mut errors = service.start_notifications().unwrap();
    drop(feed.frames);

    assert_eq!(errors.recv().await.unwrap(), StreamError::Ended);
    assert_eq!(
        errors.recv().await.unwrap(),
        StreamError::ReconnectExhausted { attempts: 0 }
    );
    // The worker exits and drops its sender.
    assert_eq!(errors.recv().await, None);
    eventually(|| !service.is_receiving_notifications()).await;
    assert_eq!(feed.drops.load(Ordering::SeqCst), 1);

    // A finished worker can be replaced.
    let _errors = service.start_notifications().unwrap();
    service.stop_notifications().await.unwrap();
}

#[tokio::test]
async fn per_kind_lanes_keep_other_kinds_flowing() {
    let backend = FakeBackend::new();
    let feed = backend.push_stream();
    let service =
        Service::with_backend(config().with_dispatch_mode(DispatchMode::PerKindLanes), backend);
    let gate = Arc::new(Semaphore::new(0));
    let reminders = Log::default();
    let statuses = Log::default();

    {
        let gate = Arc::clone(&gate);
        let reminders = Arc::clone(&reminders);
        service.on(
            NotificationKind::Reminder,
            handler_fn(move |event, _ack| {
                let gate = Arc::clone(&gate);
                let reminders = Arc::clone(&reminders);
                async move {
                    gate.acquire().await?.forget();
                    reminders.lock().push(event.notification_id.clone());
                    Ok(())
                }
            }),
        );
    }
    service.on(NotificationKind::MessageStatus, recorder(&statuses));

    let _errors = service.start_notifications().unwrap();
    feed.send(reminder_frame("r-1", "k", "p")).await;
    feed.send(reminder_frame("r-2", "k", "p")).await;
    feed.send(message_status_frame("s-1", "m-1")).await;

    // The blocked reminder lane does not hold back message statuses.
    eventually(|| statuses.lock().len() == 1).await;
    assert!(reminders.lock().is_empty());

    gate.add_permits(2);
    eventually(|| reminders.lock().len() == 2).await;
    assert_eq!(*reminders.lock(), vec!["r-1", "r-2"]);

    service.stop_notifications().await.unwrap();
    assert_eq!(feed.drop_count(), 1);
}

#[tokio::test]
async fn unsubscribed_handlers_are_not_invoked() {
    let backend = FakeBackend::new();
    let feed = backend.push_stream();
    let service = Service::with_backend(config(), backend);
    let kept = Log::default();
    let removed = Log::default();
    let id = service.on(NotificationKind::MessageStatus, recorder(&removed));
    service.on(NotificationKind::MessageStatus, recorder(&kept));
    assert!(service.unsubscribe(id));

    let _errors = service.start_notifications().unwrap();
    feed.send(message_status_frame("n-1", "m-1")).await;
    eventually(|| kept.lock().len() == 1).await;

    assert!(removed.lock().is_empty());
    assert_eq!(service.dispatch_stats().dispatched, 1);
    service.stop_notifications().await.unwrap();
}

#[tokio::test]
async fn disconnect_stops_the_worker_and_clears_subscriptions() {
    let backend = FakeBackend::new();
    let feed = backend.push_stream();
    let service = Service::with_backend(config(), backend.clone());
    service.on(NotificationKind::Reminder, recorder(&Log::default()));

    let _errors = service.start_notifications().unwrap();
    eventually(|| backend.open_count.load(Ordering::SeqCst) == 1).await;
    service.disconnect().await;

    assert!(!service.is_receiving_notifications());
    assert!(service.registry().is_empty());
    assert_eq!(feed.drop_count(), 1);
    // Disconnecting twice is harmless.
    service.disconnect().await;
}

#[tokio::test]
async fn customer_handles_check_their_reference() {
    let backend = FakeBackend::new();
    let service = Service::with_backend(config(), backend.clone());

    let by_number = service.customer(number());
    assert_eq!(by_number.id(), None);
    by_number
        .send_message(&sms_channel(), &OutboundMessage::text("hello"))
        .await
        .unwrap();
    by_number.make_voice_call(&sms_channel()).await.unwrap();
    assert!(matches!(
        by_number.adopt_state(&CustomerRef::Id("other".to_owned())).await,
        Err(SdkError::InvalidArgument(_))
    ));

    let by_id = service.customer(CustomerRef::Id("cust-9".to_owned()));
    by_id.cancel_reminder("renewal").await.unwrap();
    assert!(matches!(
        by_id
            .send_message(&sms_channel(), &OutboundMessage::text("hi"))
            .await,
        Err(SdkError::InvalidArgument(_))
    ));
    let leased = by_id.lease_app_data().await.unwrap();
    assert_eq!(leased.customer_id.as_deref(), Some("cust-9"));

    assert_eq!(
        backend.calls(),
        vec![
            "send_message +254700000001 21000",
            "make_voice_call +254700000001 21000",
            "cancel_customer_reminder id:cust-9 renewal",
            "lease_customer_app_data id:cust-9",
        ]
    );
}

#[tokio::test]
async fn unary_operations_delegate_to_the_backend() {
    let backend = FakeBackend::new();
    let service = Service::with_backend(config(), backend.clone());

    let token = service.generate_auth_token().await.unwrap();
    assert_eq!(token.lifetime, Duration::from_secs(3600));

    let payment = service
        .initiate_payment(
            &PaymentCounterParty::Purse {
                purse_id: "purse-1".to_owned(),
            },
            &PaymentCounterParty::Customer {
                customer_number: number(),
                channel_number: PaymentChannelNumber::new(PaymentChannel::Cellular, "525900"),
            },
            &Cash::new("KES", 250.0),
            Some("refund"),
        )
        .await
        .unwrap();
    assert_eq!(payment.transaction_id.as_deref(), Some("tx-1"));

    service
        .reply_to_message("cust-1", "msg-9", &OutboundMessage::text("thanks"))
        .await
        .unwrap();

    assert_eq!(
        backend.calls(),
        vec![
            "generate_auth_token",
            "initiate_payment KES 250 refund",
            "reply_to_message cust-1 msg-9",
        ]
    );
}

fn panics_on(notification_id: &'static str) -> Arc<dyn NotificationHandler> {
    handler_fn(move |event, _ack| async move {
        assert_ne!(event.notification_id, notification_id, "subscriber blew up");
        Ok(())
    })
}

#[tokio::test]
async fn a_panicking_subscriber_does_not_stop_the_worker() {
    let backend = FakeBackend::new();
    let feed = backend.push_stream();
    let service = Service::with_backend(config(), backend);
    let log = Log::default();
    service.on(NotificationKind::MessageStatus, panics_on("n-1"));
    service.on(NotificationKind::MessageStatus, recorder(&log));

    let mut errors = service.start_notifications().unwrap();
    feed.send(message_status_frame("n-1", "m-1")).await;
    feed.send(message_status_frame("n-2", "m-2")).await;
    eventually(|| log.lock().len() == 2).await;

    assert_eq!(*log.lock(), vec!["n-1", "n-2"]);
    assert!(service.is_receiving_notifications());
    assert!(errors.try_recv().is_err());
    let stats = service.dispatch_stats();
    assert_eq!(stats.dispatched, 2);
    assert_eq!(stats.handler_failures, 1);

    service.stop_notifications().await.unwrap();
    assert_eq!(feed.drop_count(), 1);
}

#[tokio::test]
async fn a_panicking_subscriber_does_not_stop_its_lane() {
    let backend = FakeBackend::new();
    let feed = backend.push_stream();
    let service =
        Service::with_backend(config().with_dispatch_mode(DispatchMode::PerKindLanes), backend);
    let log = Log::default();
    service.on(NotificationKind::Reminder, panics_on("r-1"));
    service.on(NotificationKind::Reminder, recorder(&log));

    let _errors = service.start_notifications().unwrap();
    feed.send(reminder_frame("r-1", "k", "p")).await;
    feed.send(reminder_frame("r-2", "k", "p")).await;
    eventually(|| log.lock().len() == 2).await;

    assert_eq!(*log.lock(), vec!["r-1", "r-2"]);
    assert_eq!(service.dispatch_stats().handler_failures, 1);
    service.stop_notifications().await.unwrap();
}

#[tokio::test]
async fn stopping_lanes_drops_queued_frames_and_finishes_the_current_one() {
    let backend = FakeBackend::new();
    let feed = backend.push_stream();
    let service = Arc::new(Service::with_backend(
        config().with_dispatch_mode(DispatchMode::PerKindLanes),
        backend,
    ));
    let entered = Arc::new(Notify::new());
    let release = Arc::new(Semaphore::new(0));
    let finished = Log::default();

    {
        let entered = Arc::clone(&entered);
        let release = Arc::clone(&release);
        let finished = Arc::clone(&finished);
        service.on(
            NotificationKind::Reminder,
            handler_fn(move |event, _ack| {
                let entered = Arc::clone(&entered);
                let release = Arc::clone(&release);
                let finished = Arc::clone(&finished);
                async move {
                    entered.notify_one();
                    release.acquire().await?.forget();
                    finished.lock().push(event.notification_id.clone());
                    Ok(())
                }
            }),
        );
    }

    let _errors = service.start_notifications().unwrap();
    feed.send(reminder_frame("r-1", "k", "p")).await;
    entered.notified().await;
    feed.send(reminder_frame("r-2", "k", "p")).await;
    feed.send(reminder_frame("r-3", "k", "p")).await;
    eventually(|| service.dispatch_stats().frames_received == 3).await;

    let stopper = {
        let service = Arc::clone(&service);
        tokio::spawn(async move { service.stop_notifications().await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(!stopper.is_finished());

    release.add_permits(3);
    stopper.await.unwrap().unwrap();

    assert_eq!(*finished.lock(), vec!["r-1"]);
    assert_eq!(service.dispatch_stats().dispatched, 1);
    assert_eq!(feed.drop_count(), 1);
}
