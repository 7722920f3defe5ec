// tests/notification_tests.rs
mod common;
use common::*;
use orderflow::{ChannelOutbox, NotificationOutbox, OrderNotification, OutboxDispatcher};
use serial_test::serial;
use std::sync::atomic::Ordering;
use std::sync::Arc;

#[tokio::test]
#[serial]
async fn test_placed_order_is_queued_with_its_details() {
  setup_tracing();
  let h = Harness::new().await;
  let order = h.place_bank_order(&owner("ana"), 1).await;

  let queued = h.outbox.queued.lock().clone();
  assert_eq!(queued.len(), 1);
  let notification = &queued[0];
  assert_eq!(notification, &OrderNotification::from_order(&order));
  assert_eq!(notification.contact.email, "ana@example.com");
  assert_eq!(notification.pricing.total, order.pricing.total);
}

#[tokio::test]
#[serial]
async fn test_dispatcher_sends_both_messages() {
  setup_tracing();
  let h = Harness::new().await;
  let order = h.place_bank_order(&owner("ana"), 1).await;
  let sink = Arc::new(RecordingSink::default());

  let (outbox, receiver) = ChannelOutbox::channel(8);
  let worker = OutboxDispatcher::spawn(sink.clone(), receiver);
  outbox.enqueue(OrderNotification::from_order(&order));
  drop(outbox);
  worker.await.unwrap();

  assert_eq!(*sink.customer_sent.lock(), vec![order.id]);
  assert_eq!(*sink.admin_sent.lock(), vec![order.id]);
}

#[tokio::test]
#[serial]
async fn test_one_failed_message_does_not_stop_the_other() {
  setup_tracing();
  let h = Harness::new().await;
  let order = h.place_bank_order(&owner("ana"), 1).await;
  let notification = OrderNotification::from_order(&order);

  let sink = RecordingSink::default();
  sink.fail_customer.store(true, Ordering::SeqCst);
  let report = OutboxDispatcher::deliver(&sink, &notification).await;
  assert!(!report.customer_sent);
  assert!(report.admin_sent);

  let sink = RecordingSink::default();
  sink.fail_admin.store(true, Ordering::SeqCst);
  let report = OutboxDispatcher::deliver(&sink, &notification).await;
  assert!(report.customer_sent);
  assert!(!report.admin_sent);
  assert_eq!(sink.customer_sent.lock().len(), 1);
}

#[tokio::test]
#[serial]
async fn test_full_or_closed_outbox_never_blocks_the_caller() {
  setup_tracing();
  let h = Harness::new().await;
  let order = h.place_bank_order(&owner("ana"), 1).await;

  let (outbox, mut receiver) = ChannelOutbox::channel(1);
  outbox.enqueue(OrderNotification::from_order(&order));
  outbox.enqueue(OrderNotification::from_order(&order));
  assert!(receiver.try_recv().is_ok());
  assert!(receiver.try_recv().is_err());

  drop(receiver);
  outbox.enqueue(OrderNotification::from_order(&order));
}
