// tests/admin_tests.rs
mod common;
use chrono::{NaiveDate, NaiveTime};
use common::*;
use orderflow::model::status_names;
use orderflow::OrderError;
use serial_test::serial;

fn day(d: u32) -> NaiveDate {
  NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
}

#[tokio::test]
#[serial]
async fn test_order_moves_through_the_lifecycle() {
  setup_tracing();
  let h = Harness::new().await;
  let order = h.place_bank_order(&owner("ana"), 1).await;

  for stage in [
    status_names::CONFIRMED,
    status_names::APPOINTMENT,
    status_names::SHIPPED,
    status_names::DELIVERED,
  ] {
    let moved = h.service.admin_transition_status(order.id, stage).await.unwrap();
    assert_eq!(moved.status.name, stage);
  }
}

#[tokio::test]
#[serial]
async fn test_unknown_status_name_is_validation_error() {
  setup_tracing();
  let h = Harness::new().await;
  let order = h.place_bank_order(&owner("ana"), 1).await;
  let err = h.service.admin_transition_status(order.id, "lost_in_space").await.unwrap_err();
  assert_eq!(err.kind(), "validation_error");
}

#[tokio::test]
#[serial]
async fn test_unknown_order_is_not_found() {
  setup_tracing();
  let h = Harness::new().await;
  let err = h
    .service
    .admin_transition_status(777, status_names::CONFIRMED)
    .await
    .unwrap_err();
  assert!(matches!(err, OrderError::OrderNotFound { order_id: 777 }));
}

#[tokio::test]
#[serial]
async fn test_terminal_statuses_are_final() {
  setup_tracing();
  let h = Harness::new().await;
  let ana = owner("ana");
  let order = h.place_bank_order(&ana, 1).await;
  h.service.cancel_order(order.id, &ana).await.unwrap();

  let err = h
    .service
    .admin_transition_status(order.id, status_names::RECEIVED)
    .await
    .unwrap_err();
  assert!(matches!(err, OrderError::InvalidTransition { .. }));
}

#[tokio::test]
#[serial]
async fn test_same_status_is_a_no_op() {
  setup_tracing();
  let h = Harness::new().await;
  let order = h.place_bank_order(&owner("ana"), 1).await;
  let same = h
    .service
    .admin_transition_status(order.id, status_names::RECEIVED)
    .await
    .unwrap();
  assert_eq!(same, order);
}

#[tokio::test]
#[serial]
async fn test_admin_cancel_frees_the_daily_slot() {
  setup_tracing();
  let h = Harness::new().await;
  let ana = owner("ana");
  let order = h.place_bank_order(&ana, 1).await;
  h.service
    .admin_transition_status(order.id, status_names::CANCELLED)
    .await
    .unwrap();
  assert!(h.service.can_place_order(&ana).await.allowed);
}

#[tokio::test]
#[serial]
async fn test_delivery_schedule_only_in_appointment() {
  setup_tracing();
  let h = Harness::new().await;
  let order = h.place_bank_order(&owner("ana"), 1).await;

  let err = h
    .service
    .admin_set_delivery_schedule(order.id, day(14), None, None)
    .await
    .unwrap_err();
  assert!(matches!(err, OrderError::InvalidTransition { .. }));

  h.service
    .admin_transition_status(order.id, status_names::APPOINTMENT)
    .await
    .unwrap();
  let time = NaiveTime::from_hms_opt(10, 30, 0);
  let scheduled = h
    .service
    .admin_set_delivery_schedule(order.id, day(14), time, Some("  Ring twice  ".to_string()))
    .await
    .unwrap();
  let schedule = scheduled.delivery_schedule.unwrap();
  assert_eq!(schedule.date, day(14));
  assert_eq!(schedule.time, time);
  assert_eq!(schedule.notes.as_deref(), Some("Ring twice"));
  assert_eq!(scheduled.status.name, status_names::APPOINTMENT);
}

#[tokio::test]
#[serial]
async fn test_blank_schedule_notes_are_dropped() {
  setup_tracing();
  let h = Harness::new().await;
  let order = h.place_bank_order(&owner("ana"), 1).await;
  h.service
    .admin_transition_status(order.id, status_names::APPOINTMENT)
    .await
    .unwrap();
  let scheduled = h
    .service
    .admin_set_delivery_schedule(order.id, day(12), None, Some("   ".to_string()))
    .await
    .unwrap();
  assert!(scheduled.delivery_schedule.unwrap().notes.is_none());
}

#[tokio::test]
#[serial]
async fn test_transition_recovers_after_a_failed_initial_status_load() {
  setup_tracing();
  let source = std::sync::Arc::new(SwitchableStatusSource::failing());
  let h = Harness::with_status_source(source.clone()).await;
  let order = h.place_bank_order(&owner("ana"), 1).await;

  source.fail.store(false, std::sync::atomic::Ordering::SeqCst);
  let moved = h
    .service
    .admin_transition_status(order.id, status_names::CONFIRMED)
    .await
    .unwrap();
  assert_eq!(moved.status.name, status_names::CONFIRMED);
}
