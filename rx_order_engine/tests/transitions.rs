use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use rx_common::Credentials;
use rx_order_engine::{
    db_types::{NewOrder, OrderKey, OrderStatus},
    order_objects::{ItemConfirmation, TransitionRequest},
    test_utils::{
        prepare_env::{fresh_database, sample_order, seed_shop},
        ScriptedGateway,
    },
    traits::{GatewayError, OrderGateway, OrderStore, PushOutcome},
    CredentialCache,
    IngestApi,
    OrderFlowApi,
    OrderFlowError,
    OrderLocks,
    RetryPolicy,
    SqliteDatabase,
};

fn fast_retries(max_attempts: u32) -> RetryPolicy {
    RetryPolicy::new(max_attempts, Duration::from_millis(1), Duration::from_millis(5))
}

async fn setup(gateway: ScriptedGateway) -> (SqliteDatabase, OrderFlowApi<SqliteDatabase, ScriptedGateway>) {
    let db = fresh_database().await;
    seed_shop(&db, "S2", 7, true).await;
    let ingest = IngestApi::new(db.clone());
    ingest.ingest(&[sample_order("S2", "O2", &[("D1", 2), ("D2", 1)])]).await;
    let cache = Arc::new(CredentialCache::new(db.clone()));
    let api = OrderFlowApi::new(db.clone(), gateway, cache).with_retry_policy(fast_retries(3));
    (db, api)
}

fn key() -> OrderKey {
    OrderKey::new("S2", "O2")
}

#[tokio::test]
async fn cancel_records_reason_and_all_items() {
    let gateway = ScriptedGateway::accepting();
    let (db, api) = setup(gateway.clone()).await;
    let request = TransitionRequest::new("S2", "O2").with_reason("out of stock");
    let status = api.cancel_order(request).await.unwrap();
    assert_eq!(status, OrderStatus::Canceled);

    let order = db.fetch_order(&key()).await.unwrap().unwrap();
    assert_eq!(order.history.len(), 2);
    let current = order.current().unwrap();
    assert_eq!(current.state.status, OrderStatus::Canceled);
    assert_eq!(current.state.reason.as_deref(), Some("out of stock"));
    assert_eq!(current.items.len(), 2);

    let pushed = gateway.pushed();
    assert_eq!(pushed.len(), 1);
    assert_eq!(pushed[0].status, OrderStatus::Canceled);
    assert_eq!(pushed[0].items.len(), 2);
}

#[tokio::test]
async fn confirm_passes_on_confirmed_items_only() {
    let gateway = ScriptedGateway::accepting();
    let (db, api) = setup(gateway.clone()).await;
    let request = TransitionRequest::new("S2", "O2").with_items(vec![
        ItemConfirmation::confirmed("D1").with_quantity(1),
        ItemConfirmation { drug_id: "D2".into(), confirmed: false, quantity: None },
    ]);
    assert_eq!(api.confirm_order(request).await.unwrap(), OrderStatus::Confirmed);

    let order = db.fetch_order(&key()).await.unwrap().unwrap();
    let current = order.current().unwrap();
    assert_eq!(current.state.status, OrderStatus::Confirmed);
    assert_eq!(current.items.len(), 1);
    assert_eq!(current.items[0].drug_id, "D1");
    assert_eq!(current.items[0].quantity, 1);

    // Confirmed orders can still be completed
    let request = TransitionRequest::new("S2", "O2").with_items(vec![ItemConfirmation::confirmed("D1")]);
    assert_eq!(api.complete_order(request).await.unwrap(), OrderStatus::Completed);
    let order = db.fetch_order(&key()).await.unwrap().unwrap();
    let labels = order.history.iter().map(|s| s.state.status).collect::<Vec<_>>();
    assert_eq!(labels, vec![OrderStatus::New, OrderStatus::Confirmed, OrderStatus::Completed]);
}

#[tokio::test]
async fn unknown_drug_in_confirmation_is_rejected() {
    let gateway = ScriptedGateway::accepting();
    let (_db, api) = setup(gateway.clone()).await;
    let request = TransitionRequest::new("S2", "O2").with_items(vec![ItemConfirmation::confirmed("D9")]);
    let err = api.confirm_order(request).await.unwrap_err();
    assert!(matches!(err, OrderFlowError::ValidationFailure(_)));
    assert_eq!(gateway.push_count(), 0);
}

#[tokio::test]
async fn stale_push_means_expired() {
    let gateway = ScriptedGateway::new(vec![Ok(PushOutcome::Stale)]);
    let (db, api) = setup(gateway.clone()).await;
    let request = TransitionRequest::new("S2", "O2").with_items(vec![ItemConfirmation::confirmed("D1")]);
    let err = api.confirm_order(request).await.unwrap_err();
    assert!(matches!(err, OrderFlowError::Expired(k) if k == key()));
    assert_eq!(gateway.push_count(), 1);
    let order = db.fetch_order(&key()).await.unwrap().unwrap();
    assert_eq!(order.history.len(), 1);
}

#[tokio::test]
async fn canceled_orders_refuse_every_transition() {
    let gateway = ScriptedGateway::accepting();
    let (db, api) = setup(gateway.clone()).await;
    api.cancel_order(TransitionRequest::new("S2", "O2")).await.unwrap();
    let pushes = gateway.push_count();

    let confirm = api.confirm_order(TransitionRequest::new("S2", "O2")).await.unwrap_err();
    let complete = api.complete_order(TransitionRequest::new("S2", "O2")).await.unwrap_err();
    let cancel = api.cancel_order(TransitionRequest::new("S2", "O2")).await.unwrap_err();
    for err in [confirm, complete, cancel] {
        assert!(matches!(err, OrderFlowError::NotAllowed { current: OrderStatus::Canceled, .. }), "{err}");
    }
    assert_eq!(gateway.push_count(), pushes);
    let order = db.fetch_order(&key()).await.unwrap().unwrap();
    assert_eq!(order.history.len(), 2);
}

#[tokio::test]
async fn missing_order_is_not_found() {
    let gateway = ScriptedGateway::accepting();
    let (db, api) = setup(gateway.clone()).await;
    let err = api.confirm_order(TransitionRequest::new("S2", "nope")).await.unwrap_err();
    assert!(matches!(err, OrderFlowError::OrderNotFound(_)));
    let err = api.confirm_order(TransitionRequest::new("S9", "O2")).await.unwrap_err();
    assert!(matches!(err, OrderFlowError::OrderNotFound(_)));
    assert_eq!(gateway.push_count(), 0);
    assert!(db.fetch_order(&OrderKey::new("S2", "nope")).await.unwrap().is_none());
}

#[tokio::test]
async fn transient_failures_are_retried() {
    let gateway = ScriptedGateway::new(vec![
        Err(GatewayError::Transient("502 Bad Gateway".into())),
        Err(GatewayError::Transient("connection reset".into())),
        Ok(PushOutcome::Accepted),
    ]);
    let (db, api) = setup(gateway.clone()).await;
    let status = api.cancel_order(TransitionRequest::new("S2", "O2")).await.unwrap();
    assert_eq!(status, OrderStatus::Canceled);
    assert_eq!(gateway.push_count(), 3);
    assert_eq!(db.fetch_order(&key()).await.unwrap().unwrap().history.len(), 2);
}

#[tokio::test]
async fn bounded_retries_give_up() {
    let gateway = ScriptedGateway::new(vec![Err(GatewayError::Transient("timeout".into())); 5]);
    let (db, api) = setup(gateway.clone()).await;
    let err = api.cancel_order(TransitionRequest::new("S2", "O2")).await.unwrap_err();
    assert!(matches!(err, OrderFlowError::GaveUp { attempts: 3, .. }));
    assert_eq!(gateway.push_count(), 3);
    assert_eq!(db.fetch_order(&key()).await.unwrap().unwrap().history.len(), 1);
}

#[tokio::test]
async fn fatal_gateway_error_is_not_retried() {
    let gateway = ScriptedGateway::new(vec![Err(GatewayError::Fatal("400 Bad Request".into()))]);
    let (db, api) = setup(gateway.clone()).await;
    let err = api.cancel_order(TransitionRequest::new("S2", "O2")).await.unwrap_err();
    assert!(matches!(err, OrderFlowError::GatewayFailure(_)));
    assert_eq!(gateway.push_count(), 1);
    assert_eq!(db.fetch_order(&key()).await.unwrap().unwrap().history.len(), 1);
}

#[tokio::test]
async fn concurrent_transitions_close_the_order_once() {
    let gateway = ScriptedGateway::accepting();
    let (db, api) = setup(gateway.clone()).await;
    let api = Arc::new(api);
    let cancel = {
        let api = api.clone();
        tokio::spawn(async move { api.cancel_order(TransitionRequest::new("S2", "O2")).await })
    };
    let complete = {
        let api = api.clone();
        tokio::spawn(async move {
            let request = TransitionRequest::new("S2", "O2").with_items(vec![ItemConfirmation::confirmed("D1")]);
            api.complete_order(request).await
        })
    };
    let results = [cancel.await.unwrap(), complete.await.unwrap()];
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results.iter().any(|r| matches!(r, Err(OrderFlowError::NotAllowed { .. }))));

    let order = db.fetch_order(&key()).await.unwrap().unwrap();
    assert_eq!(order.history.len(), 2);
    assert!(order.current_status().unwrap().is_terminal());
    assert_eq!(gateway.push_count(), 1);
}

#[tokio::test]
async fn handles_sharing_a_lock_table_close_the_order_once() {
    let gateway = ScriptedGateway::accepting().with_delay(Duration::from_millis(100));
    let (db, first) = setup(gateway.clone()).await;
    let locks = OrderLocks::new();
    let first = first.with_locks(locks.clone());
    let second = OrderFlowApi::new(db.clone(), gateway.clone(), Arc::new(CredentialCache::new(db.clone())))
        .with_retry_policy(fast_retries(3))
        .with_locks(locks.clone());

    let (a, b) = tokio::join!(
        first.cancel_order(TransitionRequest::new("S2", "O2").with_reason("first")),
        second.cancel_order(TransitionRequest::new("S2", "O2").with_reason("second")),
    );
    let results = [a, b];
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results.iter().any(|r| matches!(r, Err(OrderFlowError::NotAllowed { .. }))));
    assert_eq!(gateway.push_count(), 1);
    assert_eq!(db.fetch_order(&key()).await.unwrap().unwrap().history.len(), 2);
    assert_eq!(locks.active(), 0);
}

/// Accepts every push, but only after a poll has stored a remote cancellation of the same order.
#[derive(Clone)]
struct CanceledRemotely {
    db: SqliteDatabase,
    pushes: Arc<AtomicUsize>,
}

impl OrderGateway for CanceledRemotely {
    async fn push_order_update(&self, _: &Credentials, order: &NewOrder) -> Result<PushOutcome, GatewayError> {
        self.pushes.fetch_add(1, Ordering::SeqCst);
        let mut canceled = order.clone();
        canceled.status = OrderStatus::Canceled;
        canceled.reason = Some("canceled by the customer".into());
        IngestApi::new(self.db.clone()).ingest_one(&canceled).await.expect("remote cancellation is stored");
        Ok(PushOutcome::Accepted)
    }
}

#[tokio::test]
async fn accepted_push_that_cannot_be_stored_is_a_persistence_failure() {
    let db = fresh_database().await;
    seed_shop(&db, "S2", 7, true).await;
    IngestApi::new(db.clone()).ingest(&[sample_order("S2", "O2", &[("D1", 2), ("D2", 1)])]).await;
    let gateway = CanceledRemotely { db: db.clone(), pushes: Arc::default() };
    let api = OrderFlowApi::new(db.clone(), gateway.clone(), Arc::new(CredentialCache::new(db.clone())))
        .with_retry_policy(fast_retries(3));

    let request = TransitionRequest::new("S2", "O2").with_items(vec![ItemConfirmation::confirmed("D1")]);
    let err = api.confirm_order(request).await.unwrap_err();
    assert!(matches!(err, OrderFlowError::PersistenceFailure(_)), "{err}");
    assert_eq!(gateway.pushes.load(Ordering::SeqCst), 1);

    let order = db.fetch_order(&key()).await.unwrap().unwrap();
    assert_eq!(order.history.len(), 2);
    assert_eq!(order.current_status(), Some(OrderStatus::Canceled));
}
