use std::time::Duration;

use actix_web::{http::StatusCode, test::TestRequest};
use rx_order_engine::{
    db_types::{OrderKey, OrderStatus},
    test_utils::{prepare_env::sample_order, ScriptedGateway},
    traits::{GatewayError, OrderStore, PushOutcome},
};
use serde_json::json;

use super::helpers::TestBackend;
use crate::data_objects::TransitionResult;

async fn backend_with_order(gateway: ScriptedGateway) -> TestBackend {
    TestBackend::new(gateway).await.with_orders(&[sample_order("S1", "O1", &[("D1", 2), ("D2", 1)])]).await
}

fn post(path: &str, body: serde_json::Value) -> TestRequest {
    TestRequest::post().uri(path).set_json(body)
}

#[actix_web::test]
async fn confirm_then_complete() {
    let gateway = ScriptedGateway::accepting();
    let backend = backend_with_order(gateway.clone()).await;
    let body = json!({"items": [
        {"drug_id": "D1", "confirmed": true, "quantity": 1},
        {"drug_id": "D2", "confirmed": false},
    ]});
    let (status, body) = backend.send(post("/shops/S1/orders/O1/confirm", body)).await;
    assert_eq!(status, StatusCode::OK);
    let result: TransitionResult = serde_json::from_str(&body).unwrap();
    assert_eq!(result.status, OrderStatus::Confirmed);
    assert_eq!(result.state, "Confirmed");

    let order = backend.db.fetch_order(&OrderKey::new("S1", "O1")).await.unwrap().unwrap();
    let current = order.current().unwrap();
    assert_eq!(current.state.status, OrderStatus::Confirmed);
    assert_eq!(current.items.len(), 1);
    assert_eq!(current.items[0].quantity, 1);

    let body = json!({"items": [{"drug_id": "D1", "confirmed": true}]});
    let (status, _) = backend.send(post("/shops/S1/orders/O1/complete", body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(gateway.push_count(), 2);
}

#[actix_web::test]
async fn canceled_orders_are_a_conflict() {
    let backend = backend_with_order(ScriptedGateway::accepting()).await;
    let (status, body) = backend.send(post("/shops/S1/orders/O1/cancel", json!({"reason": "customer left"}))).await;
    assert_eq!(status, StatusCode::OK);
    let result: TransitionResult = serde_json::from_str(&body).unwrap();
    assert_eq!(result.status, OrderStatus::Canceled);

    let body = json!({"items": [{"drug_id": "D1", "confirmed": true}]});
    let (status, body) = backend.send(post("/shops/S1/orders/O1/confirm", body)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body.contains("error"));
}

#[actix_web::test]
async fn stale_push_is_gone() {
    let backend = backend_with_order(ScriptedGateway::new(vec![Ok(PushOutcome::Stale)])).await;
    let (status, _) = backend.send(post("/shops/S1/orders/O1/cancel", json!({}))).await;
    assert_eq!(status, StatusCode::GONE);
    let order = backend.db.fetch_order(&OrderKey::new("S1", "O1")).await.unwrap().unwrap();
    assert_eq!(order.current_status(), Some(OrderStatus::New));
}

#[actix_web::test]
async fn gateway_errors() {
    let gateway = ScriptedGateway::new(vec![
        Err(GatewayError::Transient("down".into())),
        Err(GatewayError::Transient("down".into())),
        Err(GatewayError::Transient("down".into())),
    ]);
    let backend = backend_with_order(gateway).await;
    let (status, _) = backend.send(post("/shops/S1/orders/O1/cancel", json!({}))).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    let backend = backend_with_order(ScriptedGateway::new(vec![Err(GatewayError::Fatal("forbidden".into()))])).await;
    let (status, _) = backend.send(post("/shops/S1/orders/O1/cancel", json!({}))).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
}

#[actix_web::test]
async fn unknown_order_or_drug() {
    let backend = backend_with_order(ScriptedGateway::accepting()).await;
    let (status, _) = backend.send(post("/shops/S1/orders/nope/cancel", json!({}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let body = json!({"items": [{"drug_id": "D9", "confirmed": true}]});
    let (status, _) = backend.send(post("/shops/S1/orders/O1/confirm", body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn disconnected_client_does_not_cut_a_transition_short() {
    let gateway = ScriptedGateway::accepting().with_delay(Duration::from_millis(300));
    let backend = backend_with_order(gateway.clone()).await;
    let req = post("/shops/S1/orders/O1/cancel", json!({"reason": "shop closing"}));
    assert!(backend.abandon(req, Duration::from_millis(60)).await);

    let key = OrderKey::new("S1", "O1");
    let mut status = None;
    for _ in 0..50 {
        tokio::time::sleep(Duration::from_millis(20)).await;
        status = backend.db.fetch_order(&key).await.unwrap().unwrap().current_status();
        if status == Some(OrderStatus::Canceled) {
            break;
        }
    }
    assert_eq!(status, Some(OrderStatus::Canceled));
    assert_eq!(gateway.push_count(), 1);
}
