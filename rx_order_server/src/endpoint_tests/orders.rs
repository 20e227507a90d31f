use actix_web::{http::StatusCode, test::TestRequest};
use rx_order_engine::{
    order_objects::OrderSummary,
    test_utils::{prepare_env::sample_order, ScriptedGateway},
};

use super::helpers::TestBackend;

#[actix_web::test]
async fn health_check() {
    let backend = TestBackend::new(ScriptedGateway::accepting()).await;
    let (status, body) = backend.send(TestRequest::get().uri("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "👍️\n");
}

#[actix_web::test]
async fn new_orders_are_handed_out_once() {
    let backend = TestBackend::new(ScriptedGateway::accepting()).await;
    let (status, body) = backend.send(TestRequest::get().uri("/shops/S1/orders/new")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("error"));

    backend.buffer.enqueue("S1", vec![sample_order("S1", "O1", &[("D1", 1)]), sample_order("S1", "O2", &[])]);
    let (status, body) = backend.send(TestRequest::get().uri("/shops/S1/orders/new")).await;
    assert_eq!(status, StatusCode::OK);
    let orders: Vec<OrderSummary> = serde_json::from_str(&body).unwrap();
    let ids = orders.iter().map(|o| o.order_id.as_str()).collect::<Vec<_>>();
    assert_eq!(ids, vec!["O1", "O2"]);

    let (status, _) = backend.send(TestRequest::get().uri("/shops/S1/orders/new")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn all_orders_for_a_shop() {
    let backend = TestBackend::new(ScriptedGateway::accepting())
        .await
        .with_orders(&[sample_order("S1", "1001", &[("D1", 2)]), sample_order("S1", "1002", &[])])
        .await;
    let (status, body) = backend.send(TestRequest::get().uri("/shops/S1/orders")).await;
    assert_eq!(status, StatusCode::OK);
    let mut orders: Vec<OrderSummary> = serde_json::from_str(&body).unwrap();
    orders.sort_by(|a, b| a.order_id.cmp(&b.order_id));
    assert_eq!(orders.len(), 2);
    assert_eq!(orders[0].order_id, "1001");
    assert_eq!(orders[0].items.len(), 1);
    assert_eq!(orders[0].items[0].quantity, 2);

    let (status, body) = backend.send(TestRequest::get().uri("/shops/S9/orders")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "[]");
}

#[actix_web::test]
async fn search_orders_by_suffix() {
    let backend = TestBackend::new(ScriptedGateway::accepting())
        .await
        .with_orders(&[
            sample_order("S1", "1001", &[]),
            sample_order("S1", "2001", &[]),
            sample_order("S1", "1002", &[]),
        ])
        .await;
    let (status, body) = backend.send(TestRequest::get().uri("/shops/S1/orders/search?suffix=01")).await;
    assert_eq!(status, StatusCode::OK);
    let mut orders: Vec<OrderSummary> = serde_json::from_str(&body).unwrap();
    orders.sort_by(|a, b| a.order_id.cmp(&b.order_id));
    let ids = orders.iter().map(|o| o.order_id.as_str()).collect::<Vec<_>>();
    assert_eq!(ids, vec!["1001", "2001"]);

    let (status, _) = backend.send(TestRequest::get().uri("/shops/S1/orders/search?suffix=77")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = backend.send(TestRequest::get().uri("/shops/S1/orders/search?suffix=%20")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
