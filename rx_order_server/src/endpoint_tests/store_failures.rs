use actix_web::{http::StatusCode, web, web::ServiceConfig};
use rx_order_engine::{test_utils::prepare_env::sample_order, traits::OrderStoreError, OrderBuffer, ShopOrdersApi};

use super::{helpers::get_request, mocks::MockOrderStore};
use crate::routes::{AllOrdersRoute, NewOrdersRoute, SearchOrdersRoute};

#[actix_web::test]
async fn store_errors_are_internal_errors() {
    let _ = env_logger::try_init();
    let (status, body) = get_request("/shops/S1/orders", configure).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.contains("disk I/O error"));

    let (status, _) = get_request("/shops/S1/orders/search?suffix=42", configure).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[actix_web::test]
async fn new_orders_never_touch_the_store() {
    let _ = env_logger::try_init();
    let (status, body) = get_request("/shops/S1/orders/new", configure).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("\"order_id\":\"O1\""));
}

fn configure(cfg: &mut ServiceConfig) {
    let mut store = MockOrderStore::new();
    store
        .expect_fetch_orders_for_shop()
        .returning(|_| Err(OrderStoreError::DatabaseError("disk I/O error".into())));
    store
        .expect_search_orders_by_suffix()
        .returning(|_, _| Err(OrderStoreError::DatabaseError("disk I/O error".into())));
    store.expect_record_order_state().never();
    let buffer = OrderBuffer::new();
    buffer.enqueue("S1", vec![sample_order("S1", "O1", &[("D1", 1)])]);
    cfg.service(NewOrdersRoute::<MockOrderStore>::new())
        .service(SearchOrdersRoute::<MockOrderStore>::new())
        .service(AllOrdersRoute::<MockOrderStore>::new())
        .app_data(web::Data::new(ShopOrdersApi::new(store, buffer)));
}
