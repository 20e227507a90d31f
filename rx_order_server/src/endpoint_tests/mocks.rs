use chrono::{DateTime, Utc};
use mockall::mock;
use rx_order_engine::{
    db_types::{DrugInfo, FullOrder, InsertStateResult, NewOrder, OrderKey, OrderStatus},
    traits::{OrderStore, OrderStoreError},
};

mock! {
    pub OrderStore {}
    impl OrderStore for OrderStore {
        async fn record_order_state(&self, order: &NewOrder, drugs: &[DrugInfo]) -> Result<InsertStateResult, OrderStoreError>;
        async fn fetch_order(&self, key: &OrderKey) -> Result<Option<FullOrder>, OrderStoreError>;
        async fn fetch_orders_for_shop(&self, shop_id: &str) -> Result<Vec<FullOrder>, OrderStoreError>;
        async fn search_orders_by_suffix(&self, shop_id: &str, suffix: &str) -> Result<Vec<FullOrder>, OrderStoreError>;
        async fn fetch_single_state_orders(&self, status: OrderStatus, before: DateTime<Utc>) -> Result<Vec<OrderKey>, OrderStoreError>;
    }
}
