use std::fmt::Debug;

use log::*;

use crate::{
    oe_api::{
        errors::OrderFlowError,
        order_buffer::OrderBuffer,
        order_objects::OrderSummary,
    },
    traits::OrderStore,
};

/// Read operations a shop performs on its orders.
pub struct ShopOrdersApi<B> {
    db: B,
    buffer: OrderBuffer,
}

impl<B> Debug for ShopOrdersApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ShopOrdersApi")
    }
}

impl<B> ShopOrdersApi<B> {
    pub fn new(db: B, buffer: OrderBuffer) -> Self {
        Self { db, buffer }
    }

    /// Hands the shop every order polled since its last call. Each order is handed out once only.
    pub fn get_new_orders(&self, shop_id: &str) -> Result<Vec<OrderSummary>, OrderFlowError> {
        let orders = self.buffer.drain(shop_id).ok_or_else(|| OrderFlowError::NoNewOrders(shop_id.to_string()))?;
        Ok(orders.iter().map(OrderSummary::from).collect())
    }
}

impl<B> ShopOrdersApi<B>
where B: OrderStore
{
    pub async fn get_all_orders(&self, shop_id: &str) -> Result<Vec<OrderSummary>, OrderFlowError> {
        let orders = self.db.fetch_orders_for_shop(shop_id).await?;
        Ok(orders.iter().filter_map(OrderSummary::from_full_order).collect())
    }

    /// Orders whose id ends with `suffix`, ignoring ASCII case. Shops typically know only the last few characters
    /// the customer reads out.
    pub async fn get_orders_by_id_suffix(
        &self,
        shop_id: &str,
        suffix: &str,
    ) -> Result<Vec<OrderSummary>, OrderFlowError> {
        let suffix = suffix.trim();
        if suffix.is_empty() {
            return Err(OrderFlowError::ValidationFailure("search suffix is empty".into()));
        }
        let orders = self.db.search_orders_by_suffix(shop_id, suffix).await?;
        let result = orders.iter().filter_map(OrderSummary::from_full_order).collect::<Vec<_>>();
        if result.is_empty() {
            debug!("🔍️ No orders for shop {shop_id} end with '{suffix}'");
            return Err(OrderFlowError::OrderNotFound(format!("{shop_id}/*{suffix}")));
        }
        Ok(result)
    }
}
