use std::{fmt::Debug, time::Duration};

use chrono::{DateTime, Utc};

use crate::{
    db_types::{OrderKey, OrderStatus},
    oe_api::errors::OrderFlowError,
    traits::OrderStore,
};

pub struct ReminderApi<B> {
    db: B,
}

impl<B> Debug for ReminderApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ReminderApi")
    }
}

impl<B> ReminderApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> ReminderApi<B>
where B: OrderStore
{
    /// Orders nobody has acted on for longer than `threshold` as of `now`.
    ///
    /// Only orders with a single recorded `New` state qualify. An order that has picked up a second state drops out,
    /// even if that state is also `New`.
    pub async fn overdue_orders(
        &self,
        threshold: Duration,
        now: DateTime<Utc>,
    ) -> Result<Vec<OrderKey>, OrderFlowError> {
        let threshold = chrono::Duration::from_std(threshold)
            .map_err(|e| OrderFlowError::ValidationFailure(format!("reminder threshold is out of range: {e}")))?;
        let cutoff = now - threshold;
        let keys = self.db.fetch_single_state_orders(OrderStatus::New, cutoff).await?;
        Ok(keys)
    }
}
