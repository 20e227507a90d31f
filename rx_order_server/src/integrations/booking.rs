//! Adapts the booking system client in `booking_tools` to the order engine.
//!
//! The engine works with [`NewOrder`]s and [`OrderStatus`]. The booking system speaks [`BookingOrder`]s with its own,
//! configurable, state labels and decimal prices. Conversions in both directions live here.
use booking_tools::{BookingApi, BookingApiError, BookingItem, BookingOrder, PushStatus, StateLabels};
use chrono::{DateTime, Utc};
use log::*;
use rx_common::{Credentials, Price};
use rx_order_engine::{
    db_types::{NewLineItem, NewOrder, OrderStatus},
    traits::{GatewayError, OrderGateway, PushOutcome},
};
use serde_json::Value;

use crate::errors::OrderConversionError;

#[derive(Clone)]
pub struct BookingGateway {
    api: BookingApi,
}

impl BookingGateway {
    pub fn new(api: BookingApi) -> Self {
        Self { api }
    }

    pub fn labels(&self) -> &StateLabels {
        &self.api.config().state_labels
    }

    /// Pulls the new orders for a shop, each with the JSON object it arrived as. Orders that cannot be converted are
    /// logged and skipped; they do not fail the rest of the batch.
    pub async fn pull_new_orders(
        &self,
        credentials: &Credentials,
        shop_id: &str,
    ) -> Result<Vec<(NewOrder, Value)>, BookingApiError> {
        let received_at = Utc::now();
        let raw = self.api.pull_raw_orders(credentials, shop_id).await?;
        let converted = raw
            .into_iter()
            .filter_map(|payload| {
                let order = serde_json::from_value::<BookingOrder>(payload.clone())
                    .map_err(|e| OrderConversionError::Malformed(e.to_string()))
                    .and_then(|o| new_order_from_booking_order(o, self.labels(), received_at));
                match order {
                    Ok(order) => Some((order, payload)),
                    Err(e) => {
                        let id = payload.get("orderId").and_then(Value::as_str).unwrap_or("?");
                        warn!("📡️ Skipping order {shop_id}/{id} from the booking system. {e}");
                        None
                    },
                }
            })
            .collect();
        Ok(converted)
    }
}

impl OrderGateway for BookingGateway {
    async fn push_order_update(
        &self,
        credentials: &Credentials,
        order: &NewOrder,
    ) -> Result<PushOutcome, GatewayError> {
        let payload = booking_order_from_new_order(order, self.labels());
        match self.api.push_order_update(credentials, &payload).await {
            Ok(PushStatus::Accepted) => Ok(PushOutcome::Accepted),
            Ok(PushStatus::Stale) => Ok(PushOutcome::Stale),
            Err(e) if e.is_transient() => Err(GatewayError::Transient(e.to_string())),
            Err(e) => Err(GatewayError::Fatal(e.to_string())),
        }
    }
}

pub fn new_order_from_booking_order(
    order: BookingOrder,
    labels: &StateLabels,
    time: DateTime<Utc>,
) -> Result<NewOrder, OrderConversionError> {
    let status = status_from_label(&order.status, labels)?;
    let items = order
        .items
        .into_iter()
        .map(|i| {
            let price = Price::try_from_major(i.price)
                .map_err(|e| OrderConversionError::InvalidPrice { drug_id: i.drug_id.clone(), message: e.to_string() })?;
            Ok(NewLineItem { drug_id: i.drug_id, ext_drug_id: i.ext_drug_id, quantity: i.quantity, price })
        })
        .collect::<Result<Vec<_>, OrderConversionError>>()?;
    Ok(NewOrder {
        shop_id: order.shop_id,
        order_id: order.order_id,
        phone: order.phone,
        created_at: order.created_at,
        shipping_method: order.shipping,
        agent: order.agent,
        ext_shop_id: order.ext_shop_id,
        status,
        reason: order.reason,
        time,
        items,
    })
}

pub fn booking_order_from_new_order(order: &NewOrder, labels: &StateLabels) -> BookingOrder {
    BookingOrder {
        shop_id: order.shop_id.clone(),
        order_id: order.order_id.clone(),
        phone: order.phone.clone(),
        created_at: order.created_at,
        shipping: order.shipping_method.clone(),
        agent: order.agent.clone(),
        ext_shop_id: order.ext_shop_id.clone(),
        status: label_for_status(order.status, labels).to_string(),
        reason: order.reason.clone(),
        items: order
            .items
            .iter()
            .map(|i| BookingItem {
                drug_id: i.drug_id.clone(),
                ext_drug_id: i.ext_drug_id.clone(),
                quantity: i.quantity,
                price: i.price.to_major(),
            })
            .collect(),
    }
}

pub fn label_for_status(status: OrderStatus, labels: &StateLabels) -> &str {
    match status {
        OrderStatus::New => labels.new.as_str(),
        OrderStatus::Confirmed => labels.confirmed.as_str(),
        OrderStatus::Completed => labels.completed.as_str(),
        OrderStatus::Canceled => labels.canceled.as_str(),
    }
}

pub fn status_from_label(label: &str, labels: &StateLabels) -> Result<OrderStatus, OrderConversionError> {
    let label = label.trim();
    [
        (labels.new.as_str(), OrderStatus::New),
        (labels.confirmed.as_str(), OrderStatus::Confirmed),
        (labels.completed.as_str(), OrderStatus::Completed),
        (labels.canceled.as_str(), OrderStatus::Canceled),
    ]
    .into_iter()
    .find(|(l, _)| l.eq_ignore_ascii_case(label))
    .map(|(_, s)| s)
    .ok_or_else(|| OrderConversionError::UnknownStateLabel(label.to_string()))
}
