use std::collections::HashSet;

use chrono::{DateTime, Utc};
use rx_common::Price;
use serde::{Deserialize, Serialize};

use crate::{
    db_types::{FullOrder, LineItem, NewLineItem, NewOrder, OrderKey, OrderStatus},
    oe_api::errors::OrderFlowError,
};

//--------------------------------------    TransitionRequest   --------------------------------------------------------
/// The shop's answer for one line item of the order being confirmed or completed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemConfirmation {
    pub drug_id: String,
    pub confirmed: bool,
    /// Overrides the ordered quantity, e.g. when only part of it is in stock.
    #[serde(default)]
    pub quantity: Option<i64>,
}

impl ItemConfirmation {
    pub fn confirmed<S: Into<String>>(drug_id: S) -> Self {
        Self { drug_id: drug_id.into(), confirmed: true, quantity: None }
    }

    pub fn with_quantity(mut self, quantity: i64) -> Self {
        self.quantity = Some(quantity);
        self
    }
}

/// A request to move an order to `Confirmed`, `Completed` or `Canceled`.
///
/// For a cancellation, `items` is ignored: the booking system is always told about every item that was pending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRequest {
    pub shop_id: String,
    pub order_id: String,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub items: Vec<ItemConfirmation>,
}

impl TransitionRequest {
    pub fn new<S: Into<String>>(shop_id: S, order_id: S) -> Self {
        Self { shop_id: shop_id.into(), order_id: order_id.into(), reason: None, items: vec![] }
    }

    pub fn with_reason<S: Into<String>>(mut self, reason: S) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn with_items(mut self, items: Vec<ItemConfirmation>) -> Self {
        self.items = items;
        self
    }

    pub fn key(&self) -> OrderKey {
        OrderKey::new(self.shop_id.as_str(), self.order_id.as_str())
    }

    pub fn validate(&self) -> Result<(), OrderFlowError> {
        if self.shop_id.trim().is_empty() {
            return Err(OrderFlowError::ValidationFailure("shop id is empty".into()));
        }
        if self.order_id.trim().is_empty() {
            return Err(OrderFlowError::ValidationFailure("order id is empty".into()));
        }
        let mut seen = HashSet::with_capacity(self.items.len());
        for item in &self.items {
            if !seen.insert(item.drug_id.as_str()) {
                return Err(OrderFlowError::ValidationFailure(format!("drug {} is listed twice", item.drug_id)));
            }
            if let Some(q) = item.quantity {
                if q <= 0 {
                    return Err(OrderFlowError::ValidationFailure(format!(
                        "quantity for drug {} must be positive, not {q}",
                        item.drug_id
                    )));
                }
            }
        }
        Ok(())
    }
}

//--------------------------------------      OrderSummary      --------------------------------------------------------
/// What a shop sees of an order: the immutable fields plus the current state and its items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderSummary {
    pub shop_id: String,
    pub order_id: String,
    pub phone: String,
    pub created_at: i64,
    pub shipping_method: String,
    pub agent: String,
    pub ext_shop_id: String,
    pub status: OrderStatus,
    pub reason: Option<String>,
    pub updated_at: DateTime<Utc>,
    pub items: Vec<LineItemSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItemSummary {
    pub drug_id: String,
    pub ext_drug_id: String,
    pub quantity: i64,
    pub price: Price,
    /// Only known once the order has been persisted.
    pub drug_name: Option<String>,
    pub drug_link: Option<String>,
}

impl From<&NewLineItem> for LineItemSummary {
    fn from(item: &NewLineItem) -> Self {
        Self {
            drug_id: item.drug_id.clone(),
            ext_drug_id: item.ext_drug_id.clone(),
            quantity: item.quantity,
            price: item.price,
            drug_name: None,
            drug_link: None,
        }
    }
}

impl From<&LineItem> for LineItemSummary {
    fn from(item: &LineItem) -> Self {
        Self {
            drug_id: item.drug_id.clone(),
            ext_drug_id: item.ext_drug_id.clone(),
            quantity: item.quantity,
            price: item.price,
            drug_name: Some(item.drug_name.clone()),
            drug_link: item.drug_link.clone(),
        }
    }
}

impl From<&NewOrder> for OrderSummary {
    fn from(order: &NewOrder) -> Self {
        Self {
            shop_id: order.shop_id.clone(),
            order_id: order.order_id.clone(),
            phone: order.phone.clone(),
            created_at: order.created_at,
            shipping_method: order.shipping_method.clone(),
            agent: order.agent.clone(),
            ext_shop_id: order.ext_shop_id.clone(),
            status: order.status,
            reason: order.reason.clone(),
            updated_at: order.time,
            items: order.items.iter().map(LineItemSummary::from).collect(),
        }
    }
}

impl OrderSummary {
    /// Summarises a persisted order at its current state. Returns `None` if the order has no states at all.
    pub fn from_full_order(order: &FullOrder) -> Option<Self> {
        let current = order.current()?;
        let o = &order.order;
        Some(Self {
            shop_id: o.shop_id.clone(),
            order_id: o.order_id.clone(),
            phone: o.phone.clone(),
            created_at: o.created_at,
            shipping_method: o.shipping_method.clone(),
            agent: o.agent.clone(),
            ext_shop_id: o.ext_shop_id.clone(),
            status: current.state.status,
            reason: current.state.reason.clone(),
            updated_at: current.state.time,
            items: current.items.iter().map(LineItemSummary::from).collect(),
        })
    }
}

//--------------------------------------      IngestSummary     --------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    /// First sighting. The order was created with this state.
    Inserted,
    /// The state was appended to an existing order.
    Appended,
    /// Nothing was written for this order.
    Rejected(String),
}

/// Per-order results of ingesting one batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestSummary {
    pub results: Vec<(OrderKey, IngestOutcome)>,
}

impl IngestSummary {
    pub fn push(&mut self, key: OrderKey, outcome: IngestOutcome) {
        self.results.push((key, outcome));
    }

    pub fn outcome_for(&self, key: &OrderKey) -> Option<&IngestOutcome> {
        self.results.iter().find(|(k, _)| k == key).map(|(_, o)| o)
    }

    pub fn inserted(&self) -> usize {
        self.results.iter().filter(|(_, o)| matches!(o, IngestOutcome::Inserted)).count()
    }

    pub fn appended(&self) -> usize {
        self.results.iter().filter(|(_, o)| matches!(o, IngestOutcome::Appended)).count()
    }

    pub fn rejected(&self) -> usize {
        self.results.iter().filter(|(_, o)| matches!(o, IngestOutcome::Rejected(_))).count()
    }
}
