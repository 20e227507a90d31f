use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use rx_common::{Credentials, Price};
use serde::{Deserialize, Serialize};
use thiserror::Error;

//--------------------------------------      OrderStatus      ---------------------------------------------------------
/// The lifecycle state of an order.
///
/// ```text
///   New ──► Confirmed ──► Completed
///    │          │
///    │          └───────► Canceled
///    ├──────────────────► Completed
///    └──────────────────► Canceled
/// ```
/// `Completed` and `Canceled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    /// The order has been received from the booking system and nobody has acted on it yet.
    New,
    /// The shop has acknowledged the order, possibly for a subset of the requested items.
    Confirmed,
    /// The customer has collected the order.
    Completed,
    /// The order was canceled, either by the shop or remotely.
    Canceled,
}

impl OrderStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Canceled)
    }

    /// Whether an order currently in this state may move to `next`. Terminal states accept nothing, and no state
    /// leads back to `New`.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        !self.is_terminal() && next != OrderStatus::New
    }
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatus::New => write!(f, "New"),
            OrderStatus::Confirmed => write!(f, "Confirmed"),
            OrderStatus::Completed => write!(f, "Completed"),
            OrderStatus::Canceled => write!(f, "Canceled"),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid order status: {0}")]
pub struct ConversionError(pub String);

impl FromStr for OrderStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "New" => Ok(Self::New),
            "Confirmed" => Ok(Self::Confirmed),
            "Completed" => Ok(Self::Completed),
            "Canceled" => Ok(Self::Canceled),
            s => Err(ConversionError(s.to_string())),
        }
    }
}

//--------------------------------------        OrderKey       ---------------------------------------------------------
/// Orders are only unique per shop, so every lookup needs both ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderKey {
    pub shop_id: String,
    pub order_id: String,
}

impl OrderKey {
    pub fn new<S: Into<String>>(shop_id: S, order_id: S) -> Self {
        Self { shop_id: shop_id.into(), order_id: order_id.into() }
    }
}

impl Display for OrderKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.shop_id, self.order_id)
    }
}

//--------------------------------------        NewOrder       ---------------------------------------------------------
/// A snapshot of an order as it should be recorded: the immutable order fields plus the state being appended.
///
/// Polled orders arrive in this shape, and the transition service builds one for every state change it pushes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewOrder {
    pub shop_id: String,
    pub order_id: String,
    pub phone: String,
    /// When the customer placed the order, as a Unix timestamp in seconds.
    pub created_at: i64,
    pub shipping_method: String,
    pub agent: String,
    pub ext_shop_id: String,
    pub status: OrderStatus,
    pub reason: Option<String>,
    /// When this state was observed or applied.
    pub time: DateTime<Utc>,
    pub items: Vec<NewLineItem>,
}

impl NewOrder {
    pub fn key(&self) -> OrderKey {
        OrderKey::new(self.shop_id.as_str(), self.order_id.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLineItem {
    pub drug_id: String,
    pub ext_drug_id: String,
    pub quantity: i64,
    pub price: Price,
}

//--------------------------------------          Order        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub id: i64,
    pub shop_id: String,
    pub order_id: String,
    pub phone: String,
    pub created_at: i64,
    pub shipping_method: String,
    pub agent: String,
    pub ext_shop_id: String,
}

impl Order {
    pub fn key(&self) -> OrderKey {
        OrderKey::new(self.shop_id.as_str(), self.order_id.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderState {
    pub id: i64,
    pub order_id: i64,
    pub shop_id: String,
    pub time: DateTime<Utc>,
    pub status: OrderStatus,
    pub reason: Option<String>,
}

/// A line item as stored against a state, with its drug name already resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineItem {
    pub id: i64,
    pub state_id: i64,
    pub drug_id: String,
    pub ext_drug_id: String,
    pub quantity: i64,
    pub price: Price,
    pub drug_name: String,
    pub drug_link: Option<String>,
}

impl From<&LineItem> for NewLineItem {
    fn from(item: &LineItem) -> Self {
        Self {
            drug_id: item.drug_id.clone(),
            ext_drug_id: item.ext_drug_id.clone(),
            quantity: item.quantity,
            price: item.price,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateRecord {
    pub state: OrderState,
    pub items: Vec<LineItem>,
}

/// An order with its full state history, oldest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FullOrder {
    pub order: Order,
    pub history: Vec<StateRecord>,
}

impl FullOrder {
    /// The authoritative state of the order: the last one recorded. `None` only for a corrupt order with no states.
    pub fn current(&self) -> Option<&StateRecord> {
        self.history.last()
    }

    pub fn current_status(&self) -> Option<OrderStatus> {
        self.current().map(|s| s.state.status)
    }
}

/// The result of appending a state to an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertStateResult {
    /// First sighting: the order row was created along with its first state.
    Inserted { order_id: i64, state_id: i64 },
    /// The order already existed and a state was appended to its history.
    Appended { order_id: i64, state_id: i64 },
}

//--------------------------------------     Shops & Corps     ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shop {
    pub id: String,
    pub ext_id: String,
    pub corporation_id: i64,
    pub logged_in: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCorporation {
    pub id: i64,
    pub name: String,
    pub credentials: Credentials,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrugInfo {
    pub name: String,
    pub link: Option<String>,
}
