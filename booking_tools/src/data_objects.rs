use serde::{Deserialize, Serialize};

/// An order as the booking system sends and accepts it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingOrder {
    pub shop_id: String,
    pub order_id: String,
    #[serde(default)]
    pub phone: String,
    /// Unix timestamp, seconds
    pub created_at: i64,
    #[serde(default)]
    pub shipping: String,
    #[serde(default)]
    pub agent: String,
    #[serde(default)]
    pub ext_shop_id: String,
    /// State label, in the booking system's own vocabulary. See [`crate::StateLabels`].
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default)]
    pub items: Vec<BookingItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingItem {
    pub drug_id: String,
    #[serde(default)]
    pub ext_drug_id: String,
    pub quantity: i64,
    /// Unit price in major currency units
    pub price: f64,
}

/// The decisive outcomes of pushing an order update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushStatus {
    /// The booking system processed the update (HTTP 200).
    Accepted,
    /// The booking system no longer knows the order: it expired or was closed remotely (HTTP 204).
    Stale,
}
