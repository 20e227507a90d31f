use rx_order_engine::{db_types::OrderStatus, order_objects::ItemConfirmation};
use serde::{Deserialize, Serialize};

/// Request body for the confirm, complete and cancel endpoints. The shop and order ids come from the path.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransitionParams {
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub items: Vec<ItemConfirmation>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SuffixQuery {
    pub suffix: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionResult {
    /// The applied state, in the booking system's vocabulary.
    pub state: String,
    pub status: OrderStatus,
}
