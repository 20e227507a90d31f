//! Best-effort notifications to a third-party messaging endpoint.
//!
//! Callers use the `notify_*` methods, which hand the request to a background task and return immediately. Failures are logged and dropped. Nothing that triggers a notification ever
//! waits for it or fails because of it.
use std::time::Duration;

use booking_tools::BookingOrder;
use log::*;
use reqwest::Client;
use rx_order_engine::db_types::OrderKey;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::errors::ServerError;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Notifications are disabled")]
    Disabled,
    #[error("Could not serialize notification. {0}")]
    Serialization(String),
    #[error("Could not reach the notifier. {0}")]
    Transport(String),
    #[error("Notifier answered with status {0}")]
    Rejected(u16),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderPayload {
    pub shop_id: String,
    pub order_id: String,
}

impl From<&OrderKey> for ReminderPayload {
    fn from(key: &OrderKey) -> Self {
        Self { shop_id: key.shop_id.clone(), order_id: key.order_id.clone() }
    }
}

#[derive(Clone)]
pub struct Notifier {
    url: Option<String>,
    client: Client,
}

impl Notifier {
    pub fn new(url: Option<String>, timeout: Duration) -> Result<Self, ServerError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ServerError::InitializeError(format!("Could not create notifier client. {e}")))?;
        Ok(Self { url, client })
    }

    pub fn disabled() -> Self {
        Self { url: None, client: Client::new() }
    }

    pub fn is_enabled(&self) -> bool {
        self.url.is_some()
    }

    /// Forwards a freshly polled order as the booking system sent it, including fields the engine does not model.
    pub fn notify_raw_order(&self, shop_id: &str, payload: &Value) {
        let order_id = payload.get("orderId").and_then(Value::as_str).unwrap_or("?");
        let context = format!("new order {shop_id}/{order_id}");
        self.dispatch(payload, context);
    }

    /// Forwards a freshly polled order, re-encoded in the booking system's wire format.
    pub fn notify_order_received(&self, order: &BookingOrder) {
        let context = format!("new order {}/{}", order.shop_id, order.order_id);
        self.dispatch(order, context);
    }

    pub fn notify_reminder(&self, key: &OrderKey) {
        self.dispatch(&ReminderPayload::from(key), format!("reminder for {key}"));
    }

    fn dispatch<T: Serialize>(&self, payload: &T, context: String) {
        if !self.is_enabled() {
            return;
        }
        let body = match serde_json::to_value(payload) {
            Ok(v) => v,
            Err(e) => {
                warn!("📣️ Could not serialize {context}. {e}");
                return;
            },
        };
        let notifier = self.clone();
        tokio::spawn(async move {
            match notifier.deliver(&body).await {
                Ok(()) => trace!("📣️ Delivered {context}"),
                Err(e) => warn!("📣️ Could not deliver {context}. {e}"),
            }
        });
    }

    /// Posts `payload` to the notifier and waits for the answer. Any 2xx counts as delivered; the body is ignored.
    pub async fn deliver<T: Serialize + ?Sized>(&self, payload: &T) -> Result<(), NotifyError> {
        let url = self.url.as_deref().ok_or(NotifyError::Disabled)?;
        let body = serde_json::to_vec(payload).map_err(|e| NotifyError::Serialization(e.to_string()))?;
        let response = self
            .client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(NotifyError::Rejected(response.status().as_u16()))
        }
    }
}
