use std::sync::Arc;

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue, CONTENT_TYPE, USER_AGENT},
    Client,
    RequestBuilder,
    Response,
    StatusCode,
};
use rx_common::Credentials;
use serde::Serialize;
use serde_json::Value;

use crate::{
    config::BookingConfig,
    data_objects::{BookingOrder, PushStatus},
    BookingApiError,
};

#[derive(Clone)]
pub struct BookingApi {
    config: BookingConfig,
    client: Arc<Client>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PullRequest<'a> {
    shop_id: &'a str,
}

impl BookingApi {
    pub fn new(config: BookingConfig) -> Result<Self, BookingApiError> {
        let mut headers = HeaderMap::with_capacity(2);
        let val = HeaderValue::from_str(config.user_agent.as_str())
            .map_err(|e| BookingApiError::Initialization(e.to_string()))?;
        headers.insert(USER_AGENT, val);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| BookingApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn config(&self) -> &BookingConfig {
        &self.config
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url)
    }

    /// Fetches the orders that are new for `shop_id`.
    ///
    /// The booking system answers `204 No Content` when there is nothing new, which is returned as an empty list.
    pub async fn pull_orders(
        &self,
        credentials: &Credentials,
        shop_id: &str,
    ) -> Result<Vec<BookingOrder>, BookingApiError> {
        self.pull_raw_orders(credentials, shop_id)
            .await?
            .into_iter()
            .map(|v| serde_json::from_value(v).map_err(|e| BookingApiError::JsonError(e.to_string())))
            .collect()
    }

    /// Like [`BookingApi::pull_orders`], but leaves each order as the JSON object the booking system sent, unknown
    /// fields included.
    pub async fn pull_raw_orders(
        &self,
        credentials: &Credentials,
        shop_id: &str,
    ) -> Result<Vec<Value>, BookingApiError> {
        let req = self.client.post(self.url("/orders/pull")).json(&PullRequest { shop_id });
        let response = self.send(req, credentials).await?;
        match response.status() {
            StatusCode::NO_CONTENT => {
                trace!("📡️ No new orders for shop {shop_id}");
                Ok(Vec::new())
            },
            s if s.is_success() => {
                let orders =
                    response.json::<Vec<Value>>().await.map_err(|e| BookingApiError::JsonError(e.to_string()))?;
                debug!("📡️ Pulled {} orders for shop {shop_id}", orders.len());
                Ok(orders)
            },
            _ => Err(error_from_response(response).await),
        }
    }

    /// Pushes a new state for `order` to the booking system.
    ///
    /// Only `200` and `204` are decisive. Transport failures and `5xx` come back as transient errors (see
    /// [`BookingApiError::is_transient`]); every other status is a [`BookingApiError::QueryError`].
    pub async fn push_order_update(
        &self,
        credentials: &Credentials,
        order: &BookingOrder,
    ) -> Result<PushStatus, BookingApiError> {
        let req = self.client.post(self.url("/orders/update")).json(order);
        let response = self.send(req, credentials).await?;
        match response.status() {
            StatusCode::OK => {
                debug!("📡️ Order {}/{} update to {} accepted", order.shop_id, order.order_id, order.status);
                Ok(PushStatus::Accepted)
            },
            StatusCode::NO_CONTENT => {
                info!("📡️ Booking system no longer recognises order {}/{}", order.shop_id, order.order_id);
                Ok(PushStatus::Stale)
            },
            _ => Err(error_from_response(response).await),
        }
    }

    async fn send(&self, req: RequestBuilder, credentials: &Credentials) -> Result<Response, BookingApiError> {
        req.basic_auth(&credentials.login, Some(credentials.secret.reveal()))
            .send()
            .await
            .map_err(|e| BookingApiError::Transport(e.to_string()))
    }
}

async fn error_from_response(response: Response) -> BookingApiError {
    let status = response.status();
    let message = response.text().await.unwrap_or_default();
    if status.is_server_error() {
        warn!("📡️ Booking system returned {status}: {message}");
        BookingApiError::ServerError { status: status.as_u16(), message }
    } else {
        error!("📡️ Unexpected response from booking system. {status}: {message}");
        BookingApiError::QueryError { status: status.as_u16(), message }
    }
}
