use std::{collections::HashMap, fmt::Debug, sync::Arc};

use chrono::Utc;
use log::*;
use rx_common::Credentials;

use crate::{
    db_types::{FullOrder, NewLineItem, NewOrder, OrderKey, OrderStatus, StateRecord},
    oe_api::{
        credential_cache::CredentialCache,
        errors::OrderFlowError,
        ingest_api::IngestApi,
        order_locks::OrderLocks,
        order_objects::TransitionRequest,
        retry::RetryPolicy,
    },
    traits::{DrugCatalog, GatewayError, OrderGateway, OrderStore, PushOutcome, ShopManagement},
};

/// `OrderFlowApi` drives shop-initiated state changes: confirm, complete and cancel.
///
/// Every transition follows the same steps. The order is looked up and its current state checked against the
/// transition graph. The next state is then built and pushed to the booking system, retrying transient failures
/// according to the [`RetryPolicy`]. Only once the booking system has accepted the update is the new state recorded
/// locally, through the same [`IngestApi`] path that polled orders take.
///
/// Transitions on the same order are serialised through an [`OrderLocks`] table, so two concurrent requests can never
/// both append a terminal state. Handles that serve the same orders must share one table (see
/// [`OrderFlowApi::with_locks`]); a handle built with [`OrderFlowApi::new`] only serialises its own calls.
///
/// A transition pushes to the booking system before it writes locally. Callers that may abandon the returned future
/// midway (an HTTP handler whose client disconnects, for example) should drive it on a task of its own.
pub struct OrderFlowApi<B, G> {
    db: B,
    gateway: G,
    ingest: IngestApi<B>,
    credentials: Arc<CredentialCache<B>>,
    locks: OrderLocks,
    retry: RetryPolicy,
}

impl<B, G> Debug for OrderFlowApi<B, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi ({:?})", self.retry)
    }
}

impl<B, G> OrderFlowApi<B, G>
where B: Clone
{
    pub fn new(db: B, gateway: G, credentials: Arc<CredentialCache<B>>) -> Self {
        let ingest = IngestApi::new(db.clone());
        Self { db, gateway, ingest, credentials, locks: OrderLocks::new(), retry: RetryPolicy::default() }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Serialise transitions through `locks` instead of a private table.
    pub fn with_locks(mut self, locks: OrderLocks) -> Self {
        self.locks = locks;
        self
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }
}

impl<B, G> OrderFlowApi<B, G>
where
    B: OrderStore + DrugCatalog + ShopManagement,
    G: OrderGateway,
{
    /// The shop acknowledges the order. Only items marked `confirmed` in the request are passed on.
    pub async fn confirm_order(&self, request: TransitionRequest) -> Result<OrderStatus, OrderFlowError> {
        self.transition(OrderStatus::Confirmed, request).await
    }

    /// The customer has collected the order. Only items marked `confirmed` in the request are passed on.
    pub async fn complete_order(&self, request: TransitionRequest) -> Result<OrderStatus, OrderFlowError> {
        self.transition(OrderStatus::Completed, request).await
    }

    /// Cancels the order with the request's reason. The cancellation always reports every item of the current state.
    pub async fn cancel_order(&self, request: TransitionRequest) -> Result<OrderStatus, OrderFlowError> {
        self.transition(OrderStatus::Canceled, request).await
    }

    async fn transition(&self, target: OrderStatus, request: TransitionRequest) -> Result<OrderStatus, OrderFlowError> {
        request.validate()?;
        let key = request.key();
        let _lock = self.locks.lock(&key).await;
        trace!("🔄️ Transition of {key} to {target} requested");
        let order =
            self.db.fetch_order(&key).await?.ok_or_else(|| OrderFlowError::OrderNotFound(key.to_string()))?;
        let current = order
            .current()
            .ok_or_else(|| OrderFlowError::PersistenceFailure(format!("Order {key} has no recorded states")))?;
        if !current.state.status.can_transition_to(target) {
            info!("🔄️ Order {key} is {}. Refusing to make it {target}", current.state.status);
            return Err(OrderFlowError::NotAllowed { key, current: current.state.status, target });
        }
        let mut candidate = build_candidate(&order, current, target, &request)?;
        let credentials = self.credentials.credentials_for_shop(&key.shop_id).await?;
        self.push_with_retry(&credentials, &candidate).await?;
        candidate.time = Utc::now();
        match self.ingest.ingest_one(&candidate).await {
            Ok(_) => {
                info!("🔄️ Order {key} is now {target}");
                Ok(target)
            },
            Err(e) => {
                error!(
                    "🔄️ The booking system accepted order {key} as {target}, but the new state could not be saved. \
                     Local and remote state now disagree. {e}"
                );
                Err(OrderFlowError::PersistenceFailure(e.to_string()))
            },
        }
    }

    async fn push_with_retry(&self, credentials: &Credentials, order: &NewOrder) -> Result<(), OrderFlowError> {
        let key = order.key();
        let mut attempts = 0u32;
        loop {
            attempts += 1;
            match self.gateway.push_order_update(credentials, order).await {
                Ok(PushOutcome::Accepted) => {
                    debug!("🔄️ Booking system accepted {key} as {} (attempt {attempts})", order.status);
                    return Ok(());
                },
                Ok(PushOutcome::Stale) => {
                    info!("🔄️ Booking system no longer knows order {key}. It has expired.");
                    return Err(OrderFlowError::Expired(key));
                },
                Err(GatewayError::Fatal(msg)) => {
                    warn!("🔄️ Booking system rejected the update for {key}. {msg}");
                    return Err(OrderFlowError::GatewayFailure(msg));
                },
                Err(GatewayError::Transient(msg)) => {
                    if self.retry.is_exhausted(attempts) {
                        error!("🔄️ Giving up on pushing {key} after {attempts} attempts. Last error: {msg}");
                        return Err(OrderFlowError::GaveUp { key, attempts });
                    }
                    let delay = self.retry.backoff_for(attempts);
                    warn!("🔄️ Push of {key} failed (attempt {attempts}). Retrying in {delay:?}. {msg}");
                    tokio::time::sleep(delay).await;
                },
            }
        }
    }
}

/// The next state of `order`, as it will be sent to the booking system.
fn build_candidate(
    order: &FullOrder,
    current: &StateRecord,
    target: OrderStatus,
    request: &TransitionRequest,
) -> Result<NewOrder, OrderFlowError> {
    let items = if target == OrderStatus::Canceled {
        current.items.iter().map(NewLineItem::from).collect()
    } else {
        confirmed_items(&order.order.key(), current, request)?
    };
    let o = &order.order;
    Ok(NewOrder {
        shop_id: o.shop_id.clone(),
        order_id: o.order_id.clone(),
        phone: o.phone.clone(),
        created_at: o.created_at,
        shipping_method: o.shipping_method.clone(),
        agent: o.agent.clone(),
        ext_shop_id: o.ext_shop_id.clone(),
        status: target,
        reason: request.reason.clone(),
        time: Utc::now(),
        items,
    })
}

fn confirmed_items(
    key: &OrderKey,
    current: &StateRecord,
    request: &TransitionRequest,
) -> Result<Vec<NewLineItem>, OrderFlowError> {
    let answers = request.items.iter().map(|c| (c.drug_id.as_str(), c)).collect::<HashMap<_, _>>();
    if let Some(unknown) = answers.keys().find(|id| !current.items.iter().any(|i| i.drug_id == **id)) {
        return Err(OrderFlowError::ValidationFailure(format!("drug {unknown} is not part of order {key}")));
    }
    let items = current
        .items
        .iter()
        .filter_map(|item| {
            let answer = answers.get(item.drug_id.as_str()).filter(|c| c.confirmed)?;
            let mut item = NewLineItem::from(item);
            if let Some(q) = answer.quantity {
                item.quantity = q;
            }
            Some(item)
        })
        .collect();
    Ok(items)
}
