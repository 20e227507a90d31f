use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{DrugInfo, InsertStateResult, NewOrder},
    oe_api::order_objects::{IngestOutcome, IngestSummary},
    traits::{DrugCatalog, OrderStore, OrderStoreError},
};

/// Shown for line items whose drug could not be resolved.
pub const UNKNOWN_DRUG_NAME: &str = "Unknown drug";

/// The persistence writer. Every batch of polled orders, and every state produced by a successful transition, is
/// recorded through here.
pub struct IngestApi<B> {
    db: B,
}

impl<B> Debug for IngestApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "IngestApi")
    }
}

impl<B> IngestApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> IngestApi<B>
where B: OrderStore + DrugCatalog
{
    /// Records one new state for each order in the batch.
    ///
    /// Orders are independent of each other: if one is rejected (e.g. because it is already closed), the rest are
    /// still recorded. The outcome of each is reported in the returned summary.
    pub async fn ingest(&self, orders: &[NewOrder]) -> IngestSummary {
        let mut summary = IngestSummary::default();
        for order in orders {
            let outcome = match self.ingest_one(order).await {
                Ok(InsertStateResult::Inserted { .. }) => IngestOutcome::Inserted,
                Ok(InsertStateResult::Appended { .. }) => IngestOutcome::Appended,
                Err(OrderStoreError::OrderClosed(key, status)) => {
                    info!("🗃️ Order {key} is {status} locally. Ignoring incoming {} state", order.status);
                    IngestOutcome::Rejected(format!("order is already {status}"))
                },
                Err(e) => {
                    warn!("🗃️ Could not record order {}: {e}", order.key());
                    IngestOutcome::Rejected(e.to_string())
                },
            };
            summary.push(order.key(), outcome);
        }
        debug!(
            "🗃️ Ingested {} orders: {} new, {} updated, {} rejected",
            orders.len(),
            summary.inserted(),
            summary.appended(),
            summary.rejected()
        );
        summary
    }

    /// Records a single order state atomically: the order row (on first sighting), the state and all its line items.
    pub async fn ingest_one(&self, order: &NewOrder) -> Result<InsertStateResult, OrderStoreError> {
        let mut drugs = Vec::with_capacity(order.items.len());
        for item in &order.items {
            drugs.push(self.resolve_drug(&item.drug_id).await);
        }
        self.db.record_order_state(order, &drugs).await
    }

    async fn resolve_drug(&self, drug_id: &str) -> DrugInfo {
        match self.db.drug_info(drug_id).await {
            Ok(Some(info)) => info,
            Ok(None) => {
                trace!("🗃️ Drug {drug_id} is not in the catalogue");
                unknown_drug()
            },
            Err(e) => {
                warn!("🗃️ Could not look up drug {drug_id}. Using a placeholder name. {e}");
                unknown_drug()
            },
        }
    }
}

fn unknown_drug() -> DrugInfo {
    DrugInfo { name: UNKNOWN_DRUG_NAME.to_string(), link: None }
}
