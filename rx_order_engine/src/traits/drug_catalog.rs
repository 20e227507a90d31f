use crate::{db_types::DrugInfo, traits::OrderStoreError};

/// Resolves drug ids to the name and link displayed for a line item.
#[allow(async_fn_in_trait)]
pub trait DrugCatalog {
    async fn drug_info(&self, drug_id: &str) -> Result<Option<DrugInfo>, OrderStoreError>;

    async fn upsert_drug(&self, drug_id: &str, info: DrugInfo) -> Result<(), OrderStoreError>;
}
