use std::{
    collections::HashMap,
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use log::*;
use rx_common::Credentials;

use crate::{oe_api::errors::OrderFlowError, traits::ShopManagement};

/// Booking-system credentials per corporation, loaded from the store on first use and then kept in memory.
///
/// Nothing expires on its own. If a corporation's credentials change, call [`CredentialCache::invalidate`].
pub struct CredentialCache<B> {
    db: B,
    cache: RwLock<HashMap<i64, Credentials>>,
}

impl<B> CredentialCache<B> {
    pub fn new(db: B) -> Self {
        Self { db, cache: RwLock::new(HashMap::new()) }
    }

    pub fn invalidate(&self, corporation_id: i64) {
        if self.write().remove(&corporation_id).is_some() {
            info!("🔑️ Cached credentials for corporation #{corporation_id} dropped");
        }
    }

    pub fn clear(&self) {
        self.write().clear();
        info!("🔑️ Credential cache cleared");
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<i64, Credentials>> {
        self.cache.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<i64, Credentials>> {
        self.cache.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<B> CredentialCache<B>
where B: ShopManagement
{
    /// The credentials of the corporation that owns `shop_id`.
    pub async fn credentials_for_shop(&self, shop_id: &str) -> Result<Credentials, OrderFlowError> {
        let shop =
            self.db.fetch_shop(shop_id).await?.ok_or_else(|| OrderFlowError::ShopNotFound(shop_id.to_string()))?;
        self.credentials_for_corporation(shop.corporation_id).await
    }

    pub async fn credentials_for_corporation(&self, corporation_id: i64) -> Result<Credentials, OrderFlowError> {
        let cached = self.read().get(&corporation_id).cloned();
        if let Some(creds) = cached {
            return Ok(creds);
        }
        let creds = self
            .db
            .fetch_corporation_credentials(corporation_id)
            .await?
            .ok_or(OrderFlowError::CorporationNotFound(corporation_id))?;
        debug!("🔑️ Loaded credentials for corporation #{corporation_id}");
        self.write().insert(corporation_id, creds.clone());
        Ok(creds)
    }
}
