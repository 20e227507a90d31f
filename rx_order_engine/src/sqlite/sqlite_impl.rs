//! `SqliteDatabase` is the concrete storage backend for the order engine.
//!
//! It implements [`OrderStore`], [`ShopManagement`] and [`DrugCatalog`] from the [`crate::traits`] module.
use std::fmt::Debug;

use chrono::{DateTime, Utc};
use log::*;
use rx_common::Credentials;
use sqlx::{migrate::MigrateError, SqlitePool};

use super::db::{drugs, new_pool, orders, shops};
use crate::{
    db_types::{DrugInfo, FullOrder, InsertStateResult, NewCorporation, NewOrder, OrderKey, OrderStatus, Shop},
    traits::{DrugCatalog, OrderStore, OrderStoreError, ShopManagement},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl OrderStore for SqliteDatabase {
    async fn record_order_state(
        &self,
        order: &NewOrder,
        drugs: &[DrugInfo],
    ) -> Result<InsertStateResult, OrderStoreError> {
        if drugs.len() != order.items.len() {
            return Err(OrderStoreError::InvalidData(format!(
                "{} line items but {} drug descriptions for order {}",
                order.items.len(),
                drugs.len(),
                order.key()
            )));
        }
        let key = order.key();
        let mut tx = self.pool.begin().await?;
        let is_new = orders::insert_order_if_missing(order, &mut tx).await?;
        let row = orders::fetch_order_row(&key, &mut tx)
            .await?
            .ok_or_else(|| OrderStoreError::DatabaseError(format!("Order {key} vanished mid-transaction")))?;
        let order_pk = row.id;
        if !is_new {
            if let Some(last) = orders::last_state(order_pk, &mut tx).await? {
                if last.status.is_terminal() {
                    debug!("🗃️ Order {key} is already {}. Not recording {}", last.status, order.status);
                    return Err(OrderStoreError::OrderClosed(key, last.status));
                }
            }
        }
        let state_id = orders::insert_state(order_pk, order, &mut tx).await?;
        for (item, drug) in order.items.iter().zip(drugs) {
            orders::insert_line_item(state_id, item, drug, &mut tx).await?;
        }
        tx.commit().await?;
        debug!("🗃️ Order {key} recorded as {} (state #{state_id})", order.status);
        if is_new {
            Ok(InsertStateResult::Inserted { order_id: order_pk, state_id })
        } else {
            Ok(InsertStateResult::Appended { order_id: order_pk, state_id })
        }
    }

    async fn fetch_order(&self, key: &OrderKey) -> Result<Option<FullOrder>, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        match orders::fetch_order_row(key, &mut conn).await? {
            Some(order) => Ok(Some(orders::fetch_history(order, &mut conn).await?)),
            None => Ok(None),
        }
    }

    async fn fetch_orders_for_shop(&self, shop_id: &str) -> Result<Vec<FullOrder>, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        let rows = orders::fetch_orders_for_shop(shop_id, &mut conn).await?;
        let mut result = Vec::with_capacity(rows.len());
        for order in rows {
            result.push(orders::fetch_history(order, &mut conn).await?);
        }
        Ok(result)
    }

    async fn search_orders_by_suffix(&self, shop_id: &str, suffix: &str) -> Result<Vec<FullOrder>, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        let rows = orders::search_orders_by_suffix(shop_id, suffix, &mut conn).await?;
        let mut result = Vec::with_capacity(rows.len());
        for order in rows {
            result.push(orders::fetch_history(order, &mut conn).await?);
        }
        Ok(result)
    }

    async fn fetch_single_state_orders(
        &self,
        status: OrderStatus,
        before: DateTime<Utc>,
    ) -> Result<Vec<OrderKey>, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_single_state_orders(status, before, &mut conn).await
    }
}

impl ShopManagement for SqliteDatabase {
    async fn fetch_logged_in_shops(&self) -> Result<Vec<Shop>, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        shops::fetch_logged_in_shops(&mut conn).await
    }

    async fn fetch_shop(&self, shop_id: &str) -> Result<Option<Shop>, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        shops::fetch_shop(shop_id, &mut conn).await
    }

    async fn fetch_corporation_credentials(&self, corporation_id: i64) -> Result<Option<Credentials>, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        shops::fetch_corporation_credentials(corporation_id, &mut conn).await
    }

    async fn set_logged_in(&self, shop_id: &str, logged_in: bool) -> Result<(), OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        shops::set_logged_in(shop_id, logged_in, &mut conn).await
    }

    async fn upsert_corporation(&self, corporation: NewCorporation) -> Result<(), OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        shops::upsert_corporation(&corporation, &mut conn).await
    }

    async fn upsert_shop(&self, shop: Shop) -> Result<(), OrderStoreError> {
        let mut tx = self.pool.begin().await?;
        shops::upsert_shop(&shop, &mut tx).await?;
        tx.commit().await?;
        Ok(())
    }
}

impl DrugCatalog for SqliteDatabase {
    async fn drug_info(&self, drug_id: &str) -> Result<Option<DrugInfo>, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        drugs::fetch_drug(drug_id, &mut conn).await
    }

    async fn upsert_drug(&self, drug_id: &str, info: DrugInfo) -> Result<(), OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        drugs::upsert_drug(drug_id, &info, &mut conn).await
    }
}

impl SqliteDatabase {
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("🗃️ Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Brings the schema up to date. Safe to call on every startup.
    pub async fn run_migrations(&self) -> Result<(), MigrateError> {
        sqlx::migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
