use rx_common::Credentials;

use crate::{
    db_types::{NewCorporation, Shop},
    traits::OrderStoreError,
};

/// Shops and the corporations that hold their booking-system credentials.
///
/// Apart from the logged-in flag, shops and corporations are administered elsewhere; the upserts exist for seeding.
#[allow(async_fn_in_trait)]
pub trait ShopManagement {
    /// Every shop that is currently logged in, i.e. whose orders should be polled.
    async fn fetch_logged_in_shops(&self) -> Result<Vec<Shop>, OrderStoreError>;

    async fn fetch_shop(&self, shop_id: &str) -> Result<Option<Shop>, OrderStoreError>;

    async fn fetch_corporation_credentials(&self, corporation_id: i64) -> Result<Option<Credentials>, OrderStoreError>;

    async fn set_logged_in(&self, shop_id: &str, logged_in: bool) -> Result<(), OrderStoreError>;

    async fn upsert_corporation(&self, corporation: NewCorporation) -> Result<(), OrderStoreError>;

    async fn upsert_shop(&self, shop: Shop) -> Result<(), OrderStoreError>;
}
