use chrono::Utc;
use log::*;
use rx_common::{Credentials, Price};
use sqlx::{migrate::MigrateDatabase, Sqlite};

use crate::{
    db_types::{DrugInfo, NewCorporation, NewLineItem, NewOrder, OrderStatus, Shop},
    traits::{DrugCatalog, ShopManagement},
    SqliteDatabase,
};

pub async fn prepare_test_env(url: &str) {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    debug!("🚀️ Logging initialised");
    create_database(url).await;
    run_migrations(url).await;
}

pub fn random_db_path() -> String {
    let dir = std::env::temp_dir();
    format!("sqlite://{}/rxo_test_{}.db", dir.display(), rand::random::<u64>())
}

pub async fn run_migrations(url: &str) {
    let db = SqliteDatabase::new_with_url(url, 5).await.expect("Error creating connection to database");
    db.run_migrations().await.expect("Error running DB migrations");
    db.close().await;
    info!("🚀️ Migrations complete");
}

pub async fn create_database(url: &str) {
    if let Err(e) = Sqlite::drop_database(url).await {
        trace!("Could not drop database {url}: {e:?}");
    }
    Sqlite::create_database(url).await.expect("Error creating database");
    info!("🚀️ Created Sqlite database {url}");
}

/// Creates a fresh, migrated database and returns a handle to it.
pub async fn fresh_database() -> SqliteDatabase {
    let url = random_db_path();
    prepare_test_env(&url).await;
    SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating connection to database")
}

/// Inserts a corporation (id `corporation_id`, login `corp-{id}`, secret `secret-{id}`) and a shop that belongs to it.
pub async fn seed_shop(db: &SqliteDatabase, shop_id: &str, corporation_id: i64, logged_in: bool) {
    let corp = NewCorporation {
        id: corporation_id,
        name: format!("Corporation {corporation_id}"),
        credentials: Credentials::new(format!("corp-{corporation_id}"), format!("secret-{corporation_id}")),
    };
    db.upsert_corporation(corp).await.expect("Error seeding corporation");
    let shop = Shop { id: shop_id.to_string(), ext_id: format!("ext-{shop_id}"), corporation_id, logged_in };
    db.upsert_shop(shop).await.expect("Error seeding shop");
}

pub async fn seed_drug(db: &SqliteDatabase, drug_id: &str, name: &str) {
    let info = DrugInfo { name: name.to_string(), link: Some(format!("https://drugs.example/{drug_id}")) };
    db.upsert_drug(drug_id, info).await.expect("Error seeding drug");
}

/// A `New` order as it would arrive from a poll, with one line item per `(drug_id, quantity)` pair.
pub fn sample_order(shop_id: &str, order_id: &str, items: &[(&str, i64)]) -> NewOrder {
    NewOrder {
        shop_id: shop_id.to_string(),
        order_id: order_id.to_string(),
        phone: "+70000000000".to_string(),
        created_at: Utc::now().timestamp(),
        shipping_method: "pickup".to_string(),
        agent: "web".to_string(),
        ext_shop_id: format!("ext-{shop_id}"),
        status: OrderStatus::New,
        reason: None,
        time: Utc::now(),
        items: items
            .iter()
            .map(|(drug_id, quantity)| NewLineItem {
                drug_id: drug_id.to_string(),
                ext_drug_id: format!("ext-{drug_id}"),
                quantity: *quantity,
                price: Price::from(1250),
            })
            .collect(),
    }
}
