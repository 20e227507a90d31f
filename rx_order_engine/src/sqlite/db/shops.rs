use log::debug;
use rx_common::{Credentials, Secret};
use sqlx::{sqlite::SqliteRow, Row, SqliteConnection};

use crate::{
    db_types::{NewCorporation, Shop},
    traits::OrderStoreError,
};

pub async fn fetch_logged_in_shops(conn: &mut SqliteConnection) -> Result<Vec<Shop>, OrderStoreError> {
    let rows = sqlx::query("SELECT id, ext_id, corporation_id, logged_in FROM shops WHERE logged_in = TRUE ORDER BY id")
        .fetch_all(&mut *conn)
        .await?;
    rows.iter().map(shop_from_row).collect()
}

pub async fn fetch_shop(shop_id: &str, conn: &mut SqliteConnection) -> Result<Option<Shop>, OrderStoreError> {
    let row = sqlx::query("SELECT id, ext_id, corporation_id, logged_in FROM shops WHERE id = $1")
        .bind(shop_id)
        .fetch_optional(&mut *conn)
        .await?;
    row.as_ref().map(shop_from_row).transpose()
}

pub async fn fetch_corporation_credentials(
    corporation_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<Credentials>, OrderStoreError> {
    let row = sqlx::query("SELECT login, secret FROM corporations WHERE id = $1")
        .bind(corporation_id)
        .fetch_optional(&mut *conn)
        .await?;
    match row {
        Some(row) => {
            let login: String = row.try_get("login")?;
            let secret: String = row.try_get("secret")?;
            Ok(Some(Credentials { login, secret: Secret::new(secret) }))
        },
        None => Ok(None),
    }
}

pub async fn set_logged_in(shop_id: &str, logged_in: bool, conn: &mut SqliteConnection) -> Result<(), OrderStoreError> {
    let result = sqlx::query("UPDATE shops SET logged_in = $1 WHERE id = $2")
        .bind(logged_in)
        .bind(shop_id)
        .execute(&mut *conn)
        .await?;
    if result.rows_affected() == 0 {
        return Err(OrderStoreError::ShopNotFound(shop_id.to_string()));
    }
    debug!("🗃️ Shop {shop_id} logged_in set to {logged_in}");
    Ok(())
}

pub async fn upsert_corporation(corp: &NewCorporation, conn: &mut SqliteConnection) -> Result<(), OrderStoreError> {
    sqlx::query(
        r#"
            INSERT INTO corporations (id, name, login, secret) VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO UPDATE SET
                name = excluded.name,
                login = excluded.login,
                secret = excluded.secret,
                updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(corp.id)
    .bind(&corp.name)
    .bind(&corp.credentials.login)
    .bind(corp.credentials.secret.reveal())
    .execute(&mut *conn)
    .await?;
    debug!("🗃️ Corporation #{} ({}) saved", corp.id, corp.name);
    Ok(())
}

pub async fn upsert_shop(shop: &Shop, conn: &mut SqliteConnection) -> Result<(), OrderStoreError> {
    let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM corporations WHERE id = $1")
        .bind(shop.corporation_id)
        .fetch_optional(&mut *conn)
        .await?;
    if exists.is_none() {
        return Err(OrderStoreError::CorporationNotFound(shop.corporation_id));
    }
    sqlx::query(
        r#"
            INSERT INTO shops (id, ext_id, corporation_id, logged_in) VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO UPDATE SET
                ext_id = excluded.ext_id,
                corporation_id = excluded.corporation_id,
                logged_in = excluded.logged_in
        "#,
    )
    .bind(&shop.id)
    .bind(&shop.ext_id)
    .bind(shop.corporation_id)
    .bind(shop.logged_in)
    .execute(&mut *conn)
    .await?;
    debug!("🗃️ Shop {} saved", shop.id);
    Ok(())
}

fn shop_from_row(row: &SqliteRow) -> Result<Shop, OrderStoreError> {
    Ok(Shop {
        id: row.try_get("id")?,
        ext_id: row.try_get("ext_id")?,
        corporation_id: row.try_get("corporation_id")?,
        logged_in: row.try_get("logged_in")?,
    })
}
