use chrono::{DateTime, Utc};
use log::{debug, trace};
use rx_common::helpers::matches_id_suffix;
use sqlx::{sqlite::SqliteRow, Row, SqliteConnection};

use crate::{
    db_types::{DrugInfo, FullOrder, LineItem, NewLineItem, NewOrder, Order, OrderKey, OrderState, OrderStatus, StateRecord},
    traits::OrderStoreError,
};

const ORDER_COLUMNS: &str = "id, shop_id, order_id, phone, created_at, shipping_method, agent, ext_shop_id";

/// Returns the order row for `key`, if the order has been seen before.
pub async fn fetch_order_row(key: &OrderKey, conn: &mut SqliteConnection) -> Result<Option<Order>, OrderStoreError> {
    let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE shop_id = $1 AND order_id = $2");
    let row = sqlx::query(&sql).bind(&key.shop_id).bind(&key.order_id).fetch_optional(&mut *conn).await?;
    row.as_ref().map(order_from_row).transpose()
}

/// Inserts the immutable order fields of `order` unless a row for the order already exists. Returns `true` if a row
/// was created.
///
/// Starting a transaction with this write (rather than a read) makes SQLite take the write lock up front, so
/// concurrent ingests wait on each other instead of failing with a stale snapshot.
pub async fn insert_order_if_missing(order: &NewOrder, conn: &mut SqliteConnection) -> Result<bool, OrderStoreError> {
    let result = sqlx::query(
        r#"
            INSERT INTO orders (shop_id, order_id, phone, created_at, shipping_method, agent, ext_shop_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (shop_id, order_id) DO NOTHING;
        "#,
    )
    .bind(&order.shop_id)
    .bind(&order.order_id)
    .bind(&order.phone)
    .bind(order.created_at)
    .bind(&order.shipping_method)
    .bind(&order.agent)
    .bind(&order.ext_shop_id)
    .execute(&mut *conn)
    .await?;
    let inserted = result.rows_affected() > 0;
    if inserted {
        debug!("🗃️ Order {} seen for the first time", order.key());
    }
    Ok(inserted)
}

/// The most recent state of the order, by insertion order.
pub async fn last_state(order_pk: i64, conn: &mut SqliteConnection) -> Result<Option<OrderState>, OrderStoreError> {
    let row = sqlx::query(
        "SELECT id, order_id, shop_id, time, status, reason FROM states WHERE order_id = $1 ORDER BY id DESC LIMIT 1",
    )
    .bind(order_pk)
    .fetch_optional(&mut *conn)
    .await?;
    row.as_ref().map(state_from_row).transpose()
}

pub async fn insert_state(order_pk: i64, order: &NewOrder, conn: &mut SqliteConnection) -> Result<i64, OrderStoreError> {
    let id: i64 = sqlx::query_scalar(
        r#"
            INSERT INTO states (order_id, shop_id, time, status, reason)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id;
        "#,
    )
    .bind(order_pk)
    .bind(&order.shop_id)
    .bind(order.time.timestamp())
    .bind(order.status.to_string())
    .bind(&order.reason)
    .fetch_one(&mut *conn)
    .await?;
    trace!("🗃️ State #{id} ({}) appended to order {}", order.status, order.key());
    Ok(id)
}

pub async fn insert_line_item(
    state_id: i64,
    item: &NewLineItem,
    drug: &DrugInfo,
    conn: &mut SqliteConnection,
) -> Result<i64, OrderStoreError> {
    let id: i64 = sqlx::query_scalar(
        r#"
            INSERT INTO preps_in_order (state_id, drug_id, ext_drug_id, quantity, price, drug_name, drug_link)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id;
        "#,
    )
    .bind(state_id)
    .bind(&item.drug_id)
    .bind(&item.ext_drug_id)
    .bind(item.quantity)
    .bind(item.price)
    .bind(&drug.name)
    .bind(&drug.link)
    .fetch_one(&mut *conn)
    .await?;
    Ok(id)
}

/// Loads every state of the order, oldest first, each with its line items.
pub async fn fetch_history(order: Order, conn: &mut SqliteConnection) -> Result<FullOrder, OrderStoreError> {
    let rows = sqlx::query(
        "SELECT id, order_id, shop_id, time, status, reason FROM states WHERE order_id = $1 ORDER BY id ASC",
    )
    .bind(order.id)
    .fetch_all(&mut *conn)
    .await?;
    let mut history = Vec::with_capacity(rows.len());
    for row in &rows {
        let state = state_from_row(row)?;
        let items = fetch_line_items(state.id, conn).await?;
        history.push(StateRecord { state, items });
    }
    Ok(FullOrder { order, history })
}

pub async fn fetch_line_items(state_id: i64, conn: &mut SqliteConnection) -> Result<Vec<LineItem>, OrderStoreError> {
    let rows = sqlx::query(
        r#"
            SELECT id, state_id, drug_id, ext_drug_id, quantity, price, drug_name, drug_link
            FROM preps_in_order
            WHERE state_id = $1
            ORDER BY id ASC
        "#,
    )
    .bind(state_id)
    .fetch_all(&mut *conn)
    .await?;
    rows.iter().map(line_item_from_row).collect()
}

/// Fetches the order rows (without history) for a shop, ordered by insertion.
pub async fn fetch_orders_for_shop(shop_id: &str, conn: &mut SqliteConnection) -> Result<Vec<Order>, OrderStoreError> {
    let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE shop_id = $1 ORDER BY id ASC");
    let rows = sqlx::query(&sql).bind(shop_id).fetch_all(&mut *conn).await?;
    rows.iter().map(order_from_row).collect()
}

pub async fn search_orders_by_suffix(
    shop_id: &str,
    suffix: &str,
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, OrderStoreError> {
    let orders = fetch_orders_for_shop(shop_id, conn).await?;
    Ok(orders.into_iter().filter(|o| matches_id_suffix(&o.order_id, suffix)).collect())
}

/// Orders with exactly one recorded state, where that state has the given status and is older than `before`.
pub async fn fetch_single_state_orders(
    status: OrderStatus,
    before: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Vec<OrderKey>, OrderStoreError> {
    let rows = sqlx::query(
        r#"
            SELECT o.shop_id, o.order_id
            FROM orders o
            JOIN states s ON s.order_id = o.id
            GROUP BY o.id
            HAVING COUNT(s.id) = 1 AND MAX(s.status) = $1 AND MIN(s.time) < $2
            ORDER BY o.id ASC
        "#,
    )
    .bind(status.to_string())
    .bind(before.timestamp())
    .fetch_all(&mut *conn)
    .await?;
    let keys = rows
        .iter()
        .map(|r| Ok(OrderKey { shop_id: r.try_get("shop_id")?, order_id: r.try_get("order_id")? }))
        .collect::<Result<Vec<_>, sqlx::Error>>()?;
    trace!("🗃️ {} single-state {status} orders older than {before}", keys.len());
    Ok(keys)
}

fn order_from_row(row: &SqliteRow) -> Result<Order, OrderStoreError> {
    Ok(Order {
        id: row.try_get("id")?,
        shop_id: row.try_get("shop_id")?,
        order_id: row.try_get("order_id")?,
        phone: row.try_get("phone")?,
        created_at: row.try_get("created_at")?,
        shipping_method: row.try_get("shipping_method")?,
        agent: row.try_get("agent")?,
        ext_shop_id: row.try_get("ext_shop_id")?,
    })
}

fn state_from_row(row: &SqliteRow) -> Result<OrderState, OrderStoreError> {
    let status = row
        .try_get::<String, _>("status")?
        .parse::<OrderStatus>()
        .map_err(|e| OrderStoreError::InvalidData(e.to_string()))?;
    let secs: i64 = row.try_get("time")?;
    let time = DateTime::<Utc>::from_timestamp(secs, 0)
        .ok_or_else(|| OrderStoreError::InvalidData(format!("State timestamp {secs} is out of range")))?;
    Ok(OrderState {
        id: row.try_get("id")?,
        order_id: row.try_get("order_id")?,
        shop_id: row.try_get("shop_id")?,
        time,
        status,
        reason: row.try_get("reason")?,
    })
}

fn line_item_from_row(row: &SqliteRow) -> Result<LineItem, OrderStoreError> {
    Ok(LineItem {
        id: row.try_get("id")?,
        state_id: row.try_get("state_id")?,
        drug_id: row.try_get("drug_id")?,
        ext_drug_id: row.try_get("ext_drug_id")?,
        quantity: row.try_get("quantity")?,
        price: row.try_get("price")?,
        drug_name: row.try_get("drug_name")?,
        drug_link: row.try_get("drug_link")?,
    })
}
