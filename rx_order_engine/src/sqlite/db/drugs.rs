use sqlx::{Row, SqliteConnection};

use crate::{db_types::DrugInfo, traits::OrderStoreError};

pub async fn fetch_drug(drug_id: &str, conn: &mut SqliteConnection) -> Result<Option<DrugInfo>, OrderStoreError> {
    let row = sqlx::query("SELECT name, link FROM drugs WHERE id = $1").bind(drug_id).fetch_optional(&mut *conn).await?;
    match row {
        Some(row) => Ok(Some(DrugInfo { name: row.try_get("name")?, link: row.try_get("link")? })),
        None => Ok(None),
    }
}

pub async fn upsert_drug(drug_id: &str, info: &DrugInfo, conn: &mut SqliteConnection) -> Result<(), OrderStoreError> {
    sqlx::query(
        r#"
            INSERT INTO drugs (id, name, link) VALUES ($1, $2, $3)
            ON CONFLICT (id) DO UPDATE SET name = excluded.name, link = excluded.link
        "#,
    )
    .bind(drug_id)
    .bind(&info.name)
    .bind(&info.link)
    .execute(&mut *conn)
    .await?;
    Ok(())
}
