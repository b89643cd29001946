//! PostgreSQL repository.

use async_trait::async_trait;
use basket_engine::{
    CartLine, ColorSnapshot, LineDisplay, LineId, LineKey, ProductSnapshot, Quantity,
    RemoteCartLine, StorageSnapshot, Timestamp,
};
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};

use super::{CartRepository, CatalogProduct, Quote};
use crate::error::{AppError, Result};

const LINE_COLUMNS: &str = r#"
    id, product_id, color_id, storage_id, quantity, unit_price,
    product_name, product_image, product_tagline, color_name, storage_label,
    added_at
"#;

/// A stored cart line row from the database.
#[derive(Debug)]
pub struct StoredLine {
    pub id: i64,
    pub product_id: String,
    pub color_id: Option<i32>,
    pub storage_id: Option<i32>,
    pub quantity: i64,
    pub unit_price: f64,
    pub product_name: Option<String>,
    pub product_image: Option<String>,
    pub product_tagline: Option<String>,
    pub color_name: Option<String>,
    pub storage_label: Option<String>,
    pub added_at: DateTime<Utc>,
}

impl<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> for StoredLine {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> std::result::Result<Self, sqlx::Error> {
        Ok(StoredLine {
            id: row.try_get("id")?,
            product_id: row.try_get("product_id")?,
            color_id: row.try_get("color_id")?,
            storage_id: row.try_get("storage_id")?,
            quantity: row.try_get("quantity")?,
            unit_price: row.try_get("unit_price")?,
            product_name: row.try_get("product_name")?,
            product_image: row.try_get("product_image")?,
            product_tagline: row.try_get("product_tagline")?,
            color_name: row.try_get("color_name")?,
            storage_label: row.try_get("storage_label")?,
            added_at: row.try_get("added_at")?,
        })
    }
}

impl StoredLine {
    /// Convert a database row to a wire line.
    pub fn to_remote_line(&self) -> Result<RemoteCartLine> {
        let quantity = Quantity::try_from(self.quantity).map_err(|_| {
            AppError::Internal(format!("line {} has quantity {}", self.id, self.quantity))
        })?;
        let added_at = u64::try_from(self.added_at.timestamp_millis()).unwrap_or(0);

        Ok(RemoteCartLine::new(
            self.id,
            CartLine::new(
                LineKey::new(self.product_id.clone(), self.color_id, self.storage_id),
                quantity,
                self.unit_price,
                added_at,
                LineDisplay {
                    product_name: self.product_name.clone(),
                    product_image: self.product_image.clone(),
                    product_tagline: self.product_tagline.clone(),
                    color_name: self.color_name.clone(),
                    storage_label: self.storage_label.clone(),
                },
            ),
        ))
    }
}

/// Cart storage backed by PostgreSQL.
#[derive(Clone)]
pub struct PgCartRepository {
    pool: PgPool,
}

impl PgCartRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn timestamp(millis: Timestamp) -> DateTime<Utc> {
    i64::try_from(millis)
        .ok()
        .and_then(DateTime::from_timestamp_millis)
        .unwrap_or_else(Utc::now)
}

#[async_trait]
impl CartRepository for PgCartRepository {
    async fn find_product(&self, product_id: &str) -> Result<Option<CatalogProduct>> {
        let Some(row) = sqlx::query("SELECT name, image, tagline, price FROM products WHERE id = $1")
            .bind(product_id)
            .fetch_optional(&self.pool)
            .await?
        else {
            return Ok(None);
        };

        let mut snapshot = ProductSnapshot::new(
            row.try_get::<String, _>("name")?,
            row.try_get::<f64, _>("price")?,
        );
        snapshot.image = row.try_get("image")?;
        snapshot.tagline = row.try_get("tagline")?;
        let mut product = CatalogProduct::new(product_id, snapshot);

        let colors = sqlx::query(
            "SELECT id, name, price_adjustment FROM product_colors WHERE product_id = $1 ORDER BY id",
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;
        for row in colors {
            product.colors.push((
                row.try_get("id")?,
                ColorSnapshot {
                    name: row.try_get("name")?,
                    price_adjustment: row.try_get("price_adjustment")?,
                },
            ));
        }

        let storage = sqlx::query(
            "SELECT id, label, price FROM product_storage WHERE product_id = $1 ORDER BY id",
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;
        for row in storage {
            product.storage.push((
                row.try_get("id")?,
                StorageSnapshot {
                    label: row.try_get("label")?,
                    price: row.try_get("price")?,
                },
            ));
        }

        Ok(Some(product))
    }

    async fn list_lines(&self, owner: &str) -> Result<Vec<RemoteCartLine>> {
        let rows: Vec<StoredLine> = sqlx::query_as(&format!(
            "SELECT {LINE_COLUMNS} FROM cart_lines WHERE owner = $1 ORDER BY added_at, id"
        ))
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(StoredLine::to_remote_line).collect()
    }

    async fn add_line(
        &self,
        owner: &str,
        key: &LineKey,
        quantity: Quantity,
        quote: &Quote,
        added_at: Timestamp,
    ) -> Result<RemoteCartLine> {
        let row: StoredLine = sqlx::query_as(&format!(
            r#"
            INSERT INTO cart_lines (
                owner, product_id, color_id, storage_id, quantity, unit_price,
                product_name, product_image, product_tagline, color_name, storage_label,
                added_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ON CONFLICT (owner, product_id, (COALESCE(color_id, -1)), (COALESCE(storage_id, -1)))
            DO UPDATE SET quantity = cart_lines.quantity + EXCLUDED.quantity
            RETURNING {LINE_COLUMNS}
            "#
        ))
        .bind(owner)
        .bind(&key.product_id)
        .bind(key.color_id)
        .bind(key.storage_id)
        .bind(i64::from(quantity))
        .bind(quote.unit_price)
        .bind(&quote.display.product_name)
        .bind(&quote.display.product_image)
        .bind(&quote.display.product_tagline)
        .bind(&quote.display.color_name)
        .bind(&quote.display.storage_label)
        .bind(timestamp(added_at))
        .fetch_one(&self.pool)
        .await?;

        row.to_remote_line()
    }

    async fn update_quantity(&self, owner: &str, id: LineId, quantity: Quantity) -> Result<bool> {
        let result = sqlx::query("UPDATE cart_lines SET quantity = $3 WHERE owner = $1 AND id = $2")
            .bind(owner)
            .bind(id)
            .bind(i64::from(quantity))
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn remove_line(&self, owner: &str, id: LineId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM cart_lines WHERE owner = $1 AND id = $2")
            .bind(owner)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn clear(&self, owner: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM cart_lines WHERE owner = $1")
            .bind(owner)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
