//! Repository for the `products` table.

use std::collections::BTreeMap;

use shopdesk_core::csv::ProductCsvRow;
use shopdesk_core::inventory;
use shopdesk_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::error::DbError;
use crate::models::customer::UpsertOutcome;
use crate::models::product::{CreateProduct, Product, ProductFilter, UpdateProduct};

pub(crate) const COLUMNS: &str = "id, sku, name, description, category, price, cost, \
     stock_quantity, reorder_level, is_active, created_at, updated_at";

pub struct ProductRepo;

impl ProductRepo {
    pub async fn create(pool: &PgPool, input: &CreateProduct) -> Result<Product, sqlx::Error> {
        let query = format!(
            "INSERT INTO products
                (sku, name, description, category, price, cost, stock_quantity, reorder_level, is_active)
             VALUES ($1, $2, $3, $4, $5, COALESCE($6, 0), COALESCE($7, 0), COALESCE($8, 0), COALESCE($9, true))
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Product>(&query)
            .bind(&input.sku)
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.category)
            .bind(input.price)
            .bind(input.cost)
            .bind(input.stock_quantity)
            .bind(input.reorder_level)
            .bind(input.is_active)
            .fetch_one(pool)
            .await
    }

    /// Find a product by ID. Excludes soft-deleted rows.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Product>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM products WHERE id = $1 AND deleted_at IS NULL");
        sqlx::query_as::<_, Product>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a product that is visible on the storefront.
    pub async fn find_active(pool: &PgPool, id: DbId) -> Result<Option<Product>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM products
             WHERE id = $1 AND deleted_at IS NULL AND is_active = true"
        );
        sqlx::query_as::<_, Product>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(
        pool: &PgPool,
        filter: &ProductFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Product>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM products
             WHERE deleted_at IS NULL
               AND ($1::TEXT IS NULL OR name ILIKE '%' || $1 || '%' OR sku ILIKE '%' || $1 || '%')
               AND ($2::TEXT IS NULL OR category = $2)
               AND ($3 = false OR is_active = true)
             ORDER BY name ASC, id ASC
             LIMIT $4 OFFSET $5"
        );
        sqlx::query_as::<_, Product>(&query)
            .bind(&filter.search)
            .bind(&filter.category)
            .bind(filter.active_only)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Every live product, for CSV export.
    pub async fn list_all(pool: &PgPool) -> Result<Vec<Product>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM products WHERE deleted_at IS NULL ORDER BY id ASC");
        sqlx::query_as::<_, Product>(&query).fetch_all(pool).await
    }

    /// Active products at or below their reorder level, emptiest first.
    pub async fn list_low_stock(pool: &PgPool) -> Result<Vec<Product>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM products
             WHERE deleted_at IS NULL AND is_active = true
               AND stock_quantity <= reorder_level
             ORDER BY stock_quantity ASC, name ASC"
        );
        sqlx::query_as::<_, Product>(&query).fetch_all(pool).await
    }

    /// Distinct categories of active products, alphabetically.
    pub async fn list_categories(pool: &PgPool) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT category FROM products
             WHERE deleted_at IS NULL AND is_active = true AND category IS NOT NULL
             ORDER BY category ASC",
        )
        .fetch_all(pool)
        .await
    }

    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateProduct,
    ) -> Result<Option<Product>, sqlx::Error> {
        let query = format!(
            "UPDATE products SET
                sku = COALESCE($2, sku),
                name = COALESCE($3, name),
                description = COALESCE($4, description),
                category = COALESCE($5, category),
                price = COALESCE($6, price),
                cost = COALESCE($7, cost),
                reorder_level = COALESCE($8, reorder_level),
                is_active = COALESCE($9, is_active)
             WHERE id = $1 AND deleted_at IS NULL
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Product>(&query)
            .bind(id)
            .bind(&input.sku)
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.category)
            .bind(input.price)
            .bind(input.cost)
            .bind(input.reorder_level)
            .bind(input.is_active)
            .fetch_optional(pool)
            .await
    }

    pub async fn soft_delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE products SET deleted_at = NOW(), is_active = false
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Apply a manual stock adjustment under a row lock.
    pub async fn adjust_stock(pool: &PgPool, id: DbId, delta: i32) -> Result<Product, DbError> {
        let mut tx = pool.begin().await?;

        let current: Option<i32> = sqlx::query_scalar(
            "SELECT stock_quantity FROM products
             WHERE id = $1 AND deleted_at IS NULL
             FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
        let current = current.ok_or_else(|| DbError::not_found("Product", id))?;
        let new_quantity = inventory::validate_stock_adjustment(current, delta)?;

        let query = format!(
            "UPDATE products SET stock_quantity = $2 WHERE id = $1 RETURNING {COLUMNS}"
        );
        let product = sqlx::query_as::<_, Product>(&query)
            .bind(id)
            .bind(new_quantity)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(product)
    }

    /// Insert or update imported rows by SKU in one transaction.
    ///
    /// Opening stock is applied only to new products.
    pub async fn upsert_many(
        pool: &PgPool,
        rows: &[ProductCsvRow],
    ) -> Result<Vec<UpsertOutcome>, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let mut outcomes = Vec::with_capacity(rows.len());

        for row in rows {
            // xmax = 0 only for freshly inserted tuples.
            let inserted: bool = sqlx::query_scalar(
                "INSERT INTO products
                    (sku, name, description, category, price, cost, stock_quantity, reorder_level)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                 ON CONFLICT (sku) DO UPDATE SET
                    name = EXCLUDED.name,
                    description = COALESCE(EXCLUDED.description, products.description),
                    category = COALESCE(EXCLUDED.category, products.category),
                    price = EXCLUDED.price,
                    cost = EXCLUDED.cost,
                    reorder_level = EXCLUDED.reorder_level,
                    deleted_at = NULL
                 RETURNING (xmax = 0)",
            )
            .bind(&row.sku)
            .bind(&row.name)
            .bind(&row.description)
            .bind(&row.category)
            .bind(row.price)
            .bind(row.cost)
            .bind(row.stock_quantity)
            .bind(row.reorder_level)
            .fetch_one(&mut *tx)
            .await?;
            outcomes.push(if inserted {
                UpsertOutcome::Created
            } else {
                UpsertOutcome::Updated
            });
        }

        tx.commit().await?;
        Ok(outcomes)
    }
}

/// Add quantities to stock, one update per product in ascending id order.
///
/// Every transaction that touches several product rows takes their locks in
/// id order, so concurrent sales, receipts and refunds cannot deadlock.
pub(crate) async fn restock(
    conn: &mut PgConnection,
    quantities: &BTreeMap<DbId, i32>,
) -> Result<(), sqlx::Error> {
    for (&product_id, &quantity) in quantities {
        sqlx::query("UPDATE products SET stock_quantity = stock_quantity + $2 WHERE id = $1")
            .bind(product_id)
            .bind(quantity)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}
