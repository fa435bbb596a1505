//! Repository for `receipts` and `receipt_items`.
//!
//! Receipts are written by [`PurchaseOrderRepo::receive`](super::PurchaseOrderRepo::receive);
//! this repository only reads them back.

use shopdesk_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::receipt::{Receipt, ReceiptDetail, ReceiptItem};

const COLUMNS: &str = "id, receipt_number, purchase_order_id, received_at, notes, received_by, \
     created_at, updated_at";

const ITEM_COLUMNS: &str =
    "id, receipt_id, purchase_order_item_id, product_id, quantity, created_at, updated_at";

pub struct ReceiptRepo;

impl ReceiptRepo {
    pub async fn find_detail(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<ReceiptDetail>, sqlx::Error> {
        let mut conn = pool.acquire().await?;
        match Self::fetch_detail(&mut conn, id).await {
            Ok(detail) => Ok(Some(detail)),
            Err(sqlx::Error::RowNotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Load a receipt and its lines on an existing connection or transaction.
    pub(crate) async fn fetch_detail(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<ReceiptDetail, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM receipts WHERE id = $1");
        let receipt = sqlx::query_as::<_, Receipt>(&query)
            .bind(id)
            .fetch_one(&mut *conn)
            .await?;
        let query =
            format!("SELECT {ITEM_COLUMNS} FROM receipt_items WHERE receipt_id = $1 ORDER BY id ASC");
        let items = sqlx::query_as::<_, ReceiptItem>(&query)
            .bind(id)
            .fetch_all(&mut *conn)
            .await?;
        Ok(ReceiptDetail { receipt, items })
    }

    /// List receipts newest first, optionally for one purchase order.
    pub async fn list(
        pool: &PgPool,
        purchase_order_id: Option<DbId>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Receipt>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM receipts
             WHERE ($1::BIGINT IS NULL OR purchase_order_id = $1)
             ORDER BY received_at DESC, id DESC
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, Receipt>(&query)
            .bind(purchase_order_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }
}
