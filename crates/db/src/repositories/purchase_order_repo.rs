//! Repository for `purchase_orders` and `purchase_order_items`.
//!
//! Every state change locks the purchase order row (`FOR UPDATE`) and checks
//! the lifecycle guards from [`shopdesk_core::purchasing`] inside the same
//! transaction, so concurrent requests cannot skip a transition.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use shopdesk_core::error::CoreError;
use shopdesk_core::numbering::{document_number, PURCHASE_ORDER_PREFIX, RECEIPT_PREFIX};
use shopdesk_core::payments::PaymentType;
use shopdesk_core::purchasing::{self, LineCost, PurchaseOrderStatus, ReceivingLine};
use shopdesk_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::error::DbError;
use crate::models::payment::{CreatePayment, Payment, RecordVendorPayment};
use crate::models::purchase_order::{
    CreatePurchaseOrder, PurchaseOrder, PurchaseOrderDetail, PurchaseOrderFilter,
    PurchaseOrderItem, PurchaseOrderLineInput, UpdatePurchaseOrder,
};
use crate::models::receipt::{ReceiptDetail, ReceiveGoods};
use crate::repositories::payment_repo::PaymentRepo;
use crate::repositories::product_repo;
use crate::repositories::receipt_repo::ReceiptRepo;

const COLUMNS: &str = "id, po_number, vendor_id, status, subtotal, tax_total, shipping_total, \
     total, amount_paid, ordered_at, expected_at, notes, created_by, created_at, updated_at";

const ITEM_COLUMNS: &str = "id, purchase_order_id, product_id, line_no, quantity_ordered, \
     quantity_received, unit_cost, tax_rate, shipping, cost_excl_tax, total_tax, cost_incl_tax, \
     total_price, created_at, updated_at";

pub struct PurchaseOrderRepo;

impl PurchaseOrderRepo {
    /// Create a draft purchase order with its lines and computed totals.
    pub async fn create(
        pool: &PgPool,
        input: &CreatePurchaseOrder,
        created_by: Option<DbId>,
    ) -> Result<PurchaseOrderDetail, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let id: DbId =
            sqlx::query_scalar("SELECT nextval(pg_get_serial_sequence('purchase_orders', 'id'))")
                .fetch_one(&mut *tx)
                .await?;
        let po_number = document_number(PURCHASE_ORDER_PREFIX, id);

        sqlx::query(
            "INSERT INTO purchase_orders (id, po_number, vendor_id, expected_at, notes, created_by)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(id)
        .bind(&po_number)
        .bind(input.vendor_id)
        .bind(input.expected_at)
        .bind(&input.notes)
        .bind(created_by)
        .execute(&mut *tx)
        .await?;

        let items = insert_lines(&mut tx, id, &input.items).await?;
        let order = store_totals(&mut tx, id, &items).await?;

        tx.commit().await?;
        Ok(PurchaseOrderDetail::new(order, items))
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<PurchaseOrder>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM purchase_orders WHERE id = $1");
        sqlx::query_as::<_, PurchaseOrder>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Lines of a purchase order in entry order.
    pub async fn list_items(
        pool: &PgPool,
        purchase_order_id: DbId,
    ) -> Result<Vec<PurchaseOrderItem>, sqlx::Error> {
        let query = format!(
            "SELECT {ITEM_COLUMNS} FROM purchase_order_items
             WHERE purchase_order_id = $1
             ORDER BY line_no ASC"
        );
        sqlx::query_as::<_, PurchaseOrderItem>(&query)
            .bind(purchase_order_id)
            .fetch_all(pool)
            .await
    }

    pub async fn find_detail(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<PurchaseOrderDetail>, sqlx::Error> {
        let Some(order) = Self::find_by_id(pool, id).await? else {
            return Ok(None);
        };
        let items = Self::list_items(pool, id).await?;
        Ok(Some(PurchaseOrderDetail::new(order, items)))
    }

    /// List purchase orders, newest first.
    pub async fn list(
        pool: &PgPool,
        filter: &PurchaseOrderFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PurchaseOrder>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM purchase_orders
             WHERE ($1::TEXT IS NULL OR status = $1)
               AND ($2::BIGINT IS NULL OR vendor_id = $2)
             ORDER BY created_at DESC, id DESC
             LIMIT $3 OFFSET $4"
        );
        sqlx::query_as::<_, PurchaseOrder>(&query)
            .bind(&filter.status)
            .bind(filter.vendor_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Edit a draft. When `items` is given every line is replaced and the
    /// totals recomputed.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdatePurchaseOrder,
    ) -> Result<PurchaseOrderDetail, DbError> {
        let mut tx = pool.begin().await?;
        let status = lock_status(&mut tx, id).await?;
        purchasing::ensure_editable(status)?;

        sqlx::query(
            "UPDATE purchase_orders SET
                vendor_id = COALESCE($2, vendor_id),
                expected_at = COALESCE($3, expected_at),
                notes = COALESCE($4, notes)
             WHERE id = $1",
        )
        .bind(id)
        .bind(input.vendor_id)
        .bind(input.expected_at)
        .bind(&input.notes)
        .execute(&mut *tx)
        .await?;

        let items = match &input.items {
            Some(lines) => {
                sqlx::query("DELETE FROM purchase_order_items WHERE purchase_order_id = $1")
                    .bind(id)
                    .execute(&mut *tx)
                    .await?;
                insert_lines(&mut tx, id, lines).await?
            }
            None => fetch_items(&mut tx, id).await?,
        };
        let order = store_totals(&mut tx, id, &items).await?;

        tx.commit().await?;
        Ok(PurchaseOrderDetail::new(order, items))
    }

    /// Mark a draft as sent to the vendor.
    pub async fn send(pool: &PgPool, id: DbId) -> Result<PurchaseOrder, DbError> {
        let mut tx = pool.begin().await?;
        let status = lock_status(&mut tx, id).await?;
        let items = fetch_items(&mut tx, id).await?;
        purchasing::ensure_can_send(status, items.len())?;

        let order = set_status(&mut tx, id, PurchaseOrderStatus::Sent, true).await?;
        tx.commit().await?;
        Ok(order)
    }

    pub async fn cancel(pool: &PgPool, id: DbId) -> Result<PurchaseOrder, DbError> {
        let mut tx = pool.begin().await?;
        let status = lock_status(&mut tx, id).await?;
        let items = fetch_items(&mut tx, id).await?;
        let receiving: Vec<ReceivingLine> = items.iter().map(PurchaseOrderItem::receiving).collect();
        purchasing::ensure_can_cancel(status, &receiving)?;

        let order = set_status(&mut tx, id, PurchaseOrderStatus::Cancelled, false).await?;
        tx.commit().await?;
        Ok(order)
    }

    /// Delete a draft purchase order and its lines.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<(), DbError> {
        let mut tx = pool.begin().await?;
        let status = lock_status(&mut tx, id).await?;
        purchasing::ensure_deletable(status)?;

        sqlx::query("DELETE FROM purchase_orders WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    /// Receive goods: record a receipt, bump received quantities and stock,
    /// and move the purchase order to `partial` or `received`.
    pub async fn receive(
        pool: &PgPool,
        id: DbId,
        input: &ReceiveGoods,
        received_by: Option<DbId>,
    ) -> Result<ReceiptDetail, DbError> {
        let mut tx = pool.begin().await?;
        let status = lock_status(&mut tx, id).await?;
        purchasing::ensure_can_receive(status)?;

        let query = format!(
            "SELECT {ITEM_COLUMNS} FROM purchase_order_items
             WHERE purchase_order_id = $1
             ORDER BY line_no ASC
             FOR UPDATE"
        );
        let mut items = sqlx::query_as::<_, PurchaseOrderItem>(&query)
            .bind(id)
            .fetch_all(&mut *tx)
            .await?;

        if input.items.is_empty() {
            return Err(CoreError::Validation(
                "Receipt must contain at least one line".into(),
            )
            .into());
        }

        let receipt_id: DbId =
            sqlx::query_scalar("SELECT nextval(pg_get_serial_sequence('receipts', 'id'))")
                .fetch_one(&mut *tx)
                .await?;
        sqlx::query(
            "INSERT INTO receipts (id, receipt_number, purchase_order_id, notes, received_by)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(receipt_id)
        .bind(document_number(RECEIPT_PREFIX, receipt_id))
        .bind(id)
        .bind(&input.notes)
        .bind(received_by)
        .execute(&mut *tx)
        .await?;

        let mut received: BTreeMap<DbId, i32> = BTreeMap::new();
        for line in &input.items {
            let item = items
                .iter_mut()
                .find(|i| i.id == line.purchase_order_item_id)
                .ok_or_else(|| {
                    CoreError::Validation(format!(
                        "Line {} does not belong to this purchase order",
                        line.purchase_order_item_id
                    ))
                })?;
            purchasing::validate_receipt_line(item.receiving(), line.quantity)?;
            item.quantity_received += line.quantity;

            sqlx::query(
                "INSERT INTO receipt_items (receipt_id, purchase_order_item_id, product_id, quantity)
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(receipt_id)
            .bind(item.id)
            .bind(item.product_id)
            .bind(line.quantity)
            .execute(&mut *tx)
            .await?;

            sqlx::query(
                "UPDATE purchase_order_items SET quantity_received = $2 WHERE id = $1",
            )
            .bind(item.id)
            .bind(item.quantity_received)
            .execute(&mut *tx)
            .await?;

            *received.entry(item.product_id).or_default() += line.quantity;
        }
        product_repo::restock(&mut tx, &received).await?;

        let receiving: Vec<ReceivingLine> = items.iter().map(PurchaseOrderItem::receiving).collect();
        let next = purchasing::status_after_receiving(&receiving);
        set_status(&mut tx, id, next, false).await?;

        let detail = ReceiptRepo::fetch_detail(&mut tx, receipt_id).await?;
        tx.commit().await?;
        Ok(detail)
    }

    /// Record a payment to the vendor against the outstanding balance.
    pub async fn record_payment(
        pool: &PgPool,
        id: DbId,
        input: &RecordVendorPayment,
        created_by: Option<DbId>,
    ) -> Result<Payment, DbError> {
        let mut tx = pool.begin().await?;
        let query = format!("SELECT {COLUMNS} FROM purchase_orders WHERE id = $1 FOR UPDATE");
        let order = sqlx::query_as::<_, PurchaseOrder>(&query)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| DbError::not_found("PurchaseOrder", id))?;
        let status = order.status.parse::<PurchaseOrderStatus>()?;
        let outstanding = purchasing::balance(order.total, order.amount_paid);
        purchasing::ensure_can_pay(status, input.amount, outstanding)?;

        let payment = PaymentRepo::insert(
            &mut tx,
            &CreatePayment {
                payment_type: PaymentType::Vendor.as_str().to_string(),
                amount: -input.amount,
                method: input.method.clone(),
                order_id: None,
                vendor_id: Some(order.vendor_id),
                purchase_order_id: Some(id),
                reference: input.reference.clone(),
                notes: input.notes.clone(),
                paid_at: input.paid_at,
                created_by,
            },
        )
        .await?;

        sqlx::query("UPDATE purchase_orders SET amount_paid = amount_paid + $2 WHERE id = $1")
            .bind(id)
            .bind(input.amount)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(payment)
    }

    /// Open purchase orders whose expected delivery date has passed.
    pub async fn list_overdue(
        pool: &PgPool,
        today: NaiveDate,
    ) -> Result<Vec<PurchaseOrder>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM purchase_orders
             WHERE status IN ('sent', 'partial') AND expected_at < $1
             ORDER BY expected_at ASC, id ASC"
        );
        sqlx::query_as::<_, PurchaseOrder>(&query)
            .bind(today)
            .fetch_all(pool)
            .await
    }
}

/// Lock the purchase order row and return its parsed status.
async fn lock_status(conn: &mut PgConnection, id: DbId) -> Result<PurchaseOrderStatus, DbError> {
    let status: Option<String> =
        sqlx::query_scalar("SELECT status FROM purchase_orders WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;
    let status = status.ok_or_else(|| DbError::not_found("PurchaseOrder", id))?;
    Ok(status.parse()?)
}

async fn fetch_items(
    conn: &mut PgConnection,
    id: DbId,
) -> Result<Vec<PurchaseOrderItem>, sqlx::Error> {
    let query = format!(
        "SELECT {ITEM_COLUMNS} FROM purchase_order_items
         WHERE purchase_order_id = $1
         ORDER BY line_no ASC"
    );
    sqlx::query_as::<_, PurchaseOrderItem>(&query)
        .bind(id)
        .fetch_all(&mut *conn)
        .await
}

/// Insert lines with their computed cost breakdown, numbered from 1.
async fn insert_lines(
    conn: &mut PgConnection,
    purchase_order_id: DbId,
    lines: &[PurchaseOrderLineInput],
) -> Result<Vec<PurchaseOrderItem>, sqlx::Error> {
    let query = format!(
        "INSERT INTO purchase_order_items
            (purchase_order_id, product_id, line_no, quantity_ordered, unit_cost, tax_rate,
             shipping, cost_excl_tax, total_tax, cost_incl_tax, total_price)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
         RETURNING {ITEM_COLUMNS}"
    );
    let mut items = Vec::with_capacity(lines.len());
    for (idx, line) in lines.iter().enumerate() {
        let cost = purchasing::compute_line(line.quantity, line.unit_cost, line.tax_rate, line.shipping);
        let item = sqlx::query_as::<_, PurchaseOrderItem>(&query)
            .bind(purchase_order_id)
            .bind(line.product_id)
            .bind(idx as i32 + 1)
            .bind(line.quantity)
            .bind(line.unit_cost)
            .bind(line.tax_rate)
            .bind(cost.shipping())
            .bind(cost.cost_excl_tax)
            .bind(cost.total_tax)
            .bind(cost.cost_incl_tax)
            .bind(cost.total_price)
            .fetch_one(&mut *conn)
            .await?;
        items.push(item);
    }
    Ok(items)
}

/// Recompute the header totals from the stored lines.
async fn store_totals(
    conn: &mut PgConnection,
    id: DbId,
    items: &[PurchaseOrderItem],
) -> Result<PurchaseOrder, sqlx::Error> {
    let costs: Vec<LineCost> = items
        .iter()
        .map(|i| LineCost {
            cost_excl_tax: i.cost_excl_tax,
            total_tax: i.total_tax,
            cost_incl_tax: i.cost_incl_tax,
            total_price: i.total_price,
        })
        .collect();
    let totals = purchasing::compute_totals(&costs);

    let query = format!(
        "UPDATE purchase_orders SET
            subtotal = $2, tax_total = $3, shipping_total = $4, total = $5
         WHERE id = $1
         RETURNING {COLUMNS}"
    );
    sqlx::query_as::<_, PurchaseOrder>(&query)
        .bind(id)
        .bind(totals.subtotal)
        .bind(totals.tax_total)
        .bind(totals.shipping_total)
        .bind(totals.total)
        .fetch_one(&mut *conn)
        .await
}

async fn set_status(
    conn: &mut PgConnection,
    id: DbId,
    status: PurchaseOrderStatus,
    stamp_ordered_at: bool,
) -> Result<PurchaseOrder, sqlx::Error> {
    let query = format!(
        "UPDATE purchase_orders SET
            status = $2,
            ordered_at = CASE WHEN $3 THEN NOW() ELSE ordered_at END
         WHERE id = $1
         RETURNING {COLUMNS}"
    );
    sqlx::query_as::<_, PurchaseOrder>(&query)
        .bind(id)
        .bind(status.as_str())
        .bind(stamp_ordered_at)
        .fetch_one(&mut *conn)
        .await
}
