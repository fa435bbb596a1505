//! Repository for `orders` and `order_items`.
//!
//! A sale touches stock, payments and loyalty points; [`OrderRepo::record_sale`]
//! and [`OrderRepo::refund`] do all of it in one transaction with the product
//! and customer rows locked.

use std::collections::{BTreeMap, HashMap};

use rust_decimal::Decimal;
use shopdesk_core::error::CoreError;
use shopdesk_core::inventory;
use shopdesk_core::loyalty::{self, LoyaltyReason};
use shopdesk_core::money;
use shopdesk_core::numbering::{document_number, SALES_ORDER_PREFIX};
use shopdesk_core::orders::{self, OrderStatus, PricedLine};
use shopdesk_core::payments::{PaymentMethod, PaymentType};
use shopdesk_core::types::DbId;
use sqlx::{FromRow, PgConnection, PgPool};

use crate::error::DbError;
use crate::models::order::{NewSale, Order, OrderDetail, OrderFilter, OrderItem, RefundOrder};
use crate::models::payment::CreatePayment;
use crate::repositories::loyalty_repo::{self, LoyaltyRepo};
use crate::repositories::payment_repo::PaymentRepo;
use crate::repositories::product_repo;
use crate::repositories::settings_repo::SettingsRepo;

const COLUMNS: &str = "id, order_number, customer_id, channel, status, subtotal, discount, tax, \
     shipping_fee, total, points_redeemed, points_earned, shipping_address, notes, created_by, \
     created_at, updated_at";

const ITEM_COLUMNS: &str = "id, order_id, product_id, product_name, sku, unit_price, quantity, \
     line_total, created_at, updated_at";

/// Product fields read under lock while pricing a cart.
#[derive(Debug, FromRow)]
struct StockRow {
    id: DbId,
    sku: String,
    name: String,
    price: Decimal,
    stock_quantity: i32,
    is_active: bool,
}

pub struct OrderRepo;

impl OrderRepo {
    /// Record a paid sale.
    ///
    /// Prices come from the locked product rows, tax and shipping from the
    /// store settings. Stock is decremented, the sale payment written and
    /// loyalty points redeemed and earned before the transaction commits.
    pub async fn record_sale(pool: &PgPool, sale: &NewSale) -> Result<OrderDetail, DbError> {
        orders::validate_cart(&sale.lines)?;
        let mut tx = pool.begin().await?;
        let settings = SettingsRepo::get_with(&mut *tx).await?;

        let product_ids: Vec<DbId> = sale.lines.iter().map(|l| l.product_id).collect();
        let stock: HashMap<DbId, StockRow> = sqlx::query_as::<_, StockRow>(
            "SELECT id, sku, name, price, stock_quantity, is_active FROM products
             WHERE id = ANY($1) AND deleted_at IS NULL
             ORDER BY id
             FOR UPDATE",
        )
        .bind(&product_ids)
        .fetch_all(&mut *tx)
        .await?
        .into_iter()
        .map(|row| (row.id, row))
        .collect();

        let mut priced = Vec::with_capacity(sale.lines.len());
        for line in &sale.lines {
            let product = stock
                .get(&line.product_id)
                .ok_or_else(|| DbError::not_found("Product", line.product_id))?;
            if !product.is_active {
                return Err(CoreError::Validation(format!(
                    "Product '{}' is not available for sale",
                    product.name
                ))
                .into());
            }
            inventory::ensure_in_stock(&product.name, product.stock_quantity, line.quantity)?;
            priced.push(PricedLine {
                product_id: product.id,
                quantity: line.quantity,
                unit_price: product.price,
            });
        }

        let subtotal: Decimal = priced.iter().map(PricedLine::line_total).sum();
        let manual_discount = sale.manual_discount.max(Decimal::ZERO).min(subtotal);

        let balance = match sale.customer_id {
            Some(customer_id) => Some(loyalty_repo::lock_balance(&mut tx, customer_id).await?),
            None => None,
        };
        let redemption = match balance {
            Some(balance) => loyalty::validate_redemption(
                balance,
                sale.points_to_redeem,
                subtotal - manual_discount,
                settings.loyalty_point_value,
            )?,
            None if sale.points_to_redeem > 0 => {
                return Err(CoreError::Validation(
                    "Loyalty points can only be redeemed by a customer".into(),
                )
                .into());
            }
            None => Decimal::ZERO,
        };

        let shipping_fee = if sale.charge_shipping {
            settings.flat_shipping_fee
        } else {
            Decimal::ZERO
        };
        let totals = orders::compute_order_totals(
            &priced,
            manual_discount + redemption,
            settings.default_tax_rate,
            shipping_fee,
        );
        money::validate_document_total(totals.total, "Order total")?;
        let points_redeemed = if balance.is_some() { sale.points_to_redeem } else { 0 };
        let points_earned = if balance.is_some() {
            loyalty::points_earned(totals.taxable(), settings.loyalty_points_per_unit)
        } else {
            0
        };

        let id: DbId =
            sqlx::query_scalar("SELECT nextval(pg_get_serial_sequence('orders', 'id'))")
                .fetch_one(&mut *tx)
                .await?;
        let query = format!(
            "INSERT INTO orders (id, order_number, customer_id, channel, status, subtotal,
                                 discount, tax, shipping_fee, total, points_redeemed,
                                 points_earned, shipping_address, notes, created_by)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
             RETURNING {COLUMNS}"
        );
        let order = sqlx::query_as::<_, Order>(&query)
            .bind(id)
            .bind(document_number(SALES_ORDER_PREFIX, id))
            .bind(sale.customer_id)
            .bind(&sale.channel)
            .bind(&sale.status)
            .bind(totals.subtotal)
            .bind(totals.discount)
            .bind(totals.tax)
            .bind(totals.shipping_fee)
            .bind(totals.total)
            .bind(points_redeemed)
            .bind(points_earned)
            .bind(&sale.shipping_address)
            .bind(&sale.notes)
            .bind(sale.created_by)
            .fetch_one(&mut *tx)
            .await?;

        let item_query = format!(
            "INSERT INTO order_items (order_id, product_id, product_name, sku, unit_price,
                                      quantity, line_total)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {ITEM_COLUMNS}"
        );
        let mut items = Vec::with_capacity(priced.len());
        for line in &priced {
            let product = &stock[&line.product_id];
            let item = sqlx::query_as::<_, OrderItem>(&item_query)
                .bind(id)
                .bind(line.product_id)
                .bind(&product.name)
                .bind(&product.sku)
                .bind(line.unit_price)
                .bind(line.quantity)
                .bind(line.line_total())
                .fetch_one(&mut *tx)
                .await?;
            items.push(item);

            sqlx::query("UPDATE products SET stock_quantity = stock_quantity - $2 WHERE id = $1")
                .bind(line.product_id)
                .bind(line.quantity)
                .execute(&mut *tx)
                .await?;
        }

        // A sale fully covered by points has nothing to collect.
        if totals.total > Decimal::ZERO {
            PaymentRepo::insert(
                &mut tx,
                &CreatePayment {
                    payment_type: PaymentType::Sale.as_str().to_string(),
                    amount: totals.total,
                    method: sale.method.clone(),
                    order_id: Some(id),
                    vendor_id: None,
                    purchase_order_id: None,
                    reference: sale.reference.clone(),
                    notes: None,
                    paid_at: None,
                    created_by: sale.created_by,
                },
            )
            .await?;
        }

        if let (Some(customer_id), Some(balance)) = (sale.customer_id, balance) {
            if points_redeemed > 0 {
                LoyaltyRepo::insert(
                    &mut tx,
                    customer_id,
                    Some(id),
                    -points_redeemed,
                    LoyaltyReason::Redeemed,
                    None,
                    sale.created_by,
                )
                .await?;
            }
            if points_earned > 0 {
                LoyaltyRepo::insert(
                    &mut tx,
                    customer_id,
                    Some(id),
                    points_earned,
                    LoyaltyReason::Earned,
                    None,
                    sale.created_by,
                )
                .await?;
            }
            let new_balance = balance - points_redeemed + points_earned;
            if new_balance != balance {
                loyalty_repo::set_balance(&mut tx, customer_id, new_balance).await?;
            }
        }

        tx.commit().await?;
        tracing::info!(
            order_id = id,
            order_number = %order.order_number,
            total = %order.total,
            "Sale recorded"
        );
        Ok(OrderDetail { order, items })
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Order>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM orders WHERE id = $1");
        sqlx::query_as::<_, Order>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_detail(pool: &PgPool, id: DbId) -> Result<Option<OrderDetail>, sqlx::Error> {
        let Some(order) = Self::find_by_id(pool, id).await? else {
            return Ok(None);
        };
        let query = format!("SELECT {ITEM_COLUMNS} FROM order_items WHERE order_id = $1 ORDER BY id");
        let items = sqlx::query_as::<_, OrderItem>(&query)
            .bind(id)
            .fetch_all(pool)
            .await?;
        Ok(Some(OrderDetail { order, items }))
    }

    /// List orders, newest first.
    pub async fn list(
        pool: &PgPool,
        filter: &OrderFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Order>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM orders
             WHERE ($1::TEXT IS NULL OR status = $1)
               AND ($2::TEXT IS NULL OR channel = $2)
               AND ($3::BIGINT IS NULL OR customer_id = $3)
               AND ($4::TIMESTAMPTZ IS NULL OR created_at >= $4)
               AND ($5::TIMESTAMPTZ IS NULL OR created_at < $5)
             ORDER BY created_at DESC, id DESC
             LIMIT $6 OFFSET $7"
        );
        sqlx::query_as::<_, Order>(&query)
            .bind(&filter.status)
            .bind(&filter.channel)
            .bind(filter.customer_id)
            .bind(filter.from)
            .bind(filter.to)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Move an order along its fulfilment lifecycle.
    pub async fn update_status(
        pool: &PgPool,
        id: DbId,
        to: OrderStatus,
    ) -> Result<Order, DbError> {
        let mut tx = pool.begin().await?;
        let order = set_status(&mut tx, id, to).await?;
        tx.commit().await?;
        Ok(order)
    }

    /// Fully refund an order: restock every line, pay back the total and
    /// reverse the loyalty points the sale moved.
    pub async fn refund(
        pool: &PgPool,
        id: DbId,
        input: &RefundOrder,
        created_by: Option<DbId>,
    ) -> Result<OrderDetail, DbError> {
        let mut tx = pool.begin().await?;
        let order = lock_order(&mut tx, id).await?;
        orders::ensure_refundable(order.status.parse()?)?;

        let query = format!("SELECT {ITEM_COLUMNS} FROM order_items WHERE order_id = $1 ORDER BY id");
        let items = sqlx::query_as::<_, OrderItem>(&query)
            .bind(id)
            .fetch_all(&mut *tx)
            .await?;
        let mut returned: BTreeMap<DbId, i32> = BTreeMap::new();
        for item in &items {
            *returned.entry(item.product_id).or_default() += item.quantity;
        }
        product_repo::restock(&mut tx, &returned).await?;

        if order.total > Decimal::ZERO {
            let method = match &input.method {
                Some(method) => method.parse::<PaymentMethod>()?.as_str().to_string(),
                None => sale_method(&mut tx, id).await?,
            };
            PaymentRepo::insert(
                &mut tx,
                &CreatePayment {
                    payment_type: PaymentType::Refund.as_str().to_string(),
                    amount: -order.total,
                    method,
                    order_id: Some(id),
                    vendor_id: None,
                    purchase_order_id: None,
                    reference: Some(order.order_number.clone()),
                    notes: input.notes.clone(),
                    paid_at: None,
                    created_by,
                },
            )
            .await?;
        }

        if let Some(customer_id) = order.customer_id {
            let delta = loyalty::refund_adjustment(order.points_earned, order.points_redeemed);
            if delta != 0 {
                let balance = loyalty_repo::lock_balance(&mut tx, customer_id).await?;
                let new_balance = loyalty::balance_after_refund(balance, delta);
                if new_balance != balance {
                    LoyaltyRepo::insert(
                        &mut tx,
                        customer_id,
                        Some(id),
                        new_balance - balance,
                        LoyaltyReason::Refund,
                        None,
                        created_by,
                    )
                    .await?;
                    loyalty_repo::set_balance(&mut tx, customer_id, new_balance).await?;
                }
            }
        }

        sqlx::query(
            "UPDATE invoices SET status = 'void'
             WHERE order_id = $1 AND status IN ('draft', 'issued')",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        let query = format!("UPDATE orders SET status = $2 WHERE id = $1 RETURNING {COLUMNS}");
        let order = sqlx::query_as::<_, Order>(&query)
            .bind(id)
            .bind(OrderStatus::Refunded.as_str())
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        tracing::info!(order_id = id, total = %order.total, "Order refunded");
        Ok(OrderDetail { order, items })
    }
}

async fn lock_order(conn: &mut PgConnection, id: DbId) -> Result<Order, DbError> {
    let query = format!("SELECT {COLUMNS} FROM orders WHERE id = $1 FOR UPDATE");
    sqlx::query_as::<_, Order>(&query)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| DbError::not_found("Order", id))
}

/// Lock the order, check the transition and store the new status.
pub(crate) async fn set_status(
    conn: &mut PgConnection,
    id: DbId,
    to: OrderStatus,
) -> Result<Order, DbError> {
    let order = lock_order(conn, id).await?;
    orders::ensure_transition(order.status.parse()?, to)?;
    let query = format!("UPDATE orders SET status = $2 WHERE id = $1 RETURNING {COLUMNS}");
    Ok(sqlx::query_as::<_, Order>(&query)
        .bind(id)
        .bind(to.as_str())
        .fetch_one(&mut *conn)
        .await?)
}

/// Method of the order's original sale payment, `other` when none exists.
async fn sale_method(conn: &mut PgConnection, order_id: DbId) -> Result<String, sqlx::Error> {
    let method: Option<String> = sqlx::query_scalar(
        "SELECT method FROM payments
         WHERE order_id = $1 AND payment_type = 'sale'
         ORDER BY id
         LIMIT 1",
    )
    .bind(order_id)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(method.unwrap_or_else(|| PaymentMethod::Other.as_str().to_string()))
}
