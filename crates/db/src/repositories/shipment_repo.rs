//! Repository for `shipments`.
//!
//! Shipment status drives the order: dispatch (`in_transit`) marks the order
//! shipped and delivery marks it delivered, both in the same transaction.

use shopdesk_core::error::CoreError;
use shopdesk_core::orders::{OrderChannel, OrderStatus};
use shopdesk_core::shipping::{self, ShipmentStatus};
use shopdesk_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::error::DbError;
use crate::models::shipment::{CreateShipment, Shipment, ShipmentFilter};
use crate::repositories::order_repo;

const COLUMNS: &str = "id, order_id, carrier, tracking_number, status, shipped_at, \
     delivered_at, notes, created_by, created_at, updated_at";

pub struct ShipmentRepo;

impl ShipmentRepo {
    /// Create a pending shipment for a paid online order.
    pub async fn create(
        pool: &PgPool,
        input: &CreateShipment,
        created_by: Option<DbId>,
    ) -> Result<Shipment, DbError> {
        shipping::validate_tracking(&input.carrier, input.tracking_number.as_deref())?;
        let mut tx = pool.begin().await?;

        let order: Option<(String, String)> =
            sqlx::query_as("SELECT channel, status FROM orders WHERE id = $1 FOR UPDATE")
                .bind(input.order_id)
                .fetch_optional(&mut *tx)
                .await?;
        let (channel, status) = order.ok_or_else(|| DbError::not_found("Order", input.order_id))?;
        if channel.parse::<OrderChannel>()? != OrderChannel::Online {
            return Err(CoreError::Conflict(
                "Only online orders can be shipped".into(),
            )
            .into());
        }
        if status.parse::<OrderStatus>()? != OrderStatus::Paid {
            return Err(CoreError::Conflict(format!(
                "Cannot ship an order that is {status}"
            ))
            .into());
        }

        let query = format!(
            "INSERT INTO shipments (order_id, carrier, tracking_number, notes, created_by)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        let shipment = sqlx::query_as::<_, Shipment>(&query)
            .bind(input.order_id)
            .bind(input.carrier.trim())
            .bind(&input.tracking_number)
            .bind(&input.notes)
            .bind(created_by)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(shipment)
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Shipment>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM shipments WHERE id = $1");
        sqlx::query_as::<_, Shipment>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(
        pool: &PgPool,
        filter: &ShipmentFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Shipment>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM shipments
             WHERE ($1::TEXT IS NULL OR status = $1)
               AND ($2::BIGINT IS NULL OR order_id = $2)
             ORDER BY created_at DESC, id DESC
             LIMIT $3 OFFSET $4"
        );
        sqlx::query_as::<_, Shipment>(&query)
            .bind(&filter.status)
            .bind(filter.order_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Advance a shipment and carry the order along with it.
    pub async fn update_status(
        pool: &PgPool,
        id: DbId,
        to: ShipmentStatus,
    ) -> Result<Shipment, DbError> {
        let mut tx = pool.begin().await?;
        let (order_id, from) = lock_shipment(&mut tx, id).await?;
        shipping::ensure_transition(from, to)?;

        match to {
            ShipmentStatus::InTransit => {
                order_repo::set_status(&mut tx, order_id, OrderStatus::Shipped).await?;
            }
            ShipmentStatus::Delivered => {
                order_repo::set_status(&mut tx, order_id, OrderStatus::Delivered).await?;
            }
            ShipmentStatus::Pending | ShipmentStatus::Returned => {}
        }

        let query = format!(
            "UPDATE shipments SET
                status = $2,
                shipped_at = CASE WHEN $2 = 'in_transit' THEN NOW() ELSE shipped_at END,
                delivered_at = CASE WHEN $2 = 'delivered' THEN NOW() ELSE delivered_at END
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        let shipment = sqlx::query_as::<_, Shipment>(&query)
            .bind(id)
            .bind(to.as_str())
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        tracing::info!(shipment_id = id, order_id, status = %to, "Shipment status changed");
        Ok(shipment)
    }
}

async fn lock_shipment(
    conn: &mut PgConnection,
    id: DbId,
) -> Result<(DbId, ShipmentStatus), DbError> {
    let row: Option<(DbId, String)> =
        sqlx::query_as("SELECT order_id, status FROM shipments WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;
    let (order_id, status) = row.ok_or_else(|| DbError::not_found("Shipment", id))?;
    Ok((order_id, status.parse()?))
}
