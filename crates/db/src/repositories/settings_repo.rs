//! Repository for the single-row `store_settings` table.

use sqlx::{PgPool, Postgres};

use crate::models::settings::{StoreSettings, UpdateStoreSettings};

const COLUMNS: &str = "store_name, currency, default_tax_rate, flat_shipping_fee, \
     loyalty_points_per_unit, loyalty_point_value, invoice_due_days, updated_at";

pub struct SettingsRepo;

impl SettingsRepo {
    pub async fn get(pool: &PgPool) -> Result<StoreSettings, sqlx::Error> {
        Self::get_with(pool).await
    }

    /// Read settings through any executor, e.g. inside a sale transaction.
    pub(crate) async fn get_with<'e, E>(executor: E) -> Result<StoreSettings, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = Postgres>,
    {
        let query = format!("SELECT {COLUMNS} FROM store_settings WHERE id = 1");
        sqlx::query_as::<_, StoreSettings>(&query)
            .fetch_one(executor)
            .await
    }

    pub async fn update(
        pool: &PgPool,
        input: &UpdateStoreSettings,
    ) -> Result<StoreSettings, sqlx::Error> {
        let query = format!(
            "UPDATE store_settings SET
                store_name = COALESCE($1, store_name),
                currency = COALESCE($2, currency),
                default_tax_rate = COALESCE($3, default_tax_rate),
                flat_shipping_fee = COALESCE($4, flat_shipping_fee),
                loyalty_points_per_unit = COALESCE($5, loyalty_points_per_unit),
                loyalty_point_value = COALESCE($6, loyalty_point_value),
                invoice_due_days = COALESCE($7, invoice_due_days)
             WHERE id = 1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, StoreSettings>(&query)
            .bind(&input.store_name)
            .bind(&input.currency)
            .bind(input.default_tax_rate)
            .bind(input.flat_shipping_fee)
            .bind(input.loyalty_points_per_unit)
            .bind(input.loyalty_point_value)
            .bind(input.invoice_due_days)
            .fetch_one(pool)
            .await
    }
}
