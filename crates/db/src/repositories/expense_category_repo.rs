//! Repository for the `expense_categories` table.

use shopdesk_core::error::CoreError;
use shopdesk_core::expenses::DEFAULT_COLOR;
use shopdesk_core::types::DbId;
use sqlx::PgPool;

use crate::error::DbError;
use crate::models::expense::{CreateExpenseCategory, ExpenseCategory, UpdateExpenseCategory};

const COLUMNS: &str = "id, name, kind, color, created_at, updated_at";

pub struct ExpenseCategoryRepo;

impl ExpenseCategoryRepo {
    /// Insert a category. Kind defaults to `VARIABLE`, color to the neutral grey.
    pub async fn create(
        pool: &PgPool,
        input: &CreateExpenseCategory,
    ) -> Result<ExpenseCategory, sqlx::Error> {
        let query = format!(
            "INSERT INTO expense_categories (name, kind, color)
             VALUES ($1, COALESCE($2, 'VARIABLE'), COALESCE($3, $4))
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ExpenseCategory>(&query)
            .bind(&input.name)
            .bind(&input.kind)
            .bind(&input.color)
            .bind(DEFAULT_COLOR)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<ExpenseCategory>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM expense_categories WHERE id = $1");
        sqlx::query_as::<_, ExpenseCategory>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(pool: &PgPool) -> Result<Vec<ExpenseCategory>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM expense_categories ORDER BY name ASC");
        sqlx::query_as::<_, ExpenseCategory>(&query)
            .fetch_all(pool)
            .await
    }

    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateExpenseCategory,
    ) -> Result<Option<ExpenseCategory>, sqlx::Error> {
        let query = format!(
            "UPDATE expense_categories SET
                name = COALESCE($2, name),
                kind = COALESCE($3, kind),
                color = COALESCE($4, color)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ExpenseCategory>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.kind)
            .bind(&input.color)
            .fetch_optional(pool)
            .await
    }

    /// Delete a category that no expense uses.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<(), DbError> {
        let in_use: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM expenses WHERE category_id = $1")
                .bind(id)
                .fetch_one(pool)
                .await?;
        if in_use > 0 {
            return Err(CoreError::Conflict(format!(
                "Category is used by {in_use} expense(s)"
            ))
            .into());
        }
        let result = sqlx::query("DELETE FROM expense_categories WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::not_found("ExpenseCategory", id));
        }
        Ok(())
    }
}
