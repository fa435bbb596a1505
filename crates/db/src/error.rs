//! Error type for repository operations that enforce domain rules inside a
//! transaction (checkout, receiving, refunds, vendor payments).

use shopdesk_core::error::CoreError;

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl DbError {
    pub(crate) fn not_found(entity: &'static str, id: shopdesk_core::types::DbId) -> Self {
        Self::Core(CoreError::NotFound { entity, id })
    }
}
