use common::ProductId;
use thiserror::Error;

/// Errors that can occur when interacting with the ledger store.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// A conditional update observed stored state different from what the
    /// caller expected. Retried by the mutating layer with a fresh read.
    #[error("Conditional update conflict for product {product_id}")]
    Conflict { product_id: ProductId },

    /// The drafted audit entry does not describe the record transition it
    /// was submitted with.
    #[error("Rejected mutation: {0}")]
    RejectedMutation(String),

    /// The stored data violates the schema this crate expects.
    #[error("Corrupt record: {0}")]
    Corrupt(String),

    /// The underlying store is unreachable or failed mid-operation.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl LedgerError {
    /// True for infrastructure faults that abort the in-flight operation
    /// (the caller may retry with backoff; the core never retries these).
    pub fn is_persistence_fault(&self) -> bool {
        matches!(
            self,
            LedgerError::Unavailable(_) | LedgerError::Database(_) | LedgerError::Migration(_)
        )
    }
}

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;
