use crate::domain::CardId;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DeckboardError>;

#[derive(Debug, Error)]
pub enum DeckboardError {
    #[error("Card not found: {0}")]
    CardNotFound(CardId),

    #[error("Invalid direction '{0}'")]
    InvalidDirection(String),

    #[error("Unknown column '{0}'. Valid columns: todo, doing, done")]
    UnknownColumn(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[cfg(feature = "sqlite-storage")]
    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),
}
