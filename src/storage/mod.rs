use crate::{
    domain::{Card, CardId, Column},
    error::Result,
};
use async_trait::async_trait;

pub mod memory_storage;

#[cfg(feature = "sqlite-storage")]
pub mod sqlite_storage;

/// Persistence gateway for card rows
///
/// All reads and writes made by one engine operation share a single
/// transaction opened with [`begin`](CardStore::begin) and released by
/// [`commit`](CardStore::commit) or [`rollback`](CardStore::rollback).
#[async_trait]
pub trait CardStore: Send + Sync {
    /// Initializes the storage backend
    async fn initialize(&self) -> Result<()>;

    /// Lists the cards of one column, ordered by (position, id) ascending
    async fn list_cards(&self, column: Column) -> Result<Vec<Card>>;

    /// Loads a card by id
    async fn fetch_card(&self, id: CardId) -> Result<Card>;

    /// Inserts a new card at the provisional position 0 and returns it with
    /// its assigned id
    async fn insert_card(&self, title: &str, column: Column) -> Result<Card>;

    /// Persists a card's title, column and position
    async fn update_card(&self, card: &Card) -> Result<()>;

    /// Deletes a card by id
    async fn delete_card(&self, id: CardId) -> Result<()>;

    /// Opens a transaction; fails if one is already open
    async fn begin(&self) -> Result<()>;

    /// Commits the open transaction
    async fn commit(&self) -> Result<()>;

    /// Rolls back the open transaction
    async fn rollback(&self) -> Result<()>;
}
