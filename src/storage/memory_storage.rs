use crate::{
    domain::{Card, CardId, Column},
    error::{DeckboardError, Result},
    storage::CardStore,
};
use async_trait::async_trait;
use std::sync::{Mutex, MutexGuard};

/// In-memory storage backend
///
/// Backs unit tests and embedders that do not need durability. A transaction
/// snapshots the rows on `begin` and restores the snapshot on `rollback`.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

struct Inner {
    rows: Vec<Card>,
    next_id: i64,
    snapshot: Option<(Vec<Card>, i64)>,
}

impl Default for Inner {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            next_id: 1,
            snapshot: None,
        }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| DeckboardError::StorageError("memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl CardStore for MemoryStore {
    async fn initialize(&self) -> Result<()> {
        Ok(())
    }

    async fn list_cards(&self, column: Column) -> Result<Vec<Card>> {
        let inner = self.lock()?;
        let mut cards: Vec<Card> = inner
            .rows
            .iter()
            .filter(|card| card.column == column)
            .cloned()
            .collect();
        cards.sort_by_key(|card| (card.position, card.id));
        Ok(cards)
    }

    async fn fetch_card(&self, id: CardId) -> Result<Card> {
        let inner = self.lock()?;
        inner
            .rows
            .iter()
            .find(|card| card.id == id)
            .cloned()
            .ok_or(DeckboardError::CardNotFound(id))
    }

    async fn insert_card(&self, title: &str, column: Column) -> Result<Card> {
        let mut inner = self.lock()?;
        let id = CardId::new(inner.next_id);
        inner.next_id += 1;

        let card = Card::new(id, title.to_string(), column);
        inner.rows.push(card.clone());
        Ok(card)
    }

    async fn update_card(&self, card: &Card) -> Result<()> {
        let mut inner = self.lock()?;
        let row = inner
            .rows
            .iter_mut()
            .find(|row| row.id == card.id)
            .ok_or(DeckboardError::CardNotFound(card.id))?;
        *row = card.clone();
        Ok(())
    }

    async fn delete_card(&self, id: CardId) -> Result<()> {
        let mut inner = self.lock()?;
        let index = inner
            .rows
            .iter()
            .position(|card| card.id == id)
            .ok_or(DeckboardError::CardNotFound(id))?;
        inner.rows.remove(index);
        Ok(())
    }

    async fn begin(&self) -> Result<()> {
        let mut inner = self.lock()?;
        if inner.snapshot.is_some() {
            return Err(DeckboardError::StorageError(
                "transaction already open".to_string(),
            ));
        }
        inner.snapshot = Some((inner.rows.clone(), inner.next_id));
        Ok(())
    }

    async fn commit(&self) -> Result<()> {
        let mut inner = self.lock()?;
        if inner.snapshot.take().is_none() {
            return Err(DeckboardError::StorageError(
                "no open transaction to commit".to_string(),
            ));
        }
        Ok(())
    }

    async fn rollback(&self) -> Result<()> {
        let mut inner = self.lock()?;
        let (rows, next_id) = inner.snapshot.take().ok_or_else(|| {
            DeckboardError::StorageError("no open transaction to roll back".to_string())
        })?;
        inner.rows = rows;
        inner.next_id = next_id;
        Ok(())
    }
}
