//! The card ordering engine.
//!
//! Positions within a column always form the dense sequence 0..n-1. Every
//! structural change (create, delete, move) recomputes the whole affected
//! column rather than patching positions incrementally; columns are small
//! and the full rewrite keeps the invariant trivially correct.

use crate::{
    domain::{BoardColumn, BoardSnapshot, Card, CardId, Column, ColumnDirection, ShiftDirection},
    error::{DeckboardError, Result},
    storage::CardStore,
};
use tracing::{debug, warn};

/// Ordering engine over an injected persistence gateway
///
/// Stateless between calls: every operation reads the authoritative order
/// from the gateway, computes the new order and writes it back. Each
/// mutating operation runs inside a single gateway transaction; any failure
/// rolls back all of its writes.
pub struct OrderingEngine<S> {
    store: S,
}

impl<S: CardStore> OrderingEngine<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Lists the cards of one column in display order
    pub async fn list_cards(&self, column: Column) -> Result<Vec<Card>> {
        self.store.list_cards(column).await
    }

    /// Point lookup of a single card
    pub async fn get_card(&self, id: CardId) -> Result<Card> {
        self.store.fetch_card(id).await
    }

    /// Creates a card at the end of `column`
    ///
    /// Title validation (non-empty) is the caller's responsibility.
    pub async fn create_card(&self, title: &str, column: Column) -> Result<Card> {
        self.store.begin().await?;
        match self.create_card_in_tx(title, column).await {
            Ok(card) => {
                self.store.commit().await?;
                debug!(id = %card.id, %column, "created card");
                Ok(card)
            }
            Err(err) => self.abort(err).await,
        }
    }

    /// Updates a card's title; never touches positions
    pub async fn rename_card(&self, id: CardId, title: &str) -> Result<Card> {
        self.store.begin().await?;
        match self.rename_card_in_tx(id, title).await {
            Ok(card) => {
                self.store.commit().await?;
                Ok(card)
            }
            Err(err) => self.abort(err).await,
        }
    }

    /// Deletes a card and closes the gap in its former column
    pub async fn delete_card(&self, id: CardId) -> Result<()> {
        self.store.begin().await?;
        match self.delete_card_in_tx(id).await {
            Ok(column) => {
                self.store.commit().await?;
                debug!(%id, %column, "deleted card");
                Ok(())
            }
            Err(err) => self.abort(err).await,
        }
    }

    /// Moves a card to `target_column` at `target_position`
    ///
    /// An omitted position appends to the end of the target column; an
    /// explicit position is clamped into the valid range.
    pub async fn move_card(
        &self,
        id: CardId,
        target_column: Column,
        target_position: Option<usize>,
    ) -> Result<()> {
        self.store.begin().await?;
        match self.move_card_in_tx(id, target_column, target_position).await {
            Ok(()) => {
                self.store.commit().await?;
                debug!(%id, column = %target_column, "moved card");
                Ok(())
            }
            Err(err) => self.abort(err).await,
        }
    }

    /// Moves a card one step up or down within its column
    ///
    /// Shifting the first card up, or the last card down, is a no-op.
    pub async fn shift_card(&self, id: CardId, direction: ShiftDirection) -> Result<()> {
        self.store.begin().await?;
        match self.shift_card_in_tx(id, direction).await {
            Ok(()) => {
                self.store.commit().await?;
                Ok(())
            }
            Err(err) => self.abort(err).await,
        }
    }

    /// Moves a card to the adjacent column, appended at the end
    ///
    /// At the board edge there is no adjacent column and the call is a
    /// silent no-op.
    pub async fn move_column(&self, id: CardId, direction: ColumnDirection) -> Result<()> {
        self.store.begin().await?;
        match self.move_column_in_tx(id, direction).await {
            Ok(()) => {
                self.store.commit().await?;
                Ok(())
            }
            Err(err) => self.abort(err).await,
        }
    }

    /// Read-only projection of the whole board, columns in domain order
    pub async fn board_snapshot(&self) -> Result<BoardSnapshot> {
        let mut columns = Vec::with_capacity(Column::ORDER.len());
        for column in Column::ORDER {
            columns.push(BoardColumn {
                column,
                cards: self.store.list_cards(column).await?,
            });
        }
        Ok(BoardSnapshot { columns })
    }

    async fn create_card_in_tx(&self, title: &str, column: Column) -> Result<Card> {
        let inserted = self.store.insert_card(title, column).await?;

        let mut cards = self.store.list_cards(column).await?;
        cards.retain(|existing| existing.id != inserted.id);
        cards.push(inserted.clone());
        self.renumber(&mut cards).await?;

        let position = (cards.len() - 1) as u32;
        Ok(Card {
            position,
            ..inserted
        })
    }

    async fn rename_card_in_tx(&self, id: CardId, title: &str) -> Result<Card> {
        let mut card = self.store.fetch_card(id).await?;
        card.set_title(title.to_string());
        self.store.update_card(&card).await?;
        Ok(card)
    }

    async fn delete_card_in_tx(&self, id: CardId) -> Result<Column> {
        let card = self.store.fetch_card(id).await?;
        let column = card.column;

        self.store.delete_card(id).await?;

        let mut remaining = self.store.list_cards(column).await?;
        self.renumber(&mut remaining).await?;
        Ok(column)
    }

    async fn move_card_in_tx(
        &self,
        id: CardId,
        target_column: Column,
        target_position: Option<usize>,
    ) -> Result<()> {
        let mut card = self.store.fetch_card(id).await?;
        let source_column = card.column;

        let mut source_cards = self.store.list_cards(source_column).await?;
        source_cards.retain(|existing| existing.id != id);

        let mut target_cards = if target_column == source_column {
            // Within one column the post-removal list serves as both the
            // source and the target.
            source_cards
        } else {
            self.renumber(&mut source_cards).await?;
            self.store.list_cards(target_column).await?
        };

        let insert_at = target_position
            .unwrap_or(target_cards.len())
            .min(target_cards.len());

        card.set_column(target_column);
        self.store.update_card(&card).await?;
        target_cards.insert(insert_at, card);
        self.renumber(&mut target_cards).await
    }

    async fn shift_card_in_tx(&self, id: CardId, direction: ShiftDirection) -> Result<()> {
        let card = self.store.fetch_card(id).await?;
        let column = card.column;
        let cards = self.store.list_cards(column).await?;

        // Stored position is the fallback if the id is somehow missing from
        // the freshly computed order.
        let current = cards
            .iter()
            .position(|existing| existing.id == id)
            .unwrap_or(card.position as usize);

        let new_index = match direction {
            ShiftDirection::Up => current.saturating_sub(1),
            ShiftDirection::Down => (current + 1).min(cards.len().saturating_sub(1)),
        };
        self.move_card_in_tx(id, column, Some(new_index)).await
    }

    async fn move_column_in_tx(&self, id: CardId, direction: ColumnDirection) -> Result<()> {
        let card = self.store.fetch_card(id).await?;
        match card.column.neighbor(direction) {
            Some(target) => self.move_card_in_tx(id, target, None).await,
            // already at the board edge
            None => Ok(()),
        }
    }

    /// Reassigns dense positions 0..n-1 in the order given, writing only
    /// rows whose stored position changes
    async fn renumber(&self, cards: &mut [Card]) -> Result<()> {
        for (index, card) in cards.iter_mut().enumerate() {
            let position = index as u32;
            if card.position != position {
                card.position = position;
                self.store.update_card(card).await?;
            }
        }
        Ok(())
    }

    async fn abort<T>(&self, err: DeckboardError) -> Result<T> {
        if let Err(rollback_err) = self.store.rollback().await {
            warn!(error = %rollback_err, "rollback failed after aborted operation");
        }
        Err(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory_storage::MemoryStore;

    async fn make_engine() -> OrderingEngine<MemoryStore> {
        let store = MemoryStore::new();
        store.initialize().await.unwrap();
        OrderingEngine::new(store)
    }

    fn titles(cards: &[Card]) -> Vec<&str> {
        cards.iter().map(|card| card.title.as_str()).collect()
    }

    fn positions(cards: &[Card]) -> Vec<u32> {
        cards.iter().map(|card| card.position).collect()
    }

    async fn assert_dense(engine: &OrderingEngine<MemoryStore>, column: Column) {
        let cards = engine.list_cards(column).await.unwrap();
        let expected: Vec<u32> = (0..cards.len() as u32).collect();
        assert_eq!(positions(&cards), expected, "column {column} not dense");
    }

    #[tokio::test]
    async fn test_create_appends_to_end() {
        let engine = make_engine().await;

        let a = engine.create_card("A", Column::Todo).await.unwrap();
        let b = engine.create_card("B", Column::Todo).await.unwrap();
        let c = engine.create_card("C", Column::Todo).await.unwrap();

        assert_eq!(a.position, 0);
        assert_eq!(b.position, 1);
        assert_eq!(c.position, 2);

        let cards = engine.list_cards(Column::Todo).await.unwrap();
        assert_eq!(titles(&cards), vec!["A", "B", "C"]);
        assert_eq!(positions(&cards), vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_create_and_delete_normalizes_positions() {
        let engine = make_engine().await;

        let a = engine.create_card("A", Column::Todo).await.unwrap();
        let b = engine.create_card("B", Column::Todo).await.unwrap();

        let cards = engine.list_cards(Column::Todo).await.unwrap();
        assert_eq!(
            cards.iter().map(|c| c.id).collect::<Vec<_>>(),
            vec![a.id, b.id]
        );
        assert_eq!(positions(&cards), vec![0, 1]);

        engine.delete_card(a.id).await.unwrap();

        let cards = engine.list_cards(Column::Todo).await.unwrap();
        assert_eq!(cards.iter().map(|c| c.id).collect::<Vec<_>>(), vec![b.id]);
        assert_eq!(positions(&cards), vec![0]);
    }

    #[tokio::test]
    async fn test_move_within_column_updates_order() {
        let engine = make_engine().await;

        engine.create_card("A", Column::Todo).await.unwrap();
        engine.create_card("B", Column::Todo).await.unwrap();
        let c = engine.create_card("C", Column::Todo).await.unwrap();

        engine.move_card(c.id, Column::Todo, Some(0)).await.unwrap();

        let cards = engine.list_cards(Column::Todo).await.unwrap();
        assert_eq!(titles(&cards), vec!["C", "A", "B"]);
        assert_eq!(positions(&cards), vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_move_between_columns_normalizes() {
        let engine = make_engine().await;

        let a = engine.create_card("A", Column::Todo).await.unwrap();
        let b = engine.create_card("B", Column::Todo).await.unwrap();
        let c = engine.create_card("C", Column::Doing).await.unwrap();

        engine.move_card(b.id, Column::Doing, Some(0)).await.unwrap();

        let todo = engine.list_cards(Column::Todo).await.unwrap();
        assert_eq!(todo.iter().map(|card| card.id).collect::<Vec<_>>(), vec![a.id]);
        assert_eq!(positions(&todo), vec![0]);

        let doing = engine.list_cards(Column::Doing).await.unwrap();
        assert_eq!(
            doing.iter().map(|card| card.id).collect::<Vec<_>>(),
            vec![b.id, c.id]
        );
        assert_eq!(positions(&doing), vec![0, 1]);
    }

    #[tokio::test]
    async fn test_shift_and_column_move_helpers() {
        let engine = make_engine().await;

        let a = engine.create_card("A", Column::Todo).await.unwrap();
        let b = engine.create_card("B", Column::Todo).await.unwrap();

        engine.shift_card(b.id, ShiftDirection::Up).await.unwrap();
        let cards = engine.list_cards(Column::Todo).await.unwrap();
        assert_eq!(
            cards.iter().map(|card| card.id).collect::<Vec<_>>(),
            vec![b.id, a.id]
        );
        assert_eq!(positions(&cards), vec![0, 1]);

        engine.move_column(b.id, ColumnDirection::Right).await.unwrap();

        let todo = engine.list_cards(Column::Todo).await.unwrap();
        assert_eq!(todo.iter().map(|card| card.id).collect::<Vec<_>>(), vec![a.id]);
        assert_eq!(positions(&todo), vec![0]);

        let doing = engine.list_cards(Column::Doing).await.unwrap();
        assert_eq!(doing.iter().map(|card| card.id).collect::<Vec<_>>(), vec![b.id]);
        assert_eq!(positions(&doing), vec![0]);
    }

    #[tokio::test]
    async fn test_shift_up_on_first_card_is_a_no_op() {
        let engine = make_engine().await;

        let a = engine.create_card("A", Column::Todo).await.unwrap();
        engine.create_card("B", Column::Todo).await.unwrap();

        engine.shift_card(a.id, ShiftDirection::Up).await.unwrap();

        let cards = engine.list_cards(Column::Todo).await.unwrap();
        assert_eq!(titles(&cards), vec!["A", "B"]);
        assert_eq!(positions(&cards), vec![0, 1]);
    }

    #[tokio::test]
    async fn test_shift_down_on_last_card_is_a_no_op() {
        let engine = make_engine().await;

        engine.create_card("A", Column::Todo).await.unwrap();
        let b = engine.create_card("B", Column::Todo).await.unwrap();

        engine.shift_card(b.id, ShiftDirection::Down).await.unwrap();

        let cards = engine.list_cards(Column::Todo).await.unwrap();
        assert_eq!(titles(&cards), vec!["A", "B"]);
        assert_eq!(positions(&cards), vec![0, 1]);
    }

    #[tokio::test]
    async fn test_move_column_at_board_edges_is_a_no_op() {
        let engine = make_engine().await;

        let first = engine.create_card("first", Column::Todo).await.unwrap();
        let last = engine.create_card("last", Column::Done).await.unwrap();

        engine.move_column(first.id, ColumnDirection::Left).await.unwrap();
        engine.move_column(last.id, ColumnDirection::Right).await.unwrap();

        assert_eq!(engine.get_card(first.id).await.unwrap().column, Column::Todo);
        assert_eq!(engine.get_card(last.id).await.unwrap().column, Column::Done);
    }

    #[tokio::test]
    async fn test_move_without_position_appends() {
        let engine = make_engine().await;

        let a = engine.create_card("A", Column::Todo).await.unwrap();
        engine.create_card("B", Column::Doing).await.unwrap();
        engine.create_card("C", Column::Doing).await.unwrap();

        engine.move_card(a.id, Column::Doing, None).await.unwrap();

        let doing = engine.list_cards(Column::Doing).await.unwrap();
        assert_eq!(titles(&doing), vec!["B", "C", "A"]);
        assert_eq!(positions(&doing), vec![0, 1, 2]);
        assert!(engine.list_cards(Column::Todo).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_move_clamps_out_of_range_position() {
        let engine = make_engine().await;

        let a = engine.create_card("A", Column::Todo).await.unwrap();
        engine.create_card("B", Column::Doing).await.unwrap();

        engine.move_card(a.id, Column::Doing, Some(99)).await.unwrap();

        let doing = engine.list_cards(Column::Doing).await.unwrap();
        assert_eq!(titles(&doing), vec!["B", "A"]);
        assert_eq!(positions(&doing), vec![0, 1]);
    }

    #[tokio::test]
    async fn test_move_same_column_default_appends() {
        let engine = make_engine().await;

        let a = engine.create_card("A", Column::Todo).await.unwrap();
        engine.create_card("B", Column::Todo).await.unwrap();

        engine.move_card(a.id, Column::Todo, None).await.unwrap();

        let cards = engine.list_cards(Column::Todo).await.unwrap();
        assert_eq!(titles(&cards), vec!["B", "A"]);
        assert_eq!(positions(&cards), vec![0, 1]);
    }

    #[tokio::test]
    async fn test_missing_card_errors() {
        let engine = make_engine().await;
        let ghost = CardId::new(404);

        assert!(matches!(
            engine.get_card(ghost).await.unwrap_err(),
            DeckboardError::CardNotFound(_)
        ));
        assert!(matches!(
            engine.delete_card(ghost).await.unwrap_err(),
            DeckboardError::CardNotFound(_)
        ));
        assert!(matches!(
            engine.move_card(ghost, Column::Doing, None).await.unwrap_err(),
            DeckboardError::CardNotFound(_)
        ));
        assert!(matches!(
            engine.shift_card(ghost, ShiftDirection::Up).await.unwrap_err(),
            DeckboardError::CardNotFound(_)
        ));
        assert!(matches!(
            engine
                .move_column(ghost, ColumnDirection::Right)
                .await
                .unwrap_err(),
            DeckboardError::CardNotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_failed_operation_leaves_no_open_transaction() {
        let engine = make_engine().await;

        let a = engine.create_card("A", Column::Todo).await.unwrap();
        assert!(engine.delete_card(CardId::new(404)).await.is_err());

        // The failed delete rolled back; the next operation gets a fresh
        // transaction and the board is untouched.
        let b = engine.create_card("B", Column::Todo).await.unwrap();
        let cards = engine.list_cards(Column::Todo).await.unwrap();
        assert_eq!(
            cards.iter().map(|card| card.id).collect::<Vec<_>>(),
            vec![a.id, b.id]
        );
        assert_eq!(positions(&cards), vec![0, 1]);
    }

    #[tokio::test]
    async fn test_delete_middle_card_preserves_relative_order() {
        let engine = make_engine().await;

        let a = engine.create_card("A", Column::Todo).await.unwrap();
        let b = engine.create_card("B", Column::Todo).await.unwrap();
        let c = engine.create_card("C", Column::Todo).await.unwrap();

        engine.delete_card(b.id).await.unwrap();

        let cards = engine.list_cards(Column::Todo).await.unwrap();
        assert_eq!(
            cards.iter().map(|card| card.id).collect::<Vec<_>>(),
            vec![a.id, c.id]
        );
        assert_eq!(positions(&cards), vec![0, 1]);
    }

    #[tokio::test]
    async fn test_create_then_delete_all_leaves_column_empty() {
        let engine = make_engine().await;

        let mut ids = Vec::new();
        for index in 0..5 {
            let card = engine
                .create_card(&format!("card {index}"), Column::Doing)
                .await
                .unwrap();
            ids.push(card.id);
        }

        for id in ids {
            engine.delete_card(id).await.unwrap();
            assert_dense(&engine, Column::Doing).await;
        }

        assert!(engine.list_cards(Column::Doing).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_listing_is_deterministic() {
        let engine = make_engine().await;

        engine.create_card("A", Column::Todo).await.unwrap();
        engine.create_card("B", Column::Todo).await.unwrap();
        engine.create_card("C", Column::Todo).await.unwrap();

        let first = engine.list_cards(Column::Todo).await.unwrap();
        let second = engine.list_cards(Column::Todo).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_positions_stay_dense_across_mixed_operations() {
        let engine = make_engine().await;

        let a = engine.create_card("A", Column::Todo).await.unwrap();
        let b = engine.create_card("B", Column::Todo).await.unwrap();
        let c = engine.create_card("C", Column::Todo).await.unwrap();
        let d = engine.create_card("D", Column::Doing).await.unwrap();

        engine.move_card(c.id, Column::Todo, Some(0)).await.unwrap();
        engine.move_card(a.id, Column::Doing, Some(1)).await.unwrap();
        engine.shift_card(d.id, ShiftDirection::Down).await.unwrap();
        engine.move_column(b.id, ColumnDirection::Right).await.unwrap();
        engine.delete_card(c.id).await.unwrap();
        engine.move_column(a.id, ColumnDirection::Left).await.unwrap();

        for column in Column::ORDER {
            assert_dense(&engine, column).await;
        }
    }

    #[tokio::test]
    async fn test_rename_card_keeps_ordering() {
        let engine = make_engine().await;

        let a = engine.create_card("A", Column::Todo).await.unwrap();
        let b = engine.create_card("B", Column::Todo).await.unwrap();

        let renamed = engine.rename_card(a.id, "A2").await.unwrap();
        assert_eq!(renamed.title, "A2");
        assert_eq!(renamed.position, 0);

        let cards = engine.list_cards(Column::Todo).await.unwrap();
        assert_eq!(titles(&cards), vec!["A2", "B"]);
        assert_eq!(
            cards.iter().map(|card| card.id).collect::<Vec<_>>(),
            vec![a.id, b.id]
        );
    }

    #[tokio::test]
    async fn test_board_snapshot_reflects_latest_state() {
        let engine = make_engine().await;

        let a = engine.create_card("A", Column::Todo).await.unwrap();
        engine.create_card("B", Column::Doing).await.unwrap();

        let snapshot = engine.board_snapshot().await.unwrap();
        let snapshot_columns: Vec<Column> = snapshot
            .columns
            .iter()
            .map(|board_column| board_column.column)
            .collect();
        assert_eq!(snapshot_columns, Column::ORDER.to_vec());
        assert_eq!(snapshot.cards_in(Column::Todo).len(), 1);
        assert_eq!(snapshot.cards_in(Column::Doing).len(), 1);
        assert!(snapshot.cards_in(Column::Done).is_empty());

        engine.move_column(a.id, ColumnDirection::Right).await.unwrap();

        let snapshot = engine.board_snapshot().await.unwrap();
        assert!(snapshot.cards_in(Column::Todo).is_empty());
        assert_eq!(snapshot.cards_in(Column::Doing).len(), 2);
    }
}
