use crate::{
    domain::{Card, CardId, Column},
    error::{DeckboardError, Result},
    storage::CardStore,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::{
    path::Path,
    str::FromStr,
    sync::{Mutex, MutexGuard},
};

// "column" is a SQLite keyword, hence the quoting throughout.
const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS cards (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    "column" TEXT NOT NULL,
    position INTEGER NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_cards_column ON cards("column");
CREATE INDEX IF NOT EXISTS idx_cards_position ON cards(position);
"#;

/// SQLite-based storage backend for card rows
///
/// A single connection guarded by a mutex; transactions are driven with
/// explicit `BEGIN IMMEDIATE` / `COMMIT` / `ROLLBACK` statements so the
/// engine controls the transaction scope.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Opens (or creates) a database file
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Opens a private in-memory database
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| DeckboardError::StorageError("sqlite connection lock poisoned".to_string()))
    }
}

fn card_from_row(row: &Row<'_>) -> rusqlite::Result<Card> {
    let id: i64 = row.get(0)?;
    let title: String = row.get(1)?;
    let column_raw: String = row.get(2)?;
    let position: u32 = row.get(3)?;
    let created_raw: String = row.get(4)?;
    let updated_raw: String = row.get(5)?;

    let column = Column::from_str(&column_raw).map_err(|err| {
        rusqlite::Error::FromSqlConversionFailure(
            2,
            rusqlite::types::Type::Text,
            err.to_string().into(),
        )
    })?;

    Ok(Card {
        id: CardId::new(id),
        title,
        column,
        position,
        created_at: parse_timestamp(4, &created_raw)?,
        updated_at: parse_timestamp(5, &updated_raw)?,
    })
}

fn parse_timestamp(index: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|timestamp| timestamp.with_timezone(&Utc))
        .map_err(|err| {
            rusqlite::Error::FromSqlConversionFailure(
                index,
                rusqlite::types::Type::Text,
                Box::new(err),
            )
        })
}

#[async_trait]
impl CardStore for SqliteStore {
    async fn initialize(&self) -> Result<()> {
        let conn = self.lock()?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    async fn list_cards(&self, column: Column) -> Result<Vec<Card>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            r#"SELECT id, title, "column", position, created_at, updated_at
               FROM cards WHERE "column" = ?1
               ORDER BY position ASC, id ASC"#,
        )?;
        let cards = stmt
            .query_map(params![column.as_str()], card_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(cards)
    }

    async fn fetch_card(&self, id: CardId) -> Result<Card> {
        let conn = self.lock()?;
        conn.query_row(
            r#"SELECT id, title, "column", position, created_at, updated_at
               FROM cards WHERE id = ?1"#,
            params![id.as_i64()],
            card_from_row,
        )
        .optional()?
        .ok_or(DeckboardError::CardNotFound(id))
    }

    async fn insert_card(&self, title: &str, column: Column) -> Result<Card> {
        let conn = self.lock()?;
        let now = Utc::now();
        conn.execute(
            r#"INSERT INTO cards (title, "column", position, created_at, updated_at)
               VALUES (?1, ?2, 0, ?3, ?3)"#,
            params![title, column.as_str(), now.to_rfc3339()],
        )?;

        Ok(Card {
            id: CardId::new(conn.last_insert_rowid()),
            title: title.to_string(),
            column,
            position: 0,
            created_at: now,
            updated_at: now,
        })
    }

    async fn update_card(&self, card: &Card) -> Result<()> {
        let conn = self.lock()?;
        let affected = conn.execute(
            r#"UPDATE cards
               SET title = ?1, "column" = ?2, position = ?3, updated_at = ?4
               WHERE id = ?5"#,
            params![
                card.title,
                card.column.as_str(),
                card.position,
                card.updated_at.to_rfc3339(),
                card.id.as_i64(),
            ],
        )?;
        if affected == 0 {
            return Err(DeckboardError::CardNotFound(card.id));
        }
        Ok(())
    }

    async fn delete_card(&self, id: CardId) -> Result<()> {
        let conn = self.lock()?;
        let affected = conn.execute("DELETE FROM cards WHERE id = ?1", params![id.as_i64()])?;
        if affected == 0 {
            return Err(DeckboardError::CardNotFound(id));
        }
        Ok(())
    }

    async fn begin(&self) -> Result<()> {
        let conn = self.lock()?;
        conn.execute_batch("BEGIN IMMEDIATE")?;
        Ok(())
    }

    async fn commit(&self) -> Result<()> {
        let conn = self.lock()?;
        conn.execute_batch("COMMIT")?;
        Ok(())
    }

    async fn rollback(&self) -> Result<()> {
        let conn = self.lock()?;
        conn.execute_batch("ROLLBACK")?;
        Ok(())
    }
}
