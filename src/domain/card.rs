use crate::error::DeckboardError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use super::board::Column;

/// Unique identifier for a card, assigned by the storage backend at insert time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CardId(i64);

impl CardId {
    pub fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// Returns the raw integer value
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Direction for reordering a card within its column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShiftDirection {
    Up,
    Down,
}

impl FromStr for ShiftDirection {
    type Err = DeckboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "up" => Ok(ShiftDirection::Up),
            "down" => Ok(ShiftDirection::Down),
            _ => Err(DeckboardError::InvalidDirection(s.to_string())),
        }
    }
}

impl fmt::Display for ShiftDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Up => write!(f, "up"),
            Self::Down => write!(f, "down"),
        }
    }
}

/// A unit of work on the board
///
/// `position` is the card's zero-based rank within its column. The ordering
/// engine owns this field exclusively and keeps it dense (0..n-1 per column).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    pub title: String,
    pub column: Column,
    pub position: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Card {
    /// Creates a new card at the provisional position 0
    pub fn new(id: CardId, title: String, column: Column) -> Self {
        let now = Utc::now();
        Self {
            id,
            title,
            column,
            position: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Sets the title
    pub fn set_title(&mut self, title: String) {
        self.title = title;
        self.updated_at = Utc::now();
    }

    /// Sets the owning column
    pub fn set_column(&mut self, column: Column) {
        self.column = column;
        self.updated_at = Utc::now();
    }
}
