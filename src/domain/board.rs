use crate::domain::card::Card;
use crate::error::DeckboardError;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// A stage in the fixed board workflow
///
/// The set of columns and their left-to-right order are domain constants,
/// not configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Column {
    Todo,
    Doing,
    Done,
}

impl Column {
    /// Board columns in domain order, left to right
    pub const ORDER: [Column; 3] = [Column::Todo, Column::Doing, Column::Done];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::Doing => "doing",
            Self::Done => "done",
        }
    }

    const fn index(self) -> usize {
        match self {
            Self::Todo => 0,
            Self::Doing => 1,
            Self::Done => 2,
        }
    }

    /// Returns the adjacent column in the given direction, or `None` at the
    /// board edge
    pub fn neighbor(self, direction: ColumnDirection) -> Option<Column> {
        match direction {
            ColumnDirection::Left => self.index().checked_sub(1).map(|i| Self::ORDER[i]),
            ColumnDirection::Right => Self::ORDER.get(self.index() + 1).copied(),
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Column {
    type Err = DeckboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "todo" => Ok(Column::Todo),
            "doing" => Ok(Column::Doing),
            "done" => Ok(Column::Done),
            _ => Err(DeckboardError::UnknownColumn(s.to_string())),
        }
    }
}

/// Direction for moving a card to an adjacent column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnDirection {
    Left,
    Right,
}

impl FromStr for ColumnDirection {
    type Err = DeckboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "left" => Ok(ColumnDirection::Left),
            "right" => Ok(ColumnDirection::Right),
            _ => Err(DeckboardError::InvalidDirection(s.to_string())),
        }
    }
}

impl fmt::Display for ColumnDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Left => write!(f, "left"),
            Self::Right => write!(f, "right"),
        }
    }
}

/// One column of a board snapshot, cards in position order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardColumn {
    pub column: Column,
    pub cards: Vec<Card>,
}

/// Read-only projection of the whole board, columns in domain order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardSnapshot {
    pub columns: Vec<BoardColumn>,
}

impl BoardSnapshot {
    /// Returns the ordered cards of one column
    pub fn cards_in(&self, column: Column) -> &[Card] {
        self.columns
            .iter()
            .find(|board_column| board_column.column == column)
            .map(|board_column| board_column.cards.as_slice())
            .unwrap_or(&[])
    }
}
