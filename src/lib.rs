//! # Deckboard Core
//!
//! Core domain models and the card ordering engine for Deckboard kanban
//! boards.
//!
//! This crate owns the positional invariant of the board: within every
//! column, card positions form the dense sequence 0..n-1 with no duplicates
//! and no gaps, across create, delete, move and shift operations. It has no
//! dependency on any UI or HTTP layer; persistence goes through the
//! [`CardStore`] gateway trait with in-memory and SQLite backends.

pub mod domain;
pub mod engine;
pub mod error;
pub mod storage;

// Re-export commonly used types
pub use domain::{
    board::{BoardColumn, BoardSnapshot, Column, ColumnDirection},
    card::{Card, CardId, ShiftDirection},
};
pub use engine::OrderingEngine;
pub use error::{DeckboardError, Result};
pub use storage::CardStore;
