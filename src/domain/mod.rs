pub mod board;
pub mod card;

pub use board::{BoardColumn, BoardSnapshot, Column, ColumnDirection};
pub use card::{Card, CardId, ShiftDirection};
