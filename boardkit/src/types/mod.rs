//! Core types for boardkit

mod board;
mod ids;

pub use board::{Board, Card, InvariantViolation, List};
pub use ids::{BoardId, CardId, ListId, TEMPORARY_PREFIX};
