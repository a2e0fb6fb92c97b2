//! Remote store boundary.
//!
//! The hosted backend is modeled as an opaque async service. Each call either
//! succeeds or fails with a [`RemoteError`]; callers treat every failure the
//! same way. Two reference stores are provided: [`InMemoryStore`] for tests
//! and embedding, and [`JsonFileStore`] for a board persisted on disk.

mod apply;
mod file;
mod memory;

pub use file::JsonFileStore;
pub use memory::InMemoryStore;

use crate::error::RemoteError;
use crate::reorder::PositionUpdate;
use crate::types::{Board, BoardId, Card, CardId, List, ListId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Result type for remote calls
pub type RemoteResult<T> = std::result::Result<T, RemoteError>;

/// CRUD and batch-position operations of the backing store.
///
/// Creates accept an entity that may carry a temporary id and return the
/// entity as stored, with its durable id.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Fetch a board with lists and cards ordered by position
    async fn fetch_board(&self, board_id: &BoardId) -> RemoteResult<Board>;

    async fn create_list(&self, list: &List) -> RemoteResult<List>;

    async fn update_list(&self, id: &ListId, patch: &ListPatch) -> RemoteResult<()>;

    /// Delete a list and every card in it
    async fn delete_list(&self, id: &ListId) -> RemoteResult<()>;

    async fn create_card(&self, card: &Card) -> RemoteResult<Card>;

    async fn update_card(&self, id: &CardId, patch: &CardPatch) -> RemoteResult<()>;

    async fn delete_card(&self, id: &CardId) -> RemoteResult<()>;

    /// Persist the positions of a board's lists in one round trip
    async fn update_list_positions(
        &self,
        board_id: &BoardId,
        updates: &[PositionUpdate<ListId>],
    ) -> RemoteResult<()>;

    /// Persist the positions of a list's cards in one round trip.
    ///
    /// Cards named here that currently live in another list are moved into
    /// `list_id`, which is how cross-list moves are stored.
    async fn update_card_positions(
        &self,
        list_id: &ListId,
        updates: &[PositionUpdate<CardId>],
    ) -> RemoteResult<()>;
}

/// Partial update of a list
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl ListPatch {
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
        }
    }

    pub fn apply(&self, list: &mut List) {
        if let Some(title) = &self.title {
            list.title = title.clone();
        }
    }
}

/// Partial update of a card.
///
/// `description: Some(None)` clears the description.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CardPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
}

impl CardPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = Some(description);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none()
    }

    pub fn apply(&self, card: &mut Card) {
        if let Some(title) = &self.title {
            card.title = title.clone();
        }
        if let Some(description) = &self.description {
            card.description = description.clone();
        }
    }
}
