//! JSON-file-backed remote store

use super::{apply, CardPatch, ListPatch, RemoteResult, RemoteStore};
use crate::error::{BoardError, RemoteError, Result};
use crate::reorder::PositionUpdate;
use crate::types::{Board, BoardId, Card, CardId, List, ListId};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::debug;

/// A store persisting one board as a pretty-printed JSON file.
///
/// Every write is read-modify-write under an async mutex and lands on disk
/// through a temp file and rename.
pub struct JsonFileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    /// Open a store for an existing board file
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if !path.exists() {
            return Err(BoardError::BoardFileMissing { path });
        }
        Ok(Self::at(path))
    }

    /// Create a board file, replacing any existing one
    pub async fn create(path: impl Into<PathBuf>, board: &Board) -> Result<Self> {
        let store = Self::at(path.into());
        store.save(board).await?;
        Ok(store)
    }

    fn at(path: PathBuf) -> Self {
        Self {
            path,
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored board
    pub async fn load(&self) -> RemoteResult<Board> {
        let content = fs::read_to_string(&self.path).await?;
        let board: Board = serde_json::from_str(&content)?;
        Ok(board)
    }

    async fn save(&self, board: &Board) -> RemoteResult<()> {
        let content = serde_json::to_string_pretty(board)?;
        atomic_write(&self.path, content.as_bytes()).await
    }

    async fn write<T>(&self, f: impl FnOnce(&mut Board) -> RemoteResult<T>) -> RemoteResult<T> {
        let _guard = self.write_lock.lock().await;
        let mut board = self.load().await?;
        let value = f(&mut board)?;
        self.save(&board).await?;
        debug!(path = %self.path.display(), "board file written");
        Ok(value)
    }
}

#[async_trait]
impl RemoteStore for JsonFileStore {
    async fn fetch_board(&self, board_id: &BoardId) -> RemoteResult<Board> {
        let board = self.load().await?;
        apply::fetch(&board, board_id)
    }

    async fn create_list(&self, list: &List) -> RemoteResult<List> {
        self.write(|b| apply::create_list(b, list)).await
    }

    async fn update_list(&self, id: &ListId, patch: &ListPatch) -> RemoteResult<()> {
        self.write(|b| apply::update_list(b, id, patch)).await
    }

    async fn delete_list(&self, id: &ListId) -> RemoteResult<()> {
        self.write(|b| apply::delete_list(b, id)).await
    }

    async fn create_card(&self, card: &Card) -> RemoteResult<Card> {
        self.write(|b| apply::create_card(b, card)).await
    }

    async fn update_card(&self, id: &CardId, patch: &CardPatch) -> RemoteResult<()> {
        self.write(|b| apply::update_card(b, id, patch)).await
    }

    async fn delete_card(&self, id: &CardId) -> RemoteResult<()> {
        self.write(|b| apply::delete_card(b, id)).await
    }

    async fn update_list_positions(
        &self,
        board_id: &BoardId,
        updates: &[PositionUpdate<ListId>],
    ) -> RemoteResult<()> {
        self.write(|b| apply::update_list_positions(b, board_id, updates))
            .await
    }

    async fn update_card_positions(
        &self,
        list_id: &ListId,
        updates: &[PositionUpdate<CardId>],
    ) -> RemoteResult<()> {
        self.write(|b| apply::update_card_positions(b, list_id, updates))
            .await
    }
}

/// Write a file atomically via a temp file and rename
async fn atomic_write(path: &Path, content: &[u8]) -> RemoteResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
        }
    }

    let temp_path = path.with_extension("tmp");
    fs::write(&temp_path, content).await?;
    fs::rename(&temp_path, path).await.map_err(RemoteError::from)
}
