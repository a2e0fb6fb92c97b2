//! In-memory remote store with failure injection

use super::{apply, CardPatch, ListPatch, RemoteResult, RemoteStore};
use crate::error::RemoteError;
use crate::reorder::PositionUpdate;
use crate::types::{Board, BoardId, Card, CardId, List, ListId};
use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;
use tracing::trace;

/// A remote store holding one confirmed board in memory.
///
/// Calls can be made to fail (`fail_next`, `fail_nth`, `set_offline`) or to take time
/// (`with_latency`), which is what the rollback paths are tested against.
/// Failed calls leave the stored board untouched.
pub struct InMemoryStore {
    board: Mutex<Board>,
    faults: Mutex<Faults>,
    calls: Mutex<Vec<String>>,
    latency: Option<Duration>,
}

#[derive(Default)]
struct Faults {
    fail_next: usize,
    fail_nth: Option<usize>,
    offline: bool,
}

impl InMemoryStore {
    /// Create a store whose confirmed state is `board`
    pub fn new(board: Board) -> Self {
        Self {
            board: Mutex::new(board),
            faults: Mutex::new(Faults::default()),
            calls: Mutex::new(Vec::new()),
            latency: None,
        }
    }

    /// Delay every call by `latency`
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Make the next `count` calls fail
    pub fn fail_next(&self, count: usize) {
        lock(&self.faults).fail_next = count;
    }

    /// Let `n - 1` calls through, then fail the `n`th one (counting from 1)
    pub fn fail_nth(&self, n: usize) {
        lock(&self.faults).fail_nth = Some(n.max(1));
    }

    /// Make every call fail until switched back
    pub fn set_offline(&self, offline: bool) {
        lock(&self.faults).offline = offline;
    }

    /// The confirmed board as currently stored
    pub fn snapshot(&self) -> Board {
        lock(&self.board).clone()
    }

    /// Names of the calls received so far, in order
    pub fn calls(&self) -> Vec<String> {
        lock(&self.calls).clone()
    }

    /// Record a call and decide whether it fails
    async fn begin(&self, name: &str) -> RemoteResult<()> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        trace!(call = name, "in-memory store call");
        lock(&self.calls).push(name.to_string());

        let mut faults = lock(&self.faults);
        if faults.offline {
            return Err(RemoteError::unavailable("store is offline"));
        }
        if faults.fail_next > 0 {
            faults.fail_next -= 1;
            return Err(RemoteError::unavailable(format!("injected failure in {}", name)));
        }
        match faults.fail_nth {
            Some(1) => {
                faults.fail_nth = None;
                Err(RemoteError::unavailable(format!("injected failure in {}", name)))
            }
            Some(n) => {
                faults.fail_nth = Some(n - 1);
                Ok(())
            }
            None => Ok(()),
        }
    }

    /// Apply `f` to a copy of the board and keep it only on success
    fn write<T>(&self, f: impl FnOnce(&mut Board) -> RemoteResult<T>) -> RemoteResult<T> {
        let mut board = lock(&self.board);
        let mut draft = board.clone();
        let value = f(&mut draft)?;
        *board = draft;
        Ok(value)
    }
}

/// Lock a mutex, recovering the data if a panicking holder poisoned it
fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl RemoteStore for InMemoryStore {
    async fn fetch_board(&self, board_id: &BoardId) -> RemoteResult<Board> {
        self.begin("fetch_board").await?;
        apply::fetch(&lock(&self.board), board_id)
    }

    async fn create_list(&self, list: &List) -> RemoteResult<List> {
        self.begin("create_list").await?;
        self.write(|b| apply::create_list(b, list))
    }

    async fn update_list(&self, id: &ListId, patch: &ListPatch) -> RemoteResult<()> {
        self.begin("update_list").await?;
        self.write(|b| apply::update_list(b, id, patch))
    }

    async fn delete_list(&self, id: &ListId) -> RemoteResult<()> {
        self.begin("delete_list").await?;
        self.write(|b| apply::delete_list(b, id))
    }

    async fn create_card(&self, card: &Card) -> RemoteResult<Card> {
        self.begin("create_card").await?;
        self.write(|b| apply::create_card(b, card))
    }

    async fn update_card(&self, id: &CardId, patch: &CardPatch) -> RemoteResult<()> {
        self.begin("update_card").await?;
        self.write(|b| apply::update_card(b, id, patch))
    }

    async fn delete_card(&self, id: &CardId) -> RemoteResult<()> {
        self.begin("delete_card").await?;
        self.write(|b| apply::delete_card(b, id))
    }

    async fn update_list_positions(
        &self,
        board_id: &BoardId,
        updates: &[PositionUpdate<ListId>],
    ) -> RemoteResult<()> {
        self.begin("update_list_positions").await?;
        self.write(|b| apply::update_list_positions(b, board_id, updates))
    }

    async fn update_card_positions(
        &self,
        list_id: &ListId,
        updates: &[PositionUpdate<CardId>],
    ) -> RemoteResult<()> {
        self.begin("update_card_positions").await?;
        self.write(|b| apply::update_card_positions(b, list_id, updates))
    }
}
