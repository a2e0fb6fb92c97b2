//! Optimistic mutation engine.
//!
//! The engine owns the published [`Board`] and is its only writer. A mutation
//! is a pure local transform paired with the remote write that makes it
//! durable:
//!
//! 1. the current board is snapshotted and the transform's result is published
//!    synchronously, before `submit` returns;
//! 2. the remote future is spawned on the tokio runtime;
//! 3. on success an optional reconcile step and an optional refetch run;
//!    on failure the snapshot is published again, unchanged, and a
//!    notification is raised. Mutations whose remote side makes several
//!    writes can ask for a refetch after the rollback, since an earlier
//!    write may already have landed.
//!
//! Mutations are not queued. Two overlapping mutations resolve in whatever
//! order their remote calls finish, and the last publish wins.
//!
//! ```rust,no_run
//! use boardkit::{Board, InMemoryStore, OptimisticEngine, reorder};
//! use boardkit::types::ListId;
//! use std::sync::Arc;
//!
//! # async fn example(board: Board) {
//! let store = Arc::new(InMemoryStore::new(board.clone()));
//! let engine = OptimisticEngine::new(board, store);
//!
//! let list = ListId::from("todo");
//! let handle = engine.execute(
//!     move |b| reorder::reorder_lists(b, &list, 1),
//!     async { Ok(()) },
//! );
//! let outcome = handle.settled().await;
//! assert!(outcome.is_committed());
//! # }
//! ```

use crate::config::EngineConfig;
use crate::error::{RemoteError, Result};
use crate::notify::Notifications;
use crate::remote::{RemoteResult, RemoteStore};
use crate::types::{Board, BoardId};
use futures::future::BoxFuture;
use std::future::Future;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, info_span, warn, Instrument};

type Transform = Box<dyn FnOnce(&Board) -> Board>;
type Reconcile<R> = Box<dyn FnOnce(&mut Board, R) + Send>;
type SettleCallback = Box<dyn FnOnce(&MutationOutcome) + Send>;

/// How a mutation ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationOutcome {
    /// The remote write succeeded; `refreshed` tells whether the board was
    /// reloaded from the store afterwards
    Committed { refreshed: bool },
    /// The remote write failed and the pre-mutation board was restored
    RolledBack { error: RemoteError },
    /// The settle task itself died before finishing
    Aborted { reason: String },
}

impl MutationOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, Self::Committed { .. })
    }

    pub fn is_rolled_back(&self) -> bool {
        matches!(self, Self::RolledBack { .. })
    }

    /// The remote error behind a rollback
    pub fn error(&self) -> Option<&RemoteError> {
        match self {
            Self::RolledBack { error } => Some(error),
            _ => None,
        }
    }
}

/// A local transform plus the remote write backing it.
pub struct Mutation<R> {
    label: String,
    transform: Transform,
    remote: BoxFuture<'static, RemoteResult<R>>,
    reconcile: Option<Reconcile<R>>,
    refresh: Option<bool>,
    refresh_on_failure: bool,
    on_settle: Option<SettleCallback>,
}

impl<R: Send + 'static> Mutation<R> {
    /// Create a mutation.
    ///
    /// `label` names the action in logs and in the failure notification
    /// ("Could not {label}: ...").
    pub fn new<T, F>(label: impl Into<String>, transform: T, remote: F) -> Self
    where
        T: FnOnce(&Board) -> Board + 'static,
        F: Future<Output = RemoteResult<R>> + Send + 'static,
    {
        Self {
            label: label.into(),
            transform: Box::new(transform),
            remote: Box::pin(remote),
            reconcile: None,
            refresh: None,
            refresh_on_failure: false,
            on_settle: None,
        }
    }

    /// Fold the remote result into the published board on success,
    /// typically swapping a temporary id for the durable one.
    pub fn reconcile(mut self, f: impl FnOnce(&mut Board, R) + Send + 'static) -> Self {
        self.reconcile = Some(Box::new(f));
        self
    }

    /// Override the engine default for refetching after success
    pub fn refresh(mut self, refresh: bool) -> Self {
        self.refresh = Some(refresh);
        self
    }

    /// Refetch the board after a rollback. For remote futures making more
    /// than one write, where a failure can leave the store partly updated.
    pub fn refresh_on_failure(mut self, refresh: bool) -> Self {
        self.refresh_on_failure = refresh;
        self
    }

    /// Run `f` once the mutation has settled, after the board is final
    pub fn on_settle(mut self, f: impl FnOnce(&MutationOutcome) + Send + 'static) -> Self {
        self.on_settle = Some(Box::new(f));
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

/// Handle to an in-flight mutation.
///
/// Dropping the handle does not cancel the remote write.
pub struct MutationHandle {
    seq: u64,
    task: JoinHandle<MutationOutcome>,
}

impl MutationHandle {
    /// Sequence number of the mutation, increasing per engine
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Wait until the mutation has committed or rolled back
    pub async fn settled(self) -> MutationOutcome {
        match self.task.await {
            Ok(outcome) => outcome,
            Err(e) => MutationOutcome::Aborted {
                reason: e.to_string(),
            },
        }
    }
}

struct EngineInner {
    state: watch::Sender<Board>,
    store: Arc<dyn RemoteStore>,
    notifications: Notifications,
    config: EngineConfig,
    seq: AtomicU64,
    in_flight: AtomicUsize,
}

/// Publishes board state and reconciles it with the remote store.
///
/// Cloning is cheap and shares the same state.
#[derive(Clone)]
pub struct OptimisticEngine {
    inner: Arc<EngineInner>,
}

impl OptimisticEngine {
    /// Create an engine whose confirmed state is `board`
    pub fn new(board: Board, store: Arc<dyn RemoteStore>) -> Self {
        Self::with_config(board, store, EngineConfig::default())
    }

    pub fn with_config(board: Board, store: Arc<dyn RemoteStore>, config: EngineConfig) -> Self {
        let (state, _rx) = watch::channel(board);
        Self {
            inner: Arc::new(EngineInner {
                state,
                store,
                notifications: Notifications::new(config.max_notifications),
                config,
                seq: AtomicU64::new(0),
                in_flight: AtomicUsize::new(0),
            }),
        }
    }

    /// Fetch `board_id` from the store and use it as the confirmed state
    pub async fn load(
        store: Arc<dyn RemoteStore>,
        board_id: &BoardId,
        config: EngineConfig,
    ) -> Result<Self> {
        let board = store.fetch_board(board_id).await?;
        info!(board = %board_id, lists = board.lists.len(), "board loaded");
        Ok(Self::with_config(board.sorted_by_position(), store, config))
    }

    /// Clone of the published board
    pub fn current(&self) -> Board {
        self.inner.state.borrow().clone()
    }

    /// Receiver notified on every publish
    pub fn subscribe(&self) -> watch::Receiver<Board> {
        self.inner.state.subscribe()
    }

    pub fn store(&self) -> Arc<dyn RemoteStore> {
        Arc::clone(&self.inner.store)
    }

    pub fn notifications(&self) -> &Notifications {
        &self.inner.notifications
    }

    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    /// Number of mutations whose remote write has not settled
    pub fn in_flight(&self) -> usize {
        self.inner.in_flight.load(Ordering::SeqCst)
    }

    /// Apply `transform` now and back it with `remote`
    pub fn execute<T, F>(&self, transform: T, remote: F) -> MutationHandle
    where
        T: FnOnce(&Board) -> Board + 'static,
        F: Future<Output = RemoteResult<()>> + Send + 'static,
    {
        self.submit(Mutation::new("update the board", transform, remote))
    }

    /// Apply a mutation's transform now and settle its remote write in the
    /// background.
    ///
    /// Must be called within a tokio runtime.
    pub fn submit<R: Send + 'static>(&self, mutation: Mutation<R>) -> MutationHandle {
        let Mutation {
            label,
            transform,
            remote,
            reconcile,
            refresh,
            refresh_on_failure,
            on_settle,
        } = mutation;

        let seq = self.inner.seq.fetch_add(1, Ordering::SeqCst) + 1;
        let previous = self.current();
        let next = transform(&previous);
        self.inner.state.send_replace(next);
        self.inner.in_flight.fetch_add(1, Ordering::SeqCst);
        debug!(seq, label = %label, "optimistic state published");

        let refresh = refresh.unwrap_or(self.inner.config.refresh_on_success);
        let engine = self.clone();
        let span = info_span!("mutation", seq, label = %label);

        let task = tokio::spawn(
            async move {
                let in_flight = InFlight(&engine.inner.in_flight);
                let outcome = match remote.await {
                    Ok(value) => {
                        if let Some(reconcile) = reconcile {
                            engine
                                .inner
                                .state
                                .send_modify(|board| reconcile(board, value));
                        }
                        let refreshed = refresh && engine.reload().await;
                        info!(refreshed, "mutation committed");
                        MutationOutcome::Committed { refreshed }
                    }
                    Err(error) => {
                        warn!(%error, "remote write failed, rolling back");
                        engine.inner.state.send_replace(previous);
                        if refresh_on_failure {
                            engine.resync().await;
                        }
                        engine
                            .inner
                            .notifications
                            .push(format!("Could not {}: {}", label, error));
                        MutationOutcome::RolledBack { error }
                    }
                };

                drop(in_flight);
                if let Some(callback) = on_settle {
                    callback(&outcome);
                }
                outcome
            }
            .instrument(span),
        );

        MutationHandle { seq, task }
    }

    /// Reload the board from the store and publish it as confirmed state
    pub async fn refresh(&self) -> Result<()> {
        let board_id = self.inner.state.borrow().id.clone();
        let board = self.inner.store.fetch_board(&board_id).await?;
        self.inner.state.send_replace(board.sorted_by_position());
        debug!(board = %board_id, "board refreshed from store");
        Ok(())
    }

    /// Refresh after a rollback. A failed refetch keeps the restored
    /// snapshot.
    async fn resync(&self) {
        if let Err(e) = self.refresh().await {
            warn!(error = %e, "refresh after rollback failed, keeping snapshot");
        }
    }

    /// Refresh after a committed write. A failed refetch keeps the
    /// optimistic board, since the write itself went through.
    async fn reload(&self) -> bool {
        match self.refresh().await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "refresh after commit failed, keeping local state");
                false
            }
        }
    }
}

/// Counts a settle task as in flight until it finishes or unwinds
struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::InMemoryStore;
    use crate::reorder;
    use crate::types::{Card, CardId, List, ListId};
    use std::sync::Mutex;
    use tokio::sync::oneshot;

    fn board() -> Board {
        Board::new("b")
            .with_id("b1")
            .with_list(
                List::new("b1", "A")
                    .with_id("a")
                    .with_card(Card::new("a", "one").with_id("c1")),
            )
            .with_list(List::new("b1", "B").with_id("b"))
    }

    fn engine(board: Board) -> (OptimisticEngine, Arc<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::new(board.clone()));
        (OptimisticEngine::new(board, store.clone()), store)
    }

    fn list_ids(board: &Board) -> Vec<String> {
        board.lists.iter().map(|l| l.id.to_string()).collect()
    }

    #[tokio::test]
    async fn test_transform_is_published_before_remote_runs() {
        let (engine, _store) = engine(board());
        let (tx, rx) = oneshot::channel::<()>();

        let handle = engine.execute(
            |b| reorder::reorder_lists(b, &ListId::from("a"), 1),
            async move {
                let _ = rx.await;
                Ok(())
            },
        );

        assert_eq!(list_ids(&engine.current()), vec!["b", "a"]);
        assert_eq!(engine.in_flight(), 1);

        tx.send(()).unwrap();
        assert_eq!(
            handle.settled().await,
            MutationOutcome::Committed { refreshed: false }
        );
        assert_eq!(list_ids(&engine.current()), vec!["b", "a"]);
        assert_eq!(engine.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_failure_restores_snapshot_and_notifies() {
        let original = board();
        let (engine, _store) = engine(original.clone());

        let handle = engine.submit(Mutation::new(
            "move the list",
            |b: &Board| reorder::reorder_lists(b, &ListId::from("a"), 1),
            async { Err::<(), _>(RemoteError::unavailable("offline")) },
        ));

        let outcome = handle.settled().await;
        assert!(outcome.is_rolled_back());
        assert_eq!(engine.current(), original);

        let notes = engine.notifications().active();
        assert_eq!(notes.len(), 1);
        assert_eq!(
            notes[0].message,
            "Could not move the list: remote store unavailable: offline"
        );
    }

    #[tokio::test]
    async fn test_reconcile_replaces_temporary_id() {
        let (engine, _store) = engine(board());
        let temp = CardId::temporary();
        let temp_for_transform = temp.clone();
        let temp_for_reconcile = temp.clone();

        let mutation = Mutation::new(
            "add a card",
            move |b: &Board| {
                let mut next = b.clone();
                let list = next.find_list_mut(&ListId::from("b")).unwrap();
                list.cards
                    .push(Card::new("b", "new").with_id(temp_for_transform));
                next
            },
            async { Ok(CardId::from("durable")) },
        )
        .reconcile(move |b, durable| {
            if let Some((li, ci)) = b.card_location(&temp_for_reconcile) {
                b.lists[li].cards[ci].id = durable;
            }
        });

        assert!(engine.submit(mutation).settled().await.is_committed());
        let board = engine.current();
        assert!(board.find_card(&temp).is_none());
        assert!(board.find_card(&CardId::from("durable")).is_some());
    }

    #[tokio::test]
    async fn test_refresh_on_success_loads_store_state() {
        let (engine, store) = engine(board());
        store
            .update_list(
                &ListId::from("a"),
                &crate::remote::ListPatch::title("Renamed remotely"),
            )
            .await
            .unwrap();

        let outcome = engine
            .submit(Mutation::new("touch", |b: &Board| b.clone(), async { Ok(()) }).refresh(true))
            .settled()
            .await;

        assert_eq!(outcome, MutationOutcome::Committed { refreshed: true });
        assert_eq!(engine.current().lists[0].title, "Renamed remotely");
    }

    #[tokio::test]
    async fn test_refresh_failure_keeps_optimistic_state() {
        let (engine, store) = engine(board());
        store.set_offline(true);

        let outcome = engine
            .submit(
                Mutation::new(
                    "move the list",
                    |b: &Board| reorder::reorder_lists(b, &ListId::from("a"), 1),
                    async { Ok(()) },
                )
                .refresh(true),
            )
            .settled()
            .await;

        assert_eq!(outcome, MutationOutcome::Committed { refreshed: false });
        assert_eq!(list_ids(&engine.current()), vec!["b", "a"]);
        assert!(engine.notifications().active().is_empty());
    }

    #[tokio::test]
    async fn test_on_settle_runs_after_rollback() {
        let (engine, _store) = engine(board());
        let seen = Arc::new(Mutex::new(None));
        let seen_in_callback = Arc::clone(&seen);
        let observer = engine.clone();

        engine
            .submit(
                Mutation::new(
                    "move",
                    |b: &Board| reorder::reorder_lists(b, &ListId::from("a"), 1),
                    async { Err::<(), _>(RemoteError::rejected("no")) },
                )
                .on_settle(move |outcome| {
                    *seen_in_callback.lock().unwrap() =
                        Some((outcome.clone(), list_ids(&observer.current())));
                }),
            )
            .settled()
            .await;

        let (outcome, ids) = seen.lock().unwrap().clone().unwrap();
        assert!(outcome.is_rolled_back());
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_overlapping_mutations_last_write_wins() {
        let (engine, _store) = engine(board());
        let (fail_tx, fail_rx) = oneshot::channel::<()>();

        // First mutation stays pending and later fails.
        let first = engine.submit(Mutation::new(
            "rename",
            |b: &Board| {
                let mut next = b.clone();
                next.lists[0].title = "first".into();
                next
            },
            async move {
                let _ = fail_rx.await;
                Err::<(), _>(RemoteError::unavailable("late failure"))
            },
        ));
        // Second mutation commits while the first is in flight.
        let second = engine.execute(
            |b| {
                let mut next = b.clone();
                next.lists[1].title = "second".into();
                next
            },
            async { Ok(()) },
        );
        assert!(second.settled().await.is_committed());
        assert_eq!(engine.current().lists[0].title, "first");
        assert_eq!(engine.current().lists[1].title, "second");

        // The late rollback restores the first mutation's snapshot, which
        // predates the second mutation.
        fail_tx.send(()).unwrap();
        assert!(first.settled().await.is_rolled_back());
        assert_eq!(engine.current().lists[0].title, "A");
        assert_eq!(engine.current().lists[1].title, "B");
    }

    #[tokio::test]
    async fn test_subscribers_observe_publish_and_rollback() {
        let (engine, _store) = engine(board());
        let mut rx = engine.subscribe();

        let handle = engine.execute(
            |b| reorder::reorder_lists(b, &ListId::from("a"), 1),
            async { Err(RemoteError::unavailable("down")) },
        );
        assert!(rx.has_changed().unwrap());
        assert_eq!(list_ids(&rx.borrow_and_update()), vec!["b", "a"]);

        handle.settled().await;
        rx.changed().await.unwrap();
        assert_eq!(list_ids(&rx.borrow_and_update()), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_load_sorts_fetched_board() {
        let mut unsorted = board();
        unsorted.lists[0].position = 3;
        let store = Arc::new(InMemoryStore::new(unsorted));
        let engine = OptimisticEngine::load(store, &BoardId::from("b1"), EngineConfig::default())
            .await
            .unwrap();
        assert_eq!(list_ids(&engine.current()), vec!["b", "a"]);
    }

    #[tokio::test]
    async fn test_rollback_refetches_when_asked() {
        let (engine, store) = engine(board());
        store
            .update_list(
                &ListId::from("a"),
                &crate::remote::ListPatch::title("Written before the failure"),
            )
            .await
            .unwrap();

        let outcome = engine
            .submit(
                Mutation::new(
                    "rename",
                    |b: &Board| {
                        let mut next = b.clone();
                        next.lists[0].title = "local".into();
                        next
                    },
                    async { Err::<(), _>(RemoteError::unavailable("second write failed")) },
                )
                .refresh_on_failure(true),
            )
            .settled()
            .await;

        assert!(outcome.is_rolled_back());
        assert_eq!(engine.current(), store.snapshot());
        assert_eq!(engine.current().lists[0].title, "Written before the failure");
        assert_eq!(engine.notifications().active().len(), 1);
    }

    #[tokio::test]
    async fn test_rollback_keeps_snapshot_when_refetch_fails() {
        let original = board();
        let (engine, store) = engine(original.clone());
        store.set_offline(true);

        let outcome = engine
            .submit(
                Mutation::new(
                    "move the list",
                    |b: &Board| reorder::reorder_lists(b, &ListId::from("a"), 1),
                    async { Err::<(), _>(RemoteError::unavailable("down")) },
                )
                .refresh_on_failure(true),
            )
            .settled()
            .await;

        assert!(outcome.is_rolled_back());
        assert_eq!(engine.current(), original);
    }

    #[tokio::test]
    async fn test_panicking_reconcile_still_settles_in_flight() {
        let (engine, _store) = engine(board());

        let outcome = engine
            .submit(
                Mutation::new("add", |b: &Board| b.clone(), async { Ok(()) })
                    .reconcile(|_, ()| panic!("reconcile blew up")),
            )
            .settled()
            .await;

        assert!(matches!(outcome, MutationOutcome::Aborted { .. }));
        assert_eq!(engine.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_sequence_numbers_increase() {
        let (engine, _store) = engine(board());
        let a = engine.execute(|b| b.clone(), async { Ok(()) });
        let b = engine.execute(|b| b.clone(), async { Ok(()) });
        assert!(b.seq() > a.seq());
        a.settled().await;
        b.settled().await;
    }
}
