//! Optimistic kanban board state
//!
//! This crate keeps a locally published board in step with a remote store.
//! Edits show up immediately and are rolled back when the store rejects them.
//!
//! ## Overview
//!
//! - **Optimistic engine** - Apply a pure transform now, persist in the
//!   background, restore the snapshot on failure
//! - **Reorder algorithms** - Total, clamped moves within and across
//!   containers with positions rederived as `0..len`
//! - **Drag controller** - Mouse and touch gestures turned into one set of
//!   reorder/move intents
//! - **Remote stores** - An async store trait with in-memory and JSON-file
//!   implementations
//!
//! ## Basic Usage
//!
//! ```rust,no_run
//! use boardkit::{BoardActions, BoardkitConfig, JsonFileStore};
//! use boardkit::types::BoardId;
//! use std::sync::Arc;
//!
//! # async fn example() -> boardkit::Result<()> {
//! let config = BoardkitConfig::load()?;
//! let store = Arc::new(JsonFileStore::open("board.json")?);
//! let actions = BoardActions::load(store, &BoardId::from("main"), config.engine).await?;
//!
//! let handle = actions.add_list("Backlog");
//! if handle.settled().await.is_rolled_back() {
//!     for note in actions.engine().notifications().active() {
//!         eprintln!("{}", note.message);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod actions;
pub mod config;
pub mod drag;
pub mod engine;
mod error;
pub mod notify;
pub mod remote;
pub mod reorder;
pub mod types;

pub use actions::BoardActions;
pub use config::{BoardkitConfig, DragConfig, EngineConfig};
pub use drag::{DragController, DragEvent, DragIntent, DragItem, DropTarget, DropTargets};
pub use engine::{Mutation, MutationHandle, MutationOutcome, OptimisticEngine};
pub use error::{BoardError, RemoteError, Result};
pub use notify::{Notification, Notifications};
pub use remote::{CardPatch, InMemoryStore, JsonFileStore, ListPatch, RemoteStore};
pub use types::{Board, Card, List};
