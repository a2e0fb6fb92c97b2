//! Command handlers. Each one loads the board through the optimistic
//! engine, applies one change and waits for it to settle.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use boardkit::types::{BoardId, CardId, ListId};
use boardkit::{
    Board, BoardActions, BoardkitConfig, CardPatch, InMemoryStore, JsonFileStore,
    MutationHandle, MutationOutcome,
};
use tracing::info;

use crate::cli::Commands;
use crate::replay::{dropped_intent, replay, RecordedEvent};
use crate::table::board_table;

/// Options shared by every command
#[derive(Debug, Clone, Default)]
pub struct Options {
    pub board: PathBuf,
    pub config: Option<PathBuf>,
    pub simulate_failure: bool,
}

impl Options {
    pub fn new(board: impl Into<PathBuf>) -> Self {
        Self {
            board: board.into(),
            ..Self::default()
        }
    }
}

/// Run one command against the board file named in `options`
pub async fn run(command: Commands, options: &Options) -> Result<()> {
    let config = match &options.config {
        Some(path) => BoardkitConfig::load_from(path),
        None => BoardkitConfig::load(),
    }
    .context("loading configuration")?;

    if let Commands::Init { title, id, force } = &command {
        return init(&options.board, title, id, *force).await;
    }

    let actions = open(options, &config).await?;
    match command {
        Commands::Init { .. } => Ok(()),
        Commands::Show { json } => {
            show(&actions.current(), json)?;
            Ok(())
        }
        Commands::AddList { title } => settle(actions.add_list(title), &actions).await,
        Commands::RenameList { list, title } => {
            settle(actions.rename_list(&ListId::from(list), title)?, &actions).await
        }
        Commands::RemoveList { list } => {
            settle(actions.delete_list(&ListId::from(list))?, &actions).await
        }
        Commands::MoveList { list, to } => {
            settle(actions.reorder_lists(&ListId::from(list), to)?, &actions).await
        }
        Commands::AddCard {
            list,
            title,
            description,
        } => {
            let handle = actions.add_card(&ListId::from(list), title, description)?;
            settle(handle, &actions).await
        }
        Commands::EditCard {
            card,
            title,
            description,
            clear_description,
        } => {
            let patch = card_patch(title, description, clear_description);
            if patch.is_empty() {
                bail!("nothing to change: pass --title, --description or --clear-description");
            }
            settle(actions.update_card(&CardId::from(card), patch)?, &actions).await
        }
        Commands::RemoveCard { card } => {
            settle(actions.delete_card(&CardId::from(card))?, &actions).await
        }
        Commands::MoveCard { card, list, index } => {
            let handle = actions.move_card(&CardId::from(card), &ListId::from(list), index)?;
            settle(handle, &actions).await
        }
        Commands::Replay { events } => {
            let content = tokio::fs::read_to_string(&events)
                .await
                .with_context(|| format!("reading {}", events.display()))?;
            let recorded: Vec<RecordedEvent> = serde_json::from_str(&content)
                .with_context(|| format!("parsing {}", events.display()))?;

            let emitted = replay(&actions.current(), config.drag.clone(), &recorded);
            match dropped_intent(&emitted) {
                Some(intent) => {
                    info!(?intent, "replay produced a drop");
                    settle(actions.apply_intent(&intent)?, &actions).await
                }
                None => {
                    println!("No drop: the gesture ended without a new target");
                    Ok(())
                }
            }
        }
    }
}

async fn init(path: &Path, title: &str, id: &str, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to replace it)", path.display());
    }
    let board = Board::new(title).with_id(id);
    JsonFileStore::create(path, &board).await?;
    println!("Created board '{}' at {}", title, path.display());
    Ok(())
}

async fn open(options: &Options, config: &BoardkitConfig) -> Result<BoardActions> {
    let path = &options.board;
    let store = JsonFileStore::open(path)?;
    let board = store
        .load()
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    let board_id: BoardId = board.id.clone();

    if options.simulate_failure {
        let memory = Arc::new(InMemoryStore::new(board));
        let actions = BoardActions::load(memory.clone(), &board_id, config.engine.clone()).await?;
        memory.fail_next(1);
        return Ok(actions);
    }

    let actions = BoardActions::load(Arc::new(store), &board_id, config.engine.clone()).await?;
    Ok(actions)
}

fn show(board: &Board, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(board)?);
    } else {
        println!("{}", board.title);
        println!("{}", board_table(board));
    }
    Ok(())
}

fn card_patch(
    title: Option<String>,
    description: Option<String>,
    clear_description: bool,
) -> CardPatch {
    let mut patch = CardPatch::new();
    if let Some(title) = title {
        patch = patch.with_title(title);
    }
    if clear_description {
        patch = patch.with_description(None);
    } else if let Some(description) = description {
        patch = patch.with_description(Some(description));
    }
    patch
}

/// Wait for a mutation and turn a rollback into an error carrying the
/// notification text
async fn settle(handle: MutationHandle, actions: &BoardActions) -> Result<()> {
    match handle.settled().await {
        MutationOutcome::Committed { .. } => {
            show(&actions.current(), false)?;
            Ok(())
        }
        MutationOutcome::RolledBack { error } => {
            let message = actions
                .engine()
                .notifications()
                .active()
                .pop()
                .map(|n| n.message)
                .unwrap_or_else(|| error.to_string());
            bail!(message)
        }
        MutationOutcome::Aborted { reason } => bail!("change aborted: {}", reason),
    }
}
