//! Command line definition for the `boardkit` tool.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// boardkit - inspect and rearrange a board stored as a JSON file.
///
/// Every change is applied optimistically and then written to the board
/// file. A failed write rolls the change back and reports why.
#[derive(Parser, Debug)]
#[command(name = "boardkit")]
#[command(version)]
#[command(about = "Inspect and rearrange a kanban board stored as JSON")]
#[command(
    long_about = "boardkit edits a kanban board kept in a single JSON file.\n\n\
    Changes are published locally first and rolled back if the write fails.\n\n\
    Environment variables:\n  \
    BOARDKIT_DRAG__LONG_PRESS_MS         Touch hold time before a drag starts\n  \
    BOARDKIT_ENGINE__REFRESH_ON_SUCCESS  Reload the board after every write"
)]
pub struct Cli {
    /// Board file to operate on
    #[arg(short, long, global = true, default_value = "board.json")]
    pub board: PathBuf,

    /// Configuration file (toml, yaml or json)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Run the change against an in-memory copy whose first write fails,
    /// to see the rollback. The board file is left untouched.
    #[arg(long, global = true)]
    pub simulate_failure: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a new, empty board file
    Init {
        /// Board title
        title: String,
        /// Board id
        #[arg(long, default_value = "main")]
        id: String,
        /// Overwrite an existing board file
        #[arg(long)]
        force: bool,
    },

    /// Show the board
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Append a list
    AddList {
        title: String,
    },

    /// Rename a list
    RenameList {
        list: String,
        title: String,
    },

    /// Delete a list and its cards
    RemoveList {
        list: String,
    },

    /// Move a list to a new index
    MoveList {
        list: String,
        /// Zero-based destination index
        to: usize,
    },

    /// Append a card to a list
    AddCard {
        list: String,
        title: String,
        #[arg(long)]
        description: Option<String>,
    },

    /// Change a card's title or description
    EditCard {
        card: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long, conflicts_with = "clear_description")]
        description: Option<String>,
        /// Remove the description
        #[arg(long)]
        clear_description: bool,
    },

    /// Delete a card
    RemoveCard {
        card: String,
    },

    /// Move a card to a list, appending unless an index is given
    MoveCard {
        card: String,
        /// Destination list
        list: String,
        /// Zero-based destination index
        #[arg(long)]
        index: Option<usize>,
    },

    /// Replay recorded pointer events against the board layout and apply the
    /// resulting drop
    Replay {
        /// JSON file holding an array of pointer events
        events: PathBuf,
    },
}
