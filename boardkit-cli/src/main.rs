//! boardkit CLI - edit a kanban board stored as a JSON file.
//!
//! Commands:
//! - `boardkit init <title>`: Create a board file
//! - `boardkit show`: Print the board
//! - `boardkit add-list|rename-list|remove-list|move-list`: Change lists
//! - `boardkit add-card|edit-card|remove-card|move-card`: Change cards
//! - `boardkit replay <events.json>`: Run recorded pointer events through the
//!   drag controller and apply the resulting drop
//!
//! Exit codes:
//! - 0: Success
//! - 1: Error, including a change that was rolled back

mod cli;
mod commands;
mod replay;
mod table;

use clap::Parser;
use std::process;

use cli::Cli;

const EXIT_SUCCESS: i32 = 0;
const EXIT_ERROR: i32 = 1;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    configure_logging(cli.verbose, cli.debug, cli.quiet);

    let options = commands::Options {
        board: cli.board,
        config: cli.config,
        simulate_failure: cli.simulate_failure,
    };

    let exit_code = match commands::run(cli.command, &options).await {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            tracing::debug!(error = ?e, "command failed");
            eprintln!("Error: {:#}", e);
            EXIT_ERROR
        }
    };
    process::exit(exit_code);
}

fn configure_logging(verbose: bool, debug: bool, quiet: bool) {
    use tracing::Level;
    use tracing_subscriber::{fmt, prelude::*, registry, EnvFilter};

    let log_level = if quiet {
        Level::ERROR
    } else if debug {
        Level::DEBUG
    } else if verbose {
        Level::TRACE
    } else {
        Level::WARN
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("boardkit={log_level},{log_level}")));

    registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}
