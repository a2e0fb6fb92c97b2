//! Board rendering for the terminal.

use boardkit::Board;
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};

/// Create a table with the shared preset
pub fn new_table() -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Render the board with one column per list, cards top to bottom
pub fn board_table(board: &Board) -> Table {
    let mut table = new_table();
    table.set_header(
        board
            .lists
            .iter()
            .map(|l| Cell::new(format!("{}\n{}", l.title, l.id))),
    );

    let rows = board.lists.iter().map(|l| l.cards.len()).max().unwrap_or(0);
    for row in 0..rows {
        table.add_row(board.lists.iter().map(|l| match l.cards.get(row) {
            Some(card) => Cell::new(format!("{}\n{}", truncate_str(&card.title, 40), card.id)),
            None => Cell::new(""),
        }));
    }
    table
}

/// Truncate a string to `max` characters, appending "..." if truncated.
pub fn truncate_str(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}
