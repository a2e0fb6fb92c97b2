//! Replaying recorded pointer events through the drag controller.
//!
//! The board is laid out as a fixed grid: one column per list, a header
//! strip for the list handle and fixed-height card rows below it. Event
//! coordinates in a recording refer to that grid.

use boardkit::drag::{InputSource, PointerInput, PointerPhase, Rect};
use boardkit::{Board, DragConfig, DragController, DragEvent, DragIntent, DropTargets};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

pub const COLUMN_WIDTH: f64 = 200.0;
pub const HEADER_HEIGHT: f64 = 40.0;
pub const CARD_HEIGHT: f64 = 50.0;
pub const BODY_HEIGHT: f64 = 2000.0;

/// One recorded pointer event
#[derive(Debug, Clone, Deserialize)]
pub struct RecordedEvent {
    pub phase: PointerPhase,
    #[serde(default = "default_source")]
    pub source: InputSource,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub at_ms: u64,
}

fn default_source() -> InputSource {
    InputSource::Mouse
}

impl RecordedEvent {
    fn input(&self) -> PointerInput {
        PointerInput::new(self.phase, self.source, self.x, self.y, self.at_ms)
    }
}

/// Register drop regions for `board` on the fixed grid
pub fn grid_targets(board: &Board) -> DropTargets {
    let mut targets = DropTargets::new();
    for (li, list) in board.lists.iter().enumerate() {
        let x = li as f64 * COLUMN_WIDTH;
        targets.register_list(
            list.id.clone(),
            li,
            Rect::new(x, 0.0, COLUMN_WIDTH, HEADER_HEIGHT),
        );
        targets.register_list_body(
            list.id.clone(),
            list.cards.len(),
            Rect::new(x, HEADER_HEIGHT, COLUMN_WIDTH, BODY_HEIGHT),
        );
        for (ci, card) in list.cards.iter().enumerate() {
            let y = HEADER_HEIGHT + ci as f64 * CARD_HEIGHT;
            targets.register_card(
                card.id.clone(),
                list.id.clone(),
                ci,
                Rect::new(x, y, COLUMN_WIDTH, CARD_HEIGHT),
            );
        }
    }
    targets
}

/// Feed `events` to a controller and return every emitted event.
///
/// A held touch is ticked at each following event's timestamp so the long
/// press fires the way a platform timer would.
pub fn replay(board: &Board, config: DragConfig, events: &[RecordedEvent]) -> Vec<DragEvent> {
    let targets = grid_targets(board);
    let mut controller = DragController::new(config);
    let mut emitted = Vec::new();

    for event in events {
        emitted.extend(controller.tick(Duration::from_millis(event.at_ms), &targets));
        let produced = controller.handle(&event.input(), &targets);
        debug!(?event, ?produced, "replayed pointer event");
        emitted.extend(produced);
    }
    if let Some(cancelled) = controller.cancel() {
        emitted.push(cancelled);
    }
    emitted
}

/// The intent of the first completed drop, if any
pub fn dropped_intent(events: &[DragEvent]) -> Option<DragIntent> {
    events.iter().find_map(|e| match e {
        DragEvent::Dropped(intent) => Some(intent.clone()),
        _ => None,
    })
}
