//! Drag interaction: pointer and touch gestures in, reorder/move intents out.
//!
//! Mouse and touch input take different paths to a drag (movement threshold
//! versus long press) but produce the same [`DragIntent`] values. The
//! platform split stops here; everything downstream sees only intents.

mod controller;
mod geometry;
mod targets;

pub use controller::{ArmedGesture, DragController, DragPhase, DragSession, DragState};
pub use geometry::{Point, Rect};
pub use targets::DropTargets;

use crate::types::{CardId, ListId};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Where an input event came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputSource {
    Mouse,
    Touch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointerPhase {
    Down,
    Move,
    Up,
    /// The platform interrupted the gesture
    Cancel,
}

/// One low-level pointer or touch event.
///
/// `at` is a monotonic timestamp supplied by the caller; the controller never
/// reads a clock itself.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerInput {
    pub phase: PointerPhase,
    pub source: InputSource,
    pub position: Point,
    pub at: Duration,
}

impl PointerInput {
    pub fn new(phase: PointerPhase, source: InputSource, x: f64, y: f64, at_ms: u64) -> Self {
        Self {
            phase,
            source,
            position: Point::new(x, y),
            at: Duration::from_millis(at_ms),
        }
    }

    pub fn mouse(phase: PointerPhase, x: f64, y: f64) -> Self {
        Self::new(phase, InputSource::Mouse, x, y, 0)
    }

    pub fn touch(phase: PointerPhase, x: f64, y: f64, at_ms: u64) -> Self {
        Self::new(phase, InputSource::Touch, x, y, at_ms)
    }
}

/// The entity being dragged
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DragItem {
    List { id: ListId },
    Card { id: CardId, list_id: ListId },
}

/// A slot an item can be dropped into.
///
/// Indices follow the reorder convention: for a move within one container
/// they address the sequence after the item has been removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DropTarget {
    ListSlot { index: usize },
    CardSlot { list_id: ListId, index: usize },
}

/// What a completed drag asks the board to do
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DragIntent {
    ReorderLists {
        list_id: ListId,
        from: usize,
        to: usize,
    },
    ReorderCards {
        list_id: ListId,
        card_id: CardId,
        from: usize,
        to: usize,
    },
    MoveCard {
        card_id: CardId,
        from_list: ListId,
        to_list: ListId,
        index: usize,
    },
}

impl DragIntent {
    /// Build the intent for dropping `item` from `origin` onto `target`.
    ///
    /// Returns `None` when the target is the origin or of the wrong kind.
    pub fn between(item: &DragItem, origin: &DropTarget, target: &DropTarget) -> Option<Self> {
        if origin == target {
            return None;
        }
        match (item, origin, target) {
            (
                DragItem::List { id },
                DropTarget::ListSlot { index: from },
                DropTarget::ListSlot { index: to },
            ) => Some(Self::ReorderLists {
                list_id: id.clone(),
                from: *from,
                to: *to,
            }),
            (
                DragItem::Card { id, .. },
                DropTarget::CardSlot {
                    list_id: from_list,
                    index: from,
                },
                DropTarget::CardSlot {
                    list_id: to_list,
                    index: to,
                },
            ) => {
                if from_list == to_list {
                    Some(Self::ReorderCards {
                        list_id: from_list.clone(),
                        card_id: id.clone(),
                        from: *from,
                        to: *to,
                    })
                } else {
                    Some(Self::MoveCard {
                        card_id: id.clone(),
                        from_list: from_list.clone(),
                        to_list: to_list.clone(),
                        index: *to,
                    })
                }
            }
            _ => None,
        }
    }
}

/// Output of the controller, in the order things happened
#[derive(Debug, Clone, PartialEq)]
pub enum DragEvent {
    /// A press landed on a draggable item
    Armed { item: DragItem },
    /// The press became a drag
    Started { item: DragItem, origin: DropTarget },
    /// The resolved drop target changed
    Hover { target: Option<DropTarget> },
    /// The drag ended on a valid, different target
    Dropped(DragIntent),
    /// The drag ended without an intent
    Cancelled,
    /// The press was released before it became a drag
    Click { item: DragItem },
    /// A touch moved before the long press fired; the gesture is a scroll
    Scroll,
}
