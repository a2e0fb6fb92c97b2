//! Registry of draggable items and drop regions, and hit-testing against it.
//!
//! The view registers one region per list column, per card and per list body
//! (the card container, including its empty space) each time it lays out.
//! Indices are board order at registration time.

use super::geometry::{Point, Rect};
use super::{DragItem, DropTarget};
use crate::types::{CardId, ListId};

#[derive(Debug, Clone)]
struct ListRegion {
    id: ListId,
    index: usize,
    rect: Rect,
}

#[derive(Debug, Clone)]
struct CardRegion {
    id: CardId,
    list_id: ListId,
    index: usize,
    rect: Rect,
}

#[derive(Debug, Clone)]
struct BodyRegion {
    list_id: ListId,
    len: usize,
    rect: Rect,
}

/// Geometric drop candidates for one drag surface
#[derive(Debug, Clone, Default)]
pub struct DropTargets {
    lists: Vec<ListRegion>,
    cards: Vec<CardRegion>,
    bodies: Vec<BodyRegion>,
}

impl DropTargets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a list's draggable handle (usually its header)
    pub fn register_list(&mut self, id: impl Into<ListId>, index: usize, rect: Rect) {
        self.lists.push(ListRegion {
            id: id.into(),
            index,
            rect,
        });
    }

    pub fn register_card(
        &mut self,
        id: impl Into<CardId>,
        list_id: impl Into<ListId>,
        index: usize,
        rect: Rect,
    ) {
        self.cards.push(CardRegion {
            id: id.into(),
            list_id: list_id.into(),
            index,
            rect,
        });
    }

    /// Register the card container of a list holding `len` cards
    pub fn register_list_body(&mut self, list_id: impl Into<ListId>, len: usize, rect: Rect) {
        self.bodies.push(BodyRegion {
            list_id: list_id.into(),
            len,
            rect,
        });
    }

    pub fn clear(&mut self) {
        self.lists.clear();
        self.cards.clear();
        self.bodies.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.lists.is_empty() && self.cards.is_empty() && self.bodies.is_empty()
    }

    /// The draggable item under `point`. Cards sit inside lists, so they win.
    pub fn item_at(&self, point: Point) -> Option<DragItem> {
        if let Some(card) = self.cards.iter().find(|c| c.rect.contains(point)) {
            return Some(DragItem::Card {
                id: card.id.clone(),
                list_id: card.list_id.clone(),
            });
        }
        self.lists
            .iter()
            .find(|l| l.rect.contains(point))
            .map(|l| DragItem::List { id: l.id.clone() })
    }

    /// Where `item` currently sits
    pub fn origin_of(&self, item: &DragItem) -> Option<DropTarget> {
        match item {
            DragItem::List { id } => self
                .list_index(id)
                .map(|index| DropTarget::ListSlot { index }),
            DragItem::Card { id, .. } => {
                self.cards
                    .iter()
                    .find(|c| &c.id == id)
                    .map(|c| DropTarget::CardSlot {
                        list_id: c.list_id.clone(),
                        index: c.index,
                    })
            }
        }
    }

    /// Resolve the drop target for `item` with the pointer at `point`.
    pub fn resolve(&self, item: &DragItem, point: Point) -> Option<DropTarget> {
        match item {
            DragItem::List { .. } => self.resolve_list(point),
            DragItem::Card { id, list_id } => self.resolve_card(id, list_id, point),
        }
    }

    fn list_index(&self, id: &ListId) -> Option<usize> {
        self.lists.iter().find(|l| &l.id == id).map(|l| l.index)
    }

    /// A list takes the slot of the list column under the pointer.
    fn resolve_list(&self, point: Point) -> Option<DropTarget> {
        if let Some(list) = self.lists.iter().find(|l| l.rect.contains(point)) {
            return Some(DropTarget::ListSlot { index: list.index });
        }
        self.bodies
            .iter()
            .find(|b| b.rect.contains(point))
            .and_then(|b| self.list_index(&b.list_id))
            .map(|index| DropTarget::ListSlot { index })
    }

    /// Within its own list a card takes the hovered card's slot. In another
    /// list it goes before the hovered card, or after it once the pointer is
    /// past the card's vertical midpoint. Empty body space means append.
    fn resolve_card(&self, dragged: &CardId, home: &ListId, point: Point) -> Option<DropTarget> {
        if let Some(card) = self.cards.iter().find(|c| c.rect.contains(point)) {
            if &card.id == dragged {
                return self.origin_of(&DragItem::Card {
                    id: dragged.clone(),
                    list_id: home.clone(),
                });
            }
            let index = if &card.list_id == home {
                card.index
            } else if point.y >= card.rect.center_y() {
                card.index + 1
            } else {
                card.index
            };
            return Some(DropTarget::CardSlot {
                list_id: card.list_id.clone(),
                index,
            });
        }

        let body = self.bodies.iter().find(|b| b.rect.contains(point))?;
        let index = if &body.list_id == home {
            // Append position once the card has been lifted out.
            body.len.saturating_sub(1)
        } else {
            body.len
        };
        Some(DropTarget::CardSlot {
            list_id: body.list_id.clone(),
            index,
        })
    }
}
