//! Pure reorder algorithms for lists and cards.
//!
//! Every function here is total: indices coming from drag geometry are
//! clamped instead of rejected, and an unknown id leaves the input unchanged.
//! After any change, `position` is rederived from final array order as a
//! contiguous `0..len` range. Positions are never incremented or decremented
//! in place.

use crate::types::{Board, BoardId, Card, CardId, List, ListId};
use serde::{Deserialize, Serialize};

/// An entity ranked among its siblings by an integer position
pub trait Positioned {
    type Id: Clone + PartialEq;

    fn id(&self) -> &Self::Id;
    fn position(&self) -> i64;
    fn set_position(&mut self, position: i64);
}

/// A positioned entity that references the container holding it
pub trait ContainerItem: Positioned {
    type Container: Clone + PartialEq;

    fn container(&self) -> &Self::Container;
    fn set_container(&mut self, container: Self::Container);
}

impl Positioned for List {
    type Id = ListId;

    fn id(&self) -> &ListId {
        &self.id
    }

    fn position(&self) -> i64 {
        self.position
    }

    fn set_position(&mut self, position: i64) {
        self.position = position;
    }
}

impl ContainerItem for List {
    type Container = BoardId;

    fn container(&self) -> &BoardId {
        &self.board_id
    }

    fn set_container(&mut self, container: BoardId) {
        self.board_id = container;
    }
}

impl Positioned for Card {
    type Id = CardId;

    fn id(&self) -> &CardId {
        &self.id
    }

    fn position(&self) -> i64 {
        self.position
    }

    fn set_position(&mut self, position: i64) {
        self.position = position;
    }
}

impl ContainerItem for Card {
    type Container = ListId;

    fn container(&self) -> &ListId {
        &self.list_id
    }

    fn set_container(&mut self, container: ListId) {
        self.list_id = container;
    }
}

/// One `{id, position}` pair of a batch positional update
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionUpdate<I> {
    pub id: I,
    pub position: i64,
}

/// Move one element from `source_index` to `dest_index`.
///
/// `dest_index` addresses the sequence after removal. Both indices are
/// clamped, so the result always has the input's length and elements.
pub fn move_index<T: Clone>(items: &[T], source_index: usize, dest_index: usize) -> Vec<T> {
    let mut result = items.to_vec();
    if result.is_empty() {
        return result;
    }

    let source = source_index.min(result.len() - 1);
    let item = result.remove(source);
    let dest = dest_index.min(result.len());
    result.insert(dest, item);
    result
}

/// Rederive positions of `items` from their index
pub fn restamp<T: Positioned>(items: &mut [T]) {
    for (i, item) in items.iter_mut().enumerate() {
        item.set_position(i as i64);
    }
}

/// Reorder within a single container and restamp positions.
pub fn reorder_within<T: Positioned + Clone>(
    items: &[T],
    source_index: usize,
    dest_index: usize,
) -> Vec<T> {
    let mut result = move_index(items, source_index, dest_index);
    restamp(&mut result);
    result
}

/// Move the item with `item_id` from `source` into `dest`.
///
/// The item is inserted at `dest_index` (clamped, default append) and
/// re-stamped with `dest_container`. Both containers get fresh positions.
/// When `item_id` is not in `source`, both inputs come back unchanged.
pub fn move_across<T: ContainerItem + Clone>(
    source: &[T],
    dest: &[T],
    item_id: &T::Id,
    dest_index: Option<usize>,
    dest_container: &T::Container,
) -> (Vec<T>, Vec<T>) {
    let mut source_items = source.to_vec();
    let mut dest_items = dest.to_vec();

    let Some(found) = source_items.iter().position(|i| i.id() == item_id) else {
        return (source_items, dest_items);
    };

    let mut item = source_items.remove(found);
    item.set_container(dest_container.clone());

    let index = dest_index.unwrap_or(dest_items.len()).min(dest_items.len());
    dest_items.insert(index, item);

    restamp(&mut source_items);
    restamp(&mut dest_items);
    (source_items, dest_items)
}

/// Build the batch positional update for a container
pub fn position_updates<T: Positioned>(items: &[T]) -> Vec<PositionUpdate<T::Id>> {
    items
        .iter()
        .map(|item| PositionUpdate {
            id: item.id().clone(),
            position: item.position(),
        })
        .collect()
}

/// Move a list to `to` within the board.
pub fn reorder_lists(board: &Board, list_id: &ListId, to: usize) -> Board {
    let mut next = board.clone();
    if let Some(from) = board.list_index(list_id) {
        next.lists = reorder_within(&board.lists, from, to);
    }
    next
}

/// Reorder cards inside one list.
pub fn reorder_cards(board: &Board, list_id: &ListId, from: usize, to: usize) -> Board {
    let mut next = board.clone();
    if let Some(list) = next.find_list_mut(list_id) {
        list.cards = reorder_within(&list.cards, from, to);
    }
    next
}

/// Move a card to `to_list` at `index` (append when `None`).
///
/// A move into the card's own list is a plain reorder.
pub fn move_card(board: &Board, card_id: &CardId, to_list: &ListId, index: Option<usize>) -> Board {
    let Some((from_li, from_ci)) = board.card_location(card_id) else {
        return board.clone();
    };
    let Some(to_li) = board.list_index(to_list) else {
        return board.clone();
    };

    let mut next = board.clone();
    if from_li == to_li {
        let last = board.lists[from_li].cards.len().saturating_sub(1);
        next.lists[from_li].cards =
            reorder_within(&board.lists[from_li].cards, from_ci, index.unwrap_or(last));
        return next;
    }

    let (source, dest) = move_across(
        &board.lists[from_li].cards,
        &board.lists[to_li].cards,
        card_id,
        index,
        to_list,
    );
    next.lists[from_li].cards = source;
    next.lists[to_li].cards = dest;
    next
}
