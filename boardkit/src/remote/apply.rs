//! Store-side application of remote calls to a confirmed board.
//!
//! Shared by the in-memory and file stores so both behave like the same
//! relational backend: durable ids are assigned on insert and rows come back
//! ordered by position.

use super::{CardPatch, ListPatch, RemoteResult};
use crate::error::RemoteError;
use crate::reorder::PositionUpdate;
use crate::types::{Board, BoardId, Card, CardId, List, ListId};

pub(super) fn fetch(board: &Board, board_id: &BoardId) -> RemoteResult<Board> {
    if &board.id != board_id {
        return Err(RemoteError::not_found("board", board_id.as_str()));
    }
    Ok(board.clone().sorted_by_position())
}

pub(super) fn create_list(board: &mut Board, list: &List) -> RemoteResult<List> {
    if list.board_id != board.id {
        return Err(RemoteError::not_found("board", list.board_id.as_str()));
    }

    let mut stored = list.clone();
    if stored.id.is_temporary() {
        stored.id = ListId::new();
    }
    if board.find_list(&stored.id).is_some() {
        return Err(RemoteError::rejected(format!(
            "duplicate list id {}",
            stored.id
        )));
    }
    // A new list starts empty; its cards are created separately.
    stored.cards.clear();

    board.lists.push(stored.clone());
    board.lists.sort_by_key(|l| l.position);
    Ok(stored)
}

pub(super) fn update_list(board: &mut Board, id: &ListId, patch: &ListPatch) -> RemoteResult<()> {
    let list = board
        .find_list_mut(id)
        .ok_or_else(|| RemoteError::not_found("list", id.as_str()))?;
    patch.apply(list);
    Ok(())
}

pub(super) fn delete_list(board: &mut Board, id: &ListId) -> RemoteResult<()> {
    let index = board
        .list_index(id)
        .ok_or_else(|| RemoteError::not_found("list", id.as_str()))?;
    board.lists.remove(index);
    Ok(())
}

pub(super) fn create_card(board: &mut Board, card: &Card) -> RemoteResult<Card> {
    let mut stored = card.clone();
    if stored.id.is_temporary() {
        stored.id = CardId::new();
    }
    if board.find_card(&stored.id).is_some() {
        return Err(RemoteError::rejected(format!(
            "duplicate card id {}",
            stored.id
        )));
    }

    let list = board
        .find_list_mut(&card.list_id)
        .ok_or_else(|| RemoteError::not_found("list", card.list_id.as_str()))?;
    list.cards.push(stored.clone());
    list.cards.sort_by_key(|c| c.position);
    Ok(stored)
}

pub(super) fn update_card(board: &mut Board, id: &CardId, patch: &CardPatch) -> RemoteResult<()> {
    let (li, ci) = board
        .card_location(id)
        .ok_or_else(|| RemoteError::not_found("card", id.as_str()))?;
    patch.apply(&mut board.lists[li].cards[ci]);
    Ok(())
}

pub(super) fn delete_card(board: &mut Board, id: &CardId) -> RemoteResult<()> {
    let (li, ci) = board
        .card_location(id)
        .ok_or_else(|| RemoteError::not_found("card", id.as_str()))?;
    board.lists[li].cards.remove(ci);
    Ok(())
}

pub(super) fn update_list_positions(
    board: &mut Board,
    board_id: &BoardId,
    updates: &[PositionUpdate<ListId>],
) -> RemoteResult<()> {
    if &board.id != board_id {
        return Err(RemoteError::not_found("board", board_id.as_str()));
    }
    // Validate the whole batch before touching any row.
    for update in updates {
        if board.find_list(&update.id).is_none() {
            return Err(RemoteError::not_found("list", update.id.as_str()));
        }
    }
    for update in updates {
        if let Some(list) = board.find_list_mut(&update.id) {
            list.position = update.position;
        }
    }
    board.lists.sort_by_key(|l| l.position);
    Ok(())
}

pub(super) fn update_card_positions(
    board: &mut Board,
    list_id: &ListId,
    updates: &[PositionUpdate<CardId>],
) -> RemoteResult<()> {
    if board.find_list(list_id).is_none() {
        return Err(RemoteError::not_found("list", list_id.as_str()));
    }
    for update in updates {
        if board.find_card(&update.id).is_none() {
            return Err(RemoteError::not_found("card", update.id.as_str()));
        }
    }

    for update in updates {
        let Some((li, ci)) = board.card_location(&update.id) else {
            continue;
        };
        let mut card = board.lists[li].cards.remove(ci);
        card.position = update.position;
        card.list_id = list_id.clone();
        if let Some(target) = board.find_list_mut(list_id) {
            target.cards.push(card);
        }
    }

    if let Some(target) = board.find_list_mut(list_id) {
        target.cards.sort_by_key(|c| c.position);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board() -> Board {
        Board::new("b")
            .with_id("b1")
            .with_list(
                List::new("b1", "one")
                    .with_id("l1")
                    .with_card(Card::new("l1", "a").with_id("a"))
                    .with_card(Card::new("l1", "b").with_id("b")),
            )
            .with_list(List::new("b1", "two").with_id("l2"))
    }

    #[test]
    fn test_create_assigns_durable_ids() {
        let mut b = board();
        let mut list = List::new("b1", "three");
        list.id = ListId::temporary();
        list.position = 2;
        let stored = create_list(&mut b, &list).unwrap();
        assert!(!stored.id.is_temporary());
        assert_eq!(b.lists.len(), 3);

        let mut card = Card::new("l2", "c");
        card.id = CardId::temporary();
        let stored = create_card(&mut b, &card).unwrap();
        assert!(!stored.id.is_temporary());
        assert_eq!(b.find_list(&ListId::from("l2")).unwrap().cards.len(), 1);
    }

    #[test]
    fn test_create_card_unknown_list() {
        let mut b = board();
        let card = Card::new("nope", "c");
        assert!(matches!(
            create_card(&mut b, &card),
            Err(RemoteError::NotFound { .. })
        ));
    }

    #[test]
    fn test_card_positions_rehome_cards() {
        let mut b = board();
        update_card_positions(
            &mut b,
            &ListId::from("l2"),
            &[PositionUpdate {
                id: CardId::from("a"),
                position: 0,
            }],
        )
        .unwrap();
        update_card_positions(
            &mut b,
            &ListId::from("l1"),
            &[PositionUpdate {
                id: CardId::from("b"),
                position: 0,
            }],
        )
        .unwrap();

        assert!(b.check_invariants().is_empty());
        assert_eq!(b.lists[1].cards[0].id.as_str(), "a");
        assert_eq!(b.lists[1].cards[0].list_id.as_str(), "l2");
    }

    #[test]
    fn test_list_positions_batch_is_all_or_nothing() {
        let mut b = board();
        let original = b.clone();
        let result = update_list_positions(
            &mut b,
            &BoardId::from("b1"),
            &[
                PositionUpdate {
                    id: ListId::from("l2"),
                    position: 0,
                },
                PositionUpdate {
                    id: ListId::from("ghost"),
                    position: 1,
                },
            ],
        );
        assert!(result.is_err());
        assert_eq!(b, original);
    }

    #[test]
    fn test_fetch_wrong_board() {
        let b = board();
        assert!(fetch(&b, &BoardId::from("other")).is_err());
        assert_eq!(fetch(&b, &BoardId::from("b1")).unwrap(), b);
    }
}
