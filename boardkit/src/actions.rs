//! Board operations built from a local transform and the remote calls that
//! back it.
//!
//! Each method validates ids against the published board, then submits one
//! mutation to the engine. Reorders persist through one batch positional
//! update per affected container; creates mint a temporary id and swap in
//! the store's durable id on commit.

use crate::config::EngineConfig;
use crate::drag::DragIntent;
use crate::engine::{Mutation, MutationHandle, OptimisticEngine};
use crate::error::{BoardError, Result};
use crate::remote::{CardPatch, ListPatch, RemoteStore};
use crate::reorder::{self, position_updates, restamp};
use crate::types::{Board, BoardId, Card, CardId, List, ListId};
use std::sync::Arc;
use tracing::debug;

/// High-level board operations over an [`OptimisticEngine`]
#[derive(Clone)]
pub struct BoardActions {
    engine: OptimisticEngine,
}

impl BoardActions {
    pub fn new(engine: OptimisticEngine) -> Self {
        Self { engine }
    }

    /// Fetch the initial confirmed board and wrap it
    pub async fn load(
        store: Arc<dyn RemoteStore>,
        board_id: &BoardId,
        config: EngineConfig,
    ) -> Result<Self> {
        let engine = OptimisticEngine::load(store, board_id, config).await?;
        Ok(Self::new(engine))
    }

    pub fn engine(&self) -> &OptimisticEngine {
        &self.engine
    }

    pub fn current(&self) -> Board {
        self.engine.current()
    }

    /// Run the operation a completed drag asked for
    pub fn apply_intent(&self, intent: &DragIntent) -> Result<MutationHandle> {
        debug!(?intent, "applying drag intent");
        match intent {
            DragIntent::ReorderLists { list_id, to, .. } => self.reorder_lists(list_id, *to),
            // The layout index may be stale by the time the drop lands, so
            // the card is located by id.
            DragIntent::ReorderCards {
                list_id, card_id, to, ..
            } => {
                let in_list = self
                    .current()
                    .find_card(card_id)
                    .is_some_and(|c| &c.list_id == list_id);
                if !in_list {
                    return Err(BoardError::card_not_found(card_id));
                }
                self.move_card(card_id, list_id, Some(*to))
            }
            DragIntent::MoveCard {
                card_id,
                to_list,
                index,
                ..
            } => self.move_card(card_id, to_list, Some(*index)),
        }
    }

    /// Move a list to index `to`
    pub fn reorder_lists(&self, list_id: &ListId, to: usize) -> Result<MutationHandle> {
        let board = self.current();
        if board.find_list(list_id).is_none() {
            return Err(BoardError::list_not_found(list_id));
        }

        let next = reorder::reorder_lists(&board, list_id, to);
        let updates = position_updates(&next.lists);
        let store = self.engine.store();
        let board_id = board.id.clone();
        let id = list_id.clone();

        Ok(self.engine.submit(Mutation::new(
            "move the list",
            move |b: &Board| reorder::reorder_lists(b, &id, to),
            async move { store.update_list_positions(&board_id, &updates).await },
        )))
    }

    /// Reorder cards inside one list
    pub fn reorder_cards(&self, list_id: &ListId, from: usize, to: usize) -> Result<MutationHandle> {
        let board = self.current();
        if board.find_list(list_id).is_none() {
            return Err(BoardError::list_not_found(list_id));
        }

        let next = reorder::reorder_cards(&board, list_id, from, to);
        let updates = next
            .find_list(list_id)
            .map(|l| position_updates(&l.cards))
            .unwrap_or_default();
        let store = self.engine.store();
        let id = list_id.clone();

        Ok(self.engine.submit(Mutation::new(
            "move the card",
            {
                let id = id.clone();
                move |b: &Board| reorder::reorder_cards(b, &id, from, to)
            },
            async move { store.update_card_positions(&id, &updates).await },
        )))
    }

    /// Move a card into `to_list` at `index` (append when `None`).
    ///
    /// A cross-list move writes the destination list's positions first, then
    /// the source list's.
    pub fn move_card(
        &self,
        card_id: &CardId,
        to_list: &ListId,
        index: Option<usize>,
    ) -> Result<MutationHandle> {
        let board = self.current();
        let from_list = board
            .find_card(card_id)
            .map(|c| c.list_id.clone())
            .ok_or_else(|| BoardError::card_not_found(card_id))?;
        if board.find_list(to_list).is_none() {
            return Err(BoardError::list_not_found(to_list));
        }

        let next = reorder::move_card(&board, card_id, to_list, index);
        let updates_for = |list: &ListId| {
            next.find_list(list)
                .map(|l| position_updates(&l.cards))
                .unwrap_or_default()
        };
        let dest_updates = updates_for(to_list);
        let source_updates = (&from_list != to_list).then(|| updates_for(&from_list));
        let two_writes = source_updates.is_some();

        let store = self.engine.store();
        let card = card_id.clone();
        let dest = to_list.clone();

        Ok(self.engine.submit(
            Mutation::new(
                "move the card",
                {
                    let card = card.clone();
                    let dest = dest.clone();
                    move |b: &Board| reorder::move_card(b, &card, &dest, index)
                },
                async move {
                    store.update_card_positions(&dest, &dest_updates).await?;
                    if let Some(updates) = source_updates {
                        store.update_card_positions(&from_list, &updates).await?;
                    }
                    debug!(card = %card, "card move persisted");
                    Ok(())
                },
            )
            .refresh_on_failure(two_writes),
        ))
    }

    /// Append a new list to the board
    pub fn add_list(&self, title: impl Into<String>) -> MutationHandle {
        let board = self.current();
        let mut list = List::new(board.id.clone(), title).with_id(ListId::temporary());
        list.position = board.lists.len() as i64;

        let temp_id = list.id.clone();
        let store = self.engine.store();
        let to_store = list.clone();

        self.engine.submit(
            Mutation::new(
                "add the list",
                move |b: &Board| {
                    let mut next = b.clone();
                    next.lists.push(list);
                    restamp(&mut next.lists);
                    next
                },
                async move { store.create_list(&to_store).await },
            )
            .reconcile(move |b, stored: List| {
                if let Some(list) = b.find_list_mut(&temp_id) {
                    list.id = stored.id.clone();
                    for card in &mut list.cards {
                        card.list_id = stored.id.clone();
                    }
                }
            }),
        )
    }

    pub fn rename_list(&self, list_id: &ListId, title: impl Into<String>) -> Result<MutationHandle> {
        if self.current().find_list(list_id).is_none() {
            return Err(BoardError::list_not_found(list_id));
        }

        let patch = ListPatch::title(title);
        let local = patch.clone();
        let id = list_id.clone();
        let store = self.engine.store();

        Ok(self.engine.submit(Mutation::new(
            "rename the list",
            {
                let id = id.clone();
                move |b: &Board| {
                    let mut next = b.clone();
                    if let Some(list) = next.find_list_mut(&id) {
                        local.apply(list);
                    }
                    next
                }
            },
            async move { store.update_list(&id, &patch).await },
        )))
    }

    /// Delete a list with its cards and close the gap in list positions
    pub fn delete_list(&self, list_id: &ListId) -> Result<MutationHandle> {
        let board = self.current();
        if board.find_list(list_id).is_none() {
            return Err(BoardError::list_not_found(list_id));
        }

        let next = without_list(&board, list_id);
        let updates = position_updates(&next.lists);
        let store = self.engine.store();
        let board_id = board.id.clone();
        let id = list_id.clone();

        Ok(self.engine.submit(
            Mutation::new(
                "delete the list",
                {
                    let id = id.clone();
                    move |b: &Board| without_list(b, &id)
                },
                async move {
                    store.delete_list(&id).await?;
                    if !updates.is_empty() {
                        store.update_list_positions(&board_id, &updates).await?;
                    }
                    Ok(())
                },
            )
            .refresh_on_failure(true),
        ))
    }

    /// Append a new card to `list_id`
    pub fn add_card(
        &self,
        list_id: &ListId,
        title: impl Into<String>,
        description: Option<String>,
    ) -> Result<MutationHandle> {
        let board = self.current();
        let list = board
            .find_list(list_id)
            .ok_or_else(|| BoardError::list_not_found(list_id))?;

        let mut card = Card::new(list_id.clone(), title).with_id(CardId::temporary());
        card.description = description;
        card.position = list.cards.len() as i64;

        let temp_id = card.id.clone();
        let store = self.engine.store();
        let to_store = card.clone();
        let target = list_id.clone();

        Ok(self.engine.submit(
            Mutation::new(
                "add the card",
                move |b: &Board| {
                    let mut next = b.clone();
                    if let Some(list) = next.find_list_mut(&target) {
                        list.cards.push(card);
                        restamp(&mut list.cards);
                    }
                    next
                },
                async move { store.create_card(&to_store).await },
            )
            .reconcile(move |b, stored: Card| {
                if let Some((li, ci)) = b.card_location(&temp_id) {
                    b.lists[li].cards[ci].id = stored.id;
                }
            }),
        ))
    }

    pub fn update_card(&self, card_id: &CardId, patch: CardPatch) -> Result<MutationHandle> {
        if self.current().find_card(card_id).is_none() {
            return Err(BoardError::card_not_found(card_id));
        }

        let local = patch.clone();
        let id = card_id.clone();
        let store = self.engine.store();

        Ok(self.engine.submit(Mutation::new(
            "update the card",
            {
                let id = id.clone();
                move |b: &Board| {
                    let mut next = b.clone();
                    if let Some((li, ci)) = next.card_location(&id) {
                        local.apply(&mut next.lists[li].cards[ci]);
                    }
                    next
                }
            },
            async move { store.update_card(&id, &patch).await },
        )))
    }

    /// Delete a card and close the gap in its list's positions
    pub fn delete_card(&self, card_id: &CardId) -> Result<MutationHandle> {
        let board = self.current();
        let list_id = board
            .find_card(card_id)
            .map(|c| c.list_id.clone())
            .ok_or_else(|| BoardError::card_not_found(card_id))?;

        let next = without_card(&board, card_id);
        let updates = next
            .find_list(&list_id)
            .map(|l| position_updates(&l.cards))
            .unwrap_or_default();
        let store = self.engine.store();
        let id = card_id.clone();

        Ok(self.engine.submit(
            Mutation::new(
                "delete the card",
                {
                    let id = id.clone();
                    move |b: &Board| without_card(b, &id)
                },
                async move {
                    store.delete_card(&id).await?;
                    if !updates.is_empty() {
                        store.update_card_positions(&list_id, &updates).await?;
                    }
                    Ok(())
                },
            )
            .refresh_on_failure(true),
        ))
    }
}

fn without_list(board: &Board, list_id: &ListId) -> Board {
    let mut next = board.clone();
    next.lists.retain(|l| &l.id != list_id);
    restamp(&mut next.lists);
    next
}

fn without_card(board: &Board, card_id: &CardId) -> Board {
    let mut next = board.clone();
    if let Some((li, ci)) = next.card_location(card_id) {
        let cards = &mut next.lists[li].cards;
        cards.remove(ci);
        restamp(cards);
    }
    next
}
