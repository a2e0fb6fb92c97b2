//! Board, List and Card records

use super::ids::{BoardId, CardId, ListId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// A kanban board. Owns its lists; lists have no lifecycle outside a board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Board {
    pub id: BoardId,
    pub title: String,
    #[serde(default)]
    pub lists: Vec<List>,
}

/// A column of cards on a board
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct List {
    pub id: ListId,
    pub title: String,
    pub board_id: BoardId,
    /// Rank among sibling lists. Only relative order matters.
    pub position: i64,
    #[serde(default)]
    pub cards: Vec<Card>,
}

/// A card within a list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub list_id: ListId,
    /// Rank within the owning list
    pub position: i64,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl Board {
    /// Create an empty board with a fresh id
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: BoardId::new(),
            title: title.into(),
            lists: Vec::new(),
        }
    }

    /// Set the board id
    pub fn with_id(mut self, id: impl Into<BoardId>) -> Self {
        self.id = id.into();
        self
    }

    /// Append a list, stamping its board id and position
    pub fn with_list(mut self, mut list: List) -> Self {
        list.board_id = self.id.clone();
        list.position = self.lists.len() as i64;
        self.lists.push(list);
        self
    }

    pub fn find_list(&self, id: &ListId) -> Option<&List> {
        self.lists.iter().find(|l| &l.id == id)
    }

    pub fn find_list_mut(&mut self, id: &ListId) -> Option<&mut List> {
        self.lists.iter_mut().find(|l| &l.id == id)
    }

    /// Index of a list in board order
    pub fn list_index(&self, id: &ListId) -> Option<usize> {
        self.lists.iter().position(|l| &l.id == id)
    }

    pub fn find_card(&self, id: &CardId) -> Option<&Card> {
        self.lists
            .iter()
            .flat_map(|l| l.cards.iter())
            .find(|c| &c.id == id)
    }

    /// Locate a card as (list index, card index)
    pub fn card_location(&self, id: &CardId) -> Option<(usize, usize)> {
        self.lists.iter().enumerate().find_map(|(li, list)| {
            list.cards
                .iter()
                .position(|c| &c.id == id)
                .map(|ci| (li, ci))
        })
    }

    /// Total number of cards across all lists
    pub fn card_count(&self) -> usize {
        self.lists.iter().map(|l| l.cards.len()).sum()
    }

    /// Rederive every list and card position from array order.
    pub fn normalize_positions(&mut self) {
        for (i, list) in self.lists.iter_mut().enumerate() {
            list.position = i as i64;
            list.normalize_positions();
        }
    }

    /// Order lists and cards by their stored positions.
    ///
    /// Used on boards fetched from a store, where rows may arrive in any
    /// order. The sort is stable, so equal positions keep array order.
    pub fn sorted_by_position(mut self) -> Self {
        self.lists.sort_by_key(|l| l.position);
        for list in &mut self.lists {
            list.cards.sort_by_key(|c| c.position);
        }
        self
    }

    /// Check the structural invariants of the board.
    ///
    /// Returns every violation found; an empty vector means the board is
    /// consistent.
    pub fn check_invariants(&self) -> Vec<InvariantViolation> {
        let mut violations = Vec::new();
        let mut seen_cards = HashSet::new();

        for (li, list) in self.lists.iter().enumerate() {
            if list.board_id != self.id {
                violations.push(InvariantViolation::ListBoardMismatch {
                    list: list.id.clone(),
                });
            }
            if list.position != li as i64 {
                violations.push(InvariantViolation::ListPosition {
                    list: list.id.clone(),
                    expected: li as i64,
                    actual: list.position,
                });
            }
            for (ci, card) in list.cards.iter().enumerate() {
                if !seen_cards.insert(card.id.clone()) {
                    violations.push(InvariantViolation::DuplicateCard {
                        card: card.id.clone(),
                    });
                }
                if card.list_id != list.id {
                    violations.push(InvariantViolation::CardListMismatch {
                        card: card.id.clone(),
                        stamped: card.list_id.clone(),
                        owner: list.id.clone(),
                    });
                }
                if card.position != ci as i64 {
                    violations.push(InvariantViolation::CardPosition {
                        card: card.id.clone(),
                        expected: ci as i64,
                        actual: card.position,
                    });
                }
            }
        }

        violations
    }
}

impl List {
    /// Create an empty list with a fresh id
    pub fn new(board_id: impl Into<BoardId>, title: impl Into<String>) -> Self {
        Self {
            id: ListId::new(),
            title: title.into(),
            board_id: board_id.into(),
            position: 0,
            cards: Vec::new(),
        }
    }

    /// Set the list id
    pub fn with_id(mut self, id: impl Into<ListId>) -> Self {
        self.id = id.into();
        self
    }

    /// Append a card, stamping its list id and position
    pub fn with_card(mut self, mut card: Card) -> Self {
        card.list_id = self.id.clone();
        card.position = self.cards.len() as i64;
        self.cards.push(card);
        self
    }

    /// Rederive card positions from array order
    pub fn normalize_positions(&mut self) {
        for (i, card) in self.cards.iter_mut().enumerate() {
            card.position = i as i64;
        }
    }
}

impl Card {
    /// Create a card with a fresh id, created now
    pub fn new(list_id: impl Into<ListId>, title: impl Into<String>) -> Self {
        Self {
            id: CardId::new(),
            title: title.into(),
            description: None,
            list_id: list_id.into(),
            position: 0,
            created_at: Utc::now(),
        }
    }

    /// Set the card id
    pub fn with_id(mut self, id: impl Into<CardId>) -> Self {
        self.id = id.into();
        self
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A broken board invariant, as reported by [`Board::check_invariants`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    ListBoardMismatch {
        list: ListId,
    },
    ListPosition {
        list: ListId,
        expected: i64,
        actual: i64,
    },
    DuplicateCard {
        card: CardId,
    },
    CardListMismatch {
        card: CardId,
        stamped: ListId,
        owner: ListId,
    },
    CardPosition {
        card: CardId,
        expected: i64,
        actual: i64,
    },
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ListBoardMismatch { list } => {
                write!(f, "list {} belongs to another board", list)
            }
            Self::ListPosition {
                list,
                expected,
                actual,
            } => write!(
                f,
                "list {} has position {} but sits at index {}",
                list, actual, expected
            ),
            Self::DuplicateCard { card } => write!(f, "card {} appears more than once", card),
            Self::CardListMismatch {
                card,
                stamped,
                owner,
            } => write!(
                f,
                "card {} is stamped with list {} but lives in {}",
                card, stamped, owner
            ),
            Self::CardPosition {
                card,
                expected,
                actual,
            } => write!(
                f,
                "card {} has position {} but sits at index {}",
                card, actual, expected
            ),
        }
    }
}
