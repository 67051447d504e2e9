use crate::domain::{Board, BoardId, CardId, ColumnId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A drag-and-drop event as reported by the presentation layer:
/// `item_id` was dropped over `over_id`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveIntent {
    pub item_id: String,
    pub over_id: String,
}

impl MoveIntent {
    pub fn new(item_id: impl Into<String>, over_id: impl Into<String>) -> Self {
        Self {
            item_id: item_id.into(),
            over_id: over_id.into(),
        }
    }
}

/// A movable item of the board
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ItemRef {
    Card(CardId),
    Column(ColumnId),
}

impl ItemRef {
    /// Looks the id up in the board, cards first
    pub fn resolve(board: &Board, id: &str) -> Option<Self> {
        if let Some(card) = board.card(id) {
            return Some(Self::Card(card.id.clone()));
        }
        board.column(id).map(|col| Self::Column(col.id.clone()))
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Card(id) => id.as_str(),
            Self::Column(id) => id.as_str(),
        }
    }
}

impl fmt::Display for ItemRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Card(id) => write!(f, "card {}", id),
            Self::Column(id) => write!(f, "column {}", id),
        }
    }
}

/// Anything that owns an ordered sequence of children
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ContainerRef {
    Board(BoardId),
    Column(ColumnId),
}

impl fmt::Display for ContainerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Board(id) => write!(f, "board {}", id),
            Self::Column(id) => write!(f, "column {}", id),
        }
    }
}

/// Where an item was dropped: onto a container body, or next to a sibling
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropTarget {
    Container(ContainerRef),
    Sibling(ItemRef),
}

impl DropTarget {
    /// Interprets `over_id` relative to the kind of item being dragged.
    ///
    /// Cards can be dropped on a column or a card. Columns can be dropped on
    /// the board, another column, or a card (meaning that card's column).
    pub fn resolve(board: &Board, item: &ItemRef, over_id: &str) -> Option<Self> {
        match item {
            ItemRef::Card(_) => {
                if let Some(card) = board.card(over_id) {
                    Some(Self::Sibling(ItemRef::Card(card.id.clone())))
                } else {
                    board
                        .column(over_id)
                        .map(|col| Self::Container(ContainerRef::Column(col.id.clone())))
                }
            }
            ItemRef::Column(_) => {
                if board.id.as_str() == over_id {
                    Some(Self::Container(ContainerRef::Board(board.id.clone())))
                } else if let Some(col) = board.column(over_id) {
                    Some(Self::Sibling(ItemRef::Column(col.id.clone())))
                } else {
                    board
                        .card(over_id)
                        .map(|card| Self::Sibling(ItemRef::Column(card.column_id.clone())))
                }
            }
        }
    }

    /// Normalizes the target into a container and an index within it
    pub fn placement(&self, board: &Board) -> Option<Placement> {
        match self {
            Self::Container(ContainerRef::Board(id)) => (board.id == *id)
                .then(|| Placement::new(ContainerRef::Board(id.clone()), board.columns.len())),
            Self::Container(ContainerRef::Column(id)) => board
                .column(id.as_str())
                .map(|col| Placement::new(ContainerRef::Column(id.clone()), col.cards.len())),
            Self::Sibling(ItemRef::Card(id)) => {
                let (col_idx, card_idx) = board.locate_card(id.as_str())?;
                let column = &board.columns[col_idx];
                Some(Placement::new(ContainerRef::Column(column.id.clone()), card_idx))
            }
            Self::Sibling(ItemRef::Column(id)) => board
                .column_index(id.as_str())
                .map(|idx| Placement::new(ContainerRef::Board(board.id.clone()), idx)),
        }
    }
}

/// A resolved destination: the item should end up at `index` inside `container`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub container: ContainerRef,
    pub index: usize,
}

impl Placement {
    pub fn new(container: ContainerRef, index: usize) -> Self {
        Self { container, index }
    }
}
