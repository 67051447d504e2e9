use crate::domain::{
    card::Card,
    ids::{BoardId, CardId, ColumnId},
    order::Ordered,
};
use serde::{Deserialize, Serialize};

/// A column of the board, owning an ordered sequence of cards
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub id: ColumnId,
    pub title: String,
    pub order: u32,
    pub board_id: BoardId,
    #[serde(default)]
    pub cards: Vec<Card>,
}

impl Column {
    /// Creates an empty column at the head of the given board
    pub fn new(id: ColumnId, title: String, board_id: BoardId) -> Self {
        Self {
            id,
            title,
            order: 0,
            board_id,
            cards: Vec::new(),
        }
    }

    pub fn set_title(&mut self, title: String) {
        self.title = title;
    }

    /// Position of a card within this column
    pub fn card_index(&self, id: &str) -> Option<usize> {
        self.cards.iter().position(|c| c.id.as_str() == id)
    }

    pub fn card_ids(&self) -> Vec<CardId> {
        self.cards.iter().map(|c| c.id.clone()).collect()
    }
}

impl Ordered for Column {
    fn order(&self) -> u32 {
        self.order
    }

    fn set_order(&mut self, order: u32) {
        self.order = order;
    }
}

/// Partial update for a column; absent fields are left unchanged
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<u32>,
}

impl ColumnPatch {
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            order: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.order.is_none()
    }
}
