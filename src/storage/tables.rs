//! Flat relational model shared by the in-memory and file backends.
//!
//! Mirrors what a relational store holds: one row per board, column and
//! card, with back-references instead of nesting. The nested [`Board`] is
//! assembled on read.

use crate::{
    domain::{
        order::{next_order, sort_by_order, Ordered},
        Board, BoardId, Card, CardId, CardPatch, Column, ColumnId, ColumnPatch, UNTITLED_COLUMN,
    },
    error::{KanbanError, Result},
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardRow {
    pub id: BoardId,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnRow {
    pub id: ColumnId,
    pub title: String,
    pub order: u32,
    pub board_id: BoardId,
}

impl ColumnRow {
    fn to_column(&self) -> Column {
        Column {
            id: self.id.clone(),
            title: self.title.clone(),
            order: self.order,
            board_id: self.board_id.clone(),
            cards: Vec::new(),
        }
    }
}

impl Ordered for ColumnRow {
    fn order(&self) -> u32 {
        self.order
    }

    fn set_order(&mut self, order: u32) {
        self.order = order;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tables {
    pub boards: Vec<BoardRow>,
    pub columns: Vec<ColumnRow>,
    pub cards: Vec<Card>,
}

impl Tables {
    pub fn create_board(&mut self, title: &str, column_titles: &[String]) -> Board {
        let board = BoardRow {
            id: BoardId::generate(),
            title: title.to_string(),
        };
        for (position, column_title) in column_titles.iter().enumerate() {
            self.columns.push(ColumnRow {
                id: ColumnId::generate(),
                title: column_title.clone(),
                order: position as u32,
                board_id: board.id.clone(),
            });
        }
        let id = board.id.clone();
        self.boards.push(board);
        self.assemble(&id)
            .unwrap_or_else(|| Board::new(id, title.to_string()))
    }

    /// The first board with its columns and cards, each ascending by order
    pub fn load_board(&self) -> Result<Board> {
        let first = self.boards.first().ok_or(KanbanError::BoardNotInitialized)?;
        self.assemble(&first.id).ok_or(KanbanError::BoardNotInitialized)
    }

    pub fn create_card(&mut self, column_id: &ColumnId, title: &str) -> Result<Card> {
        if title.trim().is_empty() {
            return Err(KanbanError::ValidationFailure(
                "columnId and title are required".to_string(),
            ));
        }
        if !self.columns.iter().any(|c| c.id == *column_id) {
            return Err(KanbanError::NotFound(column_id.to_string()));
        }

        let mut card = Card::new(CardId::generate(), title.to_string(), column_id.clone());
        card.order = next_order(&self.cards_of(column_id));
        self.cards.push(card.clone());
        Ok(card)
    }

    pub fn create_column(&mut self, board_id: &BoardId, title: &str) -> Result<Column> {
        if !self.boards.iter().any(|b| b.id == *board_id) {
            return Err(KanbanError::NotFound(board_id.to_string()));
        }

        let title = match title.trim() {
            "" => UNTITLED_COLUMN.to_string(),
            trimmed => trimmed.to_string(),
        };
        let siblings: Vec<ColumnRow> = self
            .columns
            .iter()
            .filter(|c| c.board_id == *board_id)
            .cloned()
            .collect();

        let row = ColumnRow {
            id: ColumnId::generate(),
            title,
            order: next_order(&siblings),
            board_id: board_id.clone(),
        };
        self.columns.push(row.clone());
        Ok(row.to_column())
    }

    pub fn update_card(&mut self, id: &CardId, patch: CardPatch) -> Result<Card> {
        if patch.is_empty() {
            return Err(KanbanError::ValidationFailure("Nothing to update".to_string()));
        }
        if let Some(column_id) = &patch.column_id {
            if !self.columns.iter().any(|c| c.id == *column_id) {
                return Err(KanbanError::NotFound(column_id.to_string()));
            }
        }

        let card = self
            .cards
            .iter_mut()
            .find(|c| c.id == *id)
            .ok_or_else(|| KanbanError::NotFound(id.to_string()))?;
        if let Some(title) = patch.title {
            card.title = title;
        }
        if let Some(order) = patch.order {
            card.order = order;
        }
        if let Some(column_id) = patch.column_id {
            card.column_id = column_id;
        }
        Ok(card.clone())
    }

    pub fn update_column(&mut self, id: &ColumnId, patch: ColumnPatch) -> Result<Column> {
        if patch.is_empty() {
            return Err(KanbanError::ValidationFailure("Nothing to update".to_string()));
        }

        let row = self
            .columns
            .iter_mut()
            .find(|c| c.id == *id)
            .ok_or_else(|| KanbanError::NotFound(id.to_string()))?;
        if let Some(title) = patch.title {
            row.title = title;
        }
        if let Some(order) = patch.order {
            row.order = order;
        }

        let mut column = row.to_column();
        column.cards = self.cards_of(id);
        Ok(column)
    }

    /// Deleting a card that is already gone still succeeds
    pub fn delete_card(&mut self, id: &CardId) {
        self.cards.retain(|c| c.id != *id);
    }

    /// Deletes a column and every card currently in it
    pub fn delete_column(&mut self, id: &ColumnId) -> Result<()> {
        if !self.columns.iter().any(|c| c.id == *id) {
            return Err(KanbanError::AlreadyDeleted(id.to_string()));
        }
        self.cards.retain(|c| c.column_id != *id);
        self.columns.retain(|c| c.id != *id);
        Ok(())
    }

    /// Sets `order = index` and `column_id` for every listed card, all or nothing
    pub fn reorder_cards(&mut self, column_id: &ColumnId, ordered_ids: &[CardId]) -> Result<()> {
        if !self.columns.iter().any(|c| c.id == *column_id) {
            return Err(KanbanError::NotFound(column_id.to_string()));
        }
        let known: HashSet<&CardId> = self.cards.iter().map(|c| &c.id).collect();
        if let Some(missing) = ordered_ids.iter().find(|id| !known.contains(id)) {
            return Err(KanbanError::NotFound(missing.to_string()));
        }

        for (index, id) in ordered_ids.iter().enumerate() {
            if let Some(card) = self.cards.iter_mut().find(|c| c.id == *id) {
                card.order = index as u32;
                card.column_id = column_id.clone();
            }
        }
        Ok(())
    }

    /// Sets `order = index` for every listed column of the board, all or nothing
    pub fn reorder_columns(&mut self, board_id: &BoardId, ordered_ids: &[ColumnId]) -> Result<()> {
        if !self.boards.iter().any(|b| b.id == *board_id) {
            return Err(KanbanError::NotFound(board_id.to_string()));
        }
        if let Some(missing) = ordered_ids
            .iter()
            .find(|id| !self.columns.iter().any(|c| c.id == **id && c.board_id == *board_id))
        {
            return Err(KanbanError::NotFound(missing.to_string()));
        }

        for (index, id) in ordered_ids.iter().enumerate() {
            if let Some(row) = self.columns.iter_mut().find(|c| c.id == *id) {
                row.order = index as u32;
            }
        }
        Ok(())
    }

    fn cards_of(&self, column_id: &ColumnId) -> Vec<Card> {
        let mut cards: Vec<Card> = self
            .cards
            .iter()
            .filter(|c| c.column_id == *column_id)
            .cloned()
            .collect();
        sort_by_order(&mut cards);
        cards
    }

    fn assemble(&self, board_id: &BoardId) -> Option<Board> {
        let row = self.boards.iter().find(|b| b.id == *board_id)?;
        let mut rows: Vec<ColumnRow> = self
            .columns
            .iter()
            .filter(|c| c.board_id == *board_id)
            .cloned()
            .collect();
        sort_by_order(&mut rows);

        let mut board = Board::new(row.id.clone(), row.title.clone());
        board.columns = rows
            .iter()
            .map(|r| {
                let mut column = r.to_column();
                column.cards = self.cards_of(&r.id);
                column
            })
            .collect();
        Some(board)
    }
}
