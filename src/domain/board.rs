use crate::domain::{
    card::Card,
    column::Column,
    ids::{BoardId, ColumnId},
    order::{is_contiguous, renumber, sort_by_order},
};
use serde::{Deserialize, Serialize};

/// Column titles a freshly created board starts with
pub const DEFAULT_COLUMNS: [&str; 3] = ["To Do", "In Progress", "Done"];

/// Title given to a column created without one
pub const UNTITLED_COLUMN: &str = "Untitled";

/// Kanban board state: the root aggregate owning columns and, through them, cards
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    pub id: BoardId,
    pub title: String,
    #[serde(default)]
    pub columns: Vec<Column>,
}

impl Board {
    pub fn new(id: BoardId, title: String) -> Self {
        Self {
            id,
            title,
            columns: Vec::new(),
        }
    }

    /// Position of a column within the board
    pub fn column_index(&self, id: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.id.as_str() == id)
    }

    pub fn column(&self, id: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.id.as_str() == id)
    }

    pub fn column_mut(&mut self, id: &str) -> Option<&mut Column> {
        self.columns.iter_mut().find(|c| c.id.as_str() == id)
    }

    /// Finds a card, returning the index of its column and its index within that column
    pub fn locate_card(&self, id: &str) -> Option<(usize, usize)> {
        self.columns
            .iter()
            .enumerate()
            .find_map(|(col_idx, col)| col.card_index(id).map(|card_idx| (col_idx, card_idx)))
    }

    pub fn card(&self, id: &str) -> Option<&Card> {
        self.locate_card(id)
            .map(|(col_idx, card_idx)| &self.columns[col_idx].cards[card_idx])
    }

    pub fn column_ids(&self) -> Vec<ColumnId> {
        self.columns.iter().map(|c| c.id.clone()).collect()
    }

    pub fn card_count(&self) -> usize {
        self.columns.iter().map(|c| c.cards.len()).sum()
    }

    /// Sorts columns and cards by their stored order, renumbers both levels
    /// and repairs back-references, so the result is settled
    pub fn normalized(mut self) -> Self {
        sort_by_order(&mut self.columns);
        renumber(&mut self.columns);
        for column in &mut self.columns {
            column.board_id = self.id.clone();
            sort_by_order(&mut column.cards);
            renumber(&mut column.cards);
            for card in &mut column.cards {
                card.column_id = column.id.clone();
            }
        }
        self
    }

    /// Checks the settled-state invariants: contiguous order values at both
    /// levels and back-references that match ownership
    pub fn is_settled(&self) -> bool {
        is_contiguous(&self.columns)
            && self.columns.iter().all(|col| {
                col.board_id == self.id
                    && is_contiguous(&col.cards)
                    && col.cards.iter().all(|card| card.column_id == col.id)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ids::CardId;

    fn sample_board() -> Board {
        let board_id = BoardId::new("b");
        let mut board = Board::new(board_id.clone(), "Sample".to_string());
        for name in ["todo", "doing"] {
            board.columns.push(Column::new(
                ColumnId::new(name),
                name.to_string(),
                board_id.clone(),
            ));
        }
        renumber(&mut board.columns);
        let todo = &mut board.columns[0];
        for name in ["t1", "t2"] {
            todo.cards
                .push(Card::new(CardId::new(name), name.to_string(), todo.id.clone()));
        }
        renumber(&mut todo.cards);
        board
    }

    #[test]
    fn test_locate_card() {
        let board = sample_board();

        assert_eq!(board.locate_card("t2"), Some((0, 1)));
        assert_eq!(board.locate_card("missing"), None);
        assert_eq!(board.card("t1").map(|c| c.title.as_str()), Some("t1"));
    }

    #[test]
    fn test_column_lookup() {
        let board = sample_board();

        assert_eq!(board.column_index("doing"), Some(1));
        assert!(board.column("nope").is_none());
        assert_eq!(board.card_count(), 2);
    }

    #[test]
    fn test_is_settled() {
        let mut board = sample_board();
        assert!(board.is_settled());

        board.columns[0].cards[1].order = 5;
        assert!(!board.is_settled());

        let mut board = sample_board();
        board.columns[0].cards[0].column_id = ColumnId::new("doing");
        assert!(!board.is_settled());
    }

    #[test]
    fn test_normalized_repairs_gaps_and_order() {
        let mut board = sample_board();
        board.columns[0].order = 7;
        board.columns[1].order = 3;
        board.columns[0].cards[0].order = 10;
        board.columns[0].cards[1].order = 4;

        let board = board.normalized();

        assert!(board.is_settled());
        assert_eq!(board.columns[0].id.as_str(), "doing");
        assert_eq!(board.columns[1].cards[0].id.as_str(), "t2");
    }
}
