use crate::{
    domain::{Board, BoardId, Card, CardId, CardPatch, Column, ColumnId, ColumnPatch},
    error::Result,
    storage::{tables::Tables, Storage},
};
use async_trait::async_trait;
use tokio::sync::RwLock;

/// Process-local storage, handy for tests and for running without a backend
#[derive(Default)]
pub struct InMemoryStorage {
    tables: RwLock<Tables>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the raw rows, for inspecting what was persisted
    pub async fn tables(&self) -> Tables {
        self.tables.read().await.clone()
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn initialize(&self) -> Result<()> {
        Ok(())
    }

    async fn is_initialized(&self) -> bool {
        true
    }

    async fn create_board(&self, title: &str, column_titles: &[String]) -> Result<Board> {
        Ok(self.tables.write().await.create_board(title, column_titles))
    }

    async fn load_board(&self) -> Result<Board> {
        self.tables.read().await.load_board()
    }

    async fn create_card(&self, column_id: &ColumnId, title: &str) -> Result<Card> {
        self.tables.write().await.create_card(column_id, title)
    }

    async fn create_column(&self, board_id: &BoardId, title: &str) -> Result<Column> {
        self.tables.write().await.create_column(board_id, title)
    }

    async fn update_card(&self, id: &CardId, patch: CardPatch) -> Result<Card> {
        self.tables.write().await.update_card(id, patch)
    }

    async fn update_column(&self, id: &ColumnId, patch: ColumnPatch) -> Result<Column> {
        self.tables.write().await.update_column(id, patch)
    }

    async fn delete_card(&self, id: &CardId) -> Result<()> {
        self.tables.write().await.delete_card(id);
        Ok(())
    }

    async fn delete_column(&self, id: &ColumnId) -> Result<()> {
        self.tables.write().await.delete_column(id)
    }

    async fn reorder_cards(&self, column_id: &ColumnId, ordered_ids: &[CardId]) -> Result<()> {
        self.tables.write().await.reorder_cards(column_id, ordered_ids)
    }

    async fn reorder_columns(&self, board_id: &BoardId, ordered_ids: &[ColumnId]) -> Result<()> {
        self.tables.write().await.reorder_columns(board_id, ordered_ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::KanbanError;

    #[tokio::test]
    async fn test_memory_roundtrip() {
        let storage = InMemoryStorage::new();
        assert!(matches!(
            storage.load_board().await,
            Err(KanbanError::BoardNotInitialized)
        ));

        let board = storage
            .create_board("Main", &["To Do".to_string()])
            .await
            .unwrap();
        let card = storage
            .create_card(&board.columns[0].id, "Write tests")
            .await
            .unwrap();

        let loaded = storage.load_board().await.unwrap();
        assert_eq!(loaded.columns[0].cards, vec![card]);
    }

    #[tokio::test]
    async fn test_delete_card_is_idempotent() {
        let storage = InMemoryStorage::new();
        storage.delete_card(&CardId::new("never-existed")).await.unwrap();
        assert!(storage.tables().await.cards.is_empty());
    }
}
