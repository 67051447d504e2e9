use crate::{
    domain::{Board, BoardId, Card, CardId, CardPatch, Column, ColumnId, ColumnPatch},
    error::{KanbanError, Result},
    storage::{InMemoryStorage, Storage},
};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Wraps an in-memory backend and fails calls that touch chosen ids
pub(crate) struct FlakyStorage {
    inner: Arc<InMemoryStorage>,
    failing: Mutex<HashSet<String>>,
    rejecting: Mutex<HashSet<String>>,
}

impl FlakyStorage {
    pub fn new(inner: Arc<InMemoryStorage>) -> Self {
        Self {
            inner,
            failing: Mutex::new(HashSet::new()),
            rejecting: Mutex::new(HashSet::new()),
        }
    }

    /// Calls scoped to `id` fail with a transient I/O error
    pub async fn fail_on(&self, id: &str) {
        self.failing.lock().await.insert(id.to_string());
    }

    /// Calls scoped to `id` fail validation
    pub async fn reject_on(&self, id: &str) {
        self.rejecting.lock().await.insert(id.to_string());
    }

    pub async fn heal(&self) {
        self.failing.lock().await.clear();
        self.rejecting.lock().await.clear();
    }

    async fn check(&self, id: &str) -> Result<()> {
        if self.failing.lock().await.contains(id) {
            return Err(KanbanError::TransientIo(format!("connection reset while writing {}", id)));
        }
        if self.rejecting.lock().await.contains(id) {
            return Err(KanbanError::ValidationFailure(format!("rejected {}", id)));
        }
        Ok(())
    }
}

#[async_trait]
impl Storage for FlakyStorage {
    async fn initialize(&self) -> Result<()> {
        self.inner.initialize().await
    }

    async fn is_initialized(&self) -> bool {
        self.inner.is_initialized().await
    }

    async fn create_board(&self, title: &str, column_titles: &[String]) -> Result<Board> {
        self.inner.create_board(title, column_titles).await
    }

    async fn load_board(&self) -> Result<Board> {
        self.inner.load_board().await
    }

    async fn create_card(&self, column_id: &ColumnId, title: &str) -> Result<Card> {
        self.check(column_id.as_str()).await?;
        self.inner.create_card(column_id, title).await
    }

    async fn create_column(&self, board_id: &BoardId, title: &str) -> Result<Column> {
        self.check(board_id.as_str()).await?;
        self.inner.create_column(board_id, title).await
    }

    async fn update_card(&self, id: &CardId, patch: CardPatch) -> Result<Card> {
        self.check(id.as_str()).await?;
        self.inner.update_card(id, patch).await
    }

    async fn update_column(&self, id: &ColumnId, patch: ColumnPatch) -> Result<Column> {
        self.check(id.as_str()).await?;
        self.inner.update_column(id, patch).await
    }

    async fn delete_card(&self, id: &CardId) -> Result<()> {
        self.check(id.as_str()).await?;
        self.inner.delete_card(id).await
    }

    async fn delete_column(&self, id: &ColumnId) -> Result<()> {
        self.check(id.as_str()).await?;
        self.inner.delete_column(id).await
    }

    async fn reorder_cards(&self, column_id: &ColumnId, ordered_ids: &[CardId]) -> Result<()> {
        self.check(column_id.as_str()).await?;
        self.inner.reorder_cards(column_id, ordered_ids).await
    }

    async fn reorder_columns(&self, board_id: &BoardId, ordered_ids: &[ColumnId]) -> Result<()> {
        self.check(board_id.as_str()).await?;
        self.inner.reorder_columns(board_id, ordered_ids).await
    }
}
