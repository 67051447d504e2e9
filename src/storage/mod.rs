use crate::{
    domain::{Board, BoardId, Card, CardId, CardPatch, Column, ColumnId, ColumnPatch},
    error::Result,
};
use async_trait::async_trait;

#[cfg(feature = "file-storage")]
pub mod file_storage;
pub mod memory;
pub mod tables;

#[cfg(feature = "sqlite-storage")]
pub mod sqlite_storage;

#[cfg(test)]
pub(crate) mod flaky;

#[cfg(feature = "file-storage")]
pub use file_storage::FileStorage;
pub use memory::InMemoryStorage;
#[cfg(feature = "sqlite-storage")]
pub use sqlite_storage::SqliteStorage;

/// Persistence boundary for boards, columns and cards
///
/// Backends assign ids and initial order values; the reorder calls take a
/// complete ordered id list so that a later call always supersedes an
/// earlier one for the same container.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Initializes the storage backend
    async fn initialize(&self) -> Result<()>;

    /// Checks if the backend has been initialized
    async fn is_initialized(&self) -> bool;

    /// Creates a board seeded with the given columns (orders 0..n)
    async fn create_board(&self, title: &str, column_titles: &[String]) -> Result<Board>;

    /// Loads the first board with nested columns and cards, ascending by order
    async fn load_board(&self) -> Result<Board>;

    /// Creates a card at the end of a column (order = current max + 1, or 0)
    async fn create_card(&self, column_id: &ColumnId, title: &str) -> Result<Card>;

    /// Creates a column at the end of a board (order = current max + 1, or 0)
    async fn create_column(&self, board_id: &BoardId, title: &str) -> Result<Column>;

    /// Partial update; fails when the patch carries no field
    async fn update_card(&self, id: &CardId, patch: CardPatch) -> Result<Card>;

    /// Partial update; fails when the patch carries no field
    async fn update_column(&self, id: &ColumnId, patch: ColumnPatch) -> Result<Column>;

    /// Deletes a card; deleting an absent card succeeds
    async fn delete_card(&self, id: &CardId) -> Result<()>;

    /// Deletes a column together with its cards
    async fn delete_column(&self, id: &ColumnId) -> Result<()>;

    /// Sets `order = index` and `column_id` for every listed card in one batch
    async fn reorder_cards(&self, column_id: &ColumnId, ordered_ids: &[CardId]) -> Result<()>;

    /// Sets `order = index` for every listed column of the board in one batch
    async fn reorder_columns(&self, board_id: &BoardId, ordered_ids: &[ColumnId]) -> Result<()>;
}
