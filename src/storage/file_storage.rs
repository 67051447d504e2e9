use crate::{
    domain::{Board, BoardId, Card, CardId, CardPatch, Column, ColumnId, ColumnPatch},
    error::{KanbanError, Result},
    storage::{tables::Tables, Storage},
};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::{fs, sync::Mutex};

/// File-based storage implementation
///
/// All rows live in a single JSON document. Every mutation is a
/// read-modify-write cycle guarded by a mutex, so concurrent persistence
/// calls from the same process never interleave.
pub struct FileStorage {
    root_path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStorage {
    const KANBAN_DIR: &'static str = ".kanban";
    const BOARD_FILE: &'static str = "board.json";

    /// Creates a new FileStorage instance for the given project root
    pub fn new(project_root: impl AsRef<Path>) -> Self {
        Self {
            root_path: project_root.as_ref().join(Self::KANBAN_DIR),
            write_lock: Mutex::new(()),
        }
    }

    fn board_file(&self) -> PathBuf {
        self.root_path.join(Self::BOARD_FILE)
    }

    async fn ensure_directory_exists(&self, path: &Path) -> Result<()> {
        if !path.exists() {
            fs::create_dir_all(path).await?;
        }
        Ok(())
    }

    async fn read_tables(&self) -> Result<Tables> {
        let board_file = self.board_file();

        if !board_file.exists() {
            return Err(KanbanError::BoardNotInitialized);
        }

        let contents = fs::read_to_string(&board_file).await?;
        let tables: Tables = serde_json::from_str(&contents)?;

        Ok(tables)
    }

    async fn write_tables(&self, tables: &Tables) -> Result<()> {
        self.ensure_directory_exists(&self.root_path).await?;

        let json = serde_json::to_string_pretty(tables)?;
        fs::write(self.board_file(), json).await?;

        Ok(())
    }

    /// Runs `op` against the stored rows and writes them back if it succeeds
    async fn mutate<T>(&self, op: impl FnOnce(&mut Tables) -> Result<T> + Send) -> Result<T> {
        let _guard = self.write_lock.lock().await;
        let mut tables = self.read_tables().await?;
        let value = op(&mut tables)?;
        self.write_tables(&tables).await?;
        Ok(value)
    }
}

#[async_trait]
impl Storage for FileStorage {
    async fn initialize(&self) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        self.ensure_directory_exists(&self.root_path).await?;

        if !self.board_file().exists() {
            self.write_tables(&Tables::default()).await?;
        }

        let gitignore_path = self.root_path.join(".gitignore");
        if !gitignore_path.exists() {
            fs::write(gitignore_path, "# Local caches\n*.db\n*.db-*\n").await?;
        }

        Ok(())
    }

    async fn is_initialized(&self) -> bool {
        self.root_path.exists() && self.board_file().exists()
    }

    async fn create_board(&self, title: &str, column_titles: &[String]) -> Result<Board> {
        self.mutate(|tables| Ok(tables.create_board(title, column_titles)))
            .await
    }

    async fn load_board(&self) -> Result<Board> {
        self.read_tables().await?.load_board()
    }

    async fn create_card(&self, column_id: &ColumnId, title: &str) -> Result<Card> {
        self.mutate(|tables| tables.create_card(column_id, title)).await
    }

    async fn create_column(&self, board_id: &BoardId, title: &str) -> Result<Column> {
        self.mutate(|tables| tables.create_column(board_id, title)).await
    }

    async fn update_card(&self, id: &CardId, patch: CardPatch) -> Result<Card> {
        self.mutate(|tables| tables.update_card(id, patch)).await
    }

    async fn update_column(&self, id: &ColumnId, patch: ColumnPatch) -> Result<Column> {
        self.mutate(|tables| tables.update_column(id, patch)).await
    }

    async fn delete_card(&self, id: &CardId) -> Result<()> {
        self.mutate(|tables| {
            tables.delete_card(id);
            Ok(())
        })
        .await
    }

    async fn delete_column(&self, id: &ColumnId) -> Result<()> {
        self.mutate(|tables| tables.delete_column(id)).await
    }

    async fn reorder_cards(&self, column_id: &ColumnId, ordered_ids: &[CardId]) -> Result<()> {
        self.mutate(|tables| tables.reorder_cards(column_id, ordered_ids))
            .await
    }

    async fn reorder_columns(&self, board_id: &BoardId, ordered_ids: &[ColumnId]) -> Result<()> {
        self.mutate(|tables| tables.reorder_columns(board_id, ordered_ids))
            .await
    }
}
