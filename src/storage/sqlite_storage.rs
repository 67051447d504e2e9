use crate::{
    domain::{
        Board, BoardId, Card, CardId, CardPatch, Column, ColumnId, ColumnPatch, UNTITLED_COLUMN,
    },
    error::{KanbanError, Result},
    storage::Storage,
};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use tokio::sync::Mutex;

const SCHEMA: &str = "
    PRAGMA foreign_keys = ON;
    CREATE TABLE IF NOT EXISTS boards (
        id TEXT PRIMARY KEY,
        title TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS columns (
        id TEXT PRIMARY KEY,
        title TEXT NOT NULL,
        position INTEGER NOT NULL,
        board_id TEXT NOT NULL REFERENCES boards(id) ON DELETE CASCADE
    );
    CREATE TABLE IF NOT EXISTS cards (
        id TEXT PRIMARY KEY,
        title TEXT NOT NULL,
        body TEXT,
        position INTEGER NOT NULL,
        column_id TEXT NOT NULL REFERENCES columns(id) ON DELETE CASCADE
    );
";

/// SQLite-based storage backend for boards, columns and cards
pub struct SqliteStorage {
    connection: Mutex<Connection>,
}

impl SqliteStorage {
    /// Opens (or creates) a database file
    pub fn new(database_path: impl AsRef<Path>) -> Result<Self> {
        let connection = Connection::open(database_path)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    /// Opens a private in-memory database
    pub fn open_in_memory() -> Result<Self> {
        let connection = Connection::open_in_memory()?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }
}

fn column_exists(conn: &Connection, id: &str) -> Result<bool> {
    let found: Option<i64> = conn
        .query_row("SELECT 1 FROM columns WHERE id = ?1", params![id], |row| row.get(0))
        .optional()?;
    Ok(found.is_some())
}

fn board_exists(conn: &Connection, id: &str) -> Result<bool> {
    let found: Option<i64> = conn
        .query_row("SELECT 1 FROM boards WHERE id = ?1", params![id], |row| row.get(0))
        .optional()?;
    Ok(found.is_some())
}

fn read_card(conn: &Connection, id: &str) -> Result<Option<Card>> {
    let card = conn
        .query_row(
            "SELECT id, title, body, position, column_id FROM cards WHERE id = ?1",
            params![id],
            |row| {
                Ok(Card {
                    id: CardId::new(row.get::<_, String>(0)?),
                    title: row.get(1)?,
                    body: row.get(2)?,
                    order: row.get(3)?,
                    column_id: ColumnId::new(row.get::<_, String>(4)?),
                })
            },
        )
        .optional()?;
    Ok(card)
}

fn read_cards(conn: &Connection, column_id: &str) -> Result<Vec<Card>> {
    let mut stmt = conn.prepare(
        "SELECT id, title, body, position, column_id FROM cards
         WHERE column_id = ?1 ORDER BY position ASC",
    )?;
    let cards = stmt
        .query_map(params![column_id], |row| {
            Ok(Card {
                id: CardId::new(row.get::<_, String>(0)?),
                title: row.get(1)?,
                body: row.get(2)?,
                order: row.get(3)?,
                column_id: ColumnId::new(row.get::<_, String>(4)?),
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(cards)
}

fn read_column(conn: &Connection, id: &str) -> Result<Option<Column>> {
    let column = conn
        .query_row(
            "SELECT id, title, position, board_id FROM columns WHERE id = ?1",
            params![id],
            |row| {
                Ok(Column {
                    id: ColumnId::new(row.get::<_, String>(0)?),
                    title: row.get(1)?,
                    order: row.get(2)?,
                    board_id: BoardId::new(row.get::<_, String>(3)?),
                    cards: Vec::new(),
                })
            },
        )
        .optional()?;
    match column {
        Some(mut column) => {
            column.cards = read_cards(conn, id)?;
            Ok(Some(column))
        }
        None => Ok(None),
    }
}

fn read_board(conn: &Connection, board_id: &str) -> Result<Board> {
    let title: String = conn
        .query_row("SELECT title FROM boards WHERE id = ?1", params![board_id], |row| {
            row.get(0)
        })
        .optional()?
        .ok_or(KanbanError::BoardNotInitialized)?;

    let mut stmt = conn.prepare(
        "SELECT id FROM columns WHERE board_id = ?1 ORDER BY position ASC",
    )?;
    let column_ids = stmt
        .query_map(params![board_id], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut board = Board::new(BoardId::new(board_id), title);
    for id in column_ids {
        if let Some(column) = read_column(conn, &id)? {
            board.columns.push(column);
        }
    }
    Ok(board)
}

#[async_trait]
impl Storage for SqliteStorage {
    async fn initialize(&self) -> Result<()> {
        let conn = self.connection.lock().await;
        conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    async fn is_initialized(&self) -> bool {
        let conn = self.connection.lock().await;
        conn.query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'boards'",
            [],
            |row| row.get::<_, i64>(0),
        )
        .optional()
        .map(|found| found.is_some())
        .unwrap_or(false)
    }

    async fn create_board(&self, title: &str, column_titles: &[String]) -> Result<Board> {
        let mut conn = self.connection.lock().await;
        let board_id = BoardId::generate();

        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO boards (id, title) VALUES (?1, ?2)",
            params![board_id.as_str(), title],
        )?;
        for (position, column_title) in column_titles.iter().enumerate() {
            tx.execute(
                "INSERT INTO columns (id, title, position, board_id) VALUES (?1, ?2, ?3, ?4)",
                params![
                    ColumnId::generate().as_str(),
                    column_title,
                    position as u32,
                    board_id.as_str()
                ],
            )?;
        }
        tx.commit()?;

        read_board(&conn, board_id.as_str())
    }

    async fn load_board(&self) -> Result<Board> {
        let conn = self.connection.lock().await;
        let first: String = conn
            .query_row("SELECT id FROM boards ORDER BY rowid ASC LIMIT 1", [], |row| {
                row.get(0)
            })
            .optional()?
            .ok_or(KanbanError::BoardNotInitialized)?;
        read_board(&conn, &first)
    }

    async fn create_card(&self, column_id: &ColumnId, title: &str) -> Result<Card> {
        if title.trim().is_empty() {
            return Err(KanbanError::ValidationFailure(
                "columnId and title are required".to_string(),
            ));
        }
        let conn = self.connection.lock().await;
        if !column_exists(&conn, column_id.as_str())? {
            return Err(KanbanError::NotFound(column_id.to_string()));
        }

        let order: u32 = conn.query_row(
            "SELECT COALESCE(MAX(position) + 1, 0) FROM cards WHERE column_id = ?1",
            params![column_id.as_str()],
            |row| row.get(0),
        )?;
        let mut card = Card::new(CardId::generate(), title.to_string(), column_id.clone());
        card.order = order;

        conn.execute(
            "INSERT INTO cards (id, title, body, position, column_id) VALUES (?1, ?2, NULL, ?3, ?4)",
            params![card.id.as_str(), card.title, card.order, column_id.as_str()],
        )?;
        Ok(card)
    }

    async fn create_column(&self, board_id: &BoardId, title: &str) -> Result<Column> {
        let conn = self.connection.lock().await;
        if !board_exists(&conn, board_id.as_str())? {
            return Err(KanbanError::NotFound(board_id.to_string()));
        }

        let title = match title.trim() {
            "" => UNTITLED_COLUMN.to_string(),
            trimmed => trimmed.to_string(),
        };
        let order: u32 = conn.query_row(
            "SELECT COALESCE(MAX(position) + 1, 0) FROM columns WHERE board_id = ?1",
            params![board_id.as_str()],
            |row| row.get(0),
        )?;
        let mut column = Column::new(ColumnId::generate(), title, board_id.clone());
        column.order = order;

        conn.execute(
            "INSERT INTO columns (id, title, position, board_id) VALUES (?1, ?2, ?3, ?4)",
            params![column.id.as_str(), column.title, column.order, board_id.as_str()],
        )?;
        Ok(column)
    }

    async fn update_card(&self, id: &CardId, patch: CardPatch) -> Result<Card> {
        if patch.is_empty() {
            return Err(KanbanError::ValidationFailure("Nothing to update".to_string()));
        }
        let conn = self.connection.lock().await;
        if let Some(column_id) = &patch.column_id {
            if !column_exists(&conn, column_id.as_str())? {
                return Err(KanbanError::NotFound(column_id.to_string()));
            }
        }

        let mut card = read_card(&conn, id.as_str())?
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

        conn.execute(
            "UPDATE cards SET title = ?2, position = ?3, column_id = ?4 WHERE id = ?1",
            params![card.id.as_str(), card.title, card.order, card.column_id.as_str()],
        )?;
        Ok(card)
    }

    async fn update_column(&self, id: &ColumnId, patch: ColumnPatch) -> Result<Column> {
        if patch.is_empty() {
            return Err(KanbanError::ValidationFailure("Nothing to update".to_string()));
        }
        let conn = self.connection.lock().await;

        let mut column = read_column(&conn, id.as_str())?
            .ok_or_else(|| KanbanError::NotFound(id.to_string()))?;
        if let Some(title) = patch.title {
            column.title = title;
        }
        if let Some(order) = patch.order {
            column.order = order;
        }

        conn.execute(
            "UPDATE columns SET title = ?2, position = ?3 WHERE id = ?1",
            params![column.id.as_str(), column.title, column.order],
        )?;
        Ok(column)
    }

    async fn delete_card(&self, id: &CardId) -> Result<()> {
        let conn = self.connection.lock().await;
        conn.execute("DELETE FROM cards WHERE id = ?1", params![id.as_str()])?;
        Ok(())
    }

    async fn delete_column(&self, id: &ColumnId) -> Result<()> {
        let mut conn = self.connection.lock().await;
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM cards WHERE column_id = ?1", params![id.as_str()])?;
        let removed = tx.execute("DELETE FROM columns WHERE id = ?1", params![id.as_str()])?;
        if removed == 0 {
            return Err(KanbanError::AlreadyDeleted(id.to_string()));
        }
        tx.commit()?;
        Ok(())
    }

    async fn reorder_cards(&self, column_id: &ColumnId, ordered_ids: &[CardId]) -> Result<()> {
        let mut conn = self.connection.lock().await;
        if !column_exists(&conn, column_id.as_str())? {
            return Err(KanbanError::NotFound(column_id.to_string()));
        }

        let tx = conn.transaction()?;
        for (index, id) in ordered_ids.iter().enumerate() {
            let updated = tx.execute(
                "UPDATE cards SET position = ?2, column_id = ?3 WHERE id = ?1",
                params![id.as_str(), index as u32, column_id.as_str()],
            )?;
            if updated == 0 {
                return Err(KanbanError::NotFound(id.to_string()));
            }
        }
        tx.commit()?;
        Ok(())
    }

    async fn reorder_columns(&self, board_id: &BoardId, ordered_ids: &[ColumnId]) -> Result<()> {
        let mut conn = self.connection.lock().await;
        if !board_exists(&conn, board_id.as_str())? {
            return Err(KanbanError::NotFound(board_id.to_string()));
        }

        let tx = conn.transaction()?;
        for (index, id) in ordered_ids.iter().enumerate() {
            let updated = tx.execute(
                "UPDATE columns SET position = ?2 WHERE id = ?1 AND board_id = ?3",
                params![id.as_str(), index as u32, board_id.as_str()],
            )?;
            if updated == 0 {
                return Err(KanbanError::NotFound(id.to_string()));
            }
        }
        tx.commit()?;
        Ok(())
    }
}
