use crate::{
    config::BoardDefaults,
    domain::Board,
    engine::MoveIntent,
    error::{KanbanError, Result},
    storage::Storage,
    store::{OptimisticStore, Snapshot},
    sync::{FailureReceiver, SyncDispatcher, SyncOutcome},
};
use std::sync::Arc;
use tokio::sync::watch;

/// Drives one board on behalf of a presentation layer.
///
/// Moves, renames and deletes are applied to the local snapshot first and
/// persisted in the background. Creates wait for the backend, which assigns
/// ids, and are applied locally once it answers. None of the operations
/// return persistence errors; those arrive on the failure channel returned
/// by [`BoardSession::open`].
pub struct BoardSession {
    store: OptimisticStore,
    dispatcher: SyncDispatcher,
    untitled: String,
}

impl BoardSession {
    /// Loads the board from storage, creating the default board if there is none
    pub async fn open(
        storage: Arc<dyn Storage>,
        defaults: &BoardDefaults,
    ) -> Result<(Self, FailureReceiver)> {
        if !storage.is_initialized().await {
            storage.initialize().await?;
        }

        let board = match storage.load_board().await {
            Ok(board) => board,
            Err(KanbanError::BoardNotInitialized) => {
                tracing::info!(title = %defaults.title, "No board found, creating default board");
                storage.create_board(&defaults.title, &defaults.columns).await?
            }
            Err(err) => return Err(err),
        };
        tracing::info!(
            board_id = %board.id,
            columns = board.columns.len(),
            cards = board.card_count(),
            "Board loaded"
        );

        let (dispatcher, failures) = SyncDispatcher::new(storage);
        let session = Self {
            store: OptimisticStore::new(board),
            dispatcher,
            untitled: defaults.untitled.clone(),
        };
        Ok((session, failures))
    }

    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.store.snapshot()
    }

    pub fn board(&self) -> &Board {
        self.store.board()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.store.subscribe()
    }

    /// Handles a drop of `item_id` over `over_id`. Returns whether the board changed.
    pub fn move_item(&mut self, item_id: &str, over_id: &str) -> bool {
        let groups = self.store.apply_move(&MoveIntent::new(item_id, over_id));
        if groups.is_empty() {
            return false;
        }
        self.dispatcher.persist(groups);
        true
    }

    pub fn rename(&mut self, item_id: &str, title: &str) -> bool {
        match self.store.apply_rename(item_id, title) {
            Some(item) => {
                self.dispatcher.persist_rename(item, title.to_string());
                true
            }
            None => false,
        }
    }

    pub fn delete(&mut self, item_id: &str) -> bool {
        match self.store.apply_delete(item_id) {
            Some(deletion) => {
                self.dispatcher.persist_delete(deletion);
                true
            }
            None => false,
        }
    }

    /// Creates a card at the end of a column; `None` when the backend refused
    pub async fn create_card(&mut self, column_id: &str, title: &str) -> Option<u32> {
        let column_id = self.store.board().column(column_id)?.id.clone();
        let card = self.dispatcher.create_card(&column_id, title).await?;
        self.store.apply_create_card(&column_id, card)
    }

    /// Creates a column at the end of the board; `None` when the backend refused.
    /// A blank title is replaced by the configured untitled title.
    pub async fn create_column(&mut self, title: &str) -> Option<u32> {
        let title = match title.trim() {
            "" => self.untitled.as_str(),
            trimmed => trimmed,
        };
        let board_id = self.store.board().id.clone();
        let column = self.dispatcher.create_column(&board_id, title).await?;
        self.store.apply_create_column(&board_id, column)
    }

    /// Replaces local state with what is persisted, discarding any divergence
    pub async fn reload(&mut self) -> Result<()> {
        self.settle().await;
        let board = self.dispatcher.storage().load_board().await?;
        tracing::info!(board_id = %board.id, "Board reloaded from storage");
        self.store.replace(board);
        Ok(())
    }

    /// Waits for all in-flight persistence calls
    pub async fn settle(&mut self) -> Vec<SyncOutcome> {
        self.dispatcher.settle().await
    }
}
