//! In-process optimistic board state.
//!
//! The store owns one immutable [`Snapshot`] at a time. Every mutation builds
//! a new board, wraps it in a new snapshot with the next version number and
//! notifies subscribers before returning. Nothing here waits on persistence.

use crate::{
    domain::{order::renumber, Board, BoardId, Card, Column, ColumnId},
    engine::{
        compute_move, compute_placement, AffectedGroup, ItemRef, MoveIntent, MoveOutcome,
        Placement,
    },
};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::watch;

/// A versioned, immutable view of the board
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub version: u64,
    pub board: Board,
    pub taken_at: DateTime<Utc>,
}

/// What a delete removed, and the renumbered container it was removed from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deletion {
    pub item: ItemRef,
    pub remaining: AffectedGroup,
}

pub struct OptimisticStore {
    current: Arc<Snapshot>,
    notifier: watch::Sender<Arc<Snapshot>>,
}

impl OptimisticStore {
    /// Creates a store from a board loaded from persistence.
    ///
    /// The board is normalized first, so gaps left in stored order values
    /// never reach the presentation layer.
    pub fn new(board: Board) -> Self {
        let snapshot = Arc::new(Snapshot {
            version: 0,
            board: board.normalized(),
            taken_at: Utc::now(),
        });
        let (notifier, _) = watch::channel(Arc::clone(&snapshot));
        Self {
            current: snapshot,
            notifier,
        }
    }

    /// Returns the current snapshot
    pub fn snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&self.current)
    }

    pub fn board(&self) -> &Board {
        &self.current.board
    }

    pub fn version(&self) -> u64 {
        self.current.version
    }

    /// Receiver that observes every snapshot replacement
    pub fn subscribe(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.notifier.subscribe()
    }

    /// Applies a drag-and-drop move, returning the groups that must be re-persisted.
    /// An unresolvable or redundant move returns no groups and leaves the snapshot alone.
    pub fn apply_move(&mut self, intent: &MoveIntent) -> Vec<AffectedGroup> {
        let outcome = compute_move(self.board(), intent);
        self.commit_move(outcome, intent.item_id.as_str())
    }

    /// Like [`apply_move`](Self::apply_move) with an already-resolved destination
    pub fn apply_placement(&mut self, item: &ItemRef, placement: Placement) -> Vec<AffectedGroup> {
        let outcome = compute_placement(self.board(), item, placement);
        self.commit_move(outcome, item.as_str())
    }

    /// Appends a card to a column with order = current number of cards.
    /// Returns the assigned order, or `None` when the column is unknown or
    /// the card id is already on the board.
    pub fn apply_create_card(&mut self, column_id: &ColumnId, mut card: Card) -> Option<u32> {
        if self.board().card(card.id.as_str()).is_some() {
            tracing::warn!(card_id = %card.id, "Card already on board, ignoring create");
            return None;
        }

        let mut board = self.board().clone();
        let Some(column) = board.column_mut(column_id.as_str()) else {
            tracing::warn!(column_id = %column_id, "Create card in unknown column");
            return None;
        };

        let order = column.cards.len() as u32;
        card.order = order;
        card.column_id = column_id.clone();
        tracing::info!(card_id = %card.id, column_id = %column_id, order, "Card created");
        column.cards.push(card);

        self.commit(board);
        Some(order)
    }

    /// Appends a column to the board with order = current number of columns
    pub fn apply_create_column(&mut self, board_id: &BoardId, mut column: Column) -> Option<u32> {
        if self.board().id != *board_id {
            tracing::warn!(board_id = %board_id, "Create column on unknown board");
            return None;
        }
        if self.board().column(column.id.as_str()).is_some() {
            tracing::warn!(column_id = %column.id, "Column already on board, ignoring create");
            return None;
        }

        let mut board = self.board().clone();
        let order = board.columns.len() as u32;
        column.order = order;
        column.board_id = board_id.clone();
        for card in &mut column.cards {
            card.column_id = column.id.clone();
        }
        renumber(&mut column.cards);
        tracing::info!(column_id = %column.id, order, "Column created");
        board.columns.push(column);

        self.commit(board);
        Some(order)
    }

    /// Removes a card or a column (with its cards) and renumbers the siblings left behind
    pub fn apply_delete(&mut self, item_id: &str) -> Option<Deletion> {
        let mut board = self.board().clone();

        let deletion = if let Some((col_idx, card_idx)) = board.locate_card(item_id) {
            let column = &mut board.columns[col_idx];
            let card = column.cards.remove(card_idx);
            renumber(&mut column.cards);
            Deletion {
                item: ItemRef::Card(card.id),
                remaining: AffectedGroup::cards_of(column),
            }
        } else if let Some(col_idx) = board.column_index(item_id) {
            let column = board.columns.remove(col_idx);
            renumber(&mut board.columns);
            Deletion {
                item: ItemRef::Column(column.id),
                remaining: AffectedGroup::columns_of(&board),
            }
        } else {
            tracing::debug!(item_id, "Delete of unknown item ignored");
            return None;
        };

        tracing::info!(item = %deletion.item, "Item deleted");
        self.commit(board);
        Some(deletion)
    }

    /// Renames a card or a column
    pub fn apply_rename(&mut self, item_id: &str, title: impl Into<String>) -> Option<ItemRef> {
        let title = title.into();
        let mut board = self.board().clone();

        let item = if let Some((col_idx, card_idx)) = board.locate_card(item_id) {
            let card = &mut board.columns[col_idx].cards[card_idx];
            card.set_title(title);
            ItemRef::Card(card.id.clone())
        } else if let Some(column) = board.column_mut(item_id) {
            column.set_title(title);
            ItemRef::Column(column.id.clone())
        } else {
            tracing::debug!(item_id, "Rename of unknown item ignored");
            return None;
        };

        tracing::info!(item = %item, "Item renamed");
        self.commit(board);
        Some(item)
    }

    /// Replaces the whole board, e.g. after reloading from persistence
    pub fn replace(&mut self, board: Board) {
        self.commit(board.normalized());
    }

    fn commit_move(&mut self, outcome: MoveOutcome, item_id: &str) -> Vec<AffectedGroup> {
        match outcome {
            MoveOutcome::Moved { board, affected } => {
                tracing::info!(item_id, groups = affected.len(), "Move applied");
                self.commit(board);
                affected
            }
            MoveOutcome::Unchanged(reason) => {
                tracing::debug!(item_id, %reason, "Move ignored");
                Vec::new()
            }
        }
    }

    fn commit(&mut self, board: Board) {
        let snapshot = Arc::new(Snapshot {
            version: self.current.version + 1,
            board,
            taken_at: Utc::now(),
        });
        self.current = Arc::clone(&snapshot);
        self.notifier.send_replace(snapshot);
    }
}
