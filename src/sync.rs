//! Asynchronous persistence of optimistic mutations.
//!
//! Every affected group is written with its own task, so groups never wait
//! on each other and a failing group does not hold back the rest. Failures
//! are logged, reported on a single channel and never touch local state.
//! A group that failed to persist is repaired by the next successful write
//! of the same group, because each write carries the complete id list.

use crate::{
    domain::{BoardId, Card, CardPatch, Column, ColumnId, ColumnPatch},
    engine::{AffectedGroup, ItemRef},
    error::{ErrorKind, KanbanError, Result},
    storage::Storage,
    store::Deletion,
};
use std::{fmt, future::Future, sync::Arc};
use tokio::{sync::mpsc, task::JoinSet};

/// A single persistence call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOp {
    ReorderCards(ColumnId),
    ReorderColumns(BoardId),
    CreateCard(ColumnId),
    CreateColumn(BoardId),
    Rename(ItemRef),
    Delete(ItemRef),
}

impl fmt::Display for SyncOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReorderCards(id) => write!(f, "reorder cards of column {}", id),
            Self::ReorderColumns(id) => write!(f, "reorder columns of board {}", id),
            Self::CreateCard(id) => write!(f, "create card in column {}", id),
            Self::CreateColumn(id) => write!(f, "create column on board {}", id),
            Self::Rename(item) => write!(f, "rename {}", item),
            Self::Delete(item) => write!(f, "delete {}", item),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    Persisted,
    /// The entity was already gone remotely; counts as success
    AlreadyDeleted,
    Failed(ErrorKind),
}

/// How a tracked persistence call ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOutcome {
    pub op: SyncOp,
    pub status: SyncStatus,
}

impl SyncOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self.status, SyncStatus::Failed(_))
    }
}

/// A failed persistence call, as delivered on the failure channel
#[derive(Debug)]
pub struct SyncFailure {
    pub op: SyncOp,
    pub error: KanbanError,
}

pub type FailureReceiver = mpsc::UnboundedReceiver<SyncFailure>;

/// Issues persistence calls for optimistic mutations.
///
/// Spawning methods must be called from within a tokio runtime.
pub struct SyncDispatcher {
    storage: Arc<dyn Storage>,
    in_flight: JoinSet<SyncOutcome>,
    failures: mpsc::UnboundedSender<SyncFailure>,
}

impl SyncDispatcher {
    /// Creates a dispatcher and the receiving end of its failure channel
    pub fn new(storage: Arc<dyn Storage>) -> (Self, FailureReceiver) {
        let (failures, receiver) = mpsc::unbounded_channel();
        let dispatcher = Self {
            storage,
            in_flight: JoinSet::new(),
            failures,
        };
        (dispatcher, receiver)
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    /// Number of spawned calls that have not finished yet
    pub fn in_flight(&mut self) -> usize {
        self.reap();
        self.in_flight.len()
    }

    /// Spawns one call per group, each writing the group's full order list
    pub fn persist(&mut self, groups: Vec<AffectedGroup>) {
        for group in groups {
            let storage = Arc::clone(&self.storage);
            let op = match &group {
                AffectedGroup::Cards { column_id, .. } => SyncOp::ReorderCards(column_id.clone()),
                AffectedGroup::Columns { board_id, .. } => SyncOp::ReorderColumns(board_id.clone()),
            };
            self.spawn(op, async move {
                write_group(storage.as_ref(), &group).await?;
                Ok(SyncStatus::Persisted)
            });
        }
    }

    pub fn persist_rename(&mut self, item: ItemRef, title: String) {
        let storage = Arc::clone(&self.storage);
        let target = item.clone();
        self.spawn(SyncOp::Rename(item), async move {
            match target {
                ItemRef::Card(id) => {
                    storage.update_card(&id, CardPatch::title(title)).await?;
                }
                ItemRef::Column(id) => {
                    storage.update_column(&id, ColumnPatch::title(title)).await?;
                }
            }
            Ok(SyncStatus::Persisted)
        });
    }

    /// Deletes the entity, then re-sends the order list of the container it
    /// was removed from so persisted order values stay contiguous
    pub fn persist_delete(&mut self, deletion: Deletion) {
        let storage = Arc::clone(&self.storage);
        let Deletion { item, remaining } = deletion;
        let target = item.clone();
        self.spawn(SyncOp::Delete(item), async move {
            let deleted = match &target {
                ItemRef::Card(id) => storage.delete_card(id).await,
                ItemRef::Column(id) => storage.delete_column(id).await,
            };
            let status = match deleted {
                Ok(()) => SyncStatus::Persisted,
                Err(err) if err.is_already_deleted() => {
                    tracing::debug!(item = %target, "Remote entity already deleted");
                    SyncStatus::AlreadyDeleted
                }
                Err(err) => return Err(err),
            };
            write_group(storage.as_ref(), &remaining).await?;
            Ok(status)
        });
    }

    /// Creates a card remotely; the backend assigns id and order
    pub async fn create_card(&self, column_id: &ColumnId, title: &str) -> Option<Card> {
        let result = self.storage.create_card(column_id, title).await;
        self.observe(SyncOp::CreateCard(column_id.clone()), result)
    }

    /// Creates a column remotely; the backend assigns id and order
    pub async fn create_column(&self, board_id: &BoardId, title: &str) -> Option<Column> {
        let result = self.storage.create_column(board_id, title).await;
        self.observe(SyncOp::CreateColumn(board_id.clone()), result)
    }

    /// Waits for every in-flight call and returns how each one ended.
    ///
    /// Calls that finished before an earlier spawn were already reaped and
    /// only appear in the log.
    pub async fn settle(&mut self) -> Vec<SyncOutcome> {
        let mut outcomes = Vec::with_capacity(self.in_flight.len());
        while let Some(joined) = self.in_flight.join_next().await {
            match joined {
                Ok(outcome) => outcomes.push(outcome),
                Err(err) => tracing::error!(error = %err, "Persistence task did not complete"),
            }
        }
        outcomes
    }

    fn spawn<F>(&mut self, op: SyncOp, call: F)
    where
        F: Future<Output = Result<SyncStatus>> + Send + 'static,
    {
        self.reap();
        tracing::debug!(op = %op, "Dispatching persistence call");
        let failures = self.failures.clone();
        self.in_flight.spawn(async move {
            let status = match call.await {
                Ok(status) => {
                    tracing::debug!(op = %op, ?status, "Persistence call finished");
                    status
                }
                Err(error) => report_failure(&failures, op.clone(), error),
            };
            SyncOutcome { op, status }
        });
    }

    /// Drops finished calls without waiting; their outcome was already
    /// logged and failures were sent on the channel
    fn reap(&mut self) {
        while let Some(joined) = self.in_flight.try_join_next() {
            match joined {
                Ok(outcome) => {
                    tracing::trace!(op = %outcome.op, status = ?outcome.status, "Reaped persistence call")
                }
                Err(err) => tracing::error!(error = %err, "Persistence task did not complete"),
            }
        }
    }

    fn observe<T>(&self, op: SyncOp, result: Result<T>) -> Option<T> {
        match result {
            Ok(value) => {
                tracing::debug!(op = %op, "Persistence call finished");
                Some(value)
            }
            Err(error) => {
                report_failure(&self.failures, op, error);
                None
            }
        }
    }
}

async fn write_group(storage: &dyn Storage, group: &AffectedGroup) -> Result<()> {
    match group {
        AffectedGroup::Cards {
            column_id,
            card_ids,
        } => storage.reorder_cards(column_id, card_ids).await,
        AffectedGroup::Columns {
            board_id,
            column_ids,
        } => storage.reorder_columns(board_id, column_ids).await,
    }
}

fn report_failure(
    failures: &mpsc::UnboundedSender<SyncFailure>,
    op: SyncOp,
    error: KanbanError,
) -> SyncStatus {
    let kind = error.kind();
    tracing::warn!(op = %op, ?kind, error = %error, "Persistence call failed, keeping local state");
    // The receiver may have been dropped; the log line above still records the failure
    let _ = failures.send(SyncFailure { op, error });
    SyncStatus::Failed(kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{Board, CardId},
        engine::MoveIntent,
        storage::{flaky::FlakyStorage, InMemoryStorage},
        store::OptimisticStore,
    };

    /// Persisted board with A = [a1, a2, a3] and B = [b1]
    async fn seeded() -> (Arc<InMemoryStorage>, Board) {
        let storage = Arc::new(InMemoryStorage::new());
        let titles = vec!["A".to_string(), "B".to_string()];
        let board = storage.create_board("Test", &titles).await.unwrap();
        for title in ["a1", "a2", "a3"] {
            storage.create_card(&board.columns[0].id, title).await.unwrap();
        }
        storage.create_card(&board.columns[1].id, "b1").await.unwrap();
        let board = storage.load_board().await.unwrap();
        (storage, board)
    }

    fn titles(board: &Board, column: usize) -> Vec<String> {
        board.columns[column]
            .cards
            .iter()
            .map(|c| c.title.clone())
            .collect()
    }

    fn card_id(board: &Board, column: usize, index: usize) -> CardId {
        board.columns[column].cards[index].id.clone()
    }

    #[tokio::test]
    async fn test_cross_column_move_persists_both_groups() {
        let (storage, board) = seeded().await;
        let (mut dispatcher, _failures) = SyncDispatcher::new(storage.clone());
        let mut store = OptimisticStore::new(board.clone());

        let groups = store.apply_move(&MoveIntent::new(
            card_id(&board, 0, 1).as_str(),
            card_id(&board, 1, 0).as_str(),
        ));
        dispatcher.persist(groups);
        let outcomes = dispatcher.settle().await;

        assert_eq!(outcomes.len(), 2);
        assert!(outcomes.iter().all(SyncOutcome::is_success));
        let persisted = storage.load_board().await.unwrap();
        assert_eq!(titles(&persisted, 0), vec!["a1", "a3"]);
        assert_eq!(titles(&persisted, 1), vec!["a2", "b1"]);
        assert_eq!(&persisted, store.board());
    }

    #[tokio::test]
    async fn test_partial_failure_keeps_other_group_and_local_state() {
        let (memory, board) = seeded().await;
        let flaky = Arc::new(FlakyStorage::new(memory.clone()));
        flaky.fail_on(board.columns[0].id.as_str()).await;

        let (mut dispatcher, mut failures) = SyncDispatcher::new(flaky.clone());
        let mut store = OptimisticStore::new(board.clone());

        let groups = store.apply_move(&MoveIntent::new(
            card_id(&board, 0, 1).as_str(),
            card_id(&board, 1, 0).as_str(),
        ));
        dispatcher.persist(groups);
        let outcomes = dispatcher.settle().await;

        let failed: Vec<_> = outcomes.iter().filter(|o| !o.is_success()).collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(
            failed[0].status,
            SyncStatus::Failed(ErrorKind::TransientIoFailure)
        );

        let failure = failures.try_recv().unwrap();
        assert_eq!(failure.op, SyncOp::ReorderCards(board.columns[0].id.clone()));
        assert!(failures.try_recv().is_err());

        // Local state is untouched by the failure
        assert_eq!(titles(store.board(), 0), vec!["a1", "a3"]);
        // Target column was written and now owns a2
        let persisted = memory.load_board().await.unwrap();
        assert_eq!(titles(&persisted, 1), vec!["a2", "b1"]);
    }

    #[tokio::test]
    async fn test_later_write_supersedes_failed_group() {
        let (memory, board) = seeded().await;
        let flaky = Arc::new(FlakyStorage::new(memory.clone()));
        let column_a = board.columns[0].id.clone();
        flaky.fail_on(column_a.as_str()).await;

        let (mut dispatcher, _failures) = SyncDispatcher::new(flaky.clone());
        let mut store = OptimisticStore::new(board.clone());

        let first = card_id(&board, 0, 0);
        let last = card_id(&board, 0, 2);
        dispatcher.persist(store.apply_move(&MoveIntent::new(first.as_str(), last.as_str())));
        dispatcher.settle().await;
        assert_eq!(titles(&memory.load_board().await.unwrap(), 0), vec!["a1", "a2", "a3"]);

        flaky.heal().await;
        dispatcher.persist(store.apply_move(&MoveIntent::new(last.as_str(), first.as_str())));
        dispatcher.settle().await;

        assert_eq!(&memory.load_board().await.unwrap(), store.board());
    }

    #[tokio::test]
    async fn test_delete_renormalizes_persisted_siblings() {
        let (storage, board) = seeded().await;
        let (mut dispatcher, _failures) = SyncDispatcher::new(storage.clone());
        let mut store = OptimisticStore::new(board.clone());

        let deletion = store.apply_delete(card_id(&board, 0, 0).as_str()).unwrap();
        dispatcher.persist_delete(deletion);
        let outcomes = dispatcher.settle().await;

        assert_eq!(outcomes[0].status, SyncStatus::Persisted);
        let persisted = storage.load_board().await.unwrap();
        let orders: Vec<u32> = persisted.columns[0].cards.iter().map(|c| c.order).collect();
        assert_eq!(orders, vec![0, 1]);
        assert_eq!(titles(&persisted, 0), vec!["a2", "a3"]);
    }

    #[tokio::test]
    async fn test_delete_of_missing_column_counts_as_success() {
        let (storage, board) = seeded().await;
        let (mut dispatcher, mut failures) = SyncDispatcher::new(storage.clone());
        let mut store = OptimisticStore::new(board.clone());

        storage.delete_column(&board.columns[1].id).await.unwrap();
        let deletion = store.apply_delete(board.columns[1].id.as_str()).unwrap();
        dispatcher.persist_delete(deletion);
        let outcomes = dispatcher.settle().await;

        assert_eq!(outcomes[0].status, SyncStatus::AlreadyDeleted);
        assert!(outcomes[0].is_success());
        assert!(failures.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_rename_validation_failure_is_reported() {
        let (memory, board) = seeded().await;
        let flaky = Arc::new(FlakyStorage::new(memory.clone()));
        let card = card_id(&board, 1, 0);
        flaky.reject_on(card.as_str()).await;

        let (mut dispatcher, mut failures) = SyncDispatcher::new(flaky.clone());
        let mut store = OptimisticStore::new(board.clone());

        let item = store.apply_rename(card.as_str(), "renamed").unwrap();
        dispatcher.persist_rename(item, "renamed".to_string());
        let outcomes = dispatcher.settle().await;

        assert_eq!(outcomes[0].status, SyncStatus::Failed(ErrorKind::ValidationFailure));
        assert_eq!(failures.try_recv().unwrap().error.kind(), ErrorKind::ValidationFailure);
        assert_eq!(store.board().card(card.as_str()).unwrap().title, "renamed");
    }

    #[tokio::test]
    async fn test_create_failure_returns_none() {
        let (storage, _board) = seeded().await;
        let (mut dispatcher, mut failures) = SyncDispatcher::new(storage);

        let created = dispatcher.create_card(&ColumnId::new("ghost"), "x").await;

        assert!(created.is_none());
        assert_eq!(failures.try_recv().unwrap().error.kind(), ErrorKind::NotFound);
        assert_eq!(dispatcher.in_flight(), 0);
    }
}
