//! # Kanban Core
//!
//! Ordered-list reordering and synchronization for kanban boards.
//!
//! A board holds ordered columns, a column holds ordered cards. This crate
//! turns drag-and-drop events into new board states, keeps an optimistic
//! in-memory snapshot that the presentation layer can read and subscribe
//! to, and persists each changed container's full order list in the
//! background, tolerating partial failure.
//!
//! The pieces, leaf to root:
//! - [`domain::order`] renumbers siblings to contiguous `0..n` order values
//! - [`engine`] computes the result of a move and the affected containers
//! - [`store`] holds the versioned snapshot and notifies subscribers
//! - [`sync`] dispatches persistence calls through a [`Storage`] backend
//! - [`session`] ties them together for a UI

pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod logging;
pub mod session;
pub mod storage;
pub mod store;
pub mod sync;

// Re-export commonly used types
pub use config::{BoardDefaults, KanbanConfig};
pub use domain::{Board, BoardId, Card, CardId, Column, ColumnId};
pub use engine::{AffectedGroup, MoveIntent, MoveOutcome};
pub use error::{ErrorKind, KanbanError, Result};
pub use session::BoardSession;
pub use storage::Storage;
pub use store::{OptimisticStore, Snapshot};
pub use sync::{SyncDispatcher, SyncFailure, SyncOutcome};
