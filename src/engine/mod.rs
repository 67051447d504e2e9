//! Drag-and-drop reordering over the two-level board hierarchy.
//!
//! A raw [`MoveIntent`] is resolved once into a [`DropTarget`] and then a
//! [`Placement`]; the core algorithm only ever sees the placement.

pub mod intent;
pub mod reorder;

pub use intent::{ContainerRef, DropTarget, ItemRef, MoveIntent, Placement};
pub use reorder::{compute_move, compute_placement, AffectedGroup, MoveOutcome, NoOpReason};
