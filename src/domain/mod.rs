pub mod board;
pub mod card;
pub mod column;
pub mod ids;
pub mod order;

pub use board::{Board, DEFAULT_COLUMNS, UNTITLED_COLUMN};
pub use card::{Card, CardPatch};
pub use column::{Column, ColumnPatch};
pub use ids::{BoardId, CardId, ColumnId};
pub use order::{normalize, Ordered};
