//! Contiguous zero-based order values for the children of a container.
//!
//! After any structural change (insert, remove, move) the children of a
//! container are renumbered so that their `order` values are exactly
//! `0..n`, matching their position in the sequence.

/// An item that carries a position within its container
pub trait Ordered {
    fn order(&self) -> u32;
    fn set_order(&mut self, order: u32);
}

/// Returns the items with `order` reassigned to their position in the input
///
/// The relative order of the items is never changed.
///
/// # Examples
/// ```
/// use kanban_core::domain::order::{normalize, Ordered};
/// use kanban_core::domain::{Card, CardId, ColumnId};
///
/// let column = ColumnId::new("todo");
/// let mut a = Card::new(CardId::new("a"), "A".to_string(), column.clone());
/// a.order = 4;
/// let mut b = Card::new(CardId::new("b"), "B".to_string(), column);
/// b.order = 9;
///
/// let cards = normalize(vec![a, b]);
/// assert_eq!(cards[0].order(), 0);
/// assert_eq!(cards[1].order(), 1);
/// ```
pub fn normalize<T: Ordered>(mut items: Vec<T>) -> Vec<T> {
    renumber(&mut items);
    items
}

/// In-place variant of [`normalize`]
pub fn renumber<T: Ordered>(items: &mut [T]) {
    for (position, item) in items.iter_mut().enumerate() {
        item.set_order(position as u32);
    }
}

/// Order value for an item appended to `items`: current max + 1, or 0 when empty
pub fn next_order<T: Ordered>(items: &[T]) -> u32 {
    items
        .iter()
        .map(Ordered::order)
        .max()
        .map_or(0, |max| max + 1)
}

/// Checks that the order values are exactly `0..n` in sequence
pub fn is_contiguous<T: Ordered>(items: &[T]) -> bool {
    items
        .iter()
        .enumerate()
        .all(|(position, item)| item.order() == position as u32)
}

/// Stable ascending sort by order value
pub fn sort_by_order<T: Ordered>(items: &mut [T]) {
    items.sort_by_key(Ordered::order);
}
