use crate::{
    domain::{
        order::{renumber, Ordered},
        Board, BoardId, CardId, Column, ColumnId,
    },
    engine::intent::{ContainerRef, DropTarget, ItemRef, MoveIntent, Placement},
};
use std::fmt;

/// A container whose children were renumbered by a mutation, with the full
/// list of child ids in their final order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AffectedGroup {
    Cards {
        column_id: ColumnId,
        card_ids: Vec<CardId>,
    },
    Columns {
        board_id: BoardId,
        column_ids: Vec<ColumnId>,
    },
}

impl AffectedGroup {
    pub fn cards_of(column: &Column) -> Self {
        Self::Cards {
            column_id: column.id.clone(),
            card_ids: column.card_ids(),
        }
    }

    pub fn columns_of(board: &Board) -> Self {
        Self::Columns {
            board_id: board.id.clone(),
            column_ids: board.column_ids(),
        }
    }

    pub fn container(&self) -> ContainerRef {
        match self {
            Self::Cards { column_id, .. } => ContainerRef::Column(column_id.clone()),
            Self::Columns { board_id, .. } => ContainerRef::Board(board_id.clone()),
        }
    }

    /// Child ids in their final order
    pub fn ordered_ids(&self) -> Vec<&str> {
        match self {
            Self::Cards { card_ids, .. } => card_ids.iter().map(CardId::as_str).collect(),
            Self::Columns { column_ids, .. } => column_ids.iter().map(ColumnId::as_str).collect(),
        }
    }
}

/// Why a move left the board untouched
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoOpReason {
    /// The dragged item or the drop target is not on the board
    NotFound(String),
    DroppedOnSelf,
    AlreadyInPlace,
    /// A card dropped on the board, or a column dropped into a column
    IncompatibleTarget,
}

impl fmt::Display for NoOpReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "id not found: {}", id),
            Self::DroppedOnSelf => write!(f, "dropped onto itself"),
            Self::AlreadyInPlace => write!(f, "already in place"),
            Self::IncompatibleTarget => write!(f, "incompatible drop target"),
        }
    }
}

/// Result of computing a move against a board
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    Moved {
        board: Board,
        affected: Vec<AffectedGroup>,
    },
    Unchanged(NoOpReason),
}

impl MoveOutcome {
    pub fn is_moved(&self) -> bool {
        matches!(self, Self::Moved { .. })
    }

    fn not_found(id: impl fmt::Display) -> Self {
        Self::Unchanged(NoOpReason::NotFound(id.to_string()))
    }
}

/// Computes the board that results from dropping `intent.item_id` over
/// `intent.over_id`.
///
/// The input board is never modified. Ids that cannot be resolved make the
/// move a no-op rather than an error, since drop targets come from the UI.
///
/// # Examples
/// ```
/// use kanban_core::engine::{compute_move, MoveIntent};
/// use kanban_core::domain::{Board, BoardId};
///
/// let board = Board::new(BoardId::new("b"), "Empty".to_string());
/// let outcome = compute_move(&board, &MoveIntent::new("ghost", "b"));
/// assert!(!outcome.is_moved());
/// ```
pub fn compute_move(board: &Board, intent: &MoveIntent) -> MoveOutcome {
    let Some(item) = ItemRef::resolve(board, &intent.item_id) else {
        return MoveOutcome::not_found(&intent.item_id);
    };

    if intent.over_id == intent.item_id {
        return MoveOutcome::Unchanged(NoOpReason::DroppedOnSelf);
    }

    let Some(placement) = DropTarget::resolve(board, &item, &intent.over_id)
        .and_then(|target| target.placement(board))
    else {
        return MoveOutcome::not_found(&intent.over_id);
    };

    compute_placement(board, &item, placement)
}

/// Moves `item` so that it ends up at `placement.index` inside `placement.container`.
///
/// Within the same container the index is the item's final position (clamped
/// to the last slot). Across containers the item is inserted before whatever
/// currently sits at the index, or appended when the index is past the end.
pub fn compute_placement(board: &Board, item: &ItemRef, placement: Placement) -> MoveOutcome {
    match (item, &placement.container) {
        (ItemRef::Card(card_id), ContainerRef::Column(column_id)) => {
            move_card(board, card_id, column_id, placement.index)
        }
        (ItemRef::Column(column_id), ContainerRef::Board(board_id)) => {
            if board.id != *board_id {
                return MoveOutcome::not_found(board_id);
            }
            move_column(board, column_id, placement.index)
        }
        _ => MoveOutcome::Unchanged(NoOpReason::IncompatibleTarget),
    }
}

fn move_card(board: &Board, card_id: &CardId, target: &ColumnId, index: usize) -> MoveOutcome {
    let Some((src_col, src_idx)) = board.locate_card(card_id.as_str()) else {
        return MoveOutcome::not_found(card_id);
    };
    let Some(dst_col) = board.column_index(target.as_str()) else {
        return MoveOutcome::not_found(target);
    };

    let mut next = board.clone();

    if src_col == dst_col {
        if !shift(&mut next.columns[src_col].cards, src_idx, index) {
            return MoveOutcome::Unchanged(NoOpReason::AlreadyInPlace);
        }
        let affected = vec![AffectedGroup::cards_of(&next.columns[src_col])];
        return MoveOutcome::Moved {
            board: next,
            affected,
        };
    }

    let mut card = next.columns[src_col].cards.remove(src_idx);
    renumber(&mut next.columns[src_col].cards);

    card.column_id = target.clone();
    let dest = &mut next.columns[dst_col].cards;
    let at = index.min(dest.len());
    dest.insert(at, card);
    renumber(dest);

    let affected = vec![
        AffectedGroup::cards_of(&next.columns[src_col]),
        AffectedGroup::cards_of(&next.columns[dst_col]),
    ];
    MoveOutcome::Moved {
        board: next,
        affected,
    }
}

fn move_column(board: &Board, column_id: &ColumnId, index: usize) -> MoveOutcome {
    let Some(src_idx) = board.column_index(column_id.as_str()) else {
        return MoveOutcome::not_found(column_id);
    };

    let mut next = board.clone();
    if !shift(&mut next.columns, src_idx, index) {
        return MoveOutcome::Unchanged(NoOpReason::AlreadyInPlace);
    }

    let affected = vec![AffectedGroup::columns_of(&next)];
    MoveOutcome::Moved {
        board: next,
        affected,
    }
}

/// Moves the element at `from` so it ends at `to` (clamped), then renumbers.
/// Returns false when nothing moved.
fn shift<T: Ordered>(items: &mut Vec<T>, from: usize, to: usize) -> bool {
    let to = to.min(items.len().saturating_sub(1));
    if from == to || from >= items.len() {
        return false;
    }
    let item = items.remove(from);
    items.insert(to, item);
    renumber(items);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Card;

    /// Board with column A = [a1, a2, a3], B = [b1], C = []
    fn board() -> Board {
        let board_id = BoardId::new("board");
        let mut board = Board::new(board_id.clone(), "Test".to_string());
        for (name, cards) in [("A", vec!["a1", "a2", "a3"]), ("B", vec!["b1"]), ("C", vec![])] {
            let mut column = Column::new(ColumnId::new(name), name.to_string(), board_id.clone());
            for card in cards {
                column
                    .cards
                    .push(Card::new(CardId::new(card), card.to_string(), column.id.clone()));
            }
            renumber(&mut column.cards);
            board.columns.push(column);
        }
        renumber(&mut board.columns);
        board
    }

    fn ids(board: &Board, column: &str) -> Vec<String> {
        board
            .column(column)
            .unwrap()
            .cards
            .iter()
            .map(|c| c.id.to_string())
            .collect()
    }

    fn moved(outcome: MoveOutcome) -> (Board, Vec<AffectedGroup>) {
        match outcome {
            MoveOutcome::Moved { board, affected } => (board, affected),
            MoveOutcome::Unchanged(reason) => panic!("expected a move, got {}", reason),
        }
    }

    #[test]
    fn test_cross_column_move_before_sibling() {
        let (next, affected) = moved(compute_move(&board(), &MoveIntent::new("a2", "b1")));

        assert_eq!(ids(&next, "A"), vec!["a1", "a3"]);
        assert_eq!(ids(&next, "B"), vec!["a2", "b1"]);
        assert!(next.is_settled());
        assert_eq!(next.card("a2").unwrap().column_id.as_str(), "B");

        assert_eq!(
            affected,
            vec![
                AffectedGroup::Cards {
                    column_id: ColumnId::new("A"),
                    card_ids: vec![CardId::new("a1"), CardId::new("a3")],
                },
                AffectedGroup::Cards {
                    column_id: ColumnId::new("B"),
                    card_ids: vec![CardId::new("a2"), CardId::new("b1")],
                },
            ]
        );
    }

    #[test]
    fn test_drop_on_empty_column_appends() {
        let (next, affected) = moved(compute_move(&board(), &MoveIntent::new("a1", "C")));

        assert_eq!(ids(&next, "C"), vec!["a1"]);
        assert_eq!(next.card("a1").unwrap().order, 0);
        assert_eq!(ids(&next, "A"), vec!["a2", "a3"]);
        assert_eq!(affected.len(), 2);
    }

    #[test]
    fn test_drop_on_column_body_appends_to_end() {
        let (next, _) = moved(compute_move(&board(), &MoveIntent::new("b1", "A")));

        assert_eq!(ids(&next, "A"), vec!["a1", "a2", "a3", "b1"]);
        assert!(ids(&next, "B").is_empty());
    }

    #[test]
    fn test_same_column_move_down_and_up() {
        let (next, affected) = moved(compute_move(&board(), &MoveIntent::new("a1", "a3")));
        assert_eq!(ids(&next, "A"), vec!["a2", "a3", "a1"]);
        assert_eq!(affected.len(), 1);
        assert!(next.is_settled());

        let (next, _) = moved(compute_move(&board(), &MoveIntent::new("a3", "a1")));
        assert_eq!(ids(&next, "A"), vec!["a3", "a1", "a2"]);
    }

    #[test]
    fn test_same_column_drop_on_own_column_moves_to_end() {
        let (next, _) = moved(compute_move(&board(), &MoveIntent::new("a1", "A")));
        assert_eq!(ids(&next, "A"), vec!["a2", "a3", "a1"]);

        let outcome = compute_move(&board(), &MoveIntent::new("a3", "A"));
        assert_eq!(outcome, MoveOutcome::Unchanged(NoOpReason::AlreadyInPlace));
    }

    #[test]
    fn test_drop_on_self_is_noop() {
        let outcome = compute_move(&board(), &MoveIntent::new("a2", "a2"));
        assert_eq!(outcome, MoveOutcome::Unchanged(NoOpReason::DroppedOnSelf));
    }

    #[test]
    fn test_unknown_ids_are_noops() {
        assert_eq!(
            compute_move(&board(), &MoveIntent::new("ghost", "a1")),
            MoveOutcome::Unchanged(NoOpReason::NotFound("ghost".to_string()))
        );
        assert_eq!(
            compute_move(&board(), &MoveIntent::new("a1", "ghost")),
            MoveOutcome::Unchanged(NoOpReason::NotFound("ghost".to_string()))
        );
        // Cards cannot be dropped on the board itself
        assert!(!compute_move(&board(), &MoveIntent::new("a1", "board")).is_moved());
    }

    #[test]
    fn test_resolved_placement_is_idempotent() {
        let item = ItemRef::Card(CardId::new("a1"));
        let placement = Placement::new(ContainerRef::Column(ColumnId::new("A")), 2);

        let (once, _) = moved(compute_placement(&board(), &item, placement.clone()));
        let twice = compute_placement(&once, &item, placement);

        assert_eq!(twice, MoveOutcome::Unchanged(NoOpReason::AlreadyInPlace));
        assert_eq!(ids(&once, "A"), vec!["a2", "a3", "a1"]);
    }

    #[test]
    fn test_cross_move_then_reverse_restores_board() {
        let original = board();
        let (moved_board, _) = moved(compute_move(&original, &MoveIntent::new("a2", "b1")));

        let back = Placement::new(ContainerRef::Column(ColumnId::new("A")), 1);
        let (restored, _) = moved(compute_placement(
            &moved_board,
            &ItemRef::Card(CardId::new("a2")),
            back,
        ));

        assert_eq!(restored, original);
    }

    #[test]
    fn test_column_reorder() {
        let (next, affected) = moved(compute_move(&board(), &MoveIntent::new("C", "A")));

        assert_eq!(
            next.column_ids(),
            vec![ColumnId::new("C"), ColumnId::new("A"), ColumnId::new("B")]
        );
        assert_eq!(
            affected,
            vec![AffectedGroup::Columns {
                board_id: BoardId::new("board"),
                column_ids: next.column_ids(),
            }]
        );
        assert!(next.is_settled());
    }

    #[test]
    fn test_column_dropped_on_board_or_card() {
        let (next, _) = moved(compute_move(&board(), &MoveIntent::new("A", "board")));
        assert_eq!(next.columns[2].id.as_str(), "A");

        // Over a card means over that card's column
        let (next, _) = moved(compute_move(&board(), &MoveIntent::new("C", "b1")));
        assert_eq!(next.columns[1].id.as_str(), "C");
        assert_eq!(ids(&next, "C"), Vec::<String>::new());
    }

    #[test]
    fn test_cards_never_duplicated_or_lost() {
        let moves = [
            ("a1", "C"),
            ("b1", "a3"),
            ("a3", "a1"),
            ("a1", "B"),
            ("a2", "b1"),
            ("C", "A"),
            ("a3", "C"),
        ];
        let mut current = board();
        for (item, over) in moves {
            if let MoveOutcome::Moved { board, .. } = compute_move(&current, &MoveIntent::new(item, over)) {
                current = board;
            }
            assert!(current.is_settled());
            assert_eq!(current.card_count(), 4);
            for card in ["a1", "a2", "a3", "b1"] {
                let owners = current
                    .columns
                    .iter()
                    .filter(|col| col.card_index(card).is_some())
                    .count();
                assert_eq!(owners, 1, "card {} owned by {} columns", card, owners);
            }
        }
    }
}
