#![forbid(unsafe_code)]

pub mod ids {
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub enum IdError {
        NotPositive,
    }

    fn validate_id(value: i64) -> Result<(), IdError> {
        if value < 1 {
            return Err(IdError::NotPositive);
        }
        Ok(())
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
    pub struct UserId(i64);

    impl UserId {
        pub fn try_new(value: i64) -> Result<Self, IdError> {
            validate_id(value)?;
            Ok(Self(value))
        }

        pub fn get(self) -> i64 {
            self.0
        }
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
    pub struct BoardId(i64);

    impl BoardId {
        pub fn try_new(value: i64) -> Result<Self, IdError> {
            validate_id(value)?;
            Ok(Self(value))
        }

        pub fn get(self) -> i64 {
            self.0
        }
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
    pub struct ColumnId(i64);

    impl ColumnId {
        pub fn try_new(value: i64) -> Result<Self, IdError> {
            validate_id(value)?;
            Ok(Self(value))
        }

        pub fn get(self) -> i64 {
            self.0
        }
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
    pub struct TaskId(i64);

    impl TaskId {
        pub fn try_new(value: i64) -> Result<Self, IdError> {
            validate_id(value)?;
            Ok(Self(value))
        }

        pub fn get(self) -> i64 {
            self.0
        }
    }
}

/// Dense 1-based ranking of items within a parent scope (columns within a
/// board, tasks within a column). A scope of size `n` holds exactly the ranks
/// `{1..n}`; every mutation below preserves that by pairing a validated
/// target rank with a bulk shift of the neighbours.
///
/// Everything here is pure range math. Rendering a [`ShiftStep`] against the
/// actual rows (and doing so atomically) is the storage layer's job.
pub mod rank {
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub enum RankError {
        OutOfRange { requested: i64, max: i64 },
    }

    /// Bound check for a rank requested for an item that is not yet counted
    /// in the scope (creation, or arrival from another scope). `size + 1`
    /// appends at the end.
    pub fn validate_insert(requested: i64, scope_size: i64) -> Result<(), RankError> {
        let max = scope_size + 1;
        if requested < 1 || requested > max {
            return Err(RankError::OutOfRange { requested, max });
        }
        Ok(())
    }

    /// Bound check for moving an item that already lives in the scope. The
    /// item is counted in `scope_size`, so the upper bound is `size` itself:
    /// `size + 1` would leave a gap behind the moved item.
    pub fn validate_move(requested: i64, scope_size: i64) -> Result<(), RankError> {
        let max = scope_size;
        if requested < 1 || requested > max {
            return Err(RankError::OutOfRange { requested, max });
        }
        Ok(())
    }

    /// One bulk rank adjustment: every item whose rank falls in
    /// `min_rank..=max_rank` (unbounded above when `max_rank` is `None`)
    /// moves by `delta`.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct ShiftStep {
        pub min_rank: i64,
        pub max_rank: Option<i64>,
        pub delta: i64,
    }

    /// Opens a hole at `rank`: everything at `rank` or later moves one down
    /// the list. Runs before a new item is written and before an item arrives
    /// from another scope.
    pub fn open_gap(rank: i64) -> ShiftStep {
        ShiftStep {
            min_rank: rank,
            max_rank: None,
            delta: 1,
        }
    }

    /// Collapses the hole left at `rank`: everything after it moves one up.
    /// Runs after a deletion and after an item departs to another scope.
    pub fn close_gap(rank: i64) -> ShiftStep {
        ShiftStep {
            min_rank: rank + 1,
            max_rank: None,
            delta: -1,
        }
    }

    /// In-scope move: exactly the items between the origin (exclusive) and
    /// the destination (inclusive) absorb a one-step shift toward the
    /// origin. Returns `None` when the move is a no-op.
    pub fn move_gap(old_rank: i64, new_rank: i64) -> Option<ShiftStep> {
        if new_rank > old_rank {
            Some(ShiftStep {
                min_rank: old_rank + 1,
                max_rank: Some(new_rank),
                delta: -1,
            })
        } else if new_rank < old_rank {
            Some(ShiftStep {
                min_rank: new_rank,
                max_rank: Some(old_rank - 1),
                delta: 1,
            })
        } else {
            None
        }
    }
}

pub mod model {
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub enum Entity {
        User,
        Board,
        Membership,
        Column,
        Task,
    }

    impl Entity {
        pub fn as_str(self) -> &'static str {
            match self {
                Entity::User => "user",
                Entity::Board => "board",
                Entity::Membership => "membership",
                Entity::Column => "column",
                Entity::Task => "task",
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ids::{BoardId, IdError};
    use super::rank::{self, RankError, ShiftStep};

    // Mirrors the storage layer's windowed UPDATE over an in-memory scope.
    fn apply(ranks: &mut [i64], step: ShiftStep) {
        for rank in ranks {
            if *rank >= step.min_rank && step.max_rank.is_none_or(|max| *rank <= max) {
                *rank += step.delta;
            }
        }
    }

    fn assert_dense(ranks: &[i64]) {
        let mut sorted = ranks.to_vec();
        sorted.sort_unstable();
        let expected: Vec<i64> = (1..=ranks.len() as i64).collect();
        assert_eq!(sorted, expected, "ranks are not dense: {ranks:?}");
    }

    #[test]
    fn ids_reject_non_positive_values() {
        assert_eq!(BoardId::try_new(0), Err(IdError::NotPositive));
        assert_eq!(BoardId::try_new(-3), Err(IdError::NotPositive));
        assert_eq!(BoardId::try_new(7).map(BoardId::get), Ok(7));
    }

    #[test]
    fn insert_rank_accepts_one_through_size_plus_one() {
        assert!(rank::validate_insert(1, 0).is_ok());
        assert!(rank::validate_insert(3, 3).is_ok());
        assert!(rank::validate_insert(4, 3).is_ok());
        assert_eq!(
            rank::validate_insert(5, 3),
            Err(RankError::OutOfRange {
                requested: 5,
                max: 4
            })
        );
        assert_eq!(
            rank::validate_insert(0, 3),
            Err(RankError::OutOfRange {
                requested: 0,
                max: 4
            })
        );
    }

    #[test]
    fn move_rank_stops_at_size() {
        assert!(rank::validate_move(3, 3).is_ok());
        assert_eq!(
            rank::validate_move(4, 3),
            Err(RankError::OutOfRange {
                requested: 4,
                max: 3
            })
        );
        assert_eq!(
            rank::validate_move(1, 0),
            Err(RankError::OutOfRange {
                requested: 1,
                max: 0
            })
        );
        assert_eq!(
            rank::validate_move(-1, 5),
            Err(RankError::OutOfRange {
                requested: -1,
                max: 5
            })
        );
    }

    #[test]
    fn open_gap_shifts_tail_only() {
        // Scope 1,2,3; insert at 2 -> old 2 and 3 become 3 and 4.
        let mut ranks = vec![1, 2, 3];
        apply(&mut ranks, rank::open_gap(2));
        assert_eq!(ranks, vec![1, 3, 4]);
        ranks.push(2);
        assert_dense(&ranks);
    }

    #[test]
    fn close_gap_compacts_after_removal() {
        // Scope 1,2,3,4; remove the item at 2.
        let mut ranks = vec![1, 3, 4];
        apply(&mut ranks, rank::close_gap(2));
        assert_eq!(ranks, vec![1, 2, 3]);
        assert_dense(&ranks);
    }

    #[test]
    fn move_gap_later_shifts_window_down() {
        // A=1 B=2 C=3 D=4; move B from 2 to 4.
        let step = rank::move_gap(2, 4).expect("shift expected");
        assert_eq!(
            step,
            ShiftStep {
                min_rank: 3,
                max_rank: Some(4),
                delta: -1
            }
        );
        let mut others = vec![1, 3, 4];
        apply(&mut others, step);
        assert_eq!(others, vec![1, 2, 3]);
        others.push(4);
        assert_dense(&others);
    }

    #[test]
    fn move_gap_earlier_shifts_window_up() {
        // A=1 B=2 C=3 D=4; move D from 4 to 2.
        let step = rank::move_gap(4, 2).expect("shift expected");
        assert_eq!(
            step,
            ShiftStep {
                min_rank: 2,
                max_rank: Some(3),
                delta: 1
            }
        );
        let mut others = vec![1, 2, 3];
        apply(&mut others, step);
        assert_eq!(others, vec![1, 3, 4]);
        others.push(2);
        assert_dense(&others);
    }

    #[test]
    fn move_gap_same_rank_is_noop() {
        assert_eq!(rank::move_gap(3, 3), None);
    }

    #[test]
    fn move_there_and_back_restores_ranking() {
        let mut others = vec![1, 3, 4, 5];
        let there = rank::move_gap(2, 5).expect("shift expected");
        apply(&mut others, there);
        let back = rank::move_gap(5, 2).expect("shift expected");
        apply(&mut others, back);
        assert_eq!(others, vec![1, 3, 4, 5]);
    }

    #[test]
    fn cross_scope_move_keeps_both_scopes_dense() {
        // Source 1,2,3,4 loses the item at 3; destination 1,2,3 gains it at 2.
        let mut source = vec![1, 2, 4];
        apply(&mut source, rank::close_gap(3));
        assert_eq!(source, vec![1, 2, 3]);
        assert_dense(&source);

        let mut destination = vec![1, 2, 3];
        apply(&mut destination, rank::open_gap(2));
        assert_eq!(destination, vec![1, 3, 4]);
        destination.push(2);
        assert_dense(&destination);
    }
}
