#![forbid(unsafe_code)]

use super::StoreError;
use kb_core::rank::{self, ShiftStep};
use rusqlite::{Transaction, params};

/// A table whose rows carry a dense 1-based `rank` within a parent scope.
/// Two instantiations exist: columns ranked within a board and tasks ranked
/// within a column. All methods run against the caller's open transaction;
/// the caller owns commit/rollback, so a failure at any step undoes every
/// shift along with the item's own write.
#[derive(Clone, Copy, Debug)]
pub(crate) struct RankedTable {
    table: &'static str,
    scope_column: &'static str,
}

pub(crate) const COLUMNS: RankedTable = RankedTable {
    table: "columns",
    scope_column: "board_id",
};

pub(crate) const TASKS: RankedTable = RankedTable {
    table: "tasks",
    scope_column: "column_id",
};

impl RankedTable {
    pub(crate) fn size_tx(self, tx: &Transaction<'_>, scope_id: i64) -> Result<i64, StoreError> {
        let sql = format!(
            "SELECT COUNT(1) FROM {} WHERE {} = ?1",
            self.table, self.scope_column
        );
        Ok(tx.query_row(&sql, params![scope_id], |row| row.get(0))?)
    }

    /// Applies one [`ShiftStep`] as a single set-oriented UPDATE. No row is
    /// ever individually repositioned, so readers of the committed state
    /// never observe a transient duplicate or gap.
    fn shift_tx(
        self,
        tx: &Transaction<'_>,
        scope_id: i64,
        step: ShiftStep,
    ) -> Result<(), StoreError> {
        match step.max_rank {
            Some(max_rank) => {
                let sql = format!(
                    "UPDATE {} SET rank = rank + ?2 WHERE {} = ?1 AND rank >= ?3 AND rank <= ?4",
                    self.table, self.scope_column
                );
                tx.execute(&sql, params![scope_id, step.delta, step.min_rank, max_rank])?;
            }
            None => {
                let sql = format!(
                    "UPDATE {} SET rank = rank + ?2 WHERE {} = ?1 AND rank >= ?3",
                    self.table, self.scope_column
                );
                tx.execute(&sql, params![scope_id, step.delta, step.min_rank])?;
            }
        }
        Ok(())
    }

    /// Validates `requested` against the current scope size and opens a hole
    /// for a new item. The caller writes the item's row at the returned rank
    /// within the same transaction.
    pub(crate) fn insert_tx(
        self,
        tx: &Transaction<'_>,
        scope_id: i64,
        requested: i64,
    ) -> Result<i64, StoreError> {
        let size = self.size_tx(tx, scope_id)?;
        rank::validate_insert(requested, size)?;
        self.shift_tx(tx, scope_id, rank::open_gap(requested))?;
        Ok(requested)
    }

    /// Repositions an existing item inside its scope. Shifts only the items
    /// strictly between the origin and the destination; the caller then
    /// writes the item's own rank.
    pub(crate) fn move_within_tx(
        self,
        tx: &Transaction<'_>,
        scope_id: i64,
        old_rank: i64,
        new_rank: i64,
    ) -> Result<(), StoreError> {
        let size = self.size_tx(tx, scope_id)?;
        rank::validate_move(new_rank, size)?;
        if let Some(step) = rank::move_gap(old_rank, new_rank) {
            self.shift_tx(tx, scope_id, step)?;
        }
        Ok(())
    }

    /// Moves an item between two scopes: closes the hole it leaves behind
    /// and opens one at the destination. The caller rewrites the item's
    /// scope and rank afterwards, inside the same transaction.
    pub(crate) fn move_across_tx(
        self,
        tx: &Transaction<'_>,
        old_scope_id: i64,
        old_rank: i64,
        new_scope_id: i64,
        new_rank: i64,
    ) -> Result<(), StoreError> {
        let destination_size = self.size_tx(tx, new_scope_id)?;
        rank::validate_insert(new_rank, destination_size)?;
        self.shift_tx(tx, old_scope_id, rank::close_gap(old_rank))?;
        self.shift_tx(tx, new_scope_id, rank::open_gap(new_rank))?;
        Ok(())
    }

    /// Compacts the scope after the row at `removed_rank` has been deleted.
    pub(crate) fn remove_tx(
        self,
        tx: &Transaction<'_>,
        scope_id: i64,
        removed_rank: i64,
    ) -> Result<(), StoreError> {
        self.shift_tx(tx, scope_id, rank::close_gap(removed_rank))
    }
}
