#![forbid(unsafe_code)]

use super::ordering::COLUMNS;
use super::{ColumnCreateRequest, ColumnRow, ColumnUpdateRequest, SqliteStore, StoreError};
use kb_core::ids::{BoardId, ColumnId};
use kb_core::model::Entity;
use rusqlite::{Connection, OptionalExtension, params};
use serde_json::json;

impl SqliteStore {
    pub fn column_create(&mut self, request: ColumnCreateRequest) -> Result<ColumnRow, StoreError> {
        let ColumnCreateRequest {
            board_id,
            name,
            rank,
            created_by,
        } = request;

        if name.trim().is_empty() {
            return Err(StoreError::InvalidInput("name must not be empty"));
        }

        let now_ms = super::now_ms();
        let tx = super::write_tx(&mut self.conn)?;

        if !super::board_exists_tx(&tx, board_id.get())? {
            return Err(StoreError::UnknownId);
        }
        super::ensure_user_exists_tx(&tx, created_by.get())?;

        let rank = COLUMNS.insert_tx(&tx, board_id.get(), rank)?;

        tx.execute(
            r#"
            INSERT INTO columns(board_id, name, rank, created_by, created_at_ms, updated_at_ms)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![board_id.get(), name, rank, created_by.get(), now_ms, now_ms],
        )?;
        let id = tx.last_insert_rowid();

        let payload =
            json!({ "board_id": board_id.get(), "column_id": id, "rank": rank }).to_string();
        super::insert_event_tx(
            &tx,
            now_ms,
            Some(board_id.get()),
            Entity::Column,
            Some(id),
            "column.created",
            &payload,
        )?;

        let row = ColumnRow::from_row(
            id,
            board_id.get(),
            name,
            rank,
            created_by.get(),
            now_ms,
            now_ms,
        )?;
        tx.commit()?;
        Ok(row)
    }

    pub fn column_update(&mut self, request: ColumnUpdateRequest) -> Result<ColumnRow, StoreError> {
        let ColumnUpdateRequest {
            column_id,
            name,
            rank,
            board_id,
        } = request;

        if name.is_none() && rank.is_none() && board_id.is_none() {
            return Err(StoreError::InvalidInput("no fields to edit"));
        }
        if let Some(new_name) = &name {
            if new_name.trim().is_empty() {
                return Err(StoreError::InvalidInput("name must not be empty"));
            }
        }

        let now_ms = super::now_ms();
        let tx = super::write_tx(&mut self.conn)?;

        let Some(current) = column_row(&tx, column_id.get())? else {
            return Err(StoreError::UnknownId);
        };

        if let Some(board) = board_id {
            if board != current.board_id {
                return Err(StoreError::BoardChangeForbidden);
            }
        }

        let mut new_rank = current.rank;
        if let Some(requested) = rank {
            COLUMNS.move_within_tx(&tx, current.board_id.get(), current.rank, requested)?;
            new_rank = requested;
        }
        let new_name = name.unwrap_or_else(|| current.name.clone());

        tx.execute(
            "UPDATE columns SET name = ?2, rank = ?3, updated_at_ms = ?4 WHERE id = ?1",
            params![column_id.get(), new_name, new_rank, now_ms],
        )?;

        let payload = json!({
            "board_id": current.board_id.get(),
            "column_id": column_id.get(),
            "old_rank": current.rank,
            "new_rank": new_rank,
        })
        .to_string();
        super::insert_event_tx(
            &tx,
            now_ms,
            Some(current.board_id.get()),
            Entity::Column,
            Some(column_id.get()),
            "column.updated",
            &payload,
        )?;

        tx.commit()?;
        Ok(ColumnRow {
            id: current.id,
            board_id: current.board_id,
            name: new_name,
            rank: new_rank,
            created_by: current.created_by,
            created_at_ms: current.created_at_ms,
            updated_at_ms: now_ms,
        })
    }

    pub fn column_get(&self, column_id: ColumnId) -> Result<Option<ColumnRow>, StoreError> {
        column_row(&self.conn, column_id.get())
    }

    pub fn columns_list(&self, board_id: BoardId) -> Result<Vec<ColumnRow>, StoreError> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, board_id, name, rank, created_by, created_at_ms, updated_at_ms
            FROM columns
            WHERE board_id = ?1
            ORDER BY rank ASC
            "#,
        )?;

        let mut rows = stmt.query(params![board_id.get()])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            out.push(ColumnRow::from_row(
                row.get::<_, i64>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, i64>(3)?,
                row.get::<_, i64>(4)?,
                row.get::<_, i64>(5)?,
                row.get::<_, i64>(6)?,
            )?);
        }
        Ok(out)
    }

    pub fn column_delete(&mut self, column_id: ColumnId) -> Result<ColumnRow, StoreError> {
        let now_ms = super::now_ms();
        let tx = super::write_tx(&mut self.conn)?;

        let Some(current) = column_row(&tx, column_id.get())? else {
            return Err(StoreError::UnknownId);
        };

        let tasks: i64 = tx.query_row(
            "SELECT COUNT(1) FROM tasks WHERE column_id = ?1",
            params![column_id.get()],
            |row| row.get(0),
        )?;
        if tasks > 0 {
            return Err(StoreError::ColumnNotEmpty { tasks });
        }

        tx.execute("DELETE FROM columns WHERE id = ?1", params![column_id.get()])?;
        COLUMNS.remove_tx(&tx, current.board_id.get(), current.rank)?;

        let payload = json!({
            "board_id": current.board_id.get(),
            "column_id": column_id.get(),
            "rank": current.rank,
        })
        .to_string();
        super::insert_event_tx(
            &tx,
            now_ms,
            Some(current.board_id.get()),
            Entity::Column,
            Some(column_id.get()),
            "column.deleted",
            &payload,
        )?;

        tx.commit()?;
        Ok(current)
    }
}

pub(crate) fn column_row(
    conn: &Connection,
    column_id: i64,
) -> Result<Option<ColumnRow>, StoreError> {
    let row = conn
        .query_row(
            r#"
            SELECT id, board_id, name, rank, created_by, created_at_ms, updated_at_ms
            FROM columns
            WHERE id = ?1
            "#,
            params![column_id],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, i64>(3)?,
                    row.get::<_, i64>(4)?,
                    row.get::<_, i64>(5)?,
                    row.get::<_, i64>(6)?,
                ))
            },
        )
        .optional()?;

    match row {
        Some((id, board_id, name, rank, created_by, created_at_ms, updated_at_ms)) => {
            Ok(Some(ColumnRow::from_row(
                id,
                board_id,
                name,
                rank,
                created_by,
                created_at_ms,
                updated_at_ms,
            )?))
        }
        None => Ok(None),
    }
}
