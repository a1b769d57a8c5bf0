#![forbid(unsafe_code)]

use super::{BoardCreateRequest, BoardRow, SqliteStore, StoreError};
use kb_core::ids::{BoardId, UserId};
use kb_core::model::Entity;
use rusqlite::{Connection, OptionalExtension, params};
use serde_json::json;

impl SqliteStore {
    pub fn board_create(&mut self, request: BoardCreateRequest) -> Result<BoardRow, StoreError> {
        let BoardCreateRequest { name, created_by } = request;

        if name.trim().is_empty() {
            return Err(StoreError::InvalidInput("name must not be empty"));
        }

        let now_ms = super::now_ms();
        let tx = super::write_tx(&mut self.conn)?;
        super::ensure_user_exists_tx(&tx, created_by.get())?;

        tx.execute(
            r#"
            INSERT INTO boards(name, created_by, created_at_ms, updated_at_ms)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![name, created_by.get(), now_ms, now_ms],
        )?;
        let id = tx.last_insert_rowid();

        // The creator is a member of their own board from the start.
        tx.execute(
            "INSERT INTO memberships(user_id, board_id, created_at_ms) VALUES (?1, ?2, ?3)",
            params![created_by.get(), id, now_ms],
        )?;

        let payload = json!({ "board_id": id, "created_by": created_by.get() }).to_string();
        super::insert_event_tx(
            &tx,
            now_ms,
            Some(id),
            Entity::Board,
            Some(id),
            "board.created",
            &payload,
        )?;

        let row = BoardRow::from_row(id, name, created_by.get(), now_ms, now_ms)?;
        tx.commit()?;
        Ok(row)
    }

    pub fn board_get(&self, board_id: BoardId) -> Result<Option<BoardRow>, StoreError> {
        board_row(&self.conn, board_id.get())
    }

    pub fn boards_list_for_user(
        &self,
        user_id: UserId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<BoardRow>, StoreError> {
        let limit = super::to_sqlite_i64(limit)?;
        let offset = super::to_sqlite_i64(offset)?;

        let mut stmt = self.conn.prepare(
            r#"
            SELECT b.id, b.name, b.created_by, b.created_at_ms, b.updated_at_ms
            FROM boards b
            JOIN memberships m ON m.board_id = b.id
            WHERE m.user_id = ?1
            ORDER BY b.created_at_ms ASC, b.id ASC
            LIMIT ?2 OFFSET ?3
            "#,
        )?;

        let mut rows = stmt.query(params![user_id.get(), limit, offset])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            out.push(BoardRow::from_row(
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, i64>(3)?,
                row.get::<_, i64>(4)?,
            )?);
        }
        Ok(out)
    }

    /// A board can only go once its columns are gone; the column-level delete
    /// guard (no tasks) therefore applies transitively.
    pub fn board_delete(&mut self, board_id: BoardId) -> Result<BoardRow, StoreError> {
        let now_ms = super::now_ms();
        let tx = super::write_tx(&mut self.conn)?;

        let Some(row) = board_row(&tx, board_id.get())? else {
            return Err(StoreError::UnknownId);
        };

        let columns: i64 = tx.query_row(
            "SELECT COUNT(1) FROM columns WHERE board_id = ?1",
            params![board_id.get()],
            |row| row.get(0),
        )?;
        if columns > 0 {
            return Err(StoreError::BoardNotEmpty { columns });
        }

        tx.execute("DELETE FROM boards WHERE id = ?1", params![board_id.get()])?;

        let payload = json!({ "board_id": board_id.get() }).to_string();
        super::insert_event_tx(
            &tx,
            now_ms,
            Some(board_id.get()),
            Entity::Board,
            Some(board_id.get()),
            "board.deleted",
            &payload,
        )?;

        tx.commit()?;
        Ok(row)
    }
}

pub(crate) fn board_row(conn: &Connection, board_id: i64) -> Result<Option<BoardRow>, StoreError> {
    let row = conn
        .query_row(
            r#"
            SELECT id, name, created_by, created_at_ms, updated_at_ms
            FROM boards
            WHERE id = ?1
            "#,
            params![board_id],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, i64>(3)?,
                    row.get::<_, i64>(4)?,
                ))
            },
        )
        .optional()?;

    match row {
        Some((id, name, created_by, created_at_ms, updated_at_ms)) => Ok(Some(BoardRow::from_row(
            id,
            name,
            created_by,
            created_at_ms,
            updated_at_ms,
        )?)),
        None => Ok(None),
    }
}
