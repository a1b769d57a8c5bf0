#![forbid(unsafe_code)]

use super::columns::column_row;
use super::ordering::TASKS;
use super::{SqliteStore, StoreError, TaskCreateRequest, TaskRow, TaskUpdateRequest};
use kb_core::ids::{ColumnId, TaskId};
use kb_core::model::Entity;
use rusqlite::{Connection, OptionalExtension, Transaction, params};
use serde_json::json;

impl SqliteStore {
    pub fn task_create(&mut self, request: TaskCreateRequest) -> Result<TaskRow, StoreError> {
        let TaskCreateRequest {
            column_id,
            title,
            description,
            rank,
            created_by,
            assigned_to,
        } = request;

        if title.trim().is_empty() {
            return Err(StoreError::InvalidInput("title must not be empty"));
        }

        let now_ms = super::now_ms();
        let tx = super::write_tx(&mut self.conn)?;

        let Some(column) = column_row(&tx, column_id.get())? else {
            return Err(StoreError::UnknownId);
        };
        super::ensure_user_exists_tx(&tx, created_by.get())?;
        if let Some(assignee) = assigned_to {
            ensure_assignee_tx(&tx, column.board_id.get(), assignee.get())?;
        }

        let rank = TASKS.insert_tx(&tx, column_id.get(), rank)?;

        tx.execute(
            r#"
            INSERT INTO tasks(column_id, title, description, rank, created_by, assigned_to, created_at_ms, updated_at_ms)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                column_id.get(),
                title,
                description,
                rank,
                created_by.get(),
                assigned_to.map(|user| user.get()),
                now_ms,
                now_ms
            ],
        )?;
        let id = tx.last_insert_rowid();

        let payload = json!({
            "board_id": column.board_id.get(),
            "column_id": column_id.get(),
            "task_id": id,
            "rank": rank,
        })
        .to_string();
        super::insert_event_tx(
            &tx,
            now_ms,
            Some(column.board_id.get()),
            Entity::Task,
            Some(id),
            "task.created",
            &payload,
        )?;

        let row = TaskRow::from_row(
            id,
            column_id.get(),
            title,
            description,
            rank,
            created_by.get(),
            assigned_to.map(|user| user.get()),
            now_ms,
            now_ms,
        )?;
        tx.commit()?;
        Ok(row)
    }

    pub fn task_update(&mut self, request: TaskUpdateRequest) -> Result<TaskRow, StoreError> {
        if request.is_empty() {
            return Err(StoreError::InvalidInput("no fields to edit"));
        }
        let TaskUpdateRequest {
            task_id,
            title,
            description,
            assigned_to,
            column_id,
            rank,
        } = request;
        if let Some(new_title) = &title {
            if new_title.trim().is_empty() {
                return Err(StoreError::InvalidInput("title must not be empty"));
            }
        }

        let now_ms = super::now_ms();
        let tx = super::write_tx(&mut self.conn)?;

        let Some(current) = task_row(&tx, task_id.get())? else {
            return Err(StoreError::UnknownId);
        };
        let Some(current_column) = column_row(&tx, current.column_id.get())? else {
            return Err(StoreError::InvalidInput("task column row is missing"));
        };
        let board_id = current_column.board_id;

        let (new_column_id, new_rank) = match column_id {
            Some(destination_id) if destination_id != current.column_id => {
                let Some(destination) = column_row(&tx, destination_id.get())? else {
                    return Err(StoreError::UnknownId);
                };
                if destination.board_id != board_id {
                    return Err(StoreError::InvalidInput(
                        "new column must belong to the same board",
                    ));
                }
                let requested = rank.ok_or(StoreError::InvalidInput(
                    "rank is required when moving to another column",
                ))?;
                TASKS.move_across_tx(
                    &tx,
                    current.column_id.get(),
                    current.rank,
                    destination_id.get(),
                    requested,
                )?;
                (destination_id, requested)
            }
            _ => match rank {
                Some(requested) if requested != current.rank => {
                    TASKS.move_within_tx(&tx, current.column_id.get(), current.rank, requested)?;
                    (current.column_id, requested)
                }
                _ => (current.column_id, current.rank),
            },
        };

        let new_assignee = match assigned_to {
            Some(Some(user)) => {
                ensure_assignee_tx(&tx, board_id.get(), user.get())?;
                Some(user)
            }
            Some(None) => None,
            None => current.assigned_to,
        };
        let new_title = title.unwrap_or_else(|| current.title.clone());
        let new_description = description.unwrap_or_else(|| current.description.clone());

        tx.execute(
            r#"
            UPDATE tasks
            SET column_id = ?2, title = ?3, description = ?4, rank = ?5, assigned_to = ?6, updated_at_ms = ?7
            WHERE id = ?1
            "#,
            params![
                task_id.get(),
                new_column_id.get(),
                new_title,
                new_description,
                new_rank,
                new_assignee.map(|user| user.get()),
                now_ms
            ],
        )?;

        let payload = json!({
            "board_id": board_id.get(),
            "task_id": task_id.get(),
            "from_column": current.column_id.get(),
            "to_column": new_column_id.get(),
            "old_rank": current.rank,
            "new_rank": new_rank,
        })
        .to_string();
        super::insert_event_tx(
            &tx,
            now_ms,
            Some(board_id.get()),
            Entity::Task,
            Some(task_id.get()),
            "task.updated",
            &payload,
        )?;

        tx.commit()?;
        Ok(TaskRow {
            id: current.id,
            column_id: new_column_id,
            title: new_title,
            description: new_description,
            rank: new_rank,
            created_by: current.created_by,
            assigned_to: new_assignee,
            created_at_ms: current.created_at_ms,
            updated_at_ms: now_ms,
        })
    }

    pub fn task_get(&self, task_id: TaskId) -> Result<Option<TaskRow>, StoreError> {
        task_row(&self.conn, task_id.get())
    }

    pub fn tasks_list(&self, column_id: ColumnId) -> Result<Vec<TaskRow>, StoreError> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, column_id, title, description, rank, created_by, assigned_to, created_at_ms, updated_at_ms
            FROM tasks
            WHERE column_id = ?1
            ORDER BY rank ASC
            "#,
        )?;

        let mut rows = stmt.query(params![column_id.get()])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            out.push(TaskRow::from_row(
                row.get::<_, i64>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, i64>(4)?,
                row.get::<_, i64>(5)?,
                row.get::<_, Option<i64>>(6)?,
                row.get::<_, i64>(7)?,
                row.get::<_, i64>(8)?,
            )?);
        }
        Ok(out)
    }

    pub fn task_delete(&mut self, task_id: TaskId) -> Result<TaskRow, StoreError> {
        let now_ms = super::now_ms();
        let tx = super::write_tx(&mut self.conn)?;

        let Some(current) = task_row(&tx, task_id.get())? else {
            return Err(StoreError::UnknownId);
        };
        let board_id = tx.query_row(
            "SELECT board_id FROM columns WHERE id = ?1",
            params![current.column_id.get()],
            |row| row.get::<_, i64>(0),
        )?;

        tx.execute("DELETE FROM tasks WHERE id = ?1", params![task_id.get()])?;
        TASKS.remove_tx(&tx, current.column_id.get(), current.rank)?;

        let payload = json!({
            "board_id": board_id,
            "column_id": current.column_id.get(),
            "task_id": task_id.get(),
            "rank": current.rank,
        })
        .to_string();
        super::insert_event_tx(
            &tx,
            now_ms,
            Some(board_id),
            Entity::Task,
            Some(task_id.get()),
            "task.deleted",
            &payload,
        )?;

        tx.commit()?;
        Ok(current)
    }
}

fn ensure_assignee_tx(
    tx: &Transaction<'_>,
    board_id: i64,
    user_id: i64,
) -> Result<(), StoreError> {
    if !super::user_exists_tx(tx, user_id)? {
        return Err(StoreError::AssigneeUnknown);
    }
    if !super::membership_exists_tx(tx, user_id, board_id)? {
        return Err(StoreError::AssigneeNotMember);
    }
    Ok(())
}

pub(crate) fn task_row(conn: &Connection, task_id: i64) -> Result<Option<TaskRow>, StoreError> {
    let row = conn
        .query_row(
            r#"
            SELECT id, column_id, title, description, rank, created_by, assigned_to, created_at_ms, updated_at_ms
            FROM tasks
            WHERE id = ?1
            "#,
            params![task_id],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, Option<String>>(3)?,
                    row.get::<_, i64>(4)?,
                    row.get::<_, i64>(5)?,
                    row.get::<_, Option<i64>>(6)?,
                    row.get::<_, i64>(7)?,
                    row.get::<_, i64>(8)?,
                ))
            },
        )
        .optional()?;

    match row {
        Some((
            id,
            column_id,
            title,
            description,
            rank,
            created_by,
            assigned_to,
            created_at_ms,
            updated_at_ms,
        )) => Ok(Some(TaskRow::from_row(
            id,
            column_id,
            title,
            description,
            rank,
            created_by,
            assigned_to,
            created_at_ms,
            updated_at_ms,
        )?)),
        None => Ok(None),
    }
}
