#![forbid(unsafe_code)]

use super::{MembershipAddRequest, MembershipRow, SqliteStore, StoreError};
use kb_core::ids::{BoardId, UserId};
use kb_core::model::Entity;
use rusqlite::params;
use serde_json::json;

impl SqliteStore {
    pub fn membership_add(
        &mut self,
        request: MembershipAddRequest,
    ) -> Result<MembershipRow, StoreError> {
        let MembershipAddRequest { user_id, board_id } = request;

        let now_ms = super::now_ms();
        let tx = super::write_tx(&mut self.conn)?;

        if !super::user_exists_tx(&tx, user_id.get())? {
            return Err(StoreError::InvalidInput("user does not exist"));
        }
        if !super::board_exists_tx(&tx, board_id.get())? {
            return Err(StoreError::UnknownId);
        }

        let insert = tx.execute(
            "INSERT INTO memberships(user_id, board_id, created_at_ms) VALUES (?1, ?2, ?3)",
            params![user_id.get(), board_id.get(), now_ms],
        );
        if let Err(err) = insert {
            if super::is_constraint_violation(&err) {
                return Err(StoreError::InvalidInput("user is already a member"));
            }
            return Err(StoreError::Sql(err));
        }

        let payload =
            json!({ "user_id": user_id.get(), "board_id": board_id.get() }).to_string();
        super::insert_event_tx(
            &tx,
            now_ms,
            Some(board_id.get()),
            Entity::Membership,
            Some(user_id.get()),
            "membership.added",
            &payload,
        )?;

        tx.commit()?;
        Ok(MembershipRow::from_row(user_id.get(), board_id.get(), now_ms)?)
    }

    pub fn membership_remove(
        &mut self,
        user_id: UserId,
        board_id: BoardId,
    ) -> Result<bool, StoreError> {
        let now_ms = super::now_ms();
        let tx = super::write_tx(&mut self.conn)?;

        let deleted = tx.execute(
            "DELETE FROM memberships WHERE user_id = ?1 AND board_id = ?2",
            params![user_id.get(), board_id.get()],
        )?;

        if deleted > 0 {
            let payload =
                json!({ "user_id": user_id.get(), "board_id": board_id.get() }).to_string();
            super::insert_event_tx(
                &tx,
                now_ms,
                Some(board_id.get()),
                Entity::Membership,
                Some(user_id.get()),
                "membership.removed",
                &payload,
            )?;
        }

        tx.commit()?;
        Ok(deleted > 0)
    }

    pub fn membership_exists(
        &self,
        user_id: UserId,
        board_id: BoardId,
    ) -> Result<bool, StoreError> {
        use rusqlite::OptionalExtension;

        Ok(self
            .conn
            .query_row(
                "SELECT 1 FROM memberships WHERE user_id = ?1 AND board_id = ?2",
                params![user_id.get(), board_id.get()],
                |row| row.get::<_, i64>(0),
            )
            .optional()?
            .is_some())
    }

    pub fn memberships_list(
        &self,
        board_id: BoardId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<MembershipRow>, StoreError> {
        let limit = super::to_sqlite_i64(limit)?;
        let offset = super::to_sqlite_i64(offset)?;

        let mut stmt = self.conn.prepare(
            r#"
            SELECT user_id, board_id, created_at_ms
            FROM memberships
            WHERE board_id = ?1
            ORDER BY created_at_ms ASC, user_id ASC
            LIMIT ?2 OFFSET ?3
            "#,
        )?;

        let mut rows = stmt.query(params![board_id.get(), limit, offset])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            out.push(MembershipRow::from_row(
                row.get::<_, i64>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, i64>(2)?,
            )?);
        }
        Ok(out)
    }
}
