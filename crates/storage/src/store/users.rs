#![forbid(unsafe_code)]

use super::{SqliteStore, StoreError, UserCreateRequest, UserRow};
use kb_core::ids::UserId;
use kb_core::model::Entity;
use rusqlite::{Connection, OptionalExtension, params};
use serde_json::json;

impl SqliteStore {
    pub fn user_create(&mut self, request: UserCreateRequest) -> Result<UserRow, StoreError> {
        let UserCreateRequest {
            name,
            email,
            password_digest,
        } = request;

        if name.trim().is_empty() {
            return Err(StoreError::InvalidInput("name must not be empty"));
        }
        if email.trim().is_empty() {
            return Err(StoreError::InvalidInput("email must not be empty"));
        }
        if password_digest.is_empty() {
            return Err(StoreError::InvalidInput("password_digest must not be empty"));
        }

        let now_ms = super::now_ms();
        let tx = super::write_tx(&mut self.conn)?;

        let insert = tx.execute(
            r#"
            INSERT INTO users(name, email, password_digest, created_at_ms, updated_at_ms)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![name, email, password_digest, now_ms, now_ms],
        );
        if let Err(err) = insert {
            if super::is_constraint_violation(&err) {
                return Err(StoreError::EmailTaken);
            }
            return Err(StoreError::Sql(err));
        }
        let id = tx.last_insert_rowid();

        let payload = json!({ "user_id": id, "email": email }).to_string();
        super::insert_event_tx(&tx, now_ms, None, Entity::User, Some(id), "user.created", &payload)?;

        let row = UserRow::from_row(id, name, email, password_digest, now_ms, now_ms)?;
        tx.commit()?;
        Ok(row)
    }

    pub fn user_get(&self, user_id: UserId) -> Result<Option<UserRow>, StoreError> {
        user_row(&self.conn, user_id.get())
    }

    /// Lookup for the login path, which only knows the email.
    pub fn user_get_by_email(&self, email: &str) -> Result<Option<UserRow>, StoreError> {
        let row = self
            .conn
            .query_row(
                r#"
                SELECT id, name, email, password_digest, created_at_ms, updated_at_ms
                FROM users
                WHERE email = ?1
                "#,
                params![email],
                read_user_parts,
            )
            .optional()?;

        match row {
            Some((id, name, email, digest, created_at_ms, updated_at_ms)) => Ok(Some(
                UserRow::from_row(id, name, email, digest, created_at_ms, updated_at_ms)?,
            )),
            None => Ok(None),
        }
    }
}

type UserParts = (i64, String, String, String, i64, i64);

fn read_user_parts(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserParts> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
    ))
}

pub(crate) fn user_row(conn: &Connection, user_id: i64) -> Result<Option<UserRow>, StoreError> {
    let row = conn
        .query_row(
            r#"
            SELECT id, name, email, password_digest, created_at_ms, updated_at_ms
            FROM users
            WHERE id = ?1
            "#,
            params![user_id],
            read_user_parts,
        )
        .optional()?;

    match row {
        Some((id, name, email, digest, created_at_ms, updated_at_ms)) => Ok(Some(
            UserRow::from_row(id, name, email, digest, created_at_ms, updated_at_ms)?,
        )),
        None => Ok(None),
    }
}
