#![forbid(unsafe_code)]

use super::StoreError;
use kb_core::ids::{BoardId, ColumnId, TaskId, UserId};

#[derive(Clone, Debug)]
pub struct UserRow {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub password_digest: String,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
}

impl UserRow {
    pub(crate) fn from_row(
        id: i64,
        name: String,
        email: String,
        password_digest: String,
        created_at_ms: i64,
        updated_at_ms: i64,
    ) -> Result<Self, StoreError> {
        Ok(Self {
            id: UserId::try_new(id).map_err(|_| StoreError::InvalidInput("invalid user row"))?,
            name,
            email,
            password_digest,
            created_at_ms,
            updated_at_ms,
        })
    }
}

#[derive(Clone, Debug)]
pub struct BoardRow {
    pub id: BoardId,
    pub name: String,
    pub created_by: UserId,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
}

impl BoardRow {
    pub(crate) fn from_row(
        id: i64,
        name: String,
        created_by: i64,
        created_at_ms: i64,
        updated_at_ms: i64,
    ) -> Result<Self, StoreError> {
        Ok(Self {
            id: BoardId::try_new(id).map_err(|_| StoreError::InvalidInput("invalid board row"))?,
            name,
            created_by: UserId::try_new(created_by)
                .map_err(|_| StoreError::InvalidInput("invalid board row"))?,
            created_at_ms,
            updated_at_ms,
        })
    }
}

#[derive(Clone, Debug)]
pub struct MembershipRow {
    pub user_id: UserId,
    pub board_id: BoardId,
    pub created_at_ms: i64,
}

impl MembershipRow {
    pub(crate) fn from_row(
        user_id: i64,
        board_id: i64,
        created_at_ms: i64,
    ) -> Result<Self, StoreError> {
        Ok(Self {
            user_id: UserId::try_new(user_id)
                .map_err(|_| StoreError::InvalidInput("invalid membership row"))?,
            board_id: BoardId::try_new(board_id)
                .map_err(|_| StoreError::InvalidInput("invalid membership row"))?,
            created_at_ms,
        })
    }
}

#[derive(Clone, Debug)]
pub struct ColumnRow {
    pub id: ColumnId,
    pub board_id: BoardId,
    pub name: String,
    pub rank: i64,
    pub created_by: UserId,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
}

impl ColumnRow {
    pub(crate) fn from_row(
        id: i64,
        board_id: i64,
        name: String,
        rank: i64,
        created_by: i64,
        created_at_ms: i64,
        updated_at_ms: i64,
    ) -> Result<Self, StoreError> {
        Ok(Self {
            id: ColumnId::try_new(id)
                .map_err(|_| StoreError::InvalidInput("invalid column row"))?,
            board_id: BoardId::try_new(board_id)
                .map_err(|_| StoreError::InvalidInput("invalid column row"))?,
            name,
            rank,
            created_by: UserId::try_new(created_by)
                .map_err(|_| StoreError::InvalidInput("invalid column row"))?,
            created_at_ms,
            updated_at_ms,
        })
    }
}

#[derive(Clone, Debug)]
pub struct TaskRow {
    pub id: TaskId,
    pub column_id: ColumnId,
    pub title: String,
    pub description: Option<String>,
    pub rank: i64,
    pub created_by: UserId,
    pub assigned_to: Option<UserId>,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
}

impl TaskRow {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_row(
        id: i64,
        column_id: i64,
        title: String,
        description: Option<String>,
        rank: i64,
        created_by: i64,
        assigned_to: Option<i64>,
        created_at_ms: i64,
        updated_at_ms: i64,
    ) -> Result<Self, StoreError> {
        Ok(Self {
            id: TaskId::try_new(id).map_err(|_| StoreError::InvalidInput("invalid task row"))?,
            column_id: ColumnId::try_new(column_id)
                .map_err(|_| StoreError::InvalidInput("invalid task row"))?,
            title,
            description,
            rank,
            created_by: UserId::try_new(created_by)
                .map_err(|_| StoreError::InvalidInput("invalid task row"))?,
            assigned_to: assigned_to
                .map(UserId::try_new)
                .transpose()
                .map_err(|_| StoreError::InvalidInput("invalid task row"))?,
            created_at_ms,
            updated_at_ms,
        })
    }
}

/// One journal entry. Written in the same transaction as the mutation it
/// records; `board_id`/`entity_id` are plain integers because the journal
/// outlives the rows it refers to.
#[derive(Clone, Debug)]
pub struct EventRow {
    pub seq: i64,
    pub ts_ms: i64,
    pub board_id: Option<i64>,
    pub entity: String,
    pub entity_id: Option<i64>,
    pub event_type: String,
    pub payload_json: String,
}
