#![forbid(unsafe_code)]

use kb_core::ids::{BoardId, ColumnId, TaskId, UserId};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserCreateRequest {
    pub name: String,
    pub email: String,
    /// Opaque digest supplied by the authentication layer; never a raw
    /// password.
    pub password_digest: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BoardCreateRequest {
    pub name: String,
    pub created_by: UserId,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MembershipAddRequest {
    pub user_id: UserId,
    pub board_id: BoardId,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColumnCreateRequest {
    pub board_id: BoardId,
    pub name: String,
    pub rank: i64,
    pub created_by: UserId,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColumnUpdateRequest {
    pub column_id: ColumnId,
    pub name: Option<String>,
    pub rank: Option<i64>,
    /// Columns never change boards; anything other than the current board id
    /// here is refused.
    pub board_id: Option<BoardId>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TaskCreateRequest {
    pub column_id: ColumnId,
    pub title: String,
    pub description: Option<String>,
    pub rank: i64,
    pub created_by: UserId,
    pub assigned_to: Option<UserId>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TaskUpdateRequest {
    pub task_id: TaskId,
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub assigned_to: Option<Option<UserId>>,
    /// Destination column for a cross-column move; requires `rank` to be set
    /// as well.
    pub column_id: Option<ColumnId>,
    pub rank: Option<i64>,
}

impl TaskUpdateRequest {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.assigned_to.is_none()
            && self.column_id.is_none()
            && self.rank.is_none()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EventsListRequest {
    pub board_id: Option<BoardId>,
    pub since_seq: i64,
    pub limit: usize,
}
