#![forbid(unsafe_code)]

#[derive(Debug)]
pub enum StoreError {
    Io(std::io::Error),
    Sql(rusqlite::Error),
    InvalidInput(&'static str),
    UnknownId,
    RankOutOfRange {
        requested: i64,
        max: i64,
    },
    BoardChangeForbidden,
    ColumnNotEmpty {
        tasks: i64,
    },
    BoardNotEmpty {
        columns: i64,
    },
    AssigneeUnknown,
    AssigneeNotMember,
    EmailTaken,
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "io: {err}"),
            Self::Sql(err) => write!(f, "sqlite: {err}"),
            Self::InvalidInput(message) => write!(f, "invalid input: {message}"),
            Self::UnknownId => write!(f, "unknown id"),
            Self::RankOutOfRange { requested, max } => {
                write!(f, "rank out of range (requested={requested}, max={max})")
            }
            Self::BoardChangeForbidden => write!(f, "columns cannot move to another board"),
            Self::ColumnNotEmpty { tasks } => {
                write!(f, "column still has {tasks} task(s) and cannot be deleted")
            }
            Self::BoardNotEmpty { columns } => {
                write!(f, "board still has {columns} column(s) and cannot be deleted")
            }
            Self::AssigneeUnknown => write!(f, "assignee must be an existing user"),
            Self::AssigneeNotMember => write!(f, "assignee must be a member of the board"),
            Self::EmailTaken => write!(f, "email is already taken"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<std::io::Error> for StoreError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sql(value)
    }
}

impl From<kb_core::rank::RankError> for StoreError {
    fn from(value: kb_core::rank::RankError) -> Self {
        match value {
            kb_core::rank::RankError::OutOfRange { requested, max } => {
                Self::RankOutOfRange { requested, max }
            }
        }
    }
}
