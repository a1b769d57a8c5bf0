#![forbid(unsafe_code)]

use kb_core::ids::{BoardId, ColumnId, UserId};
use kb_storage::{
    BoardCreateRequest, ColumnCreateRequest, SqliteStore, StoreError, TaskCreateRequest,
    TaskUpdateRequest, UserCreateRequest,
};
use rusqlite::{Connection, params};
use std::path::PathBuf;

fn temp_dir(test_name: &str) -> PathBuf {
    let base = std::env::temp_dir();
    let pid = std::process::id();
    let nonce = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let dir = base.join(format!("kb_storage_{test_name}_{pid}_{nonce}"));
    std::fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

fn seed_user(store: &mut SqliteStore, email: &str) -> UserId {
    store
        .user_create(UserCreateRequest {
            name: "Dev".to_string(),
            email: email.to_string(),
            password_digest: "digest".to_string(),
        })
        .expect("create user")
        .id
}

fn seed_board(store: &mut SqliteStore, owner: UserId) -> BoardId {
    store
        .board_create(BoardCreateRequest {
            name: "Sprint".to_string(),
            created_by: owner,
        })
        .expect("create board")
        .id
}

fn seed_column(store: &mut SqliteStore, board: BoardId, owner: UserId, rank: i64) -> ColumnId {
    store
        .column_create(ColumnCreateRequest {
            board_id: board,
            name: format!("column-{rank}"),
            rank,
            created_by: owner,
        })
        .expect("create column")
        .id
}

fn seed_task(store: &mut SqliteStore, column: ColumnId, owner: UserId, title: &str, rank: i64) {
    store
        .task_create(TaskCreateRequest {
            column_id: column,
            title: title.to_string(),
            description: None,
            rank,
            created_by: owner,
            assigned_to: None,
        })
        .expect("create task");
}

fn task_order(store: &SqliteStore, column: ColumnId) -> Vec<(String, i64)> {
    store
        .tasks_list(column)
        .expect("list tasks")
        .into_iter()
        .map(|task| (task.title, task.rank))
        .collect()
}

#[test]
fn rejected_insert_applies_no_shift() {
    let storage_dir = temp_dir("rejected_insert_applies_no_shift");
    let mut store = SqliteStore::open(&storage_dir).expect("open store");
    let owner = seed_user(&mut store, "dev@example.com");
    let board = seed_board(&mut store, owner);
    let column = seed_column(&mut store, board, owner, 1);
    seed_task(&mut store, column, owner, "A", 1);
    seed_task(&mut store, column, owner, "B", 2);
    seed_task(&mut store, column, owner, "C", 3);

    let before = task_order(&store, column);
    let err = store
        .task_create(TaskCreateRequest {
            column_id: column,
            title: "too far".to_string(),
            description: None,
            rank: 10,
            created_by: owner,
            assigned_to: None,
        })
        .expect_err("out-of-range insert must fail");
    assert!(matches!(err, StoreError::RankOutOfRange { .. }), "got {err:?}");
    assert_eq!(task_order(&store, column), before);
}

#[test]
fn rejected_cross_move_leaves_both_columns_untouched() {
    let storage_dir = temp_dir("rejected_cross_move_leaves_both_columns_untouched");
    let mut store = SqliteStore::open(&storage_dir).expect("open store");
    let owner = seed_user(&mut store, "dev@example.com");
    let board = seed_board(&mut store, owner);
    let column1 = seed_column(&mut store, board, owner, 1);
    let column2 = seed_column(&mut store, board, owner, 2);
    seed_task(&mut store, column1, owner, "T1", 1);
    seed_task(&mut store, column1, owner, "T2", 2);
    seed_task(&mut store, column2, owner, "U1", 1);

    let t2 = store.tasks_list(column1).expect("list tasks")[1].id;
    let source_before = task_order(&store, column1);
    let destination_before = task_order(&store, column2);

    // Validation happens against the destination before either scope is
    // shifted, so a bad target rank leaves no trace in the source either.
    let err = store
        .task_update(TaskUpdateRequest {
            task_id: t2,
            title: None,
            description: None,
            assigned_to: None,
            column_id: Some(column2),
            rank: Some(9),
        })
        .expect_err("out-of-range destination must fail");
    match err {
        StoreError::RankOutOfRange { requested, max } => {
            assert_eq!(requested, 9);
            assert_eq!(max, 2);
        }
        other => panic!("expected RankOutOfRange, got {other:?}"),
    }
    assert_eq!(task_order(&store, column1), source_before);
    assert_eq!(task_order(&store, column2), destination_before);
}

#[test]
fn uncommitted_transaction_is_not_persisted_after_reopen() {
    let storage_dir = temp_dir("uncommitted_transaction_is_not_persisted_after_reopen");

    {
        let _store = SqliteStore::open(&storage_dir).expect("open store");
    }

    let db_path = storage_dir.join("kanban.db");
    {
        let mut conn = Connection::open(&db_path).expect("open db");
        let tx = conn.transaction().expect("begin tx");
        tx.execute(
            "INSERT INTO users (name, email, password_digest, created_at_ms, updated_at_ms) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params!["Ghost", "ghost@example.com", "digest", 0i64, 0i64],
        )
        .expect("insert user");
        // Drop without commit -> rollback (simulated crash before commit).
    }

    let store = SqliteStore::open(&storage_dir).expect("open store again");
    let found = store
        .user_get_by_email("ghost@example.com")
        .expect("lookup user");
    assert!(found.is_none(), "uncommitted transaction should not persist");
}
