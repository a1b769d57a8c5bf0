#![forbid(unsafe_code)]

use kb_core::ids::{BoardId, UserId};
use kb_storage::{
    BoardCreateRequest, ColumnCreateRequest, EventsListRequest, MembershipAddRequest, SqliteStore,
    StoreError, UserCreateRequest,
};
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

fn open_store(test_name: &str) -> SqliteStore {
    SqliteStore::open(temp_dir(test_name)).expect("open store")
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

#[test]
fn email_must_be_unique() {
    let mut store = open_store("email_must_be_unique");
    seed_user(&mut store, "dev@example.com");

    let err = store
        .user_create(UserCreateRequest {
            name: "Other Dev".to_string(),
            email: "dev@example.com".to_string(),
            password_digest: "digest".to_string(),
        })
        .expect_err("duplicate email must fail");
    assert!(matches!(err, StoreError::EmailTaken), "got {err:?}");
}

#[test]
fn login_lookup_finds_users_by_email() {
    let mut store = open_store("login_lookup_finds_users_by_email");
    let id = seed_user(&mut store, "dev@example.com");

    let found = store
        .user_get_by_email("dev@example.com")
        .expect("lookup user")
        .expect("user exists");
    assert_eq!(found.id, id);
    assert_eq!(found.password_digest, "digest");
    assert!(
        store
            .user_get_by_email("nobody@example.com")
            .expect("lookup user")
            .is_none()
    );
}

#[test]
fn board_creator_becomes_a_member() {
    let mut store = open_store("board_creator_becomes_a_member");
    let owner = seed_user(&mut store, "owner@example.com");
    let board = seed_board(&mut store, owner);

    assert!(store.membership_exists(owner, board).expect("check membership"));
    let boards = store
        .boards_list_for_user(owner, 10, 0)
        .expect("list boards");
    assert_eq!(boards.len(), 1);
    assert_eq!(boards[0].id, board);
}

#[test]
fn memberships_are_added_and_removed() {
    let mut store = open_store("memberships_are_added_and_removed");
    let owner = seed_user(&mut store, "owner@example.com");
    let guest = seed_user(&mut store, "guest@example.com");
    let board = seed_board(&mut store, owner);

    assert!(!store.membership_exists(guest, board).expect("check membership"));
    store
        .membership_add(MembershipAddRequest {
            user_id: guest,
            board_id: board,
        })
        .expect("add membership");
    assert!(store.membership_exists(guest, board).expect("check membership"));
    assert_eq!(
        store
            .memberships_list(board, 10, 0)
            .expect("list memberships")
            .len(),
        2
    );

    let err = store
        .membership_add(MembershipAddRequest {
            user_id: guest,
            board_id: board,
        })
        .expect_err("duplicate membership must fail");
    assert!(matches!(err, StoreError::InvalidInput(_)), "got {err:?}");

    assert!(store.membership_remove(guest, board).expect("remove membership"));
    assert!(!store.membership_exists(guest, board).expect("check membership"));
    assert!(!store.membership_remove(guest, board).expect("second remove"));
}

#[test]
fn board_delete_is_refused_while_columns_remain() {
    let mut store = open_store("board_delete_is_refused_while_columns_remain");
    let owner = seed_user(&mut store, "owner@example.com");
    let board = seed_board(&mut store, owner);
    let column = store
        .column_create(ColumnCreateRequest {
            board_id: board,
            name: "todo".to_string(),
            rank: 1,
            created_by: owner,
        })
        .expect("create column")
        .id;

    let err = store
        .board_delete(board)
        .expect_err("delete of a board with columns must fail");
    match err {
        StoreError::BoardNotEmpty { columns } => assert_eq!(columns, 1),
        other => panic!("expected BoardNotEmpty, got {other:?}"),
    }

    store.column_delete(column).expect("delete column");
    store.board_delete(board).expect("delete board");
    assert!(store.board_get(board).expect("get board").is_none());
    assert!(!store.membership_exists(owner, board).expect("check membership"));
}

#[test]
fn events_journal_records_mutations_in_order() {
    let mut store = open_store("events_journal_records_mutations_in_order");
    let owner = seed_user(&mut store, "owner@example.com");
    let board = seed_board(&mut store, owner);
    store
        .column_create(ColumnCreateRequest {
            board_id: board,
            name: "todo".to_string(),
            rank: 1,
            created_by: owner,
        })
        .expect("create column");

    let events = store
        .events_list(EventsListRequest {
            board_id: Some(board),
            since_seq: 0,
            limit: 100,
        })
        .expect("list events");
    let types: Vec<&str> = events.iter().map(|event| event.event_type.as_str()).collect();
    assert_eq!(types, vec!["board.created", "column.created"]);
    assert!(events.windows(2).all(|pair| pair[0].seq < pair[1].seq));

    let later = store
        .events_list(EventsListRequest {
            board_id: Some(board),
            since_seq: events[0].seq,
            limit: 100,
        })
        .expect("list events since");
    assert_eq!(later.len(), 1);
    assert_eq!(later[0].event_type, "column.created");
}
