use rusqlite::Connection;
use stackit_core::db::migrations::{current_user_version, latest_version};
use stackit_core::db::{open_db, open_db_in_memory, DbError};
use stackit_core::{RepoError, SqliteUserRepository};

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    for table in [
        "users",
        "questions",
        "answers",
        "tags",
        "question_tags",
        "votes",
        "notifications",
    ] {
        assert_table_exists(&conn, table);
    }
    assert_index_exists(&conn, "idx_answers_single_accepted");
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stackit.db");

    let conn_first = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_first), latest_version());
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(current_user_version(&conn_second).unwrap(), latest_version());
    assert_table_exists(&conn_second, "votes");
}

#[test]
fn open_db_creates_missing_parent_directories() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("data").join("forum").join("stackit.sqlite3");

    let conn = open_db(&db_path).unwrap();
    assert_eq!(schema_version(&conn), latest_version());
    assert!(db_path.exists());
}

#[test]
fn open_db_reports_unusable_storage_directory() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("occupied");
    std::fs::write(&blocker, b"not a directory").unwrap();

    let err = open_db(blocker.join("stackit.sqlite3")).unwrap_err();
    assert!(matches!(err, DbError::StorageDir { ref path, .. } if path == &blocker));
}

#[test]
fn file_connections_use_wal_and_foreign_keys() {
    let dir = tempfile::tempdir().unwrap();
    let conn = open_db(dir.path().join("wal.db")).unwrap();

    let journal_mode: String = conn
        .query_row("PRAGMA journal_mode;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(journal_mode.to_ascii_lowercase(), "wal");

    let foreign_keys: i64 = conn
        .query_row("PRAGMA foreign_keys;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(foreign_keys, 1);
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn repositories_reject_unmigrated_connections() {
    let conn = Connection::open_in_memory().unwrap();
    let result = SqliteUserRepository::try_new(&conn);
    assert!(matches!(
        result,
        Err(RepoError::UninitializedConnection {
            actual_version: 0,
            ..
        })
    ));
}

#[test]
fn schema_rejects_malformed_votes() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch(
        "INSERT INTO users (id, username, email, credential_hash)
             VALUES ('u1', 'voter', 'v@example.com', 'h');
         INSERT INTO questions (id, title, body, author_id)
             VALUES ('q1', 'title', 'body', 'u1');
         INSERT INTO answers (id, question_id, author_id, body)
             VALUES ('a1', 'q1', 'u1', 'body');",
    )
    .unwrap();

    let neither = conn.execute(
        "INSERT INTO votes (id, voter_id, value) VALUES ('v1', 'u1', 1);",
        [],
    );
    assert!(neither.is_err());

    let both = conn.execute(
        "INSERT INTO votes (id, voter_id, question_id, answer_id, value)
         VALUES ('v2', 'u1', 'q1', 'a1', 1);",
        [],
    );
    assert!(both.is_err());

    let zero = conn.execute(
        "INSERT INTO votes (id, voter_id, question_id, value) VALUES ('v3', 'u1', 'q1', 0);",
        [],
    );
    assert!(zero.is_err());

    conn.execute(
        "INSERT INTO votes (id, voter_id, question_id, value) VALUES ('v4', 'u1', 'q1', 1);",
        [],
    )
    .unwrap();
    let duplicate = conn.execute(
        "INSERT INTO votes (id, voter_id, question_id, value) VALUES ('v5', 'u1', 'q1', -1);",
        [],
    );
    assert!(duplicate.is_err());
}

#[test]
fn schema_allows_only_one_accepted_answer_per_question() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch(
        "INSERT INTO users (id, username, email, credential_hash)
             VALUES ('u1', 'author', 'a@example.com', 'h');
         INSERT INTO questions (id, title, body, author_id)
             VALUES ('q1', 'title', 'body', 'u1');
         INSERT INTO answers (id, question_id, author_id, body, is_accepted)
             VALUES ('a1', 'q1', 'u1', 'first', 1);
         INSERT INTO answers (id, question_id, author_id, body)
             VALUES ('a2', 'q1', 'u1', 'second');",
    )
    .unwrap();

    let second_accept = conn.execute("UPDATE answers SET is_accepted = 1 WHERE id = 'a2';", []);
    assert!(second_accept.is_err());
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    assert_schema_object(conn, "table", table_name);
}

fn assert_index_exists(conn: &Connection, index_name: &str) {
    assert_schema_object(conn, "index", index_name);
}

fn assert_schema_object(conn: &Connection, kind: &str, name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = ?1 AND name = ?2
            );",
            [kind, name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "{kind} {name} does not exist");
}
