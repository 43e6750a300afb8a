use rusqlite::Connection;
use stackit_core::db::open_db_in_memory;
use stackit_core::{
    Actor, AnswerId, AnswerService, QuestionId, QuestionService, ServiceError,
    SqliteAnswerRepository, SqliteQuestionRepository, SqliteUserRepository,
    SqliteVoteRepository, UserRole, UserService, VoteDirection, VoteLedger, VoteOutcome,
    VoteTarget,
};

fn register(conn: &Connection, username: &str) -> Actor {
    let service = UserService::new(SqliteUserRepository::try_new(conn).unwrap());
    let user = service
        .register_user(
            username,
            &format!("{username}@example.com"),
            "hash",
            UserRole::User,
        )
        .unwrap();
    Actor::from(&user)
}

fn question_with_answer(conn: &Connection, author: &Actor) -> (QuestionId, AnswerId) {
    let question_id = QuestionService::new(SqliteQuestionRepository::try_new(conn).unwrap())
        .create_question(author, "Title", "body", &[])
        .unwrap()
        .question
        .id;
    let answer_id = AnswerService::new(SqliteAnswerRepository::try_new(conn).unwrap())
        .create_answer(author, question_id, "answer")
        .unwrap()
        .answer
        .id;
    (question_id, answer_id)
}

fn stored_votes(conn: &Connection) -> i64 {
    conn.query_row("SELECT COUNT(*) FROM votes;", [], |row| row.get(0))
        .unwrap()
}

#[test]
fn upvote_change_and_remove_keep_one_row() {
    let conn = open_db_in_memory().unwrap();
    let author = register(&conn, "author");
    let voter = register(&conn, "voter");
    let (question_id, _) = question_with_answer(&conn, &author);
    let ledger = VoteLedger::new(SqliteVoteRepository::try_new(&conn).unwrap());
    let target = VoteTarget::Question(question_id);

    let up = ledger.cast_vote(&voter, target, 1).unwrap();
    assert_eq!(
        up,
        VoteOutcome {
            target,
            score: 1,
            user_vote: 1,
        }
    );
    assert_eq!(ledger.current_vote(&voter, target).unwrap(), Some(VoteDirection::Up));

    let again = ledger.cast_vote(&voter, target, 1).unwrap();
    assert_eq!(again.score, 1);
    assert_eq!(stored_votes(&conn), 1);

    let down = ledger.cast_vote(&voter, target, -1).unwrap();
    assert_eq!(down.score, -1);
    assert_eq!(down.user_vote, -1);
    assert_eq!(stored_votes(&conn), 1);

    let removed = ledger.cast_vote(&voter, target, 0).unwrap();
    assert_eq!(removed.score, 0);
    assert_eq!(removed.user_vote, 0);
    assert_eq!(stored_votes(&conn), 0);
    assert_eq!(ledger.current_vote(&voter, target).unwrap(), None);

    let noop = ledger.cast_vote(&voter, target, 0).unwrap();
    assert_eq!(noop.score, 0);
}

#[test]
fn score_sums_votes_from_many_voters() {
    let conn = open_db_in_memory().unwrap();
    let author = register(&conn, "author");
    let (question_id, answer_id) = question_with_answer(&conn, &author);
    let ledger = VoteLedger::new(SqliteVoteRepository::try_new(&conn).unwrap());

    let voters: Vec<Actor> = ["alice", "bob", "carol"]
        .iter()
        .map(|name| register(&conn, name))
        .collect();
    ledger
        .cast_vote(&voters[0], VoteTarget::Question(question_id), 1)
        .unwrap();
    ledger
        .cast_vote(&voters[1], VoteTarget::Question(question_id), 1)
        .unwrap();
    let outcome = ledger
        .cast_vote(&voters[2], VoteTarget::Question(question_id), -1)
        .unwrap();
    assert_eq!(outcome.score, 1);

    let answer_target = VoteTarget::Answer(answer_id);
    ledger.cast_vote(&voters[0], answer_target, -1).unwrap();
    ledger.cast_vote(&voters[1], answer_target, -1).unwrap();
    assert_eq!(ledger.score(answer_target).unwrap(), -2);
    assert_eq!(ledger.score(VoteTarget::Question(question_id)).unwrap(), 1);

    let answers = AnswerService::new(SqliteAnswerRepository::try_new(&conn).unwrap());
    assert_eq!(answers.get_answer(answer_id, false).unwrap().score, -2);
}

#[test]
fn question_and_answer_votes_are_independent() {
    let conn = open_db_in_memory().unwrap();
    let author = register(&conn, "author");
    let voter = register(&conn, "voter");
    let (question_id, answer_id) = question_with_answer(&conn, &author);
    let ledger = VoteLedger::new(SqliteVoteRepository::try_new(&conn).unwrap());

    ledger
        .cast_vote(&voter, VoteTarget::Question(question_id), 1)
        .unwrap();
    ledger
        .cast_vote(&voter, VoteTarget::Answer(answer_id), 1)
        .unwrap();
    assert_eq!(stored_votes(&conn), 2);

    ledger
        .cast_vote(&voter, VoteTarget::Answer(answer_id), 0)
        .unwrap();
    assert_eq!(ledger.score(VoteTarget::Question(question_id)).unwrap(), 1);
    assert_eq!(ledger.score(VoteTarget::Answer(answer_id)).unwrap(), 0);
}

#[test]
fn invalid_values_and_missing_targets_are_rejected() {
    let conn = open_db_in_memory().unwrap();
    let author = register(&conn, "author");
    let voter = register(&conn, "voter");
    let (question_id, _) = question_with_answer(&conn, &author);
    let ledger = VoteLedger::new(SqliteVoteRepository::try_new(&conn).unwrap());

    for value in [2, -2, 100] {
        let err = ledger
            .cast_vote(&voter, VoteTarget::Question(question_id), value)
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }
    assert_eq!(stored_votes(&conn), 0);

    let missing = VoteTarget::Answer(uuid::Uuid::new_v4());
    let err = ledger.cast_vote(&voter, missing, 1).unwrap_err();
    assert!(matches!(err, ServiceError::NotFound { entity: "answer", .. }));
    let err = ledger.score(missing).unwrap_err();
    assert_eq!(err.code(), "not_found");
}

#[test]
fn votes_on_soft_deleted_targets_are_rejected_but_kept() {
    let conn = open_db_in_memory().unwrap();
    let author = register(&conn, "author");
    let voter = register(&conn, "voter");
    let (question_id, answer_id) = question_with_answer(&conn, &author);
    let ledger = VoteLedger::new(SqliteVoteRepository::try_new(&conn).unwrap());
    let answers = AnswerService::new(SqliteAnswerRepository::try_new(&conn).unwrap());

    let target = VoteTarget::Answer(answer_id);
    ledger.cast_vote(&voter, target, 1).unwrap();
    answers.delete_answer(&author, answer_id).unwrap();

    let err = ledger.cast_vote(&voter, target, -1).unwrap_err();
    assert!(matches!(err, ServiceError::NotFound { .. }));
    let err = ledger.cast_vote(&voter, target, 0).unwrap_err();
    assert!(matches!(err, ServiceError::NotFound { .. }));

    assert_eq!(ledger.score(target).unwrap(), 1);
    assert_eq!(ledger.current_vote(&voter, target).unwrap(), Some(VoteDirection::Up));

    let question_target = VoteTarget::Question(question_id);
    ledger.cast_vote(&voter, question_target, 1).unwrap();
    QuestionService::new(SqliteQuestionRepository::try_new(&conn).unwrap())
        .delete_question(&author, question_id)
        .unwrap();
    let err = ledger.cast_vote(&voter, question_target, 1).unwrap_err();
    assert!(matches!(err, ServiceError::NotFound { entity: "question", .. }));
    assert_eq!(ledger.score(question_target).unwrap(), 1);
}
