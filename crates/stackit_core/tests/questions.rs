use rusqlite::{params, Connection};
use stackit_core::db::open_db_in_memory;
use stackit_core::{
    Actor, AnswerService, PageRequest, QuestionListQuery, QuestionPatch, QuestionService,
    QuestionSort, ServiceError, SortOrder, SqliteAnswerRepository, SqliteQuestionRepository,
    SqliteUserRepository, SqliteVoteRepository, UserRole, UserService, VoteLedger, VoteTarget,
};

fn register(conn: &Connection, username: &str, role: UserRole) -> Actor {
    let service = UserService::new(SqliteUserRepository::try_new(conn).unwrap());
    let user = service
        .register_user(username, &format!("{username}@example.com"), "hash", role)
        .unwrap();
    Actor::from(&user)
}

fn tags(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| name.to_string()).collect()
}

#[test]
fn create_question_normalizes_input_and_links_tags() {
    let conn = open_db_in_memory().unwrap();
    let author = register(&conn, "asker", UserRole::User);
    let service = QuestionService::new(SqliteQuestionRepository::try_new(&conn).unwrap());

    let record = service
        .create_question(
            &author,
            "  How to center a div?  ",
            "<p>Use <strong>flexbox</strong></p><script>alert(1)</script>",
            &tags(&["css", " html ", "css", "CSS"]),
        )
        .unwrap();

    assert_eq!(record.question.title, "How to center a div?");
    assert_eq!(record.question.body, "<p>Use <strong>flexbox</strong></p>");
    assert_eq!(record.question.author_id, author.user_id);
    assert_eq!(record.author_username, "asker");
    assert_eq!(record.tags, vec!["CSS", "css", "html"]);
    assert_eq!(record.score, 0);
    assert_eq!(record.answers_count, 0);
    assert_eq!(record.question.views, 0);

    let tag_rows: i64 = conn
        .query_row("SELECT COUNT(*) FROM tags;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(tag_rows, 3);
}

#[test]
fn create_question_rejects_blank_fields_without_writing() {
    let conn = open_db_in_memory().unwrap();
    let author = register(&conn, "asker", UserRole::User);
    let service = QuestionService::new(SqliteQuestionRepository::try_new(&conn).unwrap());

    let blank_title = service
        .create_question(&author, "   ", "body", &[])
        .unwrap_err();
    assert!(matches!(blank_title, ServiceError::Validation(_)));

    let markup_only = service
        .create_question(&author, "Title", "<script>x()</script><div></div>", &[])
        .unwrap_err();
    assert!(matches!(markup_only, ServiceError::Validation(_)));

    let blank_tag = service
        .create_question(&author, "Title", "body", &tags(&["rust", "  "]))
        .unwrap_err();
    assert!(matches!(blank_tag, ServiceError::Validation(_)));

    let long_title = "x".repeat(201);
    let too_long = service
        .create_question(&author, &long_title, "body", &[])
        .unwrap_err();
    assert!(matches!(too_long, ServiceError::Validation(_)));

    let rows: i64 = conn
        .query_row("SELECT COUNT(*) FROM questions;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(rows, 0);
}

#[test]
fn update_question_applies_partial_patch_and_refreshes_updated_at() {
    let conn = open_db_in_memory().unwrap();
    let author = register(&conn, "asker", UserRole::User);
    let service = QuestionService::new(SqliteQuestionRepository::try_new(&conn).unwrap());
    let created = service
        .create_question(&author, "Original", "original body", &tags(&["a", "b"]))
        .unwrap();
    let id = created.question.id;
    conn.execute(
        "UPDATE questions SET updated_at = 1000 WHERE id = ?1;",
        params![id.to_string()],
    )
    .unwrap();

    let patched = service
        .update_question(
            &author,
            id,
            &QuestionPatch {
                tags: Some(tags(&["c"])),
                ..QuestionPatch::default()
            },
        )
        .unwrap();
    assert_eq!(patched.question.title, "Original");
    assert_eq!(patched.question.body, "original body");
    assert_eq!(patched.tags, vec!["c"]);
    assert!(patched.question.updated_at > 1000);

    conn.execute(
        "UPDATE questions SET updated_at = 1000 WHERE id = ?1;",
        params![id.to_string()],
    )
    .unwrap();
    let touched = service
        .update_question(&author, id, &QuestionPatch::default())
        .unwrap();
    assert!(touched.question.updated_at > 1000);
    assert_eq!(touched.tags, vec!["c"]);

    let retitled = service
        .update_question(
            &author,
            id,
            &QuestionPatch {
                title: Some(" New title ".to_string()),
                tags: Some(Vec::new()),
                ..QuestionPatch::default()
            },
        )
        .unwrap();
    assert_eq!(retitled.question.title, "New title");
    assert!(retitled.tags.is_empty());
}

#[test]
fn only_author_or_admin_can_edit_or_delete() {
    let conn = open_db_in_memory().unwrap();
    let author = register(&conn, "asker", UserRole::User);
    let stranger = register(&conn, "stranger", UserRole::User);
    let admin = register(&conn, "moderator", UserRole::Admin);
    let service = QuestionService::new(SqliteQuestionRepository::try_new(&conn).unwrap());
    let id = service
        .create_question(&author, "Title", "body", &[])
        .unwrap()
        .question
        .id;

    let patch = QuestionPatch {
        body: Some("hijacked".to_string()),
        ..QuestionPatch::default()
    };
    let err = service.update_question(&stranger, id, &patch).unwrap_err();
    assert!(matches!(err, ServiceError::Permission(_)));
    let err = service.delete_question(&stranger, id).unwrap_err();
    assert!(matches!(err, ServiceError::Permission(_)));

    let unchanged = service.find_question(id, false).unwrap().unwrap();
    assert_eq!(unchanged.question.body, "body");

    let edited = service.update_question(&admin, id, &patch).unwrap();
    assert_eq!(edited.question.body, "hijacked");
    service.delete_question(&admin, id).unwrap();
}

#[test]
fn soft_delete_is_idempotent_and_hides_question_from_reads_and_writes() {
    let conn = open_db_in_memory().unwrap();
    let author = register(&conn, "asker", UserRole::User);
    let answerer = register(&conn, "helper", UserRole::User);
    let questions = QuestionService::new(SqliteQuestionRepository::try_new(&conn).unwrap());
    let answers = AnswerService::new(SqliteAnswerRepository::try_new(&conn).unwrap());
    let ledger = VoteLedger::new(SqliteVoteRepository::try_new(&conn).unwrap());

    let id = questions
        .create_question(&author, "Title", "body", &[])
        .unwrap()
        .question
        .id;
    let answer = answers.create_answer(&answerer, id, "answer").unwrap();
    ledger
        .cast_vote(&answerer, VoteTarget::Question(id), 1)
        .unwrap();

    questions.delete_question(&author, id).unwrap();
    questions.delete_question(&author, id).unwrap();

    assert!(questions.find_question(id, false).unwrap().is_none());
    let hidden = questions.find_question(id, true).unwrap().unwrap();
    assert!(!hidden.question.is_active);
    assert_eq!(hidden.score, 1);

    let err = questions.get_question(id).unwrap_err();
    assert!(matches!(err, ServiceError::NotFound { entity: "question", .. }));
    let err = questions
        .update_question(&author, id, &QuestionPatch::default())
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound { .. }));
    let err = answers.create_answer(&answerer, id, "late").unwrap_err();
    assert!(matches!(err, ServiceError::NotFound { .. }));

    let still_there = answers.get_answer(answer.answer.id, false).unwrap();
    assert!(still_there.answer.is_active);
    assert_eq!(ledger.score(VoteTarget::Question(id)).unwrap(), 1);

    let page = questions
        .list_questions(&QuestionListQuery::default(), PageRequest::default())
        .unwrap();
    assert_eq!(page.total, 0);
}

#[test]
fn get_question_counts_views_and_includes_active_answers() {
    let conn = open_db_in_memory().unwrap();
    let author = register(&conn, "asker", UserRole::User);
    let helper = register(&conn, "helper", UserRole::User);
    let questions = QuestionService::new(SqliteQuestionRepository::try_new(&conn).unwrap());
    let answers = AnswerService::new(SqliteAnswerRepository::try_new(&conn).unwrap());

    let id = questions
        .create_question(&author, "Title", "body", &[])
        .unwrap()
        .question
        .id;
    let kept = answers.create_answer(&helper, id, "first").unwrap();
    let removed = answers.create_answer(&helper, id, "second").unwrap();
    answers.delete_answer(&helper, removed.answer.id).unwrap();

    let first = questions.get_question(id).unwrap();
    assert_eq!(first.question.question.views, 1);
    assert_eq!(first.question.answers_count, 1);
    assert_eq!(first.answers.len(), 1);
    assert_eq!(first.answers[0].answer.id, kept.answer.id);

    let second = questions.get_question(id).unwrap();
    assert_eq!(second.question.question.views, 2);

    let peek = questions.find_question(id, false).unwrap().unwrap();
    assert_eq!(peek.question.views, 2);

    let missing = questions.get_question(uuid::Uuid::new_v4()).unwrap_err();
    assert_eq!(missing.code(), "not_found");
}

#[test]
fn list_questions_filters_sorts_and_paginates() {
    let conn = open_db_in_memory().unwrap();
    let author = register(&conn, "asker", UserRole::User);
    let voter = register(&conn, "voter", UserRole::User);
    let questions = QuestionService::new(SqliteQuestionRepository::try_new(&conn).unwrap());
    let ledger = VoteLedger::new(SqliteVoteRepository::try_new(&conn).unwrap());

    let react = questions
        .create_question(&author, "React hooks", "useState or useReducer?", &tags(&["React"]))
        .unwrap();
    let flask = questions
        .create_question(&author, "Flask CORS", "100% broken", &tags(&["Flask", "API"]))
        .unwrap();
    let css = questions
        .create_question(&author, "Centering", "flexbox please", &tags(&["CSS"]))
        .unwrap();

    for (id, created_at, views) in [
        (react.question.id, 1000, 5),
        (flask.question.id, 2000, 50),
        (css.question.id, 3000, 1),
    ] {
        conn.execute(
            "UPDATE questions SET created_at = ?2, views = ?3 WHERE id = ?1;",
            params![id.to_string(), created_at, views],
        )
        .unwrap();
    }
    ledger
        .cast_vote(&voter, VoteTarget::Question(css.question.id), 1)
        .unwrap();
    ledger
        .cast_vote(&voter, VoteTarget::Question(flask.question.id), -1)
        .unwrap();

    let ids = |query: &QuestionListQuery| -> Vec<uuid::Uuid> {
        questions
            .list_questions(query, PageRequest::default())
            .unwrap()
            .items
            .into_iter()
            .map(|record| record.question.id)
            .collect()
    };

    let newest_first = ids(&QuestionListQuery::default());
    assert_eq!(
        newest_first,
        vec![css.question.id, flask.question.id, react.question.id]
    );

    let by_views = ids(&QuestionListQuery {
        sort: QuestionSort::Views,
        ..QuestionListQuery::default()
    });
    assert_eq!(by_views[0], flask.question.id);

    let by_votes_asc = ids(&QuestionListQuery {
        sort: QuestionSort::Votes,
        order: SortOrder::Asc,
        ..QuestionListQuery::default()
    });
    assert_eq!(by_votes_asc[0], flask.question.id);
    assert_eq!(by_votes_asc[2], css.question.id);

    let searched = ids(&QuestionListQuery {
        search: Some(" useReducer ".to_string()),
        ..QuestionListQuery::default()
    });
    assert_eq!(searched, vec![react.question.id]);

    let literal_percent = ids(&QuestionListQuery {
        search: Some("100%".to_string()),
        ..QuestionListQuery::default()
    });
    assert_eq!(literal_percent, vec![flask.question.id]);

    let tagged = ids(&QuestionListQuery {
        tags: tags(&["CSS", "React", "react"]),
        ..QuestionListQuery::default()
    });
    assert_eq!(tagged, vec![css.question.id, react.question.id]);

    let page = questions
        .list_questions(&QuestionListQuery::default(), PageRequest::new(2, 2))
        .unwrap();
    assert_eq!(page.total, 3);
    assert_eq!(page.pages(), 2);
    assert_eq!(page.page, 2);
    assert_eq!(page.per_page, 2);
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].question.id, react.question.id);

    let clamped = questions
        .list_questions(&QuestionListQuery::default(), PageRequest::new(1, 500))
        .unwrap();
    assert_eq!(clamped.per_page, 100);
}
