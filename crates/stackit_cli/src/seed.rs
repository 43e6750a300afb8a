//! Sample forum data loaded through the core services.
//!
//! Every row goes through the same validation, sanitizing and notification
//! rules as live traffic.

use anyhow::{bail, Context};
use log::info;
use serde_json::json;
use stackit_core::db::Connection;
use stackit_core::{
    AcceptanceService, Actor, AnswerService, NotificationKind, NotificationService,
    QuestionService, SqliteAnswerRepository, SqliteNotificationRepository,
    SqliteQuestionRepository, SqliteTagRepository, SqliteUserRepository, SqliteVoteRepository,
    TagService, UserRole, UserService, VoteLedger, VoteTarget,
};
use std::fmt::{Display, Formatter};

/// Seed accounts cannot log in until the identity provider sets a credential.
const SEED_CREDENTIAL: &str = "!unset";

const USERS: &[(&str, &str, UserRole)] = &[
    ("john_doe", "john@example.com", UserRole::User),
    ("jane_smith", "jane@example.com", UserRole::Admin),
    ("alex_dev", "alex@example.com", UserRole::User),
    ("admin", "admin@stackit.com", UserRole::Admin),
];

const TAGS: &[(&str, &str)] = &[
    ("React", "JavaScript library for building user interfaces"),
    ("JavaScript", "Programming language for web development"),
    ("Python", "High-level programming language"),
    ("Flask", "Micro web framework for Python"),
    ("CSS", "Cascading Style Sheets for styling"),
    ("HTML", "HyperText Markup Language"),
    ("Node.js", "JavaScript runtime environment"),
    ("JWT", "JSON Web Tokens for authentication"),
    ("Authentication", "User authentication and authorization"),
    ("Database", "Data storage and management"),
    ("API", "Application Programming Interface"),
    ("Design", "User interface and experience design"),
    ("Responsive", "Responsive web design"),
    ("Bootstrap", "CSS framework"),
    ("Git", "Version control system"),
];

struct SeedQuestion {
    author: usize,
    title: &'static str,
    body: &'static str,
    tags: &'static [&'static str],
}

const QUESTIONS: &[SeedQuestion] = &[
    SeedQuestion {
        author: 0,
        title: "How to implement JWT authentication in React?",
        body: "<p>I'm trying to implement JWT authentication in my React application. \
               What's the best practice for storing tokens and handling authentication state?</p>\
               <p>Also, how do I handle token expiration and refresh tokens?</p>",
        tags: &["React", "JWT", "Authentication"],
    },
    SeedQuestion {
        author: 2,
        title: "Best practices for responsive design in 2025?",
        body: "<p>What are the current best practices for creating responsive websites?</p>\
               <ul><li>CSS Grid vs Flexbox</li><li>Mobile-first approach</li>\
               <li>Breakpoint strategies</li><li>Image optimization</li></ul>",
        tags: &["CSS", "Responsive", "Design"],
    },
    SeedQuestion {
        author: 0,
        title: "How to handle CORS issues in Flask API?",
        body: "<p>I'm building a Flask API and my React frontend can't connect due to CORS errors.</p>\
               <pre><code>from flask_cors import CORS\napp = Flask(__name__)\nCORS(app)</code></pre>\
               <p>What am I missing?</p>",
        tags: &["Flask", "API", "React"],
    },
    SeedQuestion {
        author: 2,
        title: "Difference between useState and useReducer in React?",
        body: "<p>When should I use useState vs useReducer in React hooks?</p>",
        tags: &["React", "JavaScript"],
    },
    SeedQuestion {
        author: 0,
        title: "How to optimize database queries in SQLAlchemy?",
        body: "<p>My Flask application is getting slow due to database queries. \
               I'm particularly concerned about N+1 queries and want to understand eager loading.</p>",
        tags: &["Python", "Flask", "Database"],
    },
];

struct SeedAnswer {
    author: usize,
    question: usize,
    body: &'static str,
    accepted: bool,
}

const ANSWERS: &[SeedAnswer] = &[
    SeedAnswer {
        author: 1,
        question: 0,
        body: "<p>Store the access token in memory and the refresh token in an httpOnly cookie.</p>\
               <ol><li><strong>Store tokens in memory</strong></li>\
               <li><strong>Use refresh tokens</strong></li>\
               <li><strong>Implement auto-logout</strong> on token expiry</li></ol>",
        accepted: true,
    },
    SeedAnswer {
        author: 2,
        question: 0,
        body: "<p>I'd recommend a state management library like Redux or the Context API \
               to handle authentication state globally.</p>",
        accepted: false,
    },
    SeedAnswer {
        author: 1,
        question: 1,
        body: "<p>Go mobile-first, use CSS Grid for page layouts, Flexbox for components and \
               container queries for component-level breakpoints.</p>",
        accepted: true,
    },
    SeedAnswer {
        author: 1,
        question: 2,
        body: "<p>Configure the allowed origin, headers and methods explicitly:</p>\
               <pre><code>CORS(app, origins=['http://localhost:3000'])</code></pre>",
        accepted: true,
    },
];

enum SeedTarget {
    Question(usize),
    Answer(usize),
}

const VOTES: &[(usize, SeedTarget, i64)] = &[
    (0, SeedTarget::Question(0), 1),
    (1, SeedTarget::Question(0), 1),
    (2, SeedTarget::Question(0), 1),
    (0, SeedTarget::Question(1), 1),
    (1, SeedTarget::Question(1), 1),
    (0, SeedTarget::Answer(0), 1),
    (2, SeedTarget::Answer(0), 1),
    (1, SeedTarget::Answer(1), 1),
];

/// Row counts created by one seed run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    pub users: usize,
    pub tags: usize,
    pub questions: usize,
    pub answers: usize,
    pub votes: usize,
    pub notifications: usize,
}

impl Display for SeedSummary {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "seeded users={} tags={} questions={} answers={} votes={} notifications={}",
            self.users, self.tags, self.questions, self.answers, self.votes, self.notifications
        )
    }
}

/// Loads the sample forum. Refuses to run when sample users already exist.
pub fn seed_sample_forum(conn: &Connection) -> anyhow::Result<SeedSummary> {
    let users = UserService::new(SqliteUserRepository::try_new(conn)?);
    let tags = TagService::new(SqliteTagRepository::try_new(conn)?);
    let questions = QuestionService::new(SqliteQuestionRepository::try_new(conn)?);
    let answers = AnswerService::new(SqliteAnswerRepository::try_new(conn)?);
    let acceptance = AcceptanceService::new(SqliteAnswerRepository::try_new(conn)?);
    let ledger = VoteLedger::new(SqliteVoteRepository::try_new(conn)?);
    let notifications = NotificationService::new(SqliteNotificationRepository::try_new(conn)?);

    if users.find_by_login(USERS[0].0)?.is_some() {
        bail!("database already contains sample data");
    }

    let mut summary = SeedSummary::default();

    let mut actors: Vec<Actor> = Vec::with_capacity(USERS.len());
    for (username, email, role) in USERS {
        let user = users
            .register_user(username, email, SEED_CREDENTIAL, *role)
            .with_context(|| format!("failed to register `{username}`"))?;
        actors.push(Actor::from(&user));
        summary.users += 1;
    }
    let admin = &actors[3];

    for (name, description) in TAGS {
        tags.create_tag(admin, name, Some(*description))
            .with_context(|| format!("failed to create tag `{name}`"))?;
        summary.tags += 1;
    }

    let mut question_ids = Vec::with_capacity(QUESTIONS.len());
    for seed in QUESTIONS {
        let tag_names: Vec<String> = seed.tags.iter().map(|tag| tag.to_string()).collect();
        let record = questions
            .create_question(&actors[seed.author], seed.title, seed.body, &tag_names)
            .with_context(|| format!("failed to create question `{}`", seed.title))?;
        question_ids.push(record.question.id);
        summary.questions += 1;
    }

    let mut answer_ids = Vec::with_capacity(ANSWERS.len());
    for seed in ANSWERS {
        let question_id = question_ids[seed.question];
        let record = answers.create_answer(&actors[seed.author], question_id, seed.body)?;
        if record.answer.author_id != actors[QUESTIONS[seed.question].author].user_id {
            summary.notifications += 1;
        }
        if seed.accepted {
            acceptance.accept_answer(&actors[QUESTIONS[seed.question].author], record.answer.id)?;
            summary.notifications += 1;
        }
        answer_ids.push(record.answer.id);
        summary.answers += 1;
    }

    for (voter, target, value) in VOTES {
        let target = match target {
            SeedTarget::Question(index) => VoteTarget::Question(question_ids[*index]),
            SeedTarget::Answer(index) => VoteTarget::Answer(answer_ids[*index]),
        };
        ledger.cast_vote(&actors[*voter], target, *value)?;
        summary.votes += 1;
    }

    notifications.notify(
        actors[0].user_id,
        NotificationKind::Vote,
        "Your question received 3 upvotes",
        json!({ "question_id": question_ids[0] }),
    )?;
    summary.notifications += 1;

    info!(
        "event=seed module=cli status=ok users={} questions={} answers={}",
        summary.users, summary.questions, summary.answers
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::seed_sample_forum;
    use stackit_core::{
        open_db_in_memory, NotificationService, PageRequest, QuestionListQuery, QuestionService,
        QuestionSort, SqliteNotificationRepository, SqliteQuestionRepository,
        SqliteUserRepository, UserService,
    };

    #[test]
    fn seeds_sample_forum_once() {
        let conn = open_db_in_memory().unwrap();
        let summary = seed_sample_forum(&conn).unwrap();
        assert_eq!(summary.users, 4);
        assert_eq!(summary.tags, 15);
        assert_eq!(summary.questions, 5);
        assert_eq!(summary.answers, 4);
        assert_eq!(summary.votes, 8);
        assert_eq!(summary.notifications, 8);

        let questions = QuestionService::new(SqliteQuestionRepository::try_new(&conn).unwrap());
        let query = QuestionListQuery {
            sort: QuestionSort::Votes,
            ..QuestionListQuery::default()
        };
        let page = questions.list_questions(&query, PageRequest::default()).unwrap();
        assert_eq!(page.total, 5);
        assert_eq!(page.items[0].score, 3);

        let users = UserService::new(SqliteUserRepository::try_new(&conn).unwrap());
        let john_id = users.find_by_login("john_doe").unwrap().unwrap().id;
        let john = users.resolve_actor(john_id).unwrap();
        let inbox = NotificationService::new(SqliteNotificationRepository::try_new(&conn).unwrap())
            .list_notifications(&john, PageRequest::default())
            .unwrap();
        assert_eq!(inbox.unread_count, 4);

        assert!(seed_sample_forum(&conn).is_err());
    }
}
