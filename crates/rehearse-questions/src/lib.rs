//! Community question board for the Rehearse platform.
//!
//! Implements question persistence, the per-user vote ledger, toggle-style
//! vote reconciliation, and the recency-ordered listing annotated with the
//! viewer's own vote.
//!
//! Aggregate counters live on the `questions` row; the ledger lives in
//! `question_votes`, keyed by `(question_id, user_id)`. Only [`cast_vote`]
//! mutates either, inside a single immediate transaction, so the counters
//! always match the ledger.

mod vote;

pub use vote::{reconcile, LedgerChange, Reconciliation, Tally};

use chrono::{SecondsFormat, Utc};
use rehearse_types::{Orientation, VoteType};
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use thiserror::Error;

/// Errors that can occur during question operations.
#[derive(Debug, Error)]
pub enum QuestionError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("question not found: {0}")]
    NotFound(String),
}

/// A persisted community question.
#[derive(Debug, Clone, PartialEq)]
pub struct Question {
    /// Public identifier (UUID v4).
    pub id: String,
    pub title: String,
    pub description: String,
    pub orientation: Orientation,
    /// Display name of the author.
    pub username: String,
    /// Identity-provider user id of the author.
    pub user_id: String,
    pub tally: Tally,
    /// Creation timestamp (RFC 3339, UTC, millisecond precision).
    pub created_at: String,
}

impl Question {
    /// Net score, `likes - dislikes`.
    pub fn votes(&self) -> i64 {
        self.tally.votes()
    }
}

/// A question as seen by one viewer.
#[derive(Debug, Clone, PartialEq)]
pub struct ListedQuestion {
    pub question: Question,
    /// The viewer's current vote, `None` when anonymous or not voted.
    pub user_vote: Option<VoteType>,
}

/// Parameters for creating a new question.
#[derive(Debug, Clone)]
pub struct NewQuestion {
    pub title: String,
    pub description: String,
    pub orientation: Orientation,
    pub username: String,
    pub user_id: String,
}

/// Result of [`cast_vote`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteSummary {
    pub question_id: String,
    pub tally: Tally,
    /// The voter's vote after the call, `None` when toggled off.
    pub user_vote: Option<VoteType>,
}

fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Creates a question with zero counters and an empty ledger.
pub fn create_question(conn: &Connection, new: &NewQuestion) -> Result<Question, QuestionError> {
    let id = uuid::Uuid::new_v4().to_string();
    let created_at = now_timestamp();

    conn.execute(
        "INSERT INTO questions (
            id, title, description, orientation, username, user_id,
            likes, dislikes, votes, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, 0, 0, ?7, ?7)",
        params![
            id,
            new.title,
            new.description,
            new.orientation.as_str(),
            new.username,
            new.user_id,
            created_at,
        ],
    )?;

    tracing::info!(question_id = %id, user_id = %new.user_id, "question created");

    Ok(Question {
        id,
        title: new.title.clone(),
        description: new.description.clone(),
        orientation: new.orientation,
        username: new.username.clone(),
        user_id: new.user_id.clone(),
        tally: Tally::default(),
        created_at,
    })
}

const LISTED_COLUMNS: &str = "q.id, q.title, q.description, q.orientation, q.username, q.user_id,
     q.likes, q.dislikes, q.created_at, v.vote_type";

/// Lists every question, newest first, annotated with `viewer`'s vote.
///
/// Questions created in the same millisecond are ordered by insertion,
/// latest first.
pub fn list_questions(
    conn: &Connection,
    viewer: Option<&str>,
) -> Result<Vec<ListedQuestion>, QuestionError> {
    let sql = format!(
        "SELECT {LISTED_COLUMNS}
         FROM questions q
         LEFT JOIN question_votes v ON v.question_id = q.id AND v.user_id = ?1
         ORDER BY q.created_at DESC, q.rowid DESC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![viewer], map_row_to_listed)?;

    let mut questions = Vec::new();
    for row in rows {
        questions.push(row?);
    }
    Ok(questions)
}

/// Applies `desired` from `user_id` to a question with toggle semantics.
///
/// The read of the current counters and ledger entry and the write of the
/// new ones happen in one `IMMEDIATE` transaction, so concurrent votes on
/// the same question serialize on the SQLite write lock.
pub fn cast_vote(
    conn: &mut Connection,
    question_id: &str,
    user_id: &str,
    desired: VoteType,
) -> Result<VoteSummary, QuestionError> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let tally = tx
        .query_row(
            "SELECT likes, dislikes FROM questions WHERE id = ?1",
            [question_id],
            |row| Ok(Tally::new(row.get(0)?, row.get(1)?)),
        )
        .optional()?
        .ok_or_else(|| QuestionError::NotFound(question_id.to_string()))?;

    let existing: Option<VoteType> = tx
        .query_row(
            "SELECT vote_type FROM question_votes WHERE question_id = ?1 AND user_id = ?2",
            [question_id, user_id],
            |row| parse_column(row, 0),
        )
        .optional()?;

    let outcome = reconcile(existing, desired, tally);
    let now = now_timestamp();

    match outcome.change {
        LedgerChange::Insert(vote) => {
            tx.execute(
                "INSERT INTO question_votes (question_id, user_id, vote_type, voted_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![question_id, user_id, vote.as_str(), now],
            )?;
        }
        LedgerChange::Remove => {
            tx.execute(
                "DELETE FROM question_votes WHERE question_id = ?1 AND user_id = ?2",
                [question_id, user_id],
            )?;
        }
        LedgerChange::Flip(vote) => {
            tx.execute(
                "UPDATE question_votes SET vote_type = ?3, voted_at = ?4
                 WHERE question_id = ?1 AND user_id = ?2",
                params![question_id, user_id, vote.as_str(), now],
            )?;
        }
    }

    tx.execute(
        "UPDATE questions SET likes = ?2, dislikes = ?3, votes = ?4, updated_at = ?5
         WHERE id = ?1",
        params![
            question_id,
            outcome.tally.likes,
            outcome.tally.dislikes,
            outcome.tally.votes(),
            now,
        ],
    )?;

    tx.commit()?;

    tracing::debug!(
        question_id,
        user_id,
        vote = desired.as_str(),
        likes = outcome.tally.likes,
        dislikes = outcome.tally.dislikes,
        "vote reconciled"
    );

    Ok(VoteSummary {
        question_id: question_id.to_string(),
        tally: outcome.tally,
        user_vote: outcome.user_vote,
    })
}

fn parse_column<T>(row: &Row, idx: usize) -> rusqlite::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.get(idx)?;
    raw.parse().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn map_row_to_listed(row: &Row) -> rusqlite::Result<ListedQuestion> {
    let user_vote: Option<VoteType> = match row.get::<_, Option<String>>(9)? {
        Some(_) => Some(parse_column(row, 9)?),
        None => None,
    };

    Ok(ListedQuestion {
        question: Question {
            id: row.get(0)?,
            title: row.get(1)?,
            description: row.get(2)?,
            orientation: parse_column(row, 3)?,
            username: row.get(4)?,
            user_id: row.get(5)?,
            tally: Tally::new(row.get(6)?, row.get(7)?),
            created_at: row.get(8)?,
        },
        user_vote,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, Eq)]
    struct LedgerEntry {
        user_id: String,
        vote_type: VoteType,
    }

    /// Retrieves one question annotated with `viewer`'s vote.
    fn get_question(
        conn: &Connection,
        question_id: &str,
        viewer: Option<&str>,
    ) -> Result<ListedQuestion, QuestionError> {
        let sql = format!(
            "SELECT {LISTED_COLUMNS}
             FROM questions q
             LEFT JOIN question_votes v ON v.question_id = q.id AND v.user_id = ?2
             WHERE q.id = ?1"
        );
        conn.query_row(&sql, params![question_id, viewer], map_row_to_listed)
            .optional()?
            .ok_or_else(|| QuestionError::NotFound(question_id.to_string()))
    }

    /// Returns the vote ledger of a question, ordered by voting time.
    fn ledger(conn: &Connection, question_id: &str) -> Result<Vec<LedgerEntry>, QuestionError> {
        let mut stmt = conn.prepare(
            "SELECT user_id, vote_type FROM question_votes
             WHERE question_id = ?1 ORDER BY voted_at ASC, rowid ASC",
        )?;
        let rows = stmt.query_map([question_id], |row| {
            Ok(LedgerEntry {
                user_id: row.get(0)?,
                vote_type: parse_column(row, 1)?,
            })
        })?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?);
        }
        Ok(entries)
    }

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().expect("should open in-memory db");
        rehearse_db::run_migrations(&conn).expect("migrations should succeed");
        conn
    }

    fn new_question(title: &str) -> NewQuestion {
        NewQuestion {
            title: title.to_string(),
            description: "Explain the event loop.".to_string(),
            orientation: Orientation::Frontend,
            username: "ada".to_string(),
            user_id: "user_author".to_string(),
        }
    }

    #[test]
    fn create_starts_with_empty_counters_and_ledger() {
        let conn = setup();
        let q = create_question(&conn, &new_question("Closures")).unwrap();

        assert_eq!(q.tally, Tally::default());
        assert_eq!(q.votes(), 0);
        assert!(ledger(&conn, &q.id).unwrap().is_empty());

        let stored = get_question(&conn, &q.id, None).unwrap();
        assert_eq!(stored.question, q);
        assert_eq!(stored.user_vote, None);
    }

    #[test]
    fn get_question_missing_is_not_found() {
        let conn = setup();
        let err = get_question(&conn, "nope", None).unwrap_err();
        assert!(matches!(err, QuestionError::NotFound(id) if id == "nope"));
    }

    #[test]
    fn vote_toggle_round_trip_restores_state() {
        let mut conn = setup();
        let q = create_question(&conn, &new_question("Closures")).unwrap();

        let first = cast_vote(&mut conn, &q.id, "u1", VoteType::Like).unwrap();
        assert_eq!(first.tally, Tally::new(1, 0));
        assert_eq!(first.user_vote, Some(VoteType::Like));

        let second = cast_vote(&mut conn, &q.id, "u1", VoteType::Like).unwrap();
        assert_eq!(second.tally, Tally::new(0, 0));
        assert_eq!(second.user_vote, None);
        assert!(ledger(&conn, &q.id).unwrap().is_empty());
    }

    #[test]
    fn vote_switch_keeps_single_ledger_entry() {
        let mut conn = setup();
        let q = create_question(&conn, &new_question("Hoisting")).unwrap();

        cast_vote(&mut conn, &q.id, "u1", VoteType::Like).unwrap();
        let switched = cast_vote(&mut conn, &q.id, "u1", VoteType::Dislike).unwrap();
        assert_eq!(switched.tally, Tally::new(0, 1));
        assert_eq!(switched.user_vote, Some(VoteType::Dislike));

        let entries = ledger(&conn, &q.id).unwrap();
        assert_eq!(
            entries,
            vec![LedgerEntry {
                user_id: "u1".to_string(),
                vote_type: VoteType::Dislike,
            }]
        );

        let votes: i64 = conn
            .query_row("SELECT votes FROM questions WHERE id = ?1", [&q.id], |r| {
                r.get(0)
            })
            .unwrap();
        assert_eq!(votes, -1);
    }

    #[test]
    fn cast_vote_missing_question_is_not_found_and_writes_nothing() {
        let mut conn = setup();
        let err = cast_vote(&mut conn, "missing", "u1", VoteType::Like).unwrap_err();
        assert!(matches!(err, QuestionError::NotFound(_)));

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM question_votes", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn list_is_newest_first_and_viewer_scoped() {
        let mut conn = setup();
        let older = create_question(&conn, &new_question("Older")).unwrap();
        let newer = create_question(&conn, &new_question("Newer")).unwrap();

        cast_vote(&mut conn, &older.id, "viewer", VoteType::Dislike).unwrap();
        cast_vote(&mut conn, &newer.id, "someone_else", VoteType::Like).unwrap();

        let listed = list_questions(&conn, Some("viewer")).unwrap();
        let titles: Vec<_> = listed.iter().map(|l| l.question.title.as_str()).collect();
        assert_eq!(titles, vec!["Newer", "Older"]);

        assert_eq!(listed[0].user_vote, None, "other users' votes are not attributed");
        assert_eq!(listed[0].question.tally, Tally::new(1, 0));
        assert_eq!(listed[1].user_vote, Some(VoteType::Dislike));
        assert_eq!(listed[1].question.tally, Tally::new(0, 1));

        let anonymous = list_questions(&conn, None).unwrap();
        assert!(anonymous.iter().all(|l| l.user_vote.is_none()));
    }

    #[test]
    fn counters_match_ledger_after_mixed_votes() {
        let mut conn = setup();
        let q = create_question(&conn, &new_question("Event loop")).unwrap();

        let script = [
            ("a", VoteType::Like),
            ("b", VoteType::Like),
            ("c", VoteType::Dislike),
            ("a", VoteType::Dislike),
            ("b", VoteType::Like),
            ("d", VoteType::Dislike),
            ("c", VoteType::Like),
        ];
        for (user, vote) in script {
            cast_vote(&mut conn, &q.id, user, vote).unwrap();
        }

        let entries = ledger(&conn, &q.id).unwrap();
        let likes = entries.iter().filter(|e| e.vote_type == VoteType::Like).count();
        let dislikes = entries.len() - likes;

        let listed = get_question(&conn, &q.id, None).unwrap();
        assert_eq!(listed.question.tally.likes as usize, likes);
        assert_eq!(listed.question.tally.dislikes as usize, dislikes);
        assert_eq!(listed.question.tally, Tally::new(1, 2));
    }
}
