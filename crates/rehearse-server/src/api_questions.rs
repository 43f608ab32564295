use crate::api::{with_conn, ApiError};
use crate::middleware::UserContext;
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    http::StatusCode,
    Json,
};
use rehearse_questions::{
    cast_vote, create_question, list_questions, ListedQuestion, NewQuestion, Question,
};
use rehearse_types::{Orientation, VoteType};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// Maximum length for a question title.
const MAX_TITLE_LEN: usize = 256;
/// Maximum length for a question description.
const MAX_DESCRIPTION_LEN: usize = 4096;
/// Maximum length for an author display name.
const MAX_USERNAME_LEN: usize = 128;

const INVALID_VOTE_TYPE: &str = "Invalid vote type. Must be 'like' or 'dislike'";

/// Request body for `POST /questions`. Fields are optional so that a missing
/// field is reported as such rather than as unparseable JSON.
#[derive(Debug, Deserialize)]
pub struct CreateQuestionRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub orientation: Option<String>,
    pub username: Option<String>,
}

/// Request body for `PUT /questions/{id}/vote`.
#[derive(Debug, Deserialize)]
pub struct VoteRequest {
    #[serde(rename = "voteType")]
    pub vote_type: Option<Value>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionResponse {
    pub id: String,
    pub title: String,
    pub description: String,
    pub votes: i64,
    pub likes: u32,
    pub dislikes: u32,
    pub created_at: String,
    pub orientation: Orientation,
    pub username: String,
    pub user_id: String,
}

impl From<Question> for QuestionResponse {
    fn from(q: Question) -> Self {
        Self {
            votes: q.votes(),
            likes: q.tally.likes,
            dislikes: q.tally.dislikes,
            id: q.id,
            title: q.title,
            description: q.description,
            created_at: q.created_at,
            orientation: q.orientation,
            username: q.username,
            user_id: q.user_id,
        }
    }
}

/// A listed question; `userVote` is always present, `null` when absent.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListedQuestionResponse {
    #[serde(flatten)]
    pub question: QuestionResponse,
    pub user_vote: Option<VoteType>,
}

impl From<ListedQuestion> for ListedQuestionResponse {
    fn from(listed: ListedQuestion) -> Self {
        Self {
            question: listed.question.into(),
            user_vote: listed.user_vote,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteResponse {
    pub id: String,
    pub likes: u32,
    pub dislikes: u32,
    pub votes: i64,
    pub user_vote: Option<VoteType>,
}

/// Trims a required field; `None` when absent or blank.
fn required(field: Option<String>) -> Option<String> {
    field
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn check_len(value: &str, max: usize, name: &str) -> Result<(), ApiError> {
    if value.len() > max {
        return Err(ApiError::BadRequest(format!(
            "{name} must be at most {max} bytes"
        )));
    }
    Ok(())
}

fn validate_new_question(
    payload: CreateQuestionRequest,
    user_id: String,
) -> Result<NewQuestion, ApiError> {
    let missing = || ApiError::BadRequest("Missing required fields".to_string());

    let title = required(payload.title).ok_or_else(missing)?;
    let description = required(payload.description).ok_or_else(missing)?;
    let orientation = required(payload.orientation).ok_or_else(missing)?;
    let username = required(payload.username).ok_or_else(missing)?;

    let orientation: Orientation = orientation.parse().map_err(|_| {
        ApiError::BadRequest("Invalid orientation. Must be 'backend' or 'frontend'".to_string())
    })?;

    check_len(&title, MAX_TITLE_LEN, "title")?;
    check_len(&description, MAX_DESCRIPTION_LEN, "description")?;
    check_len(&username, MAX_USERNAME_LEN, "username")?;

    Ok(NewQuestion {
        title,
        description,
        orientation,
        username,
        user_id,
    })
}

/// POST /questions
pub async fn create_question_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(UserContext(user)): Extension<UserContext>,
    payload: Result<Json<CreateQuestionRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<QuestionResponse>), ApiError> {
    let Json(payload) = payload?;
    let new = validate_new_question(payload, user.user_id)?;

    let question = with_conn(&state, move |conn| Ok(create_question(conn, &new)?)).await?;

    Ok((StatusCode::CREATED, Json(question.into())))
}

/// GET /questions
pub async fn list_questions_handler(
    Extension(state): Extension<Arc<AppState>>,
    viewer: Option<Extension<UserContext>>,
) -> Result<Json<Vec<ListedQuestionResponse>>, ApiError> {
    let viewer_id = viewer.map(|Extension(UserContext(user))| user.user_id);

    let questions = with_conn(&state, move |conn| {
        Ok(list_questions(conn, viewer_id.as_deref())?)
    })
    .await?;

    Ok(Json(questions.into_iter().map(Into::into).collect()))
}

/// PUT /questions/{id}/vote
pub async fn vote_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(UserContext(user)): Extension<UserContext>,
    Path(question_id): Path<String>,
    payload: Result<Json<VoteRequest>, JsonRejection>,
) -> Result<Json<VoteResponse>, ApiError> {
    let Json(payload) = payload?;
    let vote_type: VoteType = payload
        .vote_type
        .as_ref()
        .and_then(Value::as_str)
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| ApiError::BadRequest(INVALID_VOTE_TYPE.to_string()))?;

    tracing::debug!(question_id = %question_id, user_id = %user.user_id, vote = %vote_type, "vote requested");

    let summary = with_conn(&state, move |conn| {
        Ok(cast_vote(conn, &question_id, &user.user_id, vote_type)?)
    })
    .await?;

    Ok(Json(VoteResponse {
        likes: summary.tally.likes,
        dislikes: summary.tally.dislikes,
        votes: summary.tally.votes(),
        id: summary.question_id,
        user_vote: summary.user_vote,
    }))
}
