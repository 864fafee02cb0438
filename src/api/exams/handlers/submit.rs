use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    Json,
};

use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::schemas::exam::{SubmitAttemptRequest, SubmitAttemptResponse};
use crate::services::scoring;

/// Grades an attempt against its frozen snapshot. Safe to call more than
/// once: answers are upserted by (attempt, question) and the score is
/// simply recomputed.
pub(in crate::api::exams) async fn submit_attempt(
    Path(exam_id): Path<i64>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<SubmitAttemptRequest>,
) -> Result<Json<SubmitAttemptResponse>, ApiError> {
    let attempt_id = payload
        .exam_attempt_id
        .ok_or_else(|| ApiError::BadRequest("exam_attempt_id is required".to_string()))?;
    let answers = payload
        .answers
        .ok_or_else(|| ApiError::BadRequest("answers is required".to_string()))?;

    let attempt = repositories::attempts::find_by_id(state.db(), attempt_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch attempt"))?
        .filter(|attempt| attempt.exam_id == exam_id)
        .ok_or_else(|| ApiError::NotFound("Attempt not found".to_string()))?;

    if attempt.user_id != user.id {
        return Err(ApiError::Forbidden("You can only submit your own attempt"));
    }

    let questions = repositories::exam_questions::list_by_exam(state.db(), exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load exam questions"))?;
    let total_questions = questions.len() as i32;
    let correct_answers: HashMap<i64, String> = questions
        .into_iter()
        .map(|question| (question.id, question.correct_answer))
        .collect();

    // Keys arrive as strings; entries that don't name a snapshot question
    // are dropped.
    let submitted: HashMap<i64, String> = answers
        .into_iter()
        .filter_map(|(key, value)| key.trim().parse::<i64>().ok().map(|id| (id, value)))
        .collect();

    let points = state.settings().exam().points_per_question;
    let result = scoring::grade(&correct_answers, &submitted, points);

    let now = primitive_now_utc();
    for graded in &result.graded {
        repositories::answers::upsert(
            state.db(),
            attempt.id,
            graded.exam_question_id,
            &graded.selected,
            graded.is_correct,
            now,
        )
        .await
        .map_err(|e| ApiError::internal(e, "Failed to record answer"))?;
    }

    repositories::attempts::submit(state.db(), attempt.id, result.score, now)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to finalize attempt"))?;

    metrics::counter!("exam_attempts_submitted_total").increment(1);

    Ok(Json(SubmitAttemptResponse {
        score: result.score,
        correct_count: result.correct_count,
        total_questions,
    }))
}
