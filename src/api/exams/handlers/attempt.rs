use axum::{
    extract::{Path, State},
    Json,
};

use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::ExamAttempt;
use crate::db::types::DisplayOrder;
use crate::repositories;
use crate::schemas::exam::AttemptExamResponse;
use crate::services::ordering;

use super::super::helpers;

/// Serves the exam for taking. Finds the caller's open attempt or creates
/// one; repeated calls resume the same attempt with the same question
/// order.
pub(in crate::api::exams) async fn start_or_resume_attempt(
    Path(exam_id): Path<i64>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<AttemptExamResponse>, ApiError> {
    let exam = repositories::exams::find_by_id(state.db(), exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch exam"))?
        .ok_or_else(|| ApiError::NotFound("Exam not found".to_string()))?;

    let attempt = find_or_create_attempt(&state, exam_id, user.id).await?;

    let mut questions = repositories::exam_questions::list_by_exam(state.db(), exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load exam questions"))?;

    if exam.display_order == DisplayOrder::Random {
        let order = match attempt.question_order.as_deref() {
            Some(raw) => ordering::decode_order(raw),
            None => {
                let ids: Vec<i64> = questions.iter().map(|question| question.id).collect();
                let shuffled = ordering::shuffle_ids(&ids);
                repositories::attempts::set_question_order(
                    state.db(),
                    attempt.id,
                    &ordering::encode_order(&shuffled),
                )
                .await
                .map_err(|e| ApiError::internal(e, "Failed to persist question order"))?;
                shuffled
            }
        };
        questions = ordering::apply_order(&order, questions, |question| question.id);
    }

    let choices = repositories::exam_questions::choices_by_exam(state.db(), exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load exam choices"))?;
    let media = repositories::exam_questions::media_by_exam(state.db(), exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load exam media"))?;

    let section_seconds =
        helpers::parse_section_seconds(&exam.section_seconds, state.settings().exam());
    let sections = helpers::build_sections(questions, choices, media, section_seconds);

    Ok(Json(AttemptExamResponse {
        exam_attempt_id: attempt.id,
        id: exam.id,
        name: exam.title,
        sections,
    }))
}

/// Insert-on-conflict against the partial unique index on open attempts:
/// concurrent first views collapse onto a single attempt row.
async fn find_or_create_attempt(
    state: &AppState,
    exam_id: i64,
    user_id: i64,
) -> Result<ExamAttempt, ApiError> {
    if let Some(attempt) = repositories::attempts::find_in_progress(state.db(), exam_id, user_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch attempt"))?
    {
        return Ok(attempt);
    }

    let created = repositories::attempts::create_in_progress(
        state.db(),
        exam_id,
        user_id,
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create attempt"))?;

    if created {
        metrics::counter!("exam_attempts_started_total").increment(1);
    }

    repositories::attempts::find_in_progress(state.db(), exam_id, user_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch attempt"))?
        .ok_or_else(|| ApiError::Internal("Attempt vanished after creation".to_string()))
}
