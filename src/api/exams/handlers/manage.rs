use axum::{
    extract::{Path, State},
    http::StatusCode,
};

use crate::api::errors::ApiError;
use crate::api::guards::CurrentAdmin;
use crate::core::state::AppState;
use crate::repositories;

pub(in crate::api::exams) async fn delete_exam(
    Path(exam_id): Path<i64>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let deleted = repositories::exams::delete(state.db(), exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete exam"))?;

    if !deleted {
        return Err(ApiError::NotFound("Exam not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}
