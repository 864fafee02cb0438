use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
    Json,
};

use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::api::pagination::PageResponse;
use crate::core::state::AppState;
use crate::db::types::DifficultyLevel;
use crate::repositories;
use crate::schemas::exam::{ExamSummaryResponse, GroupedExamsResponse};

use super::super::queries::ListExamsQuery;

pub(in crate::api::exams) async fn list_exams(
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
    Query(params): Query<ListExamsQuery>,
) -> Result<Response, ApiError> {
    if params.group.as_deref() == Some("difficulty") {
        return list_grouped(&state).await.map(|body| Json(body).into_response());
    }

    let limit = params.page_size.clamp(1, 1000);
    let offset = (params.index.max(1) - 1) * limit;

    let exams = repositories::exams::list(
        state.db(),
        &repositories::exams::ListExamsParams { difficulty: params.difficulty, offset, limit },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to list exams"))?;

    let total = repositories::exams::count(state.db(), params.difficulty)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count exams"))?;

    let data: Vec<ExamSummaryResponse> =
        exams.into_iter().map(ExamSummaryResponse::from_db).collect();

    Ok(Json(PageResponse { data, total, index: params.index.max(1), page_size: limit })
        .into_response())
}

async fn list_grouped(state: &AppState) -> Result<GroupedExamsResponse, ApiError> {
    let exams = repositories::exams::list_all(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list exams"))?;

    let mut grouped = GroupedExamsResponse { easy: Vec::new(), medium: Vec::new(), hard: Vec::new() };
    for exam in exams {
        let summary = ExamSummaryResponse::from_db(exam);
        match summary.difficulty {
            DifficultyLevel::Easy => grouped.easy.push(summary),
            DifficultyLevel::Medium => grouped.medium.push(summary),
            DifficultyLevel::Hard => grouped.hard.push(summary),
        }
    }

    Ok(grouped)
}
