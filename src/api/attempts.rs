use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};

use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::api::pagination::{PageQuery, PageResponse};
use crate::core::state::AppState;
use crate::repositories;
use crate::schemas::attempt::AttemptSummaryResponse;

pub(crate) fn router() -> Router<AppState> {
    Router::new().route("/", get(list_attempts))
}

/// The caller's submitted attempts, newest first.
async fn list_attempts(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Query(params): Query<PageQuery>,
) -> Result<Json<PageResponse<AttemptSummaryResponse>>, ApiError> {
    let rows = repositories::attempts::list_submitted_by_user(
        state.db(),
        user.id,
        params.offset(),
        params.limit(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to list attempts"))?;

    let total = repositories::attempts::count_submitted_by_user(state.db(), user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count attempts"))?;

    let data = rows.into_iter().map(AttemptSummaryResponse::from_row).collect();

    Ok(Json(PageResponse {
        data,
        total,
        index: params.index.max(1),
        page_size: params.limit(),
    }))
}
