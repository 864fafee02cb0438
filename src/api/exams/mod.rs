mod handlers;
mod helpers;
mod queries;

use axum::{routing::get, routing::post, Router};

use crate::core::state::AppState;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::create_exam).get(handlers::list_exams))
        .route("/:exam_id", get(handlers::start_or_resume_attempt).delete(handlers::delete_exam))
        .route("/:exam_id/submit", post(handlers::submit_attempt))
}

#[cfg(test)]
mod tests;
