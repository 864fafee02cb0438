use std::collections::HashMap;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentAdmin;
use crate::api::pagination::{default_index, default_page_size, PageResponse};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::types::{DifficultyLevel, MediaKind};
use crate::repositories;
use crate::schemas::question::{QuestionCreate, QuestionResponse};

const DEFAULT_QUESTION_TYPE: &str = "sentence";

pub(crate) fn router() -> Router<AppState> {
    Router::new().route("/", get(list_questions).post(create_question))
}

#[derive(Debug, Deserialize)]
struct ListQuestionsQuery {
    #[serde(default = "default_index")]
    index: i64,
    #[serde(default = "default_page_size", alias = "pageSize")]
    page_size: i64,
    #[serde(default)]
    part: Option<i16>,
    #[serde(default)]
    difficulty: Option<DifficultyLevel>,
}

async fn list_questions(
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
    Query(params): Query<ListQuestionsQuery>,
) -> Result<Json<PageResponse<QuestionResponse>>, ApiError> {
    let limit = params.page_size.clamp(1, 1000);
    let offset = (params.index.max(1) - 1) * limit;

    let list_params = repositories::questions::ListQuestionsParams {
        part: params.part,
        difficulty: params.difficulty,
        offset,
        limit,
    };

    let questions = repositories::questions::list(state.db(), &list_params)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list questions"))?;
    let total = repositories::questions::count(state.db(), &list_params)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count questions"))?;

    let question_ids: Vec<i64> = questions.iter().map(|question| question.id).collect();
    let mut choices_by_question: HashMap<i64, Vec<_>> = HashMap::new();
    for choice in repositories::questions::choices_by_question_ids(state.db(), &question_ids)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load question choices"))?
    {
        choices_by_question.entry(choice.question_id).or_default().push(choice);
    }
    let mut media_by_question: HashMap<i64, Vec<_>> = HashMap::new();
    for media in repositories::questions::media_by_question_ids(state.db(), &question_ids)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load question media"))?
    {
        media_by_question.entry(media.question_id).or_default().push(media);
    }

    let section_ids: Vec<i32> = questions.iter().map(|question| question.section_id).collect();
    let section_names = repositories::catalog::section_names_by_ids(state.db(), &section_ids)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load sections"))?;

    let data = questions
        .into_iter()
        .map(|question| {
            let section =
                section_names.get(&question.section_id).cloned().unwrap_or_default();
            let choices = choices_by_question.remove(&question.id).unwrap_or_default();
            let media = media_by_question.remove(&question.id).unwrap_or_default();
            QuestionResponse::from_db(question, section, choices, media)
        })
        .collect();

    Ok(Json(PageResponse { data, total, index: params.index.max(1), page_size: limit }))
}

async fn create_question(
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<QuestionCreate>,
) -> Result<(StatusCode, Json<QuestionResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let section_names = vec![payload.section.clone()];
    let sections = repositories::catalog::section_ids_by_names(state.db(), &section_names)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to resolve section"))?;
    let Some(section_id) = sections.get(&payload.section).copied() else {
        return Err(ApiError::BadRequest(format!("Unknown section: {}", payload.section)));
    };

    let type_name = payload.question_type.as_deref().unwrap_or(DEFAULT_QUESTION_TYPE);
    let type_id = repositories::catalog::type_id_by_name(state.db(), type_name)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to resolve question type"))?
        .ok_or_else(|| ApiError::BadRequest(format!("Unknown question type: {type_name}")))?;

    let correct_index = state.settings().exam().correct_option_index;
    let Some(correct_answer) = payload.options.get(correct_index) else {
        return Err(ApiError::BadRequest(format!(
            "options must include the correct option at index {correct_index}"
        )));
    };

    let now = primitive_now_utc();
    let difficulty =
        payload.difficulty.unwrap_or(state.settings().exam().default_difficulty);

    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;

    let question_id = repositories::questions::create(
        &mut *tx,
        repositories::questions::CreateQuestion {
            content: &payload.content,
            correct_answer,
            section_id,
            type_id,
            part: payload.part,
            difficulty,
            topic: payload.topic.as_deref(),
            created_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create question"))?;

    let choices = label_options(&payload.options);
    repositories::questions::insert_choices(&mut *tx, question_id, &choices)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to create question choices"))?;

    let media = collect_media(&payload);
    repositories::questions::insert_media(&mut *tx, question_id, &media)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to create question media"))?;

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit transaction"))?;

    let response = QuestionResponse {
        id: question_id,
        content: payload.content,
        correct_answer: correct_answer.clone(),
        section: payload.section,
        part: payload.part,
        difficulty,
        topic: payload.topic,
        options: payload.options,
        image: payload.image,
        audio: payload.audio,
        transcript: payload.transcript,
        created_at: crate::core::time::format_primitive(now),
    };

    Ok((StatusCode::CREATED, Json(response)))
}

/// Choices are labeled `A`, `B`, `C`... by position.
pub(crate) fn label_options(options: &[String]) -> Vec<(String, String, i32)> {
    options
        .iter()
        .enumerate()
        .map(|(position, content)| {
            let label = char::from(b'A' + (position % 26) as u8).to_string();
            (label, content.clone(), position as i32)
        })
        .collect()
}

pub(crate) fn collect_media(payload: &QuestionCreate) -> Vec<(MediaKind, String)> {
    let mut media = Vec::new();
    if let Some(url) = payload.image.as_deref().filter(|url| !url.is_empty()) {
        media.push((MediaKind::Image, url.to_string()));
    }
    if let Some(url) = payload.audio.as_deref().filter(|url| !url.is_empty()) {
        media.push((MediaKind::Audio, url.to_string()));
    }
    if let Some(url) = payload.transcript.as_deref().filter(|url| !url.is_empty()) {
        media.push((MediaKind::Transcript, url.to_string()));
    }
    media
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;
    use tower::ServiceExt;

    use super::label_options;
    use crate::db::types::DifficultyLevel;
    use crate::test_support::{
        bearer_token, insert_admin, insert_bank_question, insert_user, json_request, read_json,
        setup_test_context,
    };

    #[test]
    fn labels_follow_position() {
        let options = vec!["first".to_string(), "second".to_string(), "third".to_string()];
        let labeled = label_options(&options);
        assert_eq!(labeled[0], ("A".to_string(), "first".to_string(), 0));
        assert_eq!(labeled[1], ("B".to_string(), "second".to_string(), 1));
        assert_eq!(labeled[2], ("C".to_string(), "third".to_string(), 2));
    }

    fn bank_question_body() -> serde_json::Value {
        json!({
            "content": "What is happening in the picture?",
            "options": ["A truck is being unloaded", "A bicycle is parked"],
            "section": "listening",
            "part": 1,
            "difficulty": "medium",
            "image": "https://cdn.example.com/p1.png",
            "audio": "https://cdn.example.com/p1.mp3"
        })
    }

    #[tokio::test]
    async fn question_routes_are_admin_only() {
        let ctx = setup_test_context().await;
        let user = insert_user(ctx.state.db(), "taker", "Test Taker", "password123").await;
        let token = bearer_token(user.id, ctx.state.settings());

        let response = ctx
            .app
            .clone()
            .oneshot(json_request(Method::GET, "/api/v1/questions", None, None))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = ctx
            .app
            .clone()
            .oneshot(json_request(Method::GET, "/api/v1/questions", Some(&token), None))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = ctx
            .app
            .clone()
            .oneshot(json_request(
                Method::POST,
                "/api/v1/questions",
                Some(&token),
                Some(bank_question_body()),
            ))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn create_question_persists_choices_and_media() {
        let ctx = setup_test_context().await;
        let admin = insert_admin(ctx.state.db(), "admin", "Administrator", "password123").await;
        let token = bearer_token(admin.id, ctx.state.settings());

        let response = ctx
            .app
            .clone()
            .oneshot(json_request(
                Method::POST,
                "/api/v1/questions",
                Some(&token),
                Some(bank_question_body()),
            ))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::CREATED);

        let body = read_json(response).await;
        assert_eq!(body["correctAnswer"], json!("A truck is being unloaded"));
        assert_eq!(body["section"], json!("listening"));
        assert_eq!(body["part"].as_i64(), Some(1));
        assert_eq!(body["difficulty"], json!("medium"));
        assert_eq!(
            body["options"],
            json!(["A truck is being unloaded", "A bicycle is parked"])
        );
        assert_eq!(body["image"], json!("https://cdn.example.com/p1.png"));
        assert!(body.get("transcript").is_none());

        let question_id = body["id"].as_i64().expect("question id");
        let choices: Vec<(String, i32)> = sqlx::query_as(
            "SELECT label, position FROM question_choices WHERE question_id = $1 ORDER BY position",
        )
        .bind(question_id)
        .fetch_all(ctx.state.db())
        .await
        .expect("choices");
        assert_eq!(choices, vec![("A".to_string(), 0), ("B".to_string(), 1)]);

        let media_count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM question_media WHERE question_id = $1")
                .bind(question_id)
                .fetch_one(ctx.state.db())
                .await
                .expect("media count");
        assert_eq!(media_count, 2);
    }

    #[tokio::test]
    async fn create_question_rejects_unknown_section_and_part() {
        let ctx = setup_test_context().await;
        let admin = insert_admin(ctx.state.db(), "admin", "Administrator", "password123").await;
        let token = bearer_token(admin.id, ctx.state.settings());

        let mut body = bank_question_body();
        body["section"] = json!("speaking");
        let response = ctx
            .app
            .clone()
            .oneshot(json_request(Method::POST, "/api/v1/questions", Some(&token), Some(body)))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let mut body = bank_question_body();
        body["part"] = json!(9);
        let response = ctx
            .app
            .clone()
            .oneshot(json_request(Method::POST, "/api/v1/questions", Some(&token), Some(body)))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM questions")
            .fetch_one(ctx.state.db())
            .await
            .expect("count");
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn listing_filters_by_part_and_difficulty() {
        let ctx = setup_test_context().await;
        let admin = insert_admin(ctx.state.db(), "admin", "Administrator", "password123").await;
        let token = bearer_token(admin.id, ctx.state.settings());

        insert_bank_question(
            ctx.state.db(),
            "Reading question",
            &["alpha", "beta"],
            5,
            DifficultyLevel::Easy,
        )
        .await;
        insert_bank_question(
            ctx.state.db(),
            "Listening question",
            &["first", "second"],
            1,
            DifficultyLevel::Medium,
        )
        .await;

        let response = ctx
            .app
            .clone()
            .oneshot(json_request(Method::GET, "/api/v1/questions", Some(&token), None))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        let page = read_json(response).await;
        assert_eq!(page["total"].as_i64(), Some(2));

        let response = ctx
            .app
            .clone()
            .oneshot(json_request(Method::GET, "/api/v1/questions?part=5", Some(&token), None))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        let page = read_json(response).await;
        assert_eq!(page["total"].as_i64(), Some(1));
        assert_eq!(page["data"][0]["content"], json!("Reading question"));
        assert_eq!(page["data"][0]["section"], json!("reading"));
        assert_eq!(page["data"][0]["options"], json!(["alpha", "beta"]));

        let response = ctx
            .app
            .clone()
            .oneshot(json_request(
                Method::GET,
                "/api/v1/questions?difficulty=medium",
                Some(&token),
                None,
            ))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        let page = read_json(response).await;
        assert_eq!(page["total"].as_i64(), Some(1));
        assert_eq!(page["data"][0]["content"], json!("Listening question"));
    }
}
