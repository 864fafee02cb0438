use axum::{extract::State, http::StatusCode, Json};

use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::api::questions::label_options;
use crate::core::config::ExamSettings;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::types::{DisplayOrder, MediaKind};
use crate::repositories;
use crate::schemas::exam::{ExamCreate, ExamCreatedResponse, ExamQuestionEntry};

use super::super::helpers;

const DEFAULT_QUESTION_TYPE: &str = "sentence";

/// Builds an exam definition and freezes its question snapshot in one
/// transaction. Any failure past the exam insert rolls everything back;
/// no partial exam is ever visible.
pub(in crate::api::exams) async fn create_exam(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<ExamCreate>,
) -> Result<(StatusCode, Json<ExamCreatedResponse>), ApiError> {
    let test_name = payload
        .test_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| ApiError::BadRequest("testName must not be empty".to_string()))?;

    let entries = payload
        .questions
        .as_deref()
        .filter(|entries| !entries.is_empty())
        .ok_or_else(|| ApiError::BadRequest("questions must not be empty".to_string()))?;

    validate_entries(entries, state.settings().exam().correct_option_index)?;

    // Section resolution for the distinct `type` tags, one lookup.
    let mut type_tags: Vec<String> = Vec::new();
    for entry in entries {
        let tag = entry.question_type.as_deref().unwrap_or_default();
        if !type_tags.iter().any(|existing| existing == tag) {
            type_tags.push(tag.to_string());
        }
    }
    let sections = repositories::catalog::section_ids_by_names(state.db(), &type_tags)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to resolve sections"))?;
    for tag in &type_tags {
        if !sections.contains_key(tag) {
            return Err(ApiError::BadRequest(format!("Unknown section tag: {tag}")));
        }
    }

    let type_id = repositories::catalog::type_id_by_name(state.db(), DEFAULT_QUESTION_TYPE)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to resolve question type"))?
        .ok_or_else(|| {
            ApiError::Internal("Default question type is not seeded".to_string())
        })?;

    let exam_settings = state.settings().exam();
    let difficulty = helpers::difficulty_mode(
        entries.iter().filter_map(|entry| entry.difficulty),
        exam_settings.default_difficulty,
    );

    let parts: Vec<i16> = entries.iter().filter_map(|entry| entry.part).collect();
    let section_names = helpers::section_names_for_parts(&parts);
    let section_seconds =
        format!("{},{}", exam_settings.reading_seconds, exam_settings.listening_seconds);

    let now = primitive_now_utc();
    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;

    let exam = repositories::exams::create(
        &mut *tx,
        repositories::exams::CreateExam {
            title: test_name,
            description: payload.description.as_deref(),
            difficulty,
            display_order: payload.strategy.unwrap_or(DisplayOrder::Fixed),
            section_names: &section_names,
            section_seconds: &section_seconds,
            created_by: Some(user.id),
            question_count: entries.len() as i32,
            created_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create exam"))?;

    // Resolve every entry to a bank question id, inserting new questions
    // as we go, in submission order.
    let mut question_ids = Vec::with_capacity(entries.len());
    for entry in entries {
        let id = match entry.existed_id_in_db {
            Some(id) => id,
            None => {
                insert_bank_question(&mut tx, entry, &sections, type_id, exam_settings, now)
                    .await?
            }
        };
        question_ids.push(id);
    }

    // Re-read canonical content for the snapshot. A dangling
    // existedIDInDB reference fails here and rolls the exam back.
    let mut snapshot = Vec::with_capacity(question_ids.len());
    for (index, question_id) in question_ids.iter().enumerate() {
        let question = repositories::questions::find_by_id(&mut *tx, *question_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to read question for snapshot"))?
            .ok_or_else(|| {
                ApiError::BadRequest(format!("Referenced question {question_id} not found"))
            })?;

        snapshot.push(repositories::exam_questions::SnapshotRow {
            question_id: question.id,
            content: question.content,
            correct_answer: question.correct_answer,
            difficulty: question.difficulty,
            topic: question.topic,
            part: question.part,
            position: index as i32 + 1,
        });
    }

    repositories::exam_questions::insert_snapshot(&mut *tx, exam.id, &snapshot)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to snapshot exam questions"))?;
    repositories::exam_questions::copy_source_choices(&mut *tx, exam.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to snapshot question choices"))?;

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit transaction"))?;

    metrics::counter!("exams_created_total").increment(1);

    Ok((StatusCode::CREATED, Json(ExamCreatedResponse { success: true, exam_id: exam.id })))
}

/// All batch-shape failures happen here, before anything is persisted.
fn validate_entries(
    entries: &[ExamQuestionEntry],
    correct_option_index: usize,
) -> Result<(), ApiError> {
    for (index, entry) in entries.iter().enumerate() {
        if entry.question_type.as_deref().map(str::trim).filter(|tag| !tag.is_empty()).is_none() {
            return Err(ApiError::BadRequest(format!("questions[{index}]: missing type")));
        }
        if entry.section.as_deref().map(str::trim).filter(|name| !name.is_empty()).is_none() {
            return Err(ApiError::BadRequest(format!("questions[{index}]: missing section")));
        }
        if entry.part.is_none() {
            return Err(ApiError::BadRequest(format!("questions[{index}]: missing part")));
        }
        if entry.description.as_deref().map(str::trim).filter(|text| !text.is_empty()).is_none() {
            return Err(ApiError::BadRequest(format!("questions[{index}]: missing description")));
        }

        let Some(template) = entry.template.as_ref() else {
            return Err(ApiError::BadRequest(format!("questions[{index}]: missing template")));
        };
        let Some(options) = template.options.as_ref() else {
            return Err(ApiError::BadRequest(format!(
                "questions[{index}]: template must include an options array"
            )));
        };

        if entry.existed_id_in_db.is_none() {
            if template.question.as_deref().map(str::trim).filter(|q| !q.is_empty()).is_none() {
                return Err(ApiError::BadRequest(format!(
                    "questions[{index}]: template.question must not be empty"
                )));
            }
            if options.len() <= correct_option_index {
                return Err(ApiError::BadRequest(format!(
                    "questions[{index}]: options must include the correct option at index \
                     {correct_option_index}"
                )));
            }
        }
    }

    Ok(())
}

async fn insert_bank_question(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    entry: &ExamQuestionEntry,
    sections: &std::collections::HashMap<String, i32>,
    type_id: i32,
    exam_settings: &ExamSettings,
    now: time::PrimitiveDateTime,
) -> Result<i64, ApiError> {
    // Presence was checked up front.
    let tag = entry.question_type.as_deref().unwrap_or_default();
    let section_id = sections.get(tag).copied().ok_or_else(|| {
        ApiError::BadRequest(format!("Unknown section tag: {tag}"))
    })?;
    let template = entry
        .template
        .as_ref()
        .ok_or_else(|| ApiError::BadRequest("missing template".to_string()))?;
    let options = template
        .options
        .as_ref()
        .ok_or_else(|| ApiError::BadRequest("missing options".to_string()))?;
    let content = template
        .question
        .as_deref()
        .ok_or_else(|| ApiError::BadRequest("missing template.question".to_string()))?;
    let correct_answer = options.get(exam_settings.correct_option_index).ok_or_else(|| {
        ApiError::BadRequest(format!(
            "options must include the correct option at index {}",
            exam_settings.correct_option_index
        ))
    })?;
    let part = entry
        .part
        .ok_or_else(|| ApiError::BadRequest("missing part".to_string()))?;

    let question_id = repositories::questions::create(
        &mut **tx,
        repositories::questions::CreateQuestion {
            content,
            correct_answer,
            section_id,
            type_id,
            part,
            difficulty: entry.difficulty.unwrap_or(exam_settings.default_difficulty),
            topic: entry.description.as_deref(),
            created_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create question"))?;

    let choices = label_options(options);
    repositories::questions::insert_choices(&mut **tx, question_id, &choices)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to create question choices"))?;

    let mut media = Vec::new();
    if let Some(url) = template.image.as_deref().filter(|url| !url.is_empty()) {
        media.push((MediaKind::Image, url.to_string()));
    }
    if let Some(url) = template.audio.as_deref().filter(|url| !url.is_empty()) {
        media.push((MediaKind::Audio, url.to_string()));
    }
    if let Some(url) = template.transcript.as_deref().filter(|url| !url.is_empty()) {
        media.push((MediaKind::Transcript, url.to_string()));
    }
    repositories::questions::insert_media(&mut **tx, question_id, &media)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to create question media"))?;

    Ok(question_id)
}
