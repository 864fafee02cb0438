use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::PrimitiveDateTime;

use crate::db::types::{AttemptStatus, DifficultyLevel, DisplayOrder, MediaKind};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct User {
    pub(crate) id: i64,
    pub(crate) username: String,
    pub(crate) hashed_password: String,
    pub(crate) full_name: String,
    pub(crate) is_admin: bool,
    pub(crate) is_active: bool,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Question {
    pub(crate) id: i64,
    pub(crate) content: String,
    pub(crate) correct_answer: String,
    pub(crate) section_id: i32,
    pub(crate) type_id: i32,
    pub(crate) part: i16,
    pub(crate) difficulty: DifficultyLevel,
    pub(crate) topic: Option<String>,
    pub(crate) created_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct QuestionChoice {
    pub(crate) id: i64,
    pub(crate) question_id: i64,
    pub(crate) label: String,
    pub(crate) content: String,
    pub(crate) position: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct QuestionMedia {
    pub(crate) id: i64,
    pub(crate) question_id: i64,
    pub(crate) media_type: MediaKind,
    pub(crate) url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Exam {
    pub(crate) id: i64,
    pub(crate) title: String,
    pub(crate) description: Option<String>,
    pub(crate) difficulty: DifficultyLevel,
    pub(crate) display_order: DisplayOrder,
    pub(crate) section_names: String,
    pub(crate) section_seconds: String,
    pub(crate) created_by: Option<i64>,
    pub(crate) question_count: i32,
    pub(crate) created_at: PrimitiveDateTime,
}

/// A question frozen at exam creation time. Later edits to the bank
/// question do not show up here.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct ExamQuestion {
    pub(crate) id: i64,
    pub(crate) exam_id: i64,
    pub(crate) question_id: i64,
    pub(crate) content: String,
    pub(crate) correct_answer: String,
    pub(crate) difficulty: DifficultyLevel,
    pub(crate) topic: Option<String>,
    pub(crate) part: i16,
    pub(crate) position: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct ExamQuestionChoice {
    pub(crate) id: i64,
    pub(crate) exam_question_id: i64,
    pub(crate) label: String,
    pub(crate) content: String,
    pub(crate) position: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct ExamAttempt {
    pub(crate) id: i64,
    pub(crate) exam_id: i64,
    pub(crate) user_id: i64,
    pub(crate) status: AttemptStatus,
    pub(crate) question_order: Option<String>,
    pub(crate) score: Option<i32>,
    pub(crate) started_at: PrimitiveDateTime,
    pub(crate) submitted_at: Option<PrimitiveDateTime>,
}
