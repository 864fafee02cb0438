use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::core::time::format_primitive;
use crate::db::models::Exam;
use crate::db::types::{DifficultyLevel, DisplayOrder};

/// Body of `POST /exams`. Presence of the per-entry fields is checked in
/// the handler so a malformed batch fails with 400 before anything is
/// persisted.
#[derive(Debug, Deserialize)]
pub(crate) struct ExamCreate {
    #[serde(default, alias = "testName")]
    pub(crate) test_name: Option<String>,
    #[serde(default)]
    pub(crate) description: Option<String>,
    #[serde(default)]
    pub(crate) strategy: Option<DisplayOrder>,
    #[serde(default)]
    pub(crate) questions: Option<Vec<ExamQuestionEntry>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ExamQuestionEntry {
    /// Section tag (`listening` / `reading`); drives section resolution.
    #[serde(default, rename = "type")]
    pub(crate) question_type: Option<String>,
    /// Display label, e.g. `"Part 5"`.
    #[serde(default)]
    pub(crate) section: Option<String>,
    #[serde(default)]
    pub(crate) part: Option<i16>,
    #[serde(default)]
    pub(crate) description: Option<String>,
    #[serde(default)]
    pub(crate) difficulty: Option<DifficultyLevel>,
    #[serde(default)]
    pub(crate) template: Option<QuestionTemplate>,
    #[serde(default, alias = "existedIDInDB")]
    pub(crate) existed_id_in_db: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct QuestionTemplate {
    #[serde(default)]
    pub(crate) question: Option<String>,
    #[serde(default)]
    pub(crate) options: Option<Vec<String>>,
    #[serde(default)]
    pub(crate) image: Option<String>,
    #[serde(default)]
    pub(crate) audio: Option<String>,
    #[serde(default)]
    pub(crate) transcript: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ExamCreatedResponse {
    pub(crate) success: bool,
    #[serde(rename = "examId")]
    pub(crate) exam_id: i64,
}

#[derive(Debug, Serialize)]
pub(crate) struct ExamSummaryResponse {
    pub(crate) id: i64,
    pub(crate) name: String,
    pub(crate) description: Option<String>,
    pub(crate) difficulty: DifficultyLevel,
    #[serde(rename = "questionCount")]
    pub(crate) question_count: i32,
    #[serde(rename = "createdAt")]
    pub(crate) created_at: String,
}

impl ExamSummaryResponse {
    pub(crate) fn from_db(exam: Exam) -> Self {
        Self {
            id: exam.id,
            name: exam.title,
            description: exam.description,
            difficulty: exam.difficulty,
            question_count: exam.question_count,
            created_at: format_primitive(exam.created_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct GroupedExamsResponse {
    pub(crate) easy: Vec<ExamSummaryResponse>,
    pub(crate) medium: Vec<ExamSummaryResponse>,
    pub(crate) hard: Vec<ExamSummaryResponse>,
}

#[derive(Debug, Serialize)]
pub(crate) struct AttemptExamResponse {
    pub(crate) exam_attempt_id: i64,
    pub(crate) id: i64,
    pub(crate) name: String,
    pub(crate) sections: Vec<AttemptSectionResponse>,
}

#[derive(Debug, Serialize)]
pub(crate) struct AttemptSectionResponse {
    pub(crate) name: String,
    /// Time budget in seconds.
    pub(crate) time: i64,
    pub(crate) questions: Vec<AttemptQuestionResponse>,
}

#[derive(Debug, Serialize)]
pub(crate) struct AttemptQuestionResponse {
    pub(crate) id: i64,
    pub(crate) question: String,
    pub(crate) options: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) audio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) transcript: Option<String>,
    pub(crate) section: String,
    pub(crate) part_code: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SubmitAttemptRequest {
    #[serde(default, alias = "examAttemptId")]
    pub(crate) exam_attempt_id: Option<i64>,
    /// Keys are snapshot question ids as strings.
    #[serde(default)]
    pub(crate) answers: Option<HashMap<String, String>>,
}

#[derive(Debug, Serialize)]
pub(crate) struct SubmitAttemptResponse {
    pub(crate) score: i32,
    #[serde(rename = "correctCount")]
    pub(crate) correct_count: i32,
    #[serde(rename = "totalQuestions")]
    pub(crate) total_questions: i32,
}
