use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::{Question, QuestionChoice, QuestionMedia};
use crate::db::types::{DifficultyLevel, MediaKind};

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct QuestionCreate {
    #[validate(length(min = 1, message = "content must not be empty"))]
    pub(crate) content: String,
    #[validate(length(min = 1, message = "options must not be empty"))]
    pub(crate) options: Vec<String>,
    /// Section tag: `listening` or `reading`.
    pub(crate) section: String,
    #[serde(default, rename = "type")]
    pub(crate) question_type: Option<String>,
    #[validate(range(min = 1, max = 7, message = "part must be between 1 and 7"))]
    pub(crate) part: i16,
    #[serde(default)]
    pub(crate) difficulty: Option<DifficultyLevel>,
    #[serde(default)]
    pub(crate) topic: Option<String>,
    #[serde(default)]
    pub(crate) image: Option<String>,
    #[serde(default)]
    pub(crate) audio: Option<String>,
    #[serde(default)]
    pub(crate) transcript: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct QuestionResponse {
    pub(crate) id: i64,
    pub(crate) content: String,
    #[serde(rename = "correctAnswer")]
    pub(crate) correct_answer: String,
    pub(crate) section: String,
    pub(crate) part: i16,
    pub(crate) difficulty: DifficultyLevel,
    pub(crate) topic: Option<String>,
    pub(crate) options: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) audio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) transcript: Option<String>,
    #[serde(rename = "createdAt")]
    pub(crate) created_at: String,
}

impl QuestionResponse {
    pub(crate) fn from_db(
        question: Question,
        section: String,
        choices: Vec<QuestionChoice>,
        media: Vec<QuestionMedia>,
    ) -> Self {
        let mut image = None;
        let mut audio = None;
        let mut transcript = None;
        for item in media {
            match item.media_type {
                MediaKind::Image => image = Some(item.url),
                MediaKind::Audio => audio = Some(item.url),
                MediaKind::Transcript => transcript = Some(item.url),
            }
        }

        Self {
            id: question.id,
            content: question.content,
            correct_answer: question.correct_answer,
            section,
            part: question.part,
            difficulty: question.difficulty,
            topic: question.topic,
            options: choices.into_iter().map(|choice| choice.content).collect(),
            image,
            audio,
            transcript,
            created_at: format_primitive(question.created_at),
        }
    }
}
