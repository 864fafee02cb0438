use serde::Serialize;

use crate::core::time::format_primitive;
use crate::repositories::attempts::SubmittedAttemptRow;

#[derive(Debug, Serialize)]
pub(crate) struct AttemptSummaryResponse {
    pub(crate) id: i64,
    #[serde(rename = "examId")]
    pub(crate) exam_id: i64,
    #[serde(rename = "examTitle")]
    pub(crate) exam_title: String,
    pub(crate) score: Option<i32>,
    #[serde(rename = "startedAt")]
    pub(crate) started_at: String,
    #[serde(rename = "submittedAt")]
    pub(crate) submitted_at: Option<String>,
}

impl AttemptSummaryResponse {
    pub(crate) fn from_row(row: SubmittedAttemptRow) -> Self {
        Self {
            id: row.id,
            exam_id: row.exam_id,
            exam_title: row.exam_title,
            score: row.score,
            started_at: format_primitive(row.started_at),
            submitted_at: row.submitted_at.map(format_primitive),
        }
    }
}
