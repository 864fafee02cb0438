use sqlx::{Postgres, QueryBuilder};

use crate::db::models::{ExamQuestion, ExamQuestionChoice};
use crate::db::types::DifficultyLevel;

pub(crate) const COLUMNS: &str = "\
    id, exam_id, question_id, content, correct_answer, difficulty, topic, part, position";

pub(crate) struct SnapshotRow {
    pub(crate) question_id: i64,
    pub(crate) content: String,
    pub(crate) correct_answer: String,
    pub(crate) difficulty: DifficultyLevel,
    pub(crate) topic: Option<String>,
    pub(crate) part: i16,
    pub(crate) position: i32,
}

pub(crate) async fn insert_snapshot(
    executor: impl sqlx::PgExecutor<'_>,
    exam_id: i64,
    rows: &[SnapshotRow],
) -> Result<(), sqlx::Error> {
    if rows.is_empty() {
        return Ok(());
    }

    let mut builder = QueryBuilder::<Postgres>::new(
        "INSERT INTO exam_questions (
            exam_id, question_id, content, correct_answer, difficulty, topic, part, position) ",
    );
    builder.push_values(rows, |mut row, snapshot| {
        row.push_bind(exam_id)
            .push_bind(snapshot.question_id)
            .push_bind(&snapshot.content)
            .push_bind(&snapshot.correct_answer)
            .push_bind(snapshot.difficulty)
            .push_bind(&snapshot.topic)
            .push_bind(snapshot.part)
            .push_bind(snapshot.position);
    });
    builder.build().execute(executor).await?;
    Ok(())
}

/// Copies the current choices of every source question into the frozen
/// per-exam choice table.
pub(crate) async fn copy_source_choices(
    executor: impl sqlx::PgExecutor<'_>,
    exam_id: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO exam_question_choices (exam_question_id, label, content, position)
         SELECT eq.id, qc.label, qc.content, qc.position
         FROM exam_questions eq
         JOIN question_choices qc ON qc.question_id = eq.question_id
         WHERE eq.exam_id = $1",
    )
    .bind(exam_id)
    .execute(executor)
    .await?;
    Ok(())
}

pub(crate) async fn list_by_exam(
    executor: impl sqlx::PgExecutor<'_>,
    exam_id: i64,
) -> Result<Vec<ExamQuestion>, sqlx::Error> {
    sqlx::query_as::<_, ExamQuestion>(&format!(
        "SELECT {COLUMNS} FROM exam_questions WHERE exam_id = $1 ORDER BY position"
    ))
    .bind(exam_id)
    .fetch_all(executor)
    .await
}

pub(crate) async fn choices_by_exam(
    executor: impl sqlx::PgExecutor<'_>,
    exam_id: i64,
) -> Result<Vec<ExamQuestionChoice>, sqlx::Error> {
    sqlx::query_as::<_, ExamQuestionChoice>(
        "SELECT c.id, c.exam_question_id, c.label, c.content, c.position
         FROM exam_question_choices c
         JOIN exam_questions eq ON eq.id = c.exam_question_id
         WHERE eq.exam_id = $1
         ORDER BY c.exam_question_id, c.position",
    )
    .bind(exam_id)
    .fetch_all(executor)
    .await
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ExamQuestionMedia {
    pub(crate) exam_question_id: i64,
    pub(crate) media_type: crate::db::types::MediaKind,
    pub(crate) url: String,
}

/// Media stays attached to the source question; the snapshot keeps the
/// `question_id` reference for exactly this join.
pub(crate) async fn media_by_exam(
    executor: impl sqlx::PgExecutor<'_>,
    exam_id: i64,
) -> Result<Vec<ExamQuestionMedia>, sqlx::Error> {
    sqlx::query_as::<_, ExamQuestionMedia>(
        "SELECT eq.id AS exam_question_id, qm.media_type, qm.url
         FROM exam_questions eq
         JOIN question_media qm ON qm.question_id = eq.question_id
         WHERE eq.exam_id = $1
         ORDER BY eq.id, qm.id",
    )
    .bind(exam_id)
    .fetch_all(executor)
    .await
}
