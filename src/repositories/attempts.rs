use sqlx::PgPool;

use crate::db::models::ExamAttempt;
use crate::db::types::AttemptStatus;

pub(crate) const COLUMNS: &str = "\
    id, exam_id, user_id, status, question_order, score, started_at, submitted_at";

pub(crate) async fn find_by_id(
    pool: &PgPool,
    id: i64,
) -> Result<Option<ExamAttempt>, sqlx::Error> {
    sqlx::query_as::<_, ExamAttempt>(&format!("SELECT {COLUMNS} FROM exam_attempts WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn find_in_progress(
    executor: impl sqlx::PgExecutor<'_>,
    exam_id: i64,
    user_id: i64,
) -> Result<Option<ExamAttempt>, sqlx::Error> {
    sqlx::query_as::<_, ExamAttempt>(&format!(
        "SELECT {COLUMNS} FROM exam_attempts \
         WHERE exam_id = $1 AND user_id = $2 AND status = $3"
    ))
    .bind(exam_id)
    .bind(user_id)
    .bind(AttemptStatus::InProgress)
    .fetch_optional(executor)
    .await
}

/// Insert against the partial unique index on open attempts. Returns
/// whether this call created the row; on conflict the caller re-selects
/// the winner.
pub(crate) async fn create_in_progress(
    executor: impl sqlx::PgExecutor<'_>,
    exam_id: i64,
    user_id: i64,
    started_at: time::PrimitiveDateTime,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO exam_attempts (exam_id, user_id, status, started_at)
         VALUES ($1,$2,$3,$4)
         ON CONFLICT DO NOTHING",
    )
    .bind(exam_id)
    .bind(user_id)
    .bind(AttemptStatus::InProgress)
    .bind(started_at)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub(crate) async fn set_question_order(
    pool: &PgPool,
    id: i64,
    question_order: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE exam_attempts SET question_order = $1 WHERE id = $2")
        .bind(question_order)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub(crate) async fn submit(
    pool: &PgPool,
    id: i64,
    score: i32,
    submitted_at: time::PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE exam_attempts SET status = $1, score = $2, submitted_at = $3 WHERE id = $4",
    )
    .bind(AttemptStatus::Submitted)
    .bind(score)
    .bind(submitted_at)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct SubmittedAttemptRow {
    pub(crate) id: i64,
    pub(crate) exam_id: i64,
    pub(crate) exam_title: String,
    pub(crate) score: Option<i32>,
    pub(crate) started_at: time::PrimitiveDateTime,
    pub(crate) submitted_at: Option<time::PrimitiveDateTime>,
}

pub(crate) async fn list_submitted_by_user(
    pool: &PgPool,
    user_id: i64,
    offset: i64,
    limit: i64,
) -> Result<Vec<SubmittedAttemptRow>, sqlx::Error> {
    sqlx::query_as::<_, SubmittedAttemptRow>(
        "SELECT a.id, a.exam_id, e.title AS exam_title, a.score, a.started_at, a.submitted_at
         FROM exam_attempts a
         JOIN exams e ON e.id = a.exam_id
         WHERE a.user_id = $1 AND a.status = $2
         ORDER BY a.submitted_at DESC NULLS LAST, a.id DESC
         OFFSET $3 LIMIT $4",
    )
    .bind(user_id)
    .bind(AttemptStatus::Submitted)
    .bind(offset.max(0))
    .bind(limit.clamp(1, 1000))
    .fetch_all(pool)
    .await
}

pub(crate) async fn count_submitted_by_user(
    pool: &PgPool,
    user_id: i64,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM exam_attempts WHERE user_id = $1 AND status = $2")
        .bind(user_id)
        .bind(AttemptStatus::Submitted)
        .fetch_one(pool)
        .await
}
