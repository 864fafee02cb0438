use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::db::models::Exam;
use crate::db::types::{DifficultyLevel, DisplayOrder};

pub(crate) const COLUMNS: &str = "\
    id, title, description, difficulty, display_order, section_names, \
    section_seconds, created_by, question_count, created_at";

pub(crate) async fn find_by_id(
    executor: impl sqlx::PgExecutor<'_>,
    id: i64,
) -> Result<Option<Exam>, sqlx::Error> {
    sqlx::query_as::<_, Exam>(&format!("SELECT {COLUMNS} FROM exams WHERE id = $1"))
        .bind(id)
        .fetch_optional(executor)
        .await
}

pub(crate) struct CreateExam<'a> {
    pub(crate) title: &'a str,
    pub(crate) description: Option<&'a str>,
    pub(crate) difficulty: DifficultyLevel,
    pub(crate) display_order: DisplayOrder,
    pub(crate) section_names: &'a str,
    pub(crate) section_seconds: &'a str,
    pub(crate) created_by: Option<i64>,
    pub(crate) question_count: i32,
    pub(crate) created_at: time::PrimitiveDateTime,
}

pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreateExam<'_>,
) -> Result<Exam, sqlx::Error> {
    sqlx::query_as::<_, Exam>(&format!(
        "INSERT INTO exams (
            title, description, difficulty, display_order, section_names,
            section_seconds, created_by, question_count, created_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9)
        RETURNING {COLUMNS}",
    ))
    .bind(params.title)
    .bind(params.description)
    .bind(params.difficulty)
    .bind(params.display_order)
    .bind(params.section_names)
    .bind(params.section_seconds)
    .bind(params.created_by)
    .bind(params.question_count)
    .bind(params.created_at)
    .fetch_one(executor)
    .await
}

pub(crate) struct ListExamsParams {
    pub(crate) difficulty: Option<DifficultyLevel>,
    pub(crate) offset: i64,
    pub(crate) limit: i64,
}

pub(crate) async fn list(pool: &PgPool, params: &ListExamsParams) -> Result<Vec<Exam>, sqlx::Error> {
    let mut builder =
        QueryBuilder::<Postgres>::new(format!("SELECT {COLUMNS} FROM exams WHERE TRUE"));
    if let Some(difficulty) = params.difficulty {
        builder.push(" AND difficulty = ");
        builder.push_bind(difficulty);
    }
    builder.push(" ORDER BY created_at DESC, id DESC OFFSET ");
    builder.push_bind(params.offset.max(0));
    builder.push(" LIMIT ");
    builder.push_bind(params.limit.clamp(1, 1000));

    builder.build_query_as::<Exam>().fetch_all(pool).await
}

pub(crate) async fn count(
    pool: &PgPool,
    difficulty: Option<DifficultyLevel>,
) -> Result<i64, sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM exams WHERE TRUE");
    if let Some(difficulty) = difficulty {
        builder.push(" AND difficulty = ");
        builder.push_bind(difficulty);
    }

    builder.build_query_scalar::<i64>().fetch_one(pool).await
}

pub(crate) async fn list_all(pool: &PgPool) -> Result<Vec<Exam>, sqlx::Error> {
    sqlx::query_as::<_, Exam>(&format!(
        "SELECT {COLUMNS} FROM exams ORDER BY created_at DESC, id DESC"
    ))
    .fetch_all(pool)
    .await
}

/// Returns whether a row was deleted. Snapshot rows, attempts and answers
/// go with it via cascades.
pub(crate) async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM exams WHERE id = $1").bind(id).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}
