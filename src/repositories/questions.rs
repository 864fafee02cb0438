use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::db::models::{Question, QuestionChoice, QuestionMedia};
use crate::db::types::{DifficultyLevel, MediaKind};

pub(crate) const COLUMNS: &str = "\
    id, content, correct_answer, section_id, type_id, part, difficulty, topic, created_at";

pub(crate) async fn find_by_id(
    executor: impl sqlx::PgExecutor<'_>,
    id: i64,
) -> Result<Option<Question>, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!("SELECT {COLUMNS} FROM questions WHERE id = $1"))
        .bind(id)
        .fetch_optional(executor)
        .await
}

pub(crate) struct CreateQuestion<'a> {
    pub(crate) content: &'a str,
    pub(crate) correct_answer: &'a str,
    pub(crate) section_id: i32,
    pub(crate) type_id: i32,
    pub(crate) part: i16,
    pub(crate) difficulty: DifficultyLevel,
    pub(crate) topic: Option<&'a str>,
    pub(crate) created_at: time::PrimitiveDateTime,
}

pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreateQuestion<'_>,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "INSERT INTO questions (
            content, correct_answer, section_id, type_id, part, difficulty, topic, created_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8)
        RETURNING id",
    )
    .bind(params.content)
    .bind(params.correct_answer)
    .bind(params.section_id)
    .bind(params.type_id)
    .bind(params.part)
    .bind(params.difficulty)
    .bind(params.topic)
    .bind(params.created_at)
    .fetch_one(executor)
    .await
}

/// Bulk-inserts choices labeled by position; `choices` carries
/// (label, content, position).
pub(crate) async fn insert_choices(
    executor: impl sqlx::PgExecutor<'_>,
    question_id: i64,
    choices: &[(String, String, i32)],
) -> Result<(), sqlx::Error> {
    if choices.is_empty() {
        return Ok(());
    }

    let mut builder = QueryBuilder::<Postgres>::new(
        "INSERT INTO question_choices (question_id, label, content, position) ",
    );
    builder.push_values(choices, |mut row, (label, content, position)| {
        row.push_bind(question_id).push_bind(label).push_bind(content).push_bind(position);
    });
    builder.build().execute(executor).await?;
    Ok(())
}

pub(crate) async fn insert_media(
    executor: impl sqlx::PgExecutor<'_>,
    question_id: i64,
    media: &[(MediaKind, String)],
) -> Result<(), sqlx::Error> {
    if media.is_empty() {
        return Ok(());
    }

    let mut builder =
        QueryBuilder::<Postgres>::new("INSERT INTO question_media (question_id, media_type, url) ");
    builder.push_values(media, |mut row, (kind, url)| {
        row.push_bind(question_id).push_bind(kind).push_bind(url);
    });
    builder.build().execute(executor).await?;
    Ok(())
}

pub(crate) struct ListQuestionsParams {
    pub(crate) part: Option<i16>,
    pub(crate) difficulty: Option<DifficultyLevel>,
    pub(crate) offset: i64,
    pub(crate) limit: i64,
}

pub(crate) async fn list(
    pool: &PgPool,
    params: &ListQuestionsParams,
) -> Result<Vec<Question>, sqlx::Error> {
    let mut builder =
        QueryBuilder::<Postgres>::new(format!("SELECT {COLUMNS} FROM questions WHERE TRUE"));
    push_filters(&mut builder, params);
    builder.push(" ORDER BY id OFFSET ");
    builder.push_bind(params.offset.max(0));
    builder.push(" LIMIT ");
    builder.push_bind(params.limit.clamp(1, 1000));

    builder.build_query_as::<Question>().fetch_all(pool).await
}

pub(crate) async fn count(
    pool: &PgPool,
    params: &ListQuestionsParams,
) -> Result<i64, sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM questions WHERE TRUE");
    push_filters(&mut builder, params);

    builder.build_query_scalar::<i64>().fetch_one(pool).await
}

fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, params: &ListQuestionsParams) {
    if let Some(part) = params.part {
        builder.push(" AND part = ");
        builder.push_bind(part);
    }
    if let Some(difficulty) = params.difficulty {
        builder.push(" AND difficulty = ");
        builder.push_bind(difficulty);
    }
}

pub(crate) async fn choices_by_question_ids(
    pool: &PgPool,
    question_ids: &[i64],
) -> Result<Vec<QuestionChoice>, sqlx::Error> {
    sqlx::query_as::<_, QuestionChoice>(
        "SELECT id, question_id, label, content, position
         FROM question_choices WHERE question_id = ANY($1)
         ORDER BY question_id, position",
    )
    .bind(question_ids)
    .fetch_all(pool)
    .await
}

pub(crate) async fn media_by_question_ids(
    pool: &PgPool,
    question_ids: &[i64],
) -> Result<Vec<QuestionMedia>, sqlx::Error> {
    sqlx::query_as::<_, QuestionMedia>(
        "SELECT id, question_id, media_type, url
         FROM question_media WHERE question_id = ANY($1)
         ORDER BY question_id, id",
    )
    .bind(question_ids)
    .fetch_all(pool)
    .await
}
