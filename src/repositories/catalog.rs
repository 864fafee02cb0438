use std::collections::HashMap;

/// Lookups against the seeded `question_sections` / `question_types`
/// catalogs.
pub(crate) async fn section_ids_by_names(
    executor: impl sqlx::PgExecutor<'_>,
    names: &[String],
) -> Result<HashMap<String, i32>, sqlx::Error> {
    let rows: Vec<(i32, String)> =
        sqlx::query_as("SELECT id, name FROM question_sections WHERE name = ANY($1)")
            .bind(names)
            .fetch_all(executor)
            .await?;

    Ok(rows.into_iter().map(|(id, name)| (name, id)).collect())
}

pub(crate) async fn section_names_by_ids(
    executor: impl sqlx::PgExecutor<'_>,
    ids: &[i32],
) -> Result<HashMap<i32, String>, sqlx::Error> {
    let rows: Vec<(i32, String)> =
        sqlx::query_as("SELECT id, name FROM question_sections WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(executor)
            .await?;

    Ok(rows.into_iter().collect())
}

pub(crate) async fn type_id_by_name(
    executor: impl sqlx::PgExecutor<'_>,
    name: &str,
) -> Result<Option<i32>, sqlx::Error> {
    sqlx::query_scalar::<_, i32>("SELECT id FROM question_types WHERE name = $1")
        .bind(name)
        .fetch_optional(executor)
        .await
}
