/// Last write wins for a repeated (attempt, question) pair.
pub(crate) async fn upsert(
    executor: impl sqlx::PgExecutor<'_>,
    attempt_id: i64,
    exam_question_id: i64,
    selected: &str,
    is_correct: bool,
    answered_at: time::PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO exam_answers (attempt_id, exam_question_id, selected, is_correct, answered_at)
         VALUES ($1,$2,$3,$4,$5)
         ON CONFLICT (attempt_id, exam_question_id)
         DO UPDATE SET selected = EXCLUDED.selected,
                       is_correct = EXCLUDED.is_correct,
                       answered_at = EXCLUDED.answered_at",
    )
    .bind(attempt_id)
    .bind(exam_question_id)
    .bind(selected)
    .bind(is_correct)
    .bind(answered_at)
    .execute(executor)
    .await?;
    Ok(())
}
