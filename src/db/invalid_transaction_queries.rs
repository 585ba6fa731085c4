use chrono::{DateTime, Utc};
use sqlx::{PgExecutor, PgPool};

use crate::models::InvalidRecord;

pub async fn insert<'e, E>(
    executor: E,
    line_number: i32,
    error_message: &str,
    uploaded_at: DateTime<Utc>,
) -> Result<InvalidRecord, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, InvalidRecord>(
        "INSERT INTO invalid_transactions (line_number, error_message, uploaded_at)
         VALUES ($1, $2, $3)
         RETURNING id, line_number, error_message, uploaded_at",
    )
    .bind(line_number)
    .bind(error_message)
    .bind(uploaded_at)
    .fetch_one(executor)
    .await
}

pub async fn fetch_all(pool: &PgPool) -> Result<Vec<InvalidRecord>, sqlx::Error> {
    sqlx::query_as::<_, InvalidRecord>(
        "SELECT id, line_number, error_message, uploaded_at
         FROM invalid_transactions
         ORDER BY uploaded_at DESC, id ASC",
    )
    .fetch_all(pool)
    .await
}
