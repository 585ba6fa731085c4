use sqlx::{FromRow, PgExecutor, PgPool};

use crate::errors::FieldError;
use crate::models::Transaction;

// Enum columns come back as text and are converted after the fetch.
#[derive(Debug, FromRow)]
struct TransactionRow {
    reference_number: String,
    quantity: i64,
    amount: bigdecimal::BigDecimal,
    name: String,
    transaction_date: chrono::NaiveDateTime,
    symbol: String,
    order_side: String,
    order_status: String,
}

impl TryFrom<TransactionRow> for Transaction {
    type Error = FieldError;

    fn try_from(row: TransactionRow) -> Result<Self, Self::Error> {
        Ok(Transaction {
            reference_number: row.reference_number,
            quantity: row.quantity,
            amount: row.amount,
            name: row.name,
            transaction_date: row.transaction_date,
            symbol: row.symbol,
            order_side: row.order_side.parse()?,
            order_status: row.order_status.parse()?,
        })
    }
}

fn decode(row: TransactionRow) -> Result<Transaction, sqlx::Error> {
    Transaction::try_from(row).map_err(|e| sqlx::Error::Decode(Box::new(e)))
}

pub async fn fetch_all(pool: &PgPool) -> Result<Vec<Transaction>, sqlx::Error> {
    let rows = sqlx::query_as::<_, TransactionRow>(
        "SELECT reference_number, quantity, amount, name, transaction_date,
                symbol, order_side, order_status
         FROM transactions
         ORDER BY reference_number",
    )
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(decode).collect()
}

pub async fn fetch_one(pool: &PgPool, reference_number: &str) -> Result<Option<Transaction>, sqlx::Error> {
    sqlx::query_as::<_, TransactionRow>(
        "SELECT reference_number, quantity, amount, name, transaction_date,
                symbol, order_side, order_status
         FROM transactions
         WHERE reference_number = $1",
    )
    .bind(reference_number)
    .fetch_optional(pool)
    .await?
    .map(decode)
    .transpose()
}

pub async fn insert<'e, E>(executor: E, transaction: &Transaction) -> Result<(), sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query(
        "INSERT INTO transactions (reference_number, quantity, amount, name,
                                   transaction_date, symbol, order_side, order_status)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
    )
    .bind(&transaction.reference_number)
    .bind(transaction.quantity)
    .bind(&transaction.amount)
    .bind(&transaction.name)
    .bind(transaction.transaction_date)
    .bind(&transaction.symbol)
    .bind(transaction.order_side.as_str())
    .bind(transaction.order_status.as_str())
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn update(pool: &PgPool, transaction: &Transaction) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE transactions
         SET quantity = $2, amount = $3, name = $4, transaction_date = $5,
             symbol = $6, order_side = $7, order_status = $8
         WHERE reference_number = $1",
    )
    .bind(&transaction.reference_number)
    .bind(transaction.quantity)
    .bind(&transaction.amount)
    .bind(&transaction.name)
    .bind(transaction.transaction_date)
    .bind(&transaction.symbol)
    .bind(transaction.order_side.as_str())
    .bind(transaction.order_status.as_str())
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

pub async fn delete(pool: &PgPool, reference_number: &str) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM transactions WHERE reference_number = $1")
        .bind(reference_number)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

pub async fn fetch_existing_references(
    pool: &PgPool,
    candidates: &[String],
) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        "SELECT reference_number FROM transactions WHERE reference_number = ANY($1)",
    )
    .bind(candidates)
    .fetch_all(pool)
    .await
}
