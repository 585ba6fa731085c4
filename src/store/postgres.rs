use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::db::{invalid_transaction_queries, transaction_queries};
use crate::errors::StoreError;
use crate::models::{Diagnostic, InvalidRecord, Transaction};

use super::{InvalidRecordStore, TransactionStore};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// SQLSTATE 22001: string_data_right_truncation.
const VALUE_TOO_LONG: &str = "22001";

fn write_error(e: sqlx::Error, reference_number: &str) -> StoreError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            StoreError::Conflict(reference_number.to_string())
        }
        sqlx::Error::Database(db) if db.code().as_deref() == Some(VALUE_TOO_LONG) => {
            StoreError::ValueTooLong(reference_number.to_string())
        }
        _ => StoreError::Db(e),
    }
}

#[async_trait]
impl TransactionStore for PgStore {
    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn fetch_all(&self) -> Result<Vec<Transaction>, StoreError> {
        Ok(transaction_queries::fetch_all(&self.pool).await?)
    }

    async fn fetch_one(&self, reference_number: &str) -> Result<Option<Transaction>, StoreError> {
        Ok(transaction_queries::fetch_one(&self.pool, reference_number).await?)
    }

    async fn insert(&self, transaction: Transaction) -> Result<Transaction, StoreError> {
        transaction_queries::insert(&self.pool, &transaction)
            .await
            .map_err(|e| write_error(e, &transaction.reference_number))?;
        Ok(transaction)
    }

    async fn replace(&self, transaction: Transaction) -> Result<Option<Transaction>, StoreError> {
        let updated = transaction_queries::update(&self.pool, &transaction)
            .await
            .map_err(|e| write_error(e, &transaction.reference_number))?;
        match updated {
            0 => Ok(None),
            _ => Ok(Some(transaction)),
        }
    }

    async fn delete(&self, reference_number: &str) -> Result<u64, StoreError> {
        Ok(transaction_queries::delete(&self.pool, reference_number).await?)
    }

    async fn existing_references(&self, candidates: &[String]) -> Result<HashSet<String>, StoreError> {
        if candidates.is_empty() {
            return Ok(HashSet::new());
        }
        let found = transaction_queries::fetch_existing_references(&self.pool, candidates).await?;
        Ok(found.into_iter().collect())
    }

    async fn insert_batch(&self, transactions: Vec<Transaction>) -> Result<u64, StoreError> {
        let mut tx = self.pool.begin().await?;
        for transaction in &transactions {
            // Dropping `tx` on the error path rolls the batch back.
            transaction_queries::insert(&mut *tx, transaction)
                .await
                .map_err(|e| write_error(e, &transaction.reference_number))?;
        }
        tx.commit().await?;
        Ok(transactions.len() as u64)
    }
}

#[async_trait]
impl InvalidRecordStore for PgStore {
    async fn append(
        &self,
        diagnostics: &[Diagnostic],
        uploaded_at: DateTime<Utc>,
    ) -> Result<Vec<InvalidRecord>, StoreError> {
        let mut tx = self.pool.begin().await?;
        let mut appended = Vec::with_capacity(diagnostics.len());
        for diagnostic in diagnostics {
            let record = invalid_transaction_queries::insert(
                &mut *tx,
                diagnostic.stored_line_number(),
                &diagnostic.message,
                uploaded_at,
            )
            .await?;
            appended.push(record);
        }
        tx.commit().await?;
        Ok(appended)
    }

    async fn list(&self) -> Result<Vec<InvalidRecord>, StoreError> {
        Ok(invalid_transaction_queries::fetch_all(&self.pool).await?)
    }
}
