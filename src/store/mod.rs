pub mod memory;
pub mod postgres;

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::errors::StoreError;
use crate::models::{Diagnostic, InvalidRecord, Transaction};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Keyed storage for committed transactions.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Cheap reachability check used by the health route.
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn fetch_all(&self) -> Result<Vec<Transaction>, StoreError>;

    async fn fetch_one(&self, reference_number: &str) -> Result<Option<Transaction>, StoreError>;

    /// Fails with [`StoreError::Conflict`] when the reference number exists.
    async fn insert(&self, transaction: Transaction) -> Result<Transaction, StoreError>;

    /// Returns `None` when no record has the transaction's reference number.
    async fn replace(&self, transaction: Transaction) -> Result<Option<Transaction>, StoreError>;

    async fn delete(&self, reference_number: &str) -> Result<u64, StoreError>;

    /// The subset of `candidates` already stored.
    async fn existing_references(&self, candidates: &[String]) -> Result<HashSet<String>, StoreError>;

    /// Inserts every transaction or none of them.
    async fn insert_batch(&self, transactions: Vec<Transaction>) -> Result<u64, StoreError>;
}

/// Append-only log of line failures from rejected uploads.
#[async_trait]
pub trait InvalidRecordStore: Send + Sync {
    async fn append(
        &self,
        diagnostics: &[Diagnostic],
        uploaded_at: DateTime<Utc>,
    ) -> Result<Vec<InvalidRecord>, StoreError>;

    /// Newest first; records from the same upload keep their line order.
    async fn list(&self) -> Result<Vec<InvalidRecord>, StoreError>;
}
