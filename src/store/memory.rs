use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};

use crate::errors::StoreError;
use crate::models::{Diagnostic, InvalidRecord, Transaction};
use crate::services::csv_upload::field_validators::{
    NAME_MAX_LEN, REFERENCE_NUMBER_MAX_LEN, SYMBOL_MAX_LEN,
};

use super::{InvalidRecordStore, TransactionStore};

/// Process-local store backing both traits. Selected with
/// `STORE_BACKEND=memory`; contents are lost on restart.
#[derive(Default)]
pub struct MemoryStore {
    transactions: RwLock<BTreeMap<String, Transaction>>,
    invalid_records: Mutex<InvalidLog>,
}

#[derive(Default)]
struct InvalidLog {
    next_id: i64,
    records: Vec<InvalidRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

// Same widths as the `transactions` table's VARCHAR columns.
fn check_column_widths(transaction: &Transaction) -> Result<(), StoreError> {
    let too_long = transaction.reference_number.chars().count() > REFERENCE_NUMBER_MAX_LEN
        || transaction.name.chars().count() > NAME_MAX_LEN
        || transaction.symbol.chars().count() > SYMBOL_MAX_LEN;
    if too_long {
        return Err(StoreError::ValueTooLong(transaction.reference_number.clone()));
    }
    Ok(())
}

#[async_trait]
impl TransactionStore for MemoryStore {
    async fn fetch_all(&self) -> Result<Vec<Transaction>, StoreError> {
        Ok(self.transactions.read().values().cloned().collect())
    }

    async fn fetch_one(&self, reference_number: &str) -> Result<Option<Transaction>, StoreError> {
        Ok(self.transactions.read().get(reference_number).cloned())
    }

    async fn insert(&self, transaction: Transaction) -> Result<Transaction, StoreError> {
        check_column_widths(&transaction)?;
        let mut transactions = self.transactions.write();
        if transactions.contains_key(&transaction.reference_number) {
            return Err(StoreError::Conflict(transaction.reference_number));
        }
        transactions.insert(transaction.reference_number.clone(), transaction.clone());
        Ok(transaction)
    }

    async fn replace(&self, transaction: Transaction) -> Result<Option<Transaction>, StoreError> {
        check_column_widths(&transaction)?;
        let mut transactions = self.transactions.write();
        match transactions.get_mut(&transaction.reference_number) {
            Some(existing) => {
                *existing = transaction.clone();
                Ok(Some(transaction))
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, reference_number: &str) -> Result<u64, StoreError> {
        Ok(self.transactions.write().remove(reference_number).map_or(0, |_| 1))
    }

    async fn existing_references(&self, candidates: &[String]) -> Result<HashSet<String>, StoreError> {
        let transactions = self.transactions.read();
        Ok(candidates
            .iter()
            .filter(|reference| transactions.contains_key(reference.as_str()))
            .cloned()
            .collect())
    }

    async fn insert_batch(&self, batch: Vec<Transaction>) -> Result<u64, StoreError> {
        let mut transactions = self.transactions.write();

        let mut incoming = HashSet::with_capacity(batch.len());
        for transaction in &batch {
            let reference = transaction.reference_number.as_str();
            if transactions.contains_key(reference) || !incoming.insert(reference) {
                return Err(StoreError::Conflict(reference.to_string()));
            }
            check_column_widths(transaction)?;
        }

        let inserted = batch.len() as u64;
        for transaction in batch {
            transactions.insert(transaction.reference_number.clone(), transaction);
        }
        Ok(inserted)
    }
}

#[async_trait]
impl InvalidRecordStore for MemoryStore {
    async fn append(
        &self,
        diagnostics: &[Diagnostic],
        uploaded_at: DateTime<Utc>,
    ) -> Result<Vec<InvalidRecord>, StoreError> {
        let mut log = self.invalid_records.lock();
        let mut appended = Vec::with_capacity(diagnostics.len());
        for diagnostic in diagnostics {
            log.next_id += 1;
            let record = InvalidRecord {
                id: log.next_id,
                line_number: diagnostic.stored_line_number(),
                error_message: diagnostic.message.clone(),
                uploaded_at,
            };
            log.records.push(record.clone());
            appended.push(record);
        }
        Ok(appended)
    }

    async fn list(&self) -> Result<Vec<InvalidRecord>, StoreError> {
        let mut records = self.invalid_records.lock().records.clone();
        records.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at).then(a.id.cmp(&b.id)));
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{OrderSide, OrderStatus};
    use bigdecimal::BigDecimal;
    use chrono::{Duration, NaiveDate};

    fn transaction(reference: &str) -> Transaction {
        Transaction {
            reference_number: reference.to_string(),
            quantity: 10,
            amount: BigDecimal::from(25),
            name: "Jane Roe".to_string(),
            transaction_date: NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(10, 0, 0)
                .unwrap(),
            symbol: "XYZ".to_string(),
            order_side: OrderSide::Sell,
            order_status: OrderStatus::Matched,
        }
    }

    #[tokio::test]
    async fn test_insert_conflicts_on_existing_key() {
        let store = MemoryStore::new();
        store.insert(transaction("AB12")).await.unwrap();

        let err = store.insert(transaction("AB12")).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(reference) if reference == "AB12"));
    }

    #[tokio::test]
    async fn test_batch_is_all_or_nothing() {
        let store = MemoryStore::new();
        store.insert(transaction("CD34")).await.unwrap();

        let batch = vec![transaction("AB12"), transaction("CD34"), transaction("EF56")];
        let err = store.insert_batch(batch).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(reference) if reference == "CD34"));
        assert_eq!(TransactionStore::fetch_all(&store).await.unwrap().len(), 1);

        let inserted = store
            .insert_batch(vec![transaction("AB12"), transaction("EF56")])
            .await
            .unwrap();
        assert_eq!(inserted, 2);
        let references: Vec<String> = TransactionStore::fetch_all(&store)
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.reference_number)
            .collect();
        assert_eq!(references, vec!["AB12", "CD34", "EF56"]);
    }

    #[tokio::test]
    async fn test_column_widths_match_table() {
        let store = MemoryStore::new();
        let mut long_name = transaction("AB12");
        long_name.name = "x".repeat(101);

        let err = store.insert(long_name.clone()).await.unwrap_err();
        assert!(matches!(err, StoreError::ValueTooLong(reference) if reference == "AB12"));

        let err = store
            .insert_batch(vec![transaction("CD34"), long_name])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::ValueTooLong(_)));
        assert!(TransactionStore::fetch_all(&store).await.unwrap().is_empty());

        let mut at_limit = transaction("EF56");
        at_limit.name = "x".repeat(100);
        assert!(store.insert(at_limit).await.is_ok());
    }

    #[tokio::test]
    async fn test_replace_and_delete_missing_key() {
        let store = MemoryStore::new();
        assert!(store.replace(transaction("AB12")).await.unwrap().is_none());
        assert_eq!(store.delete("AB12").await.unwrap(), 0);

        store.insert(transaction("AB12")).await.unwrap();
        let mut updated = transaction("AB12");
        updated.quantity = 99;
        store.replace(updated).await.unwrap();
        assert_eq!(store.fetch_one("AB12").await.unwrap().unwrap().quantity, 99);
        assert_eq!(store.delete("AB12").await.unwrap(), 1);
        assert!(store.fetch_one("AB12").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_existing_references() {
        let store = MemoryStore::new();
        store.insert(transaction("AB12")).await.unwrap();
        let found = store
            .existing_references(&["AB12".to_string(), "ZZ99".to_string()])
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert!(found.contains("AB12"));
    }

    #[tokio::test]
    async fn test_invalid_records_newest_first_in_line_order() {
        let store = MemoryStore::new();
        let earlier = Utc::now() - Duration::minutes(5);
        let later = Utc::now();

        store
            .append(&[Diagnostic::new(2, "Invalid Symbol."), Diagnostic::new(4, "Name is required.")], earlier)
            .await
            .unwrap();
        store
            .append(&[Diagnostic::new(1, "Invalid OrderStatus."), Diagnostic::new(3, "Invalid Symbol.")], later)
            .await
            .unwrap();

        let listed: Vec<(i64, i32)> = store
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|r| (r.id, r.line_number))
            .collect();
        assert_eq!(listed, vec![(3, 1), (4, 3), (1, 2), (2, 4)]);
    }
}
