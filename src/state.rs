use std::sync::Arc;

use crate::store::{InvalidRecordStore, TransactionStore};

#[derive(Clone)]
pub struct AppState {
    pub transactions: Arc<dyn TransactionStore>,
    pub invalid_records: Arc<dyn InvalidRecordStore>,
    pub max_upload_bytes: usize,
}
