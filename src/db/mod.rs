pub mod invalid_transaction_queries;
pub mod transaction_queries;
