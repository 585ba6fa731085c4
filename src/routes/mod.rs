pub mod health;
pub mod invalid_transactions;
pub mod transactions;
