mod invalid_transaction;
mod transaction;

pub use invalid_transaction::{Diagnostic, InvalidRecord};
pub use transaction::{OrderSide, OrderStatus, Transaction};
