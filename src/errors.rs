use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Db(sqlx::Error),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::Db(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };
        (status, Json(json!({ "message": message }))).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(value: sqlx::Error) -> Self {
        AppError::Db(value)
    }
}

impl From<StoreError> for AppError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Conflict(reference) => AppError::Conflict(format!(
                "Transaction with ReferenceNumber '{}' already exists.",
                reference
            )),
            StoreError::ValueTooLong(reference) => AppError::Validation(format!(
                "Transaction with ReferenceNumber '{}' has a value longer than its column allows.",
                reference
            )),
            StoreError::Db(e) => AppError::Db(e),
        }
    }
}

impl From<FieldError> for AppError {
    fn from(value: FieldError) -> Self {
        AppError::Validation(value.to_string())
    }
}

/// Failures raised by a record or diagnostics store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Duplicate ReferenceNumber: {0}")]
    Conflict(String),
    #[error("Value too long for column: {0}")]
    ValueTooLong(String),
    #[error("Database error: {0}")]
    Db(#[from] sqlx::Error),
}

/// A single column that failed to parse or validate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("Invalid ReferenceNumber.")]
    ReferenceNumber,
    #[error("Duplicate ReferenceNumber.")]
    DuplicateReferenceNumber,
    #[error("Invalid Quantity: {0}")]
    Quantity(String),
    #[error("Invalid Amount: {0}")]
    Amount(String),
    #[error("Name is required.")]
    NameRequired,
    #[error("Name must be at most {0} characters.")]
    NameTooLong(usize),
    #[error("Invalid TransactionDate: {0}")]
    TransactionDate(String),
    #[error("Invalid Symbol.")]
    Symbol,
    #[error("OrderSide must be Buy or Sell.")]
    OrderSide,
    #[error("Invalid OrderStatus.")]
    OrderStatus,
}

impl FieldError {
    pub fn field(&self) -> &'static str {
        match self {
            FieldError::ReferenceNumber | FieldError::DuplicateReferenceNumber => "ReferenceNumber",
            FieldError::Quantity(_) => "Quantity",
            FieldError::Amount(_) => "Amount",
            FieldError::NameRequired | FieldError::NameTooLong(_) => "Name",
            FieldError::TransactionDate(_) => "TransactionDate",
            FieldError::Symbol => "Symbol",
            FieldError::OrderSide => "OrderSide",
            FieldError::OrderStatus => "OrderStatus",
        }
    }
}
