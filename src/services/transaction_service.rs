use crate::errors::{AppError, FieldError};
use crate::models::Transaction;
use crate::services::csv_upload::field_validators;
use crate::store::TransactionStore;

fn not_found(reference_number: &str) -> AppError {
    AppError::NotFound(format!("Transaction {} not found", reference_number))
}

/// Applies the upload column rules plus the column widths of the record store.
fn validate(mut transaction: Transaction) -> Result<Transaction, AppError> {
    field_validators::reference_number(&transaction.reference_number)?;
    field_validators::name(&transaction.name)?;
    if transaction.name.chars().count() > field_validators::NAME_MAX_LEN {
        return Err(FieldError::NameTooLong(field_validators::NAME_MAX_LEN).into());
    }
    field_validators::symbol(&transaction.symbol)?;
    transaction.amount = field_validators::normalize_amount(&transaction.amount)?;
    Ok(transaction)
}

pub async fn create(
    store: &dyn TransactionStore,
    input: Transaction,
) -> Result<Transaction, AppError> {
    let transaction = validate(input)?;
    let created = store.insert(transaction).await?;
    Ok(created)
}

pub async fn replace(
    store: &dyn TransactionStore,
    reference_number: &str,
    input: Transaction,
) -> Result<Transaction, AppError> {
    if reference_number != input.reference_number {
        return Err(AppError::Validation(format!(
            "ReferenceNumber '{}' does not match the request path '{}'",
            input.reference_number, reference_number
        )));
    }
    let transaction = validate(input)?;
    store
        .replace(transaction)
        .await?
        .ok_or_else(|| not_found(reference_number))
}

pub async fn fetch_all(store: &dyn TransactionStore) -> Result<Vec<Transaction>, AppError> {
    let transactions = store.fetch_all().await?;
    Ok(transactions)
}

pub async fn fetch_one(store: &dyn TransactionStore, reference_number: &str) -> Result<Transaction, AppError> {
    store
        .fetch_one(reference_number)
        .await?
        .ok_or_else(|| not_found(reference_number))
}

pub async fn delete(store: &dyn TransactionStore, reference_number: &str) -> Result<(), AppError> {
    match store.delete(reference_number).await? {
        0 => Err(not_found(reference_number)),
        _ => Ok(()),
    }
}
