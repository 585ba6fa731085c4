use axum::body::Bytes;
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use http::StatusCode;
use serde::Serialize;
use tracing::{error, info};

use crate::errors::AppError;
use crate::models::Transaction;
use crate::services::{csv_upload, transaction_service};
use crate::services::csv_upload::UploadOutcome;
use crate::state::AppState;

// Room for multipart boundaries and part headers on top of the file itself.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/", get(fetch_transactions).post(create_transaction))
        .route(
            "/UploadCsv",
            post(upload_csv).layer(DefaultBodyLimit::max(
                max_upload_bytes.saturating_add(MULTIPART_OVERHEAD_BYTES),
            )),
        )
        .route(
            "/:reference_number",
            get(get_transaction).put(replace_transaction).delete(delete_transaction),
        )
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadAccepted {
    pub message: String,
    pub records_inserted: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRejected {
    pub message: String,
    pub errors: Vec<String>,
}

pub async fn fetch_transactions(
    State(state): State<AppState>,
) -> Result<Json<Vec<Transaction>>, AppError> {
    info!("GET /Transactions - Fetching all transactions");
    let transactions = transaction_service::fetch_all(state.transactions.as_ref())
        .await
        .map_err(|e| {
            error!("Failed to fetch transactions: {}", e);
            e
        })?;
    Ok(Json(transactions))
}

pub async fn get_transaction(
    State(state): State<AppState>,
    Path(reference_number): Path<String>,
) -> Result<Json<Transaction>, AppError> {
    info!("GET /Transactions/{} - Fetching transaction", reference_number);
    let transaction = transaction_service::fetch_one(state.transactions.as_ref(), &reference_number)
        .await
        .map_err(|e| {
            error!("Failed to fetch transaction {}: {}", reference_number, e);
            e
        })?;
    Ok(Json(transaction))
}

pub async fn create_transaction(
    State(state): State<AppState>,
    Json(input): Json<Transaction>,
) -> Result<(StatusCode, Json<Transaction>), AppError> {
    info!("POST /Transactions - Creating transaction {}", input.reference_number);
    let created = transaction_service::create(state.transactions.as_ref(), input)
        .await
        .map_err(|e| {
            error!("Failed to create transaction: {}", e);
            e
        })?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn replace_transaction(
    State(state): State<AppState>,
    Path(reference_number): Path<String>,
    Json(input): Json<Transaction>,
) -> Result<StatusCode, AppError> {
    info!("PUT /Transactions/{} - Replacing transaction", reference_number);
    transaction_service::replace(state.transactions.as_ref(), &reference_number, input)
        .await
        .map_err(|e| {
            error!("Failed to replace transaction {}: {}", reference_number, e);
            e
        })?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_transaction(
    State(state): State<AppState>,
    Path(reference_number): Path<String>,
) -> Result<StatusCode, AppError> {
    info!("DELETE /Transactions/{} - Deleting transaction", reference_number);
    transaction_service::delete(state.transactions.as_ref(), &reference_number)
        .await
        .map_err(|e| {
            error!("Failed to delete transaction {}: {}", reference_number, e);
            e
        })?;
    Ok(StatusCode::NO_CONTENT)
}

fn multipart_error(e: MultipartError, max_upload_bytes: usize) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::Validation(csv_upload::oversize_message(max_upload_bytes))
    } else {
        AppError::Validation(e.body_text())
    }
}

async fn read_file_part(
    multipart: &mut Multipart,
    max_upload_bytes: usize,
) -> Result<Option<Bytes>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, max_upload_bytes))?
    {
        if field.name() == Some("file") {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| multipart_error(e, max_upload_bytes))?;
            return Ok(Some(bytes));
        }
    }
    Ok(None)
}

pub async fn upload_csv(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, AppError> {
    info!("POST /Transactions/UploadCsv - Uploading CSV file");

    let file = match multipart {
        Ok(mut multipart) => read_file_part(&mut multipart, state.max_upload_bytes).await?,
        Err(rejection) => {
            error!("Upload is not a multipart form: {}", rejection);
            None
        }
    };
    let content = csv_upload::decode_upload(file.as_deref(), state.max_upload_bytes)?;

    let outcome = csv_upload::ingest(
        state.transactions.as_ref(),
        state.invalid_records.as_ref(),
        &content,
    )
    .await
    .map_err(|e| {
        error!("Failed to store upload: {}", e);
        e
    })?;

    let response = match outcome {
        UploadOutcome::Committed { records_inserted } => (
            StatusCode::OK,
            Json(UploadAccepted {
                message: csv_upload::ACCEPTED_MESSAGE.to_string(),
                records_inserted,
            }),
        )
            .into_response(),
        rejected @ UploadOutcome::Rejected { .. } => (
            StatusCode::BAD_REQUEST,
            Json(UploadRejected {
                message: csv_upload::REJECTED_MESSAGE.to_string(),
                errors: rejected.error_lines(),
            }),
        )
            .into_response(),
    };
    Ok(response)
}
