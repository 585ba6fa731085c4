use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use tracing::{error, info};

use crate::errors::AppError;
use crate::models::InvalidRecord;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list_invalid_transactions))
}

pub async fn list_invalid_transactions(
    State(state): State<AppState>,
) -> Result<Json<Vec<InvalidRecord>>, AppError> {
    info!("GET /InvalidTransactions - Listing rejected upload lines");
    let records = state.invalid_records.list().await.map_err(|e| {
        error!("Failed to list invalid transactions: {}", e);
        AppError::from(e)
    })?;
    Ok(Json(records))
}
