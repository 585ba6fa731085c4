use axum::http::{HeaderValue, Method};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tracing::warn;

use crate::routes::{health, invalid_transactions, transactions};
use crate::state::AppState;

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any)
}

pub fn create_app(state: AppState, allowed_origins: &[String]) -> Router {
    let max_upload_bytes = state.max_upload_bytes;
    Router::<AppState>::new()
        .nest("/health", health::router())
        .nest("/api/Transactions", transactions::router(max_upload_bytes))
        .nest("/api/InvalidTransactions", invalid_transactions::router())
        .layer(cors_layer(allowed_origins))
        .with_state(state)
}
