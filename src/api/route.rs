use crate::{
    api::{error::ApiError, response::ApiResponse},
    state::AppState,
    validation::validate_window_days,
};
use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

// GET /api/gas endpoint query parameters
#[derive(Deserialize)]
pub struct GasQuery {
    #[serde(default)]
    address: Option<String>,
    #[serde(default)]
    days: Option<String>,
}

// Create router with all routes
pub fn create_router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/gas", get(get_gas))
        .route("/health", get(health))
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}

// GET /api/gas handler
async fn get_gas(
    State(state): State<Arc<AppState>>,
    Query(params): Query<GasQuery>,
) -> Result<Response, ApiError> {
    let identifier = params.address.unwrap_or_default();
    info!("Gas data requested for: {}", identifier);

    let days = validate_window_days(params.days.as_deref(), state.config.history_days)?;
    let address = state.resolver.resolve(&identifier).await?;
    let chains = state.aggregator.enabled_chains();

    let result = state.aggregator.aggregate(&address, &chains, days).await?;
    info!(
        "Returning {} daily entries, {} transactions, {} warnings for {}",
        result.daily.len(),
        result.totals.tx_count,
        result.warnings.len(),
        address
    );

    Ok(ApiResponse { data: result }.into_response())
}

// GET /health handler
async fn health(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let chains: Vec<&str> = state
        .aggregator
        .enabled_chains()
        .iter()
        .map(|chain| chain.id.as_str())
        .collect();

    Json(json!({ "status": "ok", "chains": chains }))
}
