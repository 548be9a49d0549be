use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, warn};

use crate::models::{AppState, PaperSet, PapersQuery};
use crate::types::AppError;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/papers", get(get_papers))
        .with_state(state)
}

async fn get_papers(
    State(state): State<AppState>,
    Query(query): Query<PapersQuery>,
) -> Result<Json<PaperSet>, (StatusCode, String)> {
    let (first, second) = (query.first.trim(), query.second.trim());
    if first.is_empty() || second.is_empty() {
        let err = AppError::InvalidRequest("first and second are required".to_string());
        return Err((err.status_code(), err.to_string()));
    }

    info!(first = %first, second = %second, "Drill-down requested");
    state
        .records
        .papers(first, second)
        .await
        .map(Json)
        .map_err(|e| {
            warn!(error = %e, "Drill-down failed");
            let err = AppError::from(e);
            (err.status_code(), err.to_string())
        })
}
