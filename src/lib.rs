// PubMed Pairs - pairwise literature co-occurrence counts with paper drill-down

pub mod config;
pub mod middleware;
pub mod models;
pub mod pipeline;
pub mod routes;
pub mod search;
pub mod types;
pub mod utils;

// Re-exports for convenience
pub use config::Config;
pub use models::AppState;
pub use types::{AppError, AppResult};

pub fn create_router(state: AppState) -> axum::Router {
    routes::create_router(state)
}
