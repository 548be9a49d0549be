// Error taxonomy shared across the pipeline

use axum::http::StatusCode;

use crate::search::eutils::FetchError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Search cancelled after {completed} of {total} pairs")]
    Cancelled { completed: usize, total: usize },
}

impl AppError {
    /// HTTP status an adapter should report for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Fetch(_) => StatusCode::BAD_GATEWAY,
            AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Cancelled { .. } => StatusCode::CONFLICT,
        }
    }
}

pub type AppResult<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let err = AppError::InvalidRequest("empty term list".to_string());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let err = AppError::Fetch(FetchError::Timeout);
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);

        let err = AppError::Cancelled { completed: 1, total: 4 };
        assert_eq!(err.to_string(), "Search cancelled after 1 of 4 pairs");
    }
}
