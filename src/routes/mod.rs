//! API Routes
//!
//! This module organizes all HTTP endpoints for the application:
//! - `/api/search` - Streamed pair counts (Server-Sent Events)
//! - `/api/papers` - Drill-down into one pair's paper records
//! - `/api/health` - Health checks

pub mod health;
pub mod papers;
pub mod search;

use axum::Router;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::middleware::apply_cors;
use crate::models::AppState;

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    info!("Creating application router");

    let origins = state.config.server.cors_allowed_origins.clone();
    let router = Router::new()
        .merge(search::router(state.clone()))
        .merge(papers::router(state))
        .merge(health::router())
        .layer(TraceLayer::new_for_http());

    apply_cors(router, &origins)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, EutilsConfig, LoggingConfig, PipelineConfig, ServerConfig};
    use crate::search::testing::MockIndex;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use std::sync::Arc;
    use tower::ServiceExt;

    const DUMP: &str = "1. Blood. 2003;101:1.\n\nImatinib in CML.\n\nDruker B.\n\nOHSU.\n\nAbstract.\n\nPMID: 111";

    fn test_config() -> Config {
        config_with_delay(0)
    }

    fn config_with_delay(pair_delay_ms: u64) -> Config {
        Config {
            server: ServerConfig {
                port: 0,
                host: "127.0.0.1".to_string(),
                cors_allowed_origins: vec!["*".to_string()],
            },
            eutils: EutilsConfig::default(),
            pipeline: PipelineConfig {
                pair_delay_ms,
                ..PipelineConfig::default()
            },
            logging: LoggingConfig { log_dir: None },
        }
    }

    fn app(index: MockIndex) -> Router {
        create_router(AppState::with_index(test_config(), Arc::new(index)))
    }

    async fn body_string(response: axum::response::Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = app(MockIndex::new())
            .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_string(response).await.contains("\"status\":\"ok\""));
    }

    #[tokio::test]
    async fn test_search_streams_progress_then_done() {
        let index = MockIndex::new().with_count("a x", 4).with_count("b x", 9);
        let request = Request::post("/api/search")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"first":"a, b","second":"x"}"#))
            .unwrap();

        let response = app(index).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_string(response).await;
        let events: Vec<&str> = body
            .lines()
            .filter_map(|l| l.strip_prefix("event: "))
            .collect();
        assert_eq!(events, vec!["pairs", "progress", "progress", "done"]);
        assert!(body.contains("\"pair\":\"b x\""));
        assert!(body.contains("\"count\":9"));
    }

    fn search_request(body: &'static str) -> Request<Body> {
        Request::post("/api/search")
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    fn event_names(body: &str) -> Vec<&str> {
        body.lines().filter_map(|l| l.strip_prefix("event: ")).collect()
    }

    #[tokio::test]
    async fn test_anonymous_searches_do_not_cancel_each_other() {
        let index = MockIndex::new().with_count("a x", 1).with_count("a y", 2);
        let state = AppState::with_index(config_with_delay(50), Arc::new(index));
        let app = create_router(state.clone());

        let (one, two) = tokio::join!(
            async {
                let response = app.clone().oneshot(search_request(r#"{"first":"a","second":"x, y"}"#)).await.unwrap();
                body_string(response).await
            },
            async {
                let response = app.clone().oneshot(search_request(r#"{"first":"a","second":"x, y"}"#)).await.unwrap();
                body_string(response).await
            }
        );

        assert_eq!(event_names(&one), vec!["pairs", "progress", "progress", "done"]);
        assert_eq!(event_names(&two), vec!["pairs", "progress", "progress", "done"]);
        assert_eq!(state.supervisor.active_count().await, 0);
    }

    #[tokio::test]
    async fn test_search_can_load_first_pair_papers() {
        let index = MockIndex::new()
            .with_count("imatinib ABL1", 1)
            .with_count("imatinib BCR", 1)
            .with_abstracts(&["111"], DUMP);
        let state = AppState::with_index(test_config(), Arc::new(index));

        let response = create_router(state.clone())
            .oneshot(search_request(
                r#"{"first":"imatinib","second":"ABL1, BCR","client_id":"tab-1","papers_for_first":true}"#,
            ))
            .await
            .unwrap();
        let body = body_string(response).await;

        assert_eq!(event_names(&body), vec!["pairs", "progress", "progress", "papers", "done"]);
        assert!(body.contains("\"label\":\"imatinib ABL1\""));
        assert!(body.contains("\"pmid\":\"111\""));
        assert_eq!(state.supervisor.active_count().await, 0);
    }

    #[tokio::test]
    async fn test_search_rejects_empty_lists() {
        let request = Request::post("/api/search")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"first":" , ","second":"x"}"#))
            .unwrap();

        let response = app(MockIndex::new()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_papers_returns_records() {
        let index = MockIndex::new().with_abstracts(&["111"], DUMP);
        let response = app(index)
            .oneshot(
                Request::get("/api/papers?first=imatinib&second=ABL1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(json["label"], "imatinib ABL1");
        assert_eq!(json["records"][0]["pmid"], "111");
        assert_eq!(json["records"][0]["year"], "2003-01-01");
    }

    #[tokio::test]
    async fn test_papers_upstream_failure_is_bad_gateway() {
        let index = MockIndex::new().with_efetch_failure(&["1"], crate::search::FetchError::Timeout);
        let response = app(index)
            .oneshot(
                Request::get("/api/papers?first=a&second=b")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
