//! Streamed pair search.
//!
//! `POST /api/search` starts the aggregation loop in the background and
//! streams its presenter callbacks as Server-Sent Events: one `pairs` event,
//! one `progress` event per completed pair, optionally `papers` for the first
//! pair, then `done` or `error`.

use std::convert::Infallible;

use axum::{
    extract::State,
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    routing::post,
    Json, Router,
};
use futures::stream::{self, Stream};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::{AppState, SearchRequest};
use crate::pipeline::{ChannelPresenter, SearchEvent};
use crate::search::parse_terms;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/search", post(start_search))
        .with_state(state)
}

async fn start_search(
    State(state): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, (StatusCode, String)> {
    let delimiter = state.config.pipeline.delimiter;
    let first = parse_terms(&request.first, delimiter);
    let second = parse_terms(&request.second, delimiter);
    if first.is_empty() || second.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "both term lists need at least one term".to_string(),
        ));
    }

    let search_id = Uuid::new_v4();
    // Anonymous searches get their own key and never supersede anyone else's.
    let client = request.client_id.unwrap_or_else(|| search_id.to_string());
    info!(%search_id, client = %client, first = ?first, second = ?second, "Search requested");

    let token = state.supervisor.begin(&client).await;
    let (tx, rx) = mpsc::unbounded_channel();
    let aggregator = state.aggregator.clone();
    let records = state.records.clone();
    let supervisor = state.supervisor.clone();
    let papers_for_first = request.papers_for_first;

    tokio::spawn(async move {
        let presenter = ChannelPresenter::new(tx).with_token(token.clone());
        match aggregator.search(&first, &second, &presenter, &token).await {
            Ok(results) => {
                info!(%search_id, pairs = results.len(), "Search finished");
                if papers_for_first && !results.is_empty() && !token.is_cancelled() {
                    if let Err(e) = records.drill_down(&first[0], &second[0], &presenter).await {
                        warn!(%search_id, error = %e, "Drill-down for first pair failed");
                        presenter.send(SearchEvent::Error {
                            message: e.to_string(),
                        });
                    }
                }
                presenter.send(SearchEvent::Done {
                    total: results.len(),
                });
            }
            Err(e) => {
                warn!(%search_id, error = %e, "Search ended early");
                presenter.send(SearchEvent::Error {
                    message: e.to_string(),
                });
            }
        }
        supervisor.finish(&client, &token).await;
    });

    let stream = stream::unfold(rx, |mut rx| async move {
        let event = rx.recv().await?;
        Some((Ok(to_sse(&event)), rx))
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

fn to_sse(event: &SearchEvent) -> Event {
    Event::default()
        .event(event.name())
        .json_data(event)
        .unwrap_or_else(|e| Event::default().event("error").data(e.to_string()))
}
