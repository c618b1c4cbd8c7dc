//! HTTP front end.
//!
//! Routes:
//!
//! * `GET /get_current_track_beta?ya_token=` - current track of the
//!   account's active device
//! * `GET /song/{track_id}?ya_token=` - metadata of a single track
//! * `GET /songs?track_ids=1,2,3&ya_token=` - metadata of several tracks,
//!   in request order
//!
//! Failures are answered with the status of their [`ErrorKind`] and a
//! JSON body, see [`Error`]'s `IntoResponse` implementation.
//!
//! [`ErrorKind`]: crate::error::ErrorKind

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{PathRejection, QueryRejection},
        Path, Query, State,
    },
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tokio::net::TcpListener;

use crate::{
    catalog::Catalog,
    error::{Error, Result},
    protocol::catalog::Track,
    token::Token,
    ynison::{self, TrackResult},
};

/// Shared by all requests. Holds no per-request or mutable state.
pub struct AppState {
    pub ynison: ynison::Client,
    pub catalog: Arc<dyn Catalog>,
}

#[derive(Debug, Deserialize)]
struct TokenQuery {
    ya_token: Token,
}

#[derive(Debug, Deserialize)]
struct SongsQuery {
    track_ids: String,
    ya_token: Token,
}

/// Builds the router serving all endpoints.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/get_current_track_beta", get(current_track))
        .route("/song/{track_id}", get(song))
        .route("/songs", get(songs))
        .with_state(state)
}

/// Serves `router` on `listener` until Ctrl-C is received.
///
/// # Errors
///
/// Returns error if accepting connections fails.
pub async fn serve(listener: TcpListener, router: Router) -> Result<()> {
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("failed to listen for shutdown signal: {e}");
        // Keep serving rather than shut down on a broken signal handler.
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}

fn bad_query(rejection: QueryRejection) -> Error {
    Error::invalid_argument(rejection.body_text())
}

fn bad_path(rejection: PathRejection) -> Error {
    Error::invalid_argument(rejection.body_text())
}

async fn current_track(
    State(state): State<Arc<AppState>>,
    query: std::result::Result<Query<TokenQuery>, QueryRejection>,
) -> Result<Json<TrackResult>> {
    let Query(query) = query.map_err(bad_query)?;

    let result = state
        .ynison
        .current_track(state.catalog.as_ref(), &query.ya_token)
        .await?;
    Ok(Json(result))
}

async fn song(
    State(state): State<Arc<AppState>>,
    track_id: std::result::Result<Path<u64>, PathRejection>,
    query: std::result::Result<Query<TokenQuery>, QueryRejection>,
) -> Result<Json<Track>> {
    let Path(track_id) = track_id.map_err(bad_path)?;
    let Query(query) = query.map_err(bad_query)?;

    let track = state
        .catalog
        .lookup_track(&query.ya_token, &track_id.to_string())
        .await?;
    Ok(Json(track))
}

async fn songs(
    State(state): State<Arc<AppState>>,
    query: std::result::Result<Query<SongsQuery>, QueryRejection>,
) -> Result<Json<Vec<Track>>> {
    let Query(query) = query.map_err(bad_query)?;
    let ids = parse_track_ids(&query.track_ids)?;

    let mut tracks = Vec::with_capacity(ids.len());
    for id in ids {
        tracks.push(
            state
                .catalog
                .lookup_track(&query.ya_token, &id.to_string())
                .await?,
        );
    }

    Ok(Json(tracks))
}

/// Parses a comma separated list of numeric track ids.
fn parse_track_ids(ids: &str) -> Result<Vec<u64>> {
    ids.split(',')
        .map(|id| {
            id.trim()
                .parse::<u64>()
                .map_err(|e| Error::invalid_argument(format!("invalid track id {id:?}: {e}")))
        })
        .collect()
}
