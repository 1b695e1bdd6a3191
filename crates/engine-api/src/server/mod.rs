//! The HTTP frontage: JSON routes over the per-game engines, permissive CORS,
//! and per-game serialization through the registry's mutexes.

use std::collections::BTreeMap;
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Path, Query, Request, State};
use axum::http::header::{HeaderName, HeaderValue};
use axum::http::{Method, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use contracts::{ApiError, ErrorCode, GameConfig, Phase, PlayerAction, PlayerView, Role};
use engine_core::AdvisorSuite;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::Mutex;

use crate::scheduler::{epoch_ms, spawn_tick_loop};
use crate::{EngineApi, SqliteGameStore};

const SERVICE_NAME: &str = "statecraft";
const DEFAULT_SQLITE_PATH: &str = "statecraft_games.sqlite";

include!("error.rs");
include!("state.rs");
include!("util.rs");
include!("routes/games.rs");

pub async fn serve(addr: SocketAddr, options: ServerOptions) -> Result<(), ServerError> {
    let state = AppState::new(options);
    state.restore_persisted_games().await;
    let app = router(state);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/server/create", post(create_server))
        .route("/server/{id}/join", post(join_server))
        .route("/server/{id}/view", get(view_server))
        .route("/server/{id}/action", post(submit_action))
        .route("/server/{id}/status", get(server_status))
        .layer(middleware::from_fn(cors_middleware))
        .with_state(state)
}

async fn cors_middleware(request: Request, next: Next) -> Response {
    if request.method() == Method::OPTIONS {
        let mut response = Response::new(axum::body::Body::empty());
        *response.status_mut() = StatusCode::NO_CONTENT;
        apply_cors_headers(response.headers_mut());
        return response;
    }

    let mut response = next.run(request).await;
    apply_cors_headers(response.headers_mut());
    response
}

#[cfg(test)]
mod tests;
