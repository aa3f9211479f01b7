use crate::error::FuelError;
use crate::source::TableSource;
use crate::store::SiteStore;
use crate::types::{DataOrigin, FuelSite, FuelStats};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use log::{error, info};
use serde::Serialize;
use std::sync::Arc;
use tokio::net::TcpListener;

const ENDPOINTS: &[&str] = &[
    "/api/ping",
    "/api/fuel/sites",
    "/api/fuel/stats",
    "/api/fuel/refresh",
    "/data.json",
];

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<SiteStore>,
    pub source: Arc<dyn TableSource>,
}

#[derive(Serialize)]
struct IndexResponse {
    message: &'static str,
    endpoints: &'static [&'static str],
    status: &'static str,
}

#[derive(Serialize)]
struct PingResponse {
    message: &'static str,
    status: &'static str,
    timestamp: DateTime<Utc>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SitesResponse<'a> {
    success: bool,
    data: &'a [FuelSite],
    count: usize,
    origin: DataOrigin,
    last_updated: DateTime<Utc>,
}

#[derive(Serialize)]
struct StatsResponse {
    success: bool,
    stats: FuelStats,
}

#[derive(Serialize)]
struct RefreshResponse {
    success: bool,
    count: usize,
    dropped: usize,
    origin: DataOrigin,
    stats: FuelStats,
    message: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    error: String,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/api/ping", get(ping_handler))
        .route("/api/fuel/sites", get(sites_handler))
        .route("/api/fuel/stats", get(stats_handler))
        .route("/api/fuel/refresh", get(refresh_handler).post(refresh_handler))
        .route("/data.json", get(data_json_handler))
        .with_state(state)
}

pub async fn run(bind_addr: &str, state: AppState) -> Result<(), FuelError> {
    let listener = TcpListener::bind(bind_addr).await?;
    info!("fuel_plan listening on http://{}", listener.local_addr()?);
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}

async fn index_handler() -> Json<IndexResponse> {
    Json(IndexResponse {
        message: "COW Fuel Dashboard API",
        endpoints: ENDPOINTS,
        status: "running",
    })
}

async fn ping_handler() -> Json<PingResponse> {
    Json(PingResponse {
        message: "COW Fuel Dashboard Server is running!",
        status: "healthy",
        timestamp: Utc::now(),
    })
}

async fn sites_handler(State(state): State<AppState>) -> Response {
    let snap = state.store.snapshot();
    Json(SitesResponse {
        success: true,
        data: &snap.sites,
        count: snap.sites.len(),
        origin: snap.origin,
        last_updated: snap.loaded_at,
    })
    .into_response()
}

async fn data_json_handler(State(state): State<AppState>) -> Response {
    let snap = state.store.snapshot();
    Json(&snap.sites).into_response()
}

async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse {
        success: true,
        stats: state.store.stats(),
    })
}

async fn refresh_handler(State(state): State<AppState>) -> Response {
    let store = Arc::clone(&state.store);
    let source = Arc::clone(&state.source);
    // Blocking HTTP client and std locks: keep them off the async workers.
    let result = tokio::task::spawn_blocking(move || store.refresh(source.as_ref())).await;
    match result {
        Ok(Ok(outcome)) => {
            info!(
                "Refresh wrote {} and {}",
                outcome.reports.today.display(),
                outcome.reports.pending.display()
            );
            Json(RefreshResponse {
                success: true,
                count: outcome.count,
                dropped: outcome.normalize.dropped_rows,
                origin: outcome.origin,
                message: format!("Loaded {} fuel sites", outcome.count),
                stats: outcome.stats,
            })
            .into_response()
        }
        Ok(Err(e)) => {
            error!("Refresh failed: {}", e);
            failure(e.to_string())
        }
        Err(e) => {
            error!("Refresh task aborted: {}", e);
            failure(format!("refresh task aborted: {}", e))
        }
    }
}

fn failure(message: String) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            success: false,
            error: message,
        }),
    )
        .into_response()
}
