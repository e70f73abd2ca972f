//! fleettop_agent: serves the dashboard API for this one host.

mod gpu;
mod sampler;
mod state;
mod types;

use std::collections::HashMap;
use std::net::SocketAddr;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::sampler::collect_summary;
use crate::state::AppState;
use crate::types::SummaryResponse;

const DEFAULT_PORT: u16 = 3232;

fn arg_value(name: &str) -> Option<String> {
    let mut it = std::env::args().skip(1);
    while let Some(a) = it.next() {
        if a == name {
            return it.next();
        }
        if let Some(v) = a.strip_prefix(name).and_then(|r| r.strip_prefix('=')) {
            return Some(v.to_string());
        }
    }
    None
}

fn usage() -> String {
    format!("Usage: fleettop_agent [--port PORT|-p PORT] (default {DEFAULT_PORT})")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if std::env::args().any(|a| a == "-h" || a == "--help") {
        println!("{}", usage());
        return Ok(());
    }

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let port = match arg_value("--port").or_else(|| arg_value("-p")) {
        Some(v) => v
            .parse::<u16>()
            .map_err(|_| anyhow::anyhow!("invalid port: {v}. {}", usage()))?,
        None => DEFAULT_PORT,
    };

    let state = AppState::new();
    info!(machine = %state.machine_name, alias = %state.machine_alias, "sampling this host");

    let app = router(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("fleettop_agent listening on http://{addr}");
    axum::serve(listener, app).await?;
    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/get_summary", get(summary_handler))
        .route("/api/get_event_data", get(empty_history_handler))
        .route("/api/get_availability_data", get(empty_history_handler))
        .route("/api/get_historical_data", get(empty_history_handler))
        .with_state(state)
}

async fn summary_handler(State(state): State<AppState>) -> Json<SummaryResponse> {
    let summary = collect_summary(&state).await;
    debug!(cpu = summary.cpu_usage, procs = summary.top_processes.len(), "summary");
    Json(SummaryResponse {
        servers: vec![summary],
    })
}

// The agent keeps no history; every machine has an empty record.
async fn empty_history_handler(Query(q): Query<HashMap<String, String>>) -> impl IntoResponse {
    match q.get("server_name").filter(|s| !s.is_empty()) {
        Some(_) => (StatusCode::OK, Json(Value::Array(Vec::new()))),
        None => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "server_name is required" })),
        ),
    }
}
