// Permit Ledger - Web Server
// Read-only REST API over the reconciled permit snapshot

use anyhow::Context;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use permit_ledger::{
    get_permit_event, load_snapshot, setup_database, sort_permit_events, AppConfig, PermitEvent,
    SortAttribute, PERMITS_TABLE_COLUMNS,
};

/// Shared application state
#[derive(Clone)]
struct AppState {
    db: Arc<Mutex<Connection>>,
    default_sort: SortAttribute,
    default_ascending: bool,
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Query string of GET /api/events
#[derive(Deserialize)]
struct EventsQuery {
    sort: Option<String>,
    ascending: Option<bool>,
}

/// Column descriptor for the permits table
#[derive(Serialize)]
struct ColumnResponse {
    key: &'static str,
    numeric: bool,
}

fn with_db<R>(
    state: &AppState,
    f: impl FnOnce(&Connection) -> anyhow::Result<R>,
) -> anyhow::Result<R> {
    let conn = state
        .db
        .lock()
        .map_err(|_| anyhow::anyhow!("database lock poisoned"))?;
    f(&conn)
}

fn internal_error(context: &str, e: anyhow::Error) -> Response {
    error!("{}: {:#}", context, e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ApiResponse::<()>::err(format!("{}: {}", context, e))),
    )
        .into_response()
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/events - Reconciled snapshot, sorted
async fn get_events(State(state): State<AppState>, Query(query): Query<EventsQuery>) -> Response {
    let attribute = match query.sort.as_deref().map(SortAttribute::from_str) {
        None => state.default_sort,
        Some(Ok(attribute)) => attribute,
        Some(Err(e)) => {
            return (StatusCode::BAD_REQUEST, Json(ApiResponse::<()>::err(e.to_string()))).into_response()
        }
    };
    let ascending = query.ascending.unwrap_or(state.default_ascending);

    match with_db(&state, load_snapshot) {
        Ok(events) => {
            let sorted: Vec<PermitEvent> = sort_permit_events(events, attribute, ascending);
            (StatusCode::OK, Json(ApiResponse::ok(sorted))).into_response()
        }
        Err(e) => internal_error("Error loading permit events", e),
    }
}

/// GET /api/events/:permit_hash - One permit's latest event
async fn get_event(State(state): State<AppState>, Path(permit_hash): Path<String>) -> Response {
    match with_db(&state, |conn| get_permit_event(conn, &permit_hash)) {
        Ok(Some(event)) => (StatusCode::OK, Json(ApiResponse::ok(event))).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::<()>::err(format!("No permit {}", permit_hash))),
        )
            .into_response(),
        Err(e) => internal_error("Error loading permit event", e),
    }
}

/// GET /api/columns - Permits table columns in display order
async fn get_columns() -> impl IntoResponse {
    let columns: Vec<ColumnResponse> = PERMITS_TABLE_COLUMNS
        .iter()
        .map(|c| ColumnResponse {
            key: c.label(),
            numeric: c.is_numeric(),
        })
        .collect();

    Json(ApiResponse::ok(columns))
}

fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/events", get(get_events))
        .route("/events/:permit_hash", get(get_event))
        .route("/columns", get(get_columns))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::from_filename(".env.local");

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config_path = std::env::args().nth(1).map(std::path::PathBuf::from);
    let config = AppConfig::load(config_path.as_deref())?;

    let conn = Connection::open(&config.database_path)
        .with_context(|| format!("Failed to open database {:?}", config.database_path))?;
    setup_database(&conn)?;
    info!("database opened: {:?}", config.database_path);

    let state = AppState {
        db: Arc::new(Mutex::new(conn)),
        default_sort: config.sort_by,
        default_ascending: config.ascending,
    };

    let listener = tokio::net::TcpListener::bind(&config.server_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.server_addr))?;
    info!("permit-server listening on http://{}", config.server_addr);

    axum::serve(listener, build_router(state))
        .await
        .context("server crashed")?;

    Ok(())
}
