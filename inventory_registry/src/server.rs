//! HTTP server exposing the inventory over a REST API.

use anyhow::Result;
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::{header, HeaderValue, StatusCode},
    middleware,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{net::SocketAddr, sync::Arc, time::Duration, time::Instant};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{error, info, instrument};

use crate::{
    inventory::{Inventory, InventoryError, InventoryItem, ItemPayload, QueryMode},
    metrics::{InventoryMetrics, MetricsSnapshot},
    middleware::{
        create_body_limit_layer, create_cors_layer, create_rate_limiter, rate_limit_middleware,
        request_logging_middleware, security_headers_middleware, AppRateLimiter,
    },
    settings::Settings,
};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub inventory: Arc<Inventory>,
    pub metrics: Arc<InventoryMetrics>,
    pub rate_limiter: Option<Arc<AppRateLimiter>>,
    pub settings: Settings,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(settings: Settings, inventory: Arc<Inventory>) -> Result<Self> {
        let rate_limiter = if settings.security.enable_rate_limiting {
            Some(create_rate_limiter(&settings.security)?)
        } else {
            None
        };

        Ok(Self {
            inventory,
            metrics: Arc::new(InventoryMetrics::new()),
            rate_limiter,
            settings,
            started_at: Instant::now(),
        })
    }
}

/// Error body returned for every non-2xx response produced by a handler
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

/// Handler error wrapping an inventory error
#[derive(Debug)]
pub struct ApiError(InventoryError);

impl From<InventoryError> for ApiError {
    fn from(err: InventoryError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            InventoryError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            InventoryError::NotFound(_) => StatusCode::NOT_FOUND,
            InventoryError::AlreadyExists(_) => StatusCode::CONFLICT,
            InventoryError::InternalConsistency(_) => {
                error!("Inventory consistency failure: {}", self.0);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = ErrorBody {
            error: self.0.kind().to_string(),
            message: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

fn invalid_request(message: impl ToString) -> InventoryError {
    InventoryError::InvalidInput(message.to_string())
}

/// Health check response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: String,
    version: String,
    uptime_seconds: u64,
    item_count: usize,
}

/// Query string of the listing endpoint
#[derive(Debug, Deserialize)]
struct InventoryQuery {
    name: Option<String>,
    options: Option<String>,
}

/// Create the HTTP router with all endpoints and middleware
pub fn create_router(state: AppState) -> Router {
    let security = &state.settings.security;
    let cors_layer = create_cors_layer(security);
    let body_limit_layer = create_body_limit_layer(security.max_request_size_kb);
    let timeout = Duration::from_secs(state.settings.server.request_timeout_seconds);

    let mut app = Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(get_metrics))
        .route(
            "/inventory",
            get(query_inventory).post(post_inventory).put(put_inventory),
        )
        .route("/inventory/:name", get(get_item).delete(delete_item))
        .with_state(state.clone());

    if let Some(rate_limiter) = state.rate_limiter.clone() {
        app = app.layer(middleware::from_fn_with_state(
            rate_limiter,
            rate_limit_middleware,
        ));
    }

    // Later layers wrap earlier ones, so tracing sees every request first.
    app.layer(body_limit_layer)
        .layer(cors_layer)
        .layer(TimeoutLayer::new(timeout))
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(middleware::from_fn(request_logging_middleware))
        .layer(TraceLayer::new_for_http())
}

/// Response carrying the item and a `Location` header for its key
fn located(status: StatusCode, item: InventoryItem) -> Response {
    let location = HeaderValue::from_str(&format!(
        "/inventory/{}",
        urlencoding::encode(&item.key())
    ));
    let mut response = (status, Json(item)).into_response();
    if let Ok(location) = location {
        response.headers_mut().insert(header::LOCATION, location);
    }
    response
}

/// Health check endpoint
#[instrument(skip(state))]
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
        item_count: state.inventory.len(),
    })
}

/// Operation counters
#[instrument(skip(state))]
async fn get_metrics(State(state): State<AppState>) -> Json<MetricsSnapshot> {
    Json(state.metrics.snapshot(state.inventory.len()))
}

/// List or query items, `GET /inventory?options=<mode>&name=<name>`
#[instrument(skip(state))]
async fn query_inventory(
    State(state): State<AppState>,
    params: Result<Query<InventoryQuery>, QueryRejection>,
) -> Result<Json<Vec<InventoryItem>>, ApiError> {
    let result = params
        .map_err(|rejection| invalid_request(rejection.body_text()))
        .and_then(|Query(params)| {
            let mode = params.options.as_deref().unwrap_or_default().parse::<QueryMode>()?;
            state.inventory.query(mode, params.name.as_deref())
        });

    let items = state.metrics.track("query", result)?;
    Ok(Json(items))
}

/// Fetch one item by name
#[instrument(skip(state))]
async fn get_item(
    State(state): State<AppState>,
    name: Result<Path<String>, PathRejection>,
) -> Result<Json<InventoryItem>, ApiError> {
    let result = name
        .map_err(|rejection| invalid_request(rejection.body_text()))
        .and_then(|Path(name)| state.inventory.get(&name));
    let item = state.metrics.track("get", result)?;
    Ok(Json(item))
}

/// Strict create for a single item, batch upsert for an array
#[instrument(skip(state, body))]
async fn post_inventory(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => {
            let err = invalid_request(rejection.body_text());
            state.metrics.record("create");
            state.metrics.record_error(&err);
            return Err(err.into());
        }
    };

    // Branch on the JSON shape first so field errors reach the caller intact.
    if body.is_array() {
        let result = serde_json::from_value::<Vec<ItemPayload>>(body)
            .map_err(invalid_request)
            .and_then(|payloads| {
                payloads
                    .into_iter()
                    .map(ItemPayload::validate)
                    .collect::<Result<Vec<_>, _>>()
            })
            .and_then(|items| state.inventory.upsert_many(items));
        let summary = state.metrics.track("batch_upsert", result)?;
        info!(created = summary.created, updated = summary.updated, "Applied inventory batch");
        return Ok((StatusCode::OK, Json(summary)).into_response());
    }

    let result = serde_json::from_value::<ItemPayload>(body)
        .map_err(invalid_request)
        .and_then(ItemPayload::validate)
        .and_then(|item| {
            state.inventory.create(item.clone())?;
            Ok(item)
        });
    let item = state.metrics.track("create", result)?;
    info!(name = %item.name, "Created inventory item");
    Ok(located(StatusCode::CREATED, item))
}

/// Upsert a single item
#[instrument(skip(state, body))]
async fn put_inventory(
    State(state): State<AppState>,
    body: Result<Json<ItemPayload>, JsonRejection>,
) -> Result<Response, ApiError> {
    let result = body
        .map_err(|rejection| invalid_request(rejection.body_text()))
        .and_then(|Json(payload)| {
            let item = payload.validate()?;
            let outcome = state.inventory.upsert(item.clone())?;
            Ok((item, outcome))
        });

    let (item, outcome) = state.metrics.track("upsert", result)?;
    info!(name = %item.name, ?outcome, "Upserted inventory item");
    Ok(located(StatusCode::ACCEPTED, item))
}

/// Delete an item and its activity record
#[instrument(skip(state))]
async fn delete_item(
    State(state): State<AppState>,
    name: Result<Path<String>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let result = name
        .map_err(|rejection| invalid_request(rejection.body_text()))
        .and_then(|Path(name)| state.inventory.delete(&name));
    let removed = state.metrics.track("delete", result)?;
    info!(name = %removed.name, "Deleted inventory item");
    Ok(StatusCode::NO_CONTENT)
}

/// Build the inventory configured by `settings`
pub fn build_inventory(settings: &Settings) -> Arc<Inventory> {
    if settings.inventory.seed_defaults {
        Arc::new(Inventory::seeded())
    } else {
        Arc::new(Inventory::new())
    }
}

/// Start the HTTP server and wait for shutdown signal
pub async fn serve(settings: Settings) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", settings.server.host, settings.server.port)
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid server address: {}", e))?;

    let inventory = build_inventory(&settings);
    info!(items = inventory.len(), "Inventory initialized");

    let state = AppState::new(settings, inventory)?;
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("HTTP server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_shutdown())
        .await?;

    info!("HTTP server shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn wait_for_shutdown() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C), shutting down gracefully");
        }
        _ = terminate => {
            info!("Received SIGTERM, shutting down gracefully");
        }
    }
}
