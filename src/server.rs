//! HTTP server: REST endpoints plus the JSON-RPC tool endpoint.
//!
//! Provides endpoints for:
//! - Service info and health
//! - Tool catalogue
//! - Image generation as PNG bytes or a base64 JSON envelope
//! - JSON-RPC over HTTP at `/mcp`, answered as JSON or as one SSE event

use std::{convert::Infallible, net::SocketAddr, sync::Arc};

use axum::{
    body::Bytes,
    extract::Extension,
    http::{header, HeaderMap, StatusCode},
    response::{
        sse::{Event, Sse},
        IntoResponse, Json, Response,
    },
    routing::{get, post},
    Router,
};
use futures::stream;
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, warn};

use crate::{
    error::RequestError,
    mcp::{McpService, TOOL_HORIZONTAL},
    renderer::GridRenderer,
    request::{attachment_filename, input_schema, GenerateImageRequest, ImageEnvelope, MIME_PNG},
    text::{SystemPainter, TextPainter},
};

pub const SERVICE_NAME: &str = "grid-image-generator";

// ============================================================================
// Shared State
// ============================================================================

pub struct AppState<P = &'static SystemPainter> {
    pub renderer: Arc<GridRenderer<P>>,
    pub mcp: Arc<McpService<P>>,
}

impl<P: TextPainter> AppState<P> {
    pub fn new(renderer: GridRenderer<P>) -> Self {
        let renderer = Arc::new(renderer);
        Self {
            mcp: Arc::new(McpService::new(Arc::clone(&renderer))),
            renderer,
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Error reply with a FastAPI-style `{"detail": ...}` body.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    pub fn internal(detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            detail: detail.into(),
        }
    }
}

impl From<RequestError> for ApiError {
    fn from(err: RequestError) -> Self {
        let status = match &err {
            RequestError::MissingDate => StatusCode::BAD_REQUEST,
            RequestError::Invalid(_) => StatusCode::UNPROCESSABLE_ENTITY,
            RequestError::Render(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            detail: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(status = %self.status, detail = %self.detail, "Request failed");
        } else {
            warn!(status = %self.status, detail = %self.detail, "Request rejected");
        }
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}

// ============================================================================
// Router
// ============================================================================

/// Build the HTTP router.
pub fn build_router<P: TextPainter + 'static>(state: Arc<AppState<P>>) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/tools", get(tools_handler))
        .route(
            "/tools/generate_grid_availability_image",
            post(generate_handler::<P>),
        )
        .route("/generate", post(generate_handler::<P>))
        .route("/mcp", post(mcp_handler::<P>))
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Start the HTTP server and run until Ctrl-C.
pub async fn serve<P: TextPainter + 'static>(
    state: Arc<AppState<P>>,
    addr: SocketAddr,
) -> anyhow::Result<()> {
    let app = build_router(state);

    info!(%addr, "Starting grid image HTTP server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Could not listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GET / - Service info
async fn root_handler() -> Json<Value> {
    Json(json!({
        "name": "Grid Image Generator MCP Server",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "HTTP API wrapper for generating electricity grid availability images",
        "endpoints": {
            "/health": "Health check endpoint",
            "/tools": "List available tools",
            "/tools/generate_grid_availability_image": "Generate grid availability image",
            "/generate": "Generate grid availability image (short alias)",
            "/mcp": "JSON-RPC tool protocol endpoint"
        }
    }))
}

/// GET /health - Liveness check
async fn health_handler() -> Json<Value> {
    Json(json!({ "status": "healthy", "service": SERVICE_NAME }))
}

/// GET /tools - Tool catalogue
async fn tools_handler() -> Json<Value> {
    Json(json!({
        "tools": [{
            "name": TOOL_HORIZONTAL,
            "description": "Generate an image showing electricity grid availability for a given date. \
                            The image is 1024x250px (or 250x1024px with `vertical`). \
                            Input data should be a JSON object with T_Date (format: DD-MM-YYYY) and \
                            T_00 through T_23 keys with values: '●' (available), '✕' (unavailable), \
                            '%' (partial/transition), or '-' (unknown).",
            "inputSchema": input_schema(true, false)
        }]
    }))
}

/// POST /tools/generate_grid_availability_image and POST /generate
async fn generate_handler<P: TextPainter + 'static>(
    Extension(state): Extension<Arc<AppState<P>>>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let value: Value =
        serde_json::from_slice(&body).map_err(|e| RequestError::invalid(e.to_string()))?;
    let request = GenerateImageRequest::from_value(value)?;
    let record = request.record()?;
    let orientation = request.orientation();
    let filename = attachment_filename(&record.date);
    info!(
        date = %record.date,
        ?orientation,
        base64 = request.return_base64,
        "Generating grid image"
    );

    let renderer = Arc::clone(&state.renderer);
    let png = tokio::task::spawn_blocking(move || renderer.render(&record, orientation))
        .await
        .map_err(|e| ApiError::internal(format!("render task failed: {e}")))?
        .map_err(RequestError::from)?;

    if request.return_base64 {
        return Ok(Json(ImageEnvelope::new(&png, orientation)).into_response());
    }
    Ok((
        [
            (header::CONTENT_TYPE, MIME_PNG.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename={filename}"),
            ),
        ],
        png,
    )
        .into_response())
}

/// POST /mcp - JSON-RPC over HTTP
async fn mcp_handler<P: TextPainter + 'static>(
    Extension(state): Extension<Arc<AppState<P>>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let wants_sse = headers
        .get(header::ACCEPT)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|accept| accept.contains("text/event-stream"));

    let message = String::from_utf8_lossy(&body).into_owned();
    let service = Arc::clone(&state.mcp);
    let reply = match tokio::task::spawn_blocking(move || service.handle_line(&message)).await {
        Ok(reply) => reply,
        Err(e) => return ApiError::internal(format!("tool task failed: {e}")).into_response(),
    };

    match reply {
        None => StatusCode::ACCEPTED.into_response(),
        Some(reply) if wants_sse => match Event::default().event("message").json_data(&reply) {
            Ok(event) => {
                Sse::new(stream::once(async move { Ok::<_, Infallible>(event) })).into_response()
            }
            Err(e) => ApiError::internal(e.to_string()).into_response(),
        },
        Some(reply) => Json(reply).into_response(),
    }
}
