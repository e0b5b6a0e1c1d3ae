//! HTTP API gateway for Ragline.
//!
//! Exposes the query endpoint and a health check. The query response is
//! a plain-text stream: the lead-in prefix, then answer deltas as the
//! model produces them (or a fixed notice when retrieval comes up
//! empty). Failures before the stream opens return structured JSON.
//!
//! Built on Axum.

use axum::body::{Body, Bytes};
use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{header, HeaderMap, HeaderName, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use futures::StreamExt;
use serde::Serialize;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio_stream::wrappers::ReceiverStream;
use tower_http::cors::CorsLayer;
use tracing::{error, info};
use uuid::Uuid;

use ragline_core::memory::UserId;
use ragline_core::{Error, VectorIndex};
use ragline_index::{InMemoryIndex, RemoteIndex};
use ragline_pipeline::{
    AnswerEvent, PipelineOptions, QueryPipeline, EMPTY_CONTEXT_MESSAGE, LEAD_IN,
    NO_MATCHES_MESSAGE,
};
use ragline_providers::resolver::ModelResolver;

/// Header carrying the caller's identity. Absent means anonymous.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Shared application state for the gateway.
pub struct GatewayState {
    pub pipeline: Arc<QueryPipeline>,
}

type SharedState = Arc<GatewayState>;

/// Build the Axum router with all gateway routes.
///
/// Layers applied:
/// - CORS (any origin; the service holds no cookies or sessions)
/// - Request body size limit (64 KB — queries are short)
/// - HTTP trace logging
pub fn build_router(state: SharedState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static(USER_ID_HEADER),
        ]);

    Router::new()
        .route("/health", get(health_handler))
        .route("/query", post(query_handler))
        .with_state(state)
        .layer(DefaultBodyLimit::max(64 * 1024))
        .layer(cors)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Build the full pipeline from configuration.
///
/// Shared by the server and the CLI's one-shot mode.
pub fn build_pipeline(
    config: &ragline_config::AppConfig,
) -> Result<Arc<QueryPipeline>, Box<dyn std::error::Error>> {
    let provider = ragline_providers::build_from_config(config)?;

    let index: Arc<dyn VectorIndex> = match config.index.backend.as_str() {
        "memory" => Arc::new(InMemoryIndex::new()),
        _ => {
            let host = config
                .index
                .host
                .clone()
                .ok_or("index.host must be set for the remote backend")?;
            let api_key = config
                .index
                .api_key
                .clone()
                .ok_or("index.api_key must be set for the remote backend")?;
            Arc::new(RemoteIndex::new(host, api_key)?)
        }
    };

    let resolver = Arc::new(ModelResolver::new(
        provider.clone(),
        &config.provider.chat_model,
    ));

    let options = PipelineOptions {
        chat_model: config.provider.chat_model.clone(),
        embedding_model: config.provider.embedding_model.clone(),
        answer_temperature: config.pipeline.answer_temperature,
        max_context_chars: config.pipeline.max_context_chars,
        memory_ttl: Duration::from_secs(config.memory.ttl_secs),
    };

    Ok(Arc::new(QueryPipeline::new(
        provider, index, resolver, options,
    )))
}

/// Start the gateway HTTP server.
pub async fn start(config: ragline_config::AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);
    let pipeline = build_pipeline(&config)?;
    let state = Arc::new(GatewayState { pipeline });
    let app = build_router(state);

    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
        .into_response()
}

async fn query_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
    payload: Result<Json<serde_json::Value>, JsonRejection>,
) -> Response {
    let request_id = Uuid::new_v4();

    // Malformed JSON, a missing field, and a non-string or blank query
    // all get the same rejection.
    let query = payload.ok().and_then(|Json(body)| {
        body.get("query")
            .and_then(|q| q.as_str())
            .map(str::to_string)
    });
    let Some(query) = query.filter(|q| !q.trim().is_empty()) else {
        return error_response(
            StatusCode::BAD_REQUEST,
            "Query is required and must be a non-empty string",
        );
    };

    let user = headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
        .map(UserId::from)
        .unwrap_or_else(UserId::anonymous);

    info!(request_id = %request_id, user = %user, "query received");

    let rx = match state.pipeline.answer(&query, user).await {
        Ok(rx) => rx,
        Err(Error::InvalidQuery(message)) => {
            return error_response(StatusCode::BAD_REQUEST, &message);
        }
        Err(err) => {
            error!(request_id = %request_id, error = %err, "query failed before streaming");
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to process the query",
            );
        }
    };

    let body_stream = ReceiverStream::new(rx).filter_map(|event| {
        std::future::ready(match event {
            AnswerEvent::LeadIn => Some(Ok::<Bytes, io::Error>(Bytes::from(LEAD_IN))),
            AnswerEvent::Chunk { content } => Some(Ok(Bytes::from(content))),
            AnswerEvent::NoMatches => Some(Ok(Bytes::from(NO_MATCHES_MESSAGE))),
            AnswerEvent::EmptyContext => Some(Ok(Bytes::from(EMPTY_CONTEXT_MESSAGE))),
            // Terminal bookkeeping; nothing more goes on the wire.
            AnswerEvent::Done { .. } => None,
            // Aborts the body; bytes already flushed stand.
            AnswerEvent::Error { message } => Some(Err(io::Error::other(message))),
        })
    });

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        Body::from_stream(body_stream),
    )
        .into_response()
}
