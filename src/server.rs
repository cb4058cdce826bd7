//! HTTP front door: `POST /ask-council`

use anyhow::Result;
use axum::extract::State;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tracing::info;

use crate::config::ServerConfig;
use crate::llm::{Council, CouncilResponse};

#[derive(Debug, Deserialize)]
pub struct PromptRequest {
    pub prompt: String,
}

/// Request rejected before the council was convened
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({ "error": self.message }));
        (self.status, body).into_response()
    }
}

pub fn router(council: Arc<Council>, config: &ServerConfig) -> Router {
    Router::new()
        .route("/ask-council", post(ask_council))
        .layer(cors_layer(config))
        .with_state(council)
}

/// Serve the council until the process is stopped
pub async fn serve(council: Arc<Council>, config: &ServerConfig) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(&config.bind).await?;
    info!(addr = %listener.local_addr()?, "council listening");
    axum::serve(listener, router(council, config)).await?;
    Ok(())
}

async fn ask_council(
    State(council): State<Arc<Council>>,
    Json(request): Json<PromptRequest>,
) -> Result<Json<CouncilResponse>, ApiError> {
    if request.prompt.trim().is_empty() {
        return Err(ApiError {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            message: "prompt must not be empty".to_string(),
        });
    }

    Ok(Json(council.convene(&request.prompt).await))
}

/// Any origin when none are configured, otherwise just the listed ones
fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods(AllowMethods::any())
        .allow_headers(AllowHeaders::any());

    if config.allowed_origins.is_empty() {
        layer.allow_origin(AllowOrigin::any())
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        layer.allow_origin(origins)
    }
}
