// src/http.rs
//! Admin trigger and read-only index routes.
use axum::{
    extract::{Path, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde_json::json;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::config::AdminConfig;
use crate::service::{ComposeService, ServiceError};
use crate::types::{ComposeOutcome, IndexProduct, IndexStatus};

/// Bearer-token check for the manual trigger.
#[derive(Debug, Clone, Default)]
pub struct AdminAuth {
    required: bool,
    api_key: Option<String>,
}

impl AdminAuth {
    pub fn from_config(cfg: &AdminConfig) -> Self {
        Self { required: cfg.auth_required(), api_key: cfg.api_key.clone() }
    }

    pub fn bearer(api_key: impl Into<String>) -> Self {
        Self { required: true, api_key: Some(api_key.into()) }
    }

    fn check(&self, headers: &HeaderMap) -> Result<(), ApiError> {
        if !self.required {
            return Ok(());
        }
        let Some(value) = headers.get(AUTHORIZATION) else {
            return Err(ApiError(StatusCode::UNAUTHORIZED, "Unauthorized".into()));
        };
        let expected = format!("Bearer {}", self.api_key.as_deref().unwrap_or_default());
        if self.api_key.is_none() || value.as_bytes() != expected.as_bytes() {
            return Err(ApiError(StatusCode::UNAUTHORIZED, "Invalid signature".into()));
        }
        Ok(())
    }
}

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ComposeService>,
    pub auth: AdminAuth,
}

#[derive(Debug)]
pub struct ApiError(StatusCode, String);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.0, Json(json!({ "error": self.1 }))).into_response()
    }
}

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        let status = match e {
            ServiceError::AlreadyRunning => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        ApiError(status, e.to_string())
    }
}

pub fn router(state: AppState) -> Router {
    let router = Router::new()
        .route("/admin/compose-now", post(compose_now))
        .route("/indices", get(list_indices))
        .route("/indices/live", get(live_indices))
        .route("/indices/{id}", get(index_by_id));

    #[cfg(feature = "metrics")]
    let router = router.route("/metrics", get(metrics));

    router.layer(TraceLayer::new_for_http()).with_state(state)
}

pub async fn serve<F>(addr: SocketAddr, state: AppState, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("API server listening on {}", addr);
    axum::serve(listener, router(state)).with_graceful_shutdown(shutdown).await?;
    Ok(())
}

async fn compose_now(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ComposeOutcome>, ApiError> {
    state.auth.check(&headers)?;
    let outcome = state.service.compose_now(Utc::now()).await.map_err(|e| {
        tracing::error!(error = %e, "error triggering index composition");
        ApiError::from(e)
    })?;
    Ok(Json(outcome))
}

async fn list_indices(State(state): State<AppState>) -> Json<Vec<IndexProduct>> {
    Json(state.service.store().list().await)
}

async fn live_indices(State(state): State<AppState>) -> Json<Vec<IndexProduct>> {
    Json(state.service.store().list_by_status(IndexStatus::Open).await)
}

async fn index_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<IndexProduct>, ApiError> {
    state
        .service
        .store()
        .find_by_id(&id)
        .await
        .map(Json)
        .ok_or_else(|| ApiError(StatusCode::NOT_FOUND, "Index not found".into()))
}

#[cfg(feature = "metrics")]
async fn metrics() -> Result<String, ApiError> {
    crate::metrics::render()
        .map_err(|e| ApiError(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
}
