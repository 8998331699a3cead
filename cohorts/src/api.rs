//! HTTP lookup API over the cohort registry.
//!
//! Lets non-RPC components (and operators) ask the same questions the
//! selector asks in-process.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

use crate::config::Listener;
use crate::registry::CohortRegistry;
use selector::{CohortDirectory, DirectoryError};

#[derive(Serialize)]
struct GroupResponse {
    group: Option<String>,
}

impl IntoResponse for GroupResponse {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

#[derive(Serialize)]
struct ApiErrorResponse {
    error_message: String,
}

impl ApiErrorResponse {
    fn new(status: StatusCode, message: impl Into<String>) -> (StatusCode, Json<ApiErrorResponse>) {
        (
            status,
            Json(ApiErrorResponse {
                error_message: message.into(),
            }),
        )
    }
}

#[derive(Deserialize, Debug)]
struct GroupParams {
    tenant: Option<String>,
    application: Option<String>,
}

pub async fn serve(listener: &Listener, registry: CohortRegistry) -> Result<(), std::io::Error> {
    let app = router(registry);
    let tcp = TcpListener::bind(format!("{}:{}", listener.host, listener.port)).await?;
    tracing::info!(host = %listener.host, port = listener.port, "cohort lookup API listening");
    axum::serve(tcp, app).await
}

fn router(registry: CohortRegistry) -> Router {
    Router::new()
        .route("/group", get(group_handler))
        .route("/health", get(|| async { "ok\n" }))
        .route("/ready", get(ready_handler))
        .with_state(registry)
}

async fn group_handler(
    State(registry): State<CohortRegistry>,
    Query(params): Query<GroupParams>,
) -> Result<GroupResponse, (StatusCode, Json<ApiErrorResponse>)> {
    let group = registry
        .resolve_group(
            params.tenant.as_deref(),
            params.application.as_deref().unwrap_or(""),
        )
        .map_err(|err| match err {
            DirectoryError::NotReady => {
                ApiErrorResponse::new(StatusCode::SERVICE_UNAVAILABLE, err.to_string())
            }
            DirectoryError::Lookup(_) => {
                tracing::error!(error = %err, "group lookup failed");
                ApiErrorResponse::new(StatusCode::BAD_REQUEST, err.to_string())
            }
        })?;

    Ok(GroupResponse {
        group: (!group.is_empty()).then_some(group),
    })
}

async fn ready_handler(State(registry): State<CohortRegistry>) -> StatusCode {
    if registry.is_ready() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}
