use axum::{
    body::Bytes,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::warn;

use packlink_core::{Failure, Status};

use crate::metrics::{collect_dynamic_metrics, encode_metrics};
use crate::state::AppState;

/// Body of `/api/pack` and `/api/parse`.
#[derive(Debug, Deserialize)]
pub struct AnnounceRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "clientname")]
    pub client_name: String,
    /// Torrent file as base64 or a byte array. Only read by `/api/parse`.
    #[serde(default)]
    pub torrent: Value,
}

#[derive(Debug, Serialize)]
pub struct AnnounceResponse {
    pub message: String,
    #[serde(rename = "statusCode", skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub async fn pack(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let request = match decode_request(&body) {
        Ok(request) => request,
        Err(response) => return response,
    };

    let result = state
        .service()
        .process_pack(&request.name, &request.client_name)
        .await;
    respond(result)
}

pub async fn parse(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let request = match decode_request(&body) {
        Ok(request) => request,
        Err(response) => return response,
    };

    let result = state
        .service()
        .process_parse(&request.name, &request.client_name, &request.torrent)
        .await;
    respond(result)
}

pub async fn liveness() -> &'static str {
    "OK"
}

pub async fn readiness() -> &'static str {
    "OK"
}

pub async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    collect_dynamic_metrics(&state);
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        encode_metrics(),
    )
}

fn decode_request(body: &[u8]) -> Result<AnnounceRequest, Response> {
    serde_json::from_slice(body).map_err(|e| {
        warn!(error = %e, "Failed to decode request body");
        respond(Err(Failure::with_cause(Status::DecodingError, e)))
    })
}

/// The domain code doubles as the HTTP status.
fn respond(result: Result<Status, Failure>) -> Response {
    let (status, body) = match result {
        Ok(status) => (
            status.code(),
            AnnounceResponse {
                message: status.message().to_string(),
                status_code: None,
                error: None,
            },
        ),
        Err(failure) => (
            failure.code(),
            AnnounceResponse {
                message: failure.status.message().to_string(),
                status_code: Some(failure.code()),
                error: Some(failure.message),
            },
        ),
    };

    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(body)).into_response()
}
