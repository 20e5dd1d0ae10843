//! HTTP transport for the metadata trees
//!
//! Every path that is not a fixed route falls through to
//! [`handle_metadata`], which picks a provider by its mount prefix (or the
//! default provider), maps the HTTP verb onto a tree method and serializes
//! the resulting value.

use crate::AppState;
use arestor_metadata::{Method, MetadataError, Request, Value, split_path};
use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{Method as HttpMethod, StatusCode, Uri, header},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Serialize;
use thiserror::Error;
use tower_http::trace::TraceLayer;
use tracing::{debug, warn};

/// Error body returned to clients
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

/// Error type for HTTP handlers
#[derive(Debug, Error)]
pub enum ApiError {
    /// Failure reported by the dispatch tree
    #[error(transparent)]
    Metadata(#[from] MetadataError),

    /// HTTP verb with no tree counterpart
    #[error("method {0} not supported")]
    UnsupportedMethod(HttpMethod),
}

impl ApiError {
    /// Get the HTTP status for the error
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Metadata(err) => match err {
                MetadataError::NotFound { .. }
                | MetadataError::UnknownResource(_)
                | MetadataError::NotAResource(_)
                | MetadataError::IndexOutOfRange { .. } => StatusCode::NOT_FOUND,
                MetadataError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
                MetadataError::InvalidIndex(_) | MetadataError::InvalidValue(_) => {
                    StatusCode::BAD_REQUEST
                }
                MetadataError::Backend(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::UnsupportedMethod(_) => StatusCode::METHOD_NOT_ALLOWED,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            warn!(error = %self, "metadata request failed");
        } else {
            debug!(error = %self, status = %status, "metadata request rejected");
        }

        let body = ErrorResponse {
            error: status.canonical_reason().unwrap_or("Error").to_string(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Build the metadata router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(|| async { "ok" }))
        .fallback(handle_metadata)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve a metadata request
pub async fn handle_metadata(
    State(state): State<AppState>,
    method: HttpMethod,
    uri: Uri,
    body: Bytes,
) -> Result<Response, ApiError> {
    let segments = split_path(uri.path());

    if segments.is_empty() && (method == HttpMethod::GET || method == HttpMethod::HEAD) {
        return Ok(value_response(root_listing(&state)?));
    }

    let Some((service, rest)) = state.route(&segments) else {
        return match segments.first() {
            None => Err(ApiError::UnsupportedMethod(method)),
            Some(segment) => Err(MetadataError::UnknownResource(segment.clone()).into()),
        };
    };

    let request = match method {
        HttpMethod::GET | HttpMethod::HEAD => Request::get(),
        HttpMethod::PUT | HttpMethod::POST => {
            let text = std::str::from_utf8(&body).map_err(|e| {
                MetadataError::InvalidValue(format!("body is not UTF-8: {}", e))
            })?;
            Request::set(text)
        }
        other => return Err(ApiError::UnsupportedMethod(other)),
    };

    let value = service.dispatch(&request, rest)?;
    if request.method == Method::Set {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }
    Ok(value_response(value))
}

/// Listing served at `/`
///
/// The default provider's root listing when it has one, else the mount
/// prefixes.
fn root_listing(state: &AppState) -> Result<Value, ApiError> {
    let Some((service, rest)) = state.route(&[]) else {
        return Ok(Value::List(state.listing()));
    };
    match service.dispatch(&Request::get(), rest) {
        Err(MetadataError::NotAResource(_)) => Ok(Value::List(state.listing())),
        other => Ok(other?),
    }
}

/// Serialize a tree value
fn value_response(value: Value) -> Response {
    let content_type = value.content_type();
    match value {
        Value::Empty => ([(header::CONTENT_TYPE, content_type)], "").into_response(),
        Value::Text(text) => ([(header::CONTENT_TYPE, content_type)], text).into_response(),
        Value::Bytes(bytes) => ([(header::CONTENT_TYPE, content_type)], bytes).into_response(),
        Value::List(items) => {
            ([(header::CONTENT_TYPE, content_type)], items.join("\n")).into_response()
        }
        Value::Json(doc) => Json(doc).into_response(),
    }
}
