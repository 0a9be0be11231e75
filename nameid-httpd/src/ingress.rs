//! The ingress handler: decode, transform, re-encode.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use nameid_core::{transform_batch, Entity, Plan, PlanError};
use tracing::{debug, error, info};

use crate::AppState;

/// Handle one transformation request.
///
/// Accepts `POST` on any path the plan grammar admits; the body must be a
/// JSON array of objects. Invalid paths or bodies are rejected with a bare
/// status code and no body.
pub async fn ingress(
    State(state): State<Arc<AppState>>,
    method: Method,
    uri: Uri,
    body: Bytes,
) -> Response {
    if method != Method::POST {
        return StatusCode::METHOD_NOT_ALLOWED.into_response();
    }

    let plan = match Plan::compile(uri.path()) {
        Ok(plan) => plan,
        Err(PlanError::UnknownPath) => return StatusCode::NOT_FOUND.into_response(),
        Err(err) => {
            debug!(path = %uri.path(), %err, "rejected rewrite path");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    // Strict decode: exactly one JSON array of objects, no trailing bytes.
    let entities: Vec<Entity> = match serde_json::from_slice(&body) {
        Ok(entities) => entities,
        Err(err) => {
            debug!(%err, "rejected request body");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    if let Some((old, new)) = state.batch_size.observe(entities.len()) {
        info!(old, new, "batch size setting increased");
    }

    let transformed = transform_batch(entities, &plan, &state.deriver);

    match serde_json::to_vec(&transformed) {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(err) => {
            error!(%err, "failed to serialize response");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
