//! `POST /api/expand`: expand a snippet for the interactive playground.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::server::AppState;

/// Filename the playground's code is expanded under.
const PLAYGROUND_FILENAME: &str = "example.ts";

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

fn error(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorBody {
            error: message.into(),
        }),
    )
        .into_response()
}

/// Expand `{"code": "..."}` and answer `{"code", "diagnostics"}`.
///
/// A body without a non-empty string `code` is a 400. Engine and formatter
/// failures are a 500 carrying the error message.
pub(crate) async fn expand_handler(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let code = serde_json::from_slice::<serde_json::Value>(&body)
        .ok()
        .and_then(|value| value.get("code")?.as_str().map(str::to_string))
        .filter(|code| !code.is_empty());

    let Some(code) = code else {
        return error(StatusCode::BAD_REQUEST, "Code is required");
    };

    let Some(expander) = state.expander.clone() else {
        return error(StatusCode::INTERNAL_SERVER_ERROR, "Macro engine is not available");
    };

    let result =
        tokio::task::spawn_blocking(move || expander.expand_formatted(&code, PLAYGROUND_FILENAME))
            .await;

    match result {
        Ok(Ok(expansion)) => Json(expansion).into_response(),
        Ok(Err(e)) => {
            tracing::warn!("Playground expansion failed: {}", e);
            error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
        Err(e) => error(StatusCode::INTERNAL_SERVER_ERROR, format!("Expansion failed: {}", e)),
    }
}
