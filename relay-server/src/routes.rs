//! HTTP routes.
//!
//! | Method | Path               | Response                                  |
//! |--------|--------------------|-------------------------------------------|
//! | GET    | `/api/chat`        | completion text, or an apology on failure |
//! | GET    | `/api/chat/stream` | `text/event-stream` frames                |
//! | GET    | `/api/health`      | liveness string                           |
//! | GET    | `/api/chat/health` | same as `/api/health`                     |

use std::any::Any;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use futures::TryStreamExt;
use relay::error::ValidationError;
use relay::frame::Frame;
use relay::message::Prompt;
use serde::Deserialize;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{self, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::error::ApiError;
use crate::state::AppState;

/// Body of `GET /api/health`.
pub const HEALTH_MESSAGE: &str = "Relay service is running";

/// Query string accepted by both chat endpoints.
#[derive(Debug, Deserialize)]
pub struct ChatParams {
    prompt: Option<String>,
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/chat", get(chat))
        .route("/chat/stream", get(chat_stream))
        .route("/chat/health", get(health))
        .route("/health", get(health));

    Router::new()
        .nest("/api", api)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(cors::Any)
                .allow_methods(cors::Any)
                .allow_headers(cors::Any),
        )
        .with_state(state)
}

fn prompt_from(params: Result<Query<ChatParams>, QueryRejection>) -> Result<Prompt, ApiError> {
    let Query(params) = params.map_err(rejection_error)?;
    Ok(Prompt::try_from(params.prompt)?)
}

/// Attribute a query rejection to `prompt` when serde names it.
fn rejection_error(rejection: QueryRejection) -> ValidationError {
    let message = rejection.body_text();
    let field = if message.contains(&format!("`{}`", Prompt::FIELD)) {
        Prompt::FIELD
    } else {
        "query"
    };
    ValidationError::field(field, message)
}

/// `GET /api/chat`
///
/// Upstream failures are reported in-band with status 200.
async fn chat(
    State(state): State<AppState>,
    params: Result<Query<ChatParams>, QueryRejection>,
) -> Result<String, ApiError> {
    let prompt = prompt_from(params)?;
    info!(len = prompt.as_str().len(), "received chat request");

    match state.client.complete(&prompt).await {
        Ok(completion) => Ok(completion.into_text()),
        Err(err) => {
            error!("chat request failed: {err}");
            Ok(err.apology())
        }
    }
}

/// `GET /api/chat/stream`
async fn chat_stream(
    State(state): State<AppState>,
    params: Result<Query<ChatParams>, QueryRejection>,
) -> Result<Response, ApiError> {
    let prompt = prompt_from(params)?;
    info!(
        len = prompt.as_str().len(),
        transport = %state.transport,
        "received stream request"
    );

    let frames = state
        .transport
        .relay(Arc::clone(&state.client), prompt, state.channel_capacity);
    let body = Body::from_stream(frames.map_ok(|frame: Frame| frame.encode()));

    Ok((
        [(CONTENT_TYPE, "text/event-stream"), (CACHE_CONTROL, "no-cache")],
        body,
    )
        .into_response())
}

/// `GET /api/health`
async fn health() -> &'static str {
    HEALTH_MESSAGE
}

#[allow(clippy::needless_pass_by_value)]
fn handle_panic(payload: Box<dyn Any + Send + 'static>) -> Response {
    ApiError::internal(panic_message(payload.as_ref())).into_response()
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else {
        "unknown panic".to_owned()
    }
}
