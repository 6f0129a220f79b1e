pub mod health;
pub mod todos;

use axum::body::Bytes;
use axum::extract::Path;
use axum::extract::rejection::{BytesRejection, PathRejection};
use axum::http::{HeaderName, HeaderValue, header};
use axum::routing::{get, patch};
use axum::Router;
use serde_json::Value;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::error::{AppError, ValidationError};
use crate::state::AppState;
use crate::validation::validate_id;

pub fn router(state: AppState) -> Router {
    let middleware = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(security_header(header::X_CONTENT_TYPE_OPTIONS, "nosniff"))
        .layer(security_header(header::X_FRAME_OPTIONS, "DENY"))
        .layer(security_header(header::REFERRER_POLICY, "no-referrer"))
        .layer(security_header(header::X_DNS_PREFETCH_CONTROL, "off"))
        .layer(security_header(
            HeaderName::from_static("cross-origin-opener-policy"),
            "same-origin",
        ));

    Router::new()
        .route("/healthz", get(health::healthz))
        .route("/readyz", get(health::readyz))
        .route("/todos", get(todos::list_todos).post(todos::create_todo))
        .route("/todos/{id}", patch(todos::update_todo).delete(todos::delete_todo))
        .fallback(route_not_found)
        .method_not_allowed_fallback(route_not_found)
        .layer(middleware)
        .with_state(state)
}

fn security_header(name: HeaderName, value: &'static str) -> SetResponseHeaderLayer<HeaderValue> {
    SetResponseHeaderLayer::if_not_present(name, HeaderValue::from_static(value))
}

async fn route_not_found() -> AppError {
    AppError::RouteNotFound
}

/// Parses a request body into JSON. An empty body reads as `{}`; a body
/// that could not be buffered (too large, aborted) keeps its status.
pub(crate) fn parse_body(body: Result<Bytes, BytesRejection>) -> Result<Value, AppError> {
    let body = body?;
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(Default::default()));
    }
    serde_json::from_slice(&body).map_err(|_| AppError::InvalidJson)
}

/// Any id segment the router cannot decode (e.g. invalid UTF-8) is a bad id.
pub(crate) fn path_id(id: Result<Path<String>, PathRejection>) -> Result<i64, AppError> {
    let Path(raw) = id.map_err(|_| ValidationError::InvalidId)?;
    Ok(validate_id(&raw)?)
}
