//! Panic recovery: a panic anywhere below this layer becomes a 500 response
//! for that request only.

use std::any::Any;
use std::backtrace::Backtrace;

use axum::response::{IntoResponse, Response};

use crate::error::ApiError;

/// Response factory for `tower_http::catch_panic::CatchPanicLayer`.
#[allow(clippy::needless_pass_by_value)]
pub fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_owned()
    };

    tracing::error!(
        panic = %message,
        backtrace = %Backtrace::capture(),
        "request handler panicked"
    );

    ApiError::Internal("request handler panicked".into()).into_response()
}
