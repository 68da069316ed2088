use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::error::Error;

use crate::api::ErrorBody;
use crate::error::CatalogError;

pub mod api;
pub mod authors;
pub mod books;
pub mod catalog;
pub mod config;
pub mod error;
pub mod handler;
pub mod model;
pub mod query;
pub mod store;

/// Maps a catalog error to its HTTP response: NotFound is a 404,
/// InvalidInput a 400, and only genuine store failures become a 500.
pub fn error_response(err: &CatalogError) -> Response {
    let status = match err {
        CatalogError::NotFound(_) => StatusCode::NOT_FOUND,
        CatalogError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        CatalogError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(ErrorBody { message: err.to_string() })).into_response()
}

/// Logs and converts a failed operation. Store failures are logged with
/// the full error chain; client-side rejections only at debug.
pub fn fail(op: &str, err: CatalogError) -> Response {
    match &err {
        CatalogError::Store(_) => tracing::error!("failed to {}: {}", op, unpack_error(&err)),
        _ => tracing::debug!("{} rejected: {}", op, err),
    }
    error_response(&err)
}

/// Converts a rejected JSON request body (malformed JSON, missing required
/// fields, wrong content type) into the standard error shape. Every error
/// this service produces is a `{"message": ...}` body.
pub fn rejected_payload(op: &str, rejection: JsonRejection) -> Response {
    fail(op, CatalogError::invalid(rejection.body_text()))
}

pub fn unpack_error(err: &(dyn Error)) -> String {
    let mut parts = Vec::new();
    parts.push(err.to_string());
    let mut current = err.source();
    while let Some(source) = current {
        parts.push(source.to_string());
        current = source.source();
    }
    parts.join(": ")
}
