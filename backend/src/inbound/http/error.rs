//! Maps domain errors onto HTTP responses.
//!
//! Handlers return [`ApiResult`]; Actix calls [`ResponseError`] on the error
//! branch. Internal errors are logged with their real message and redacted
//! before they reach the client, keeping only the trace id. Extractor
//! failures (malformed JSON bodies, bad query strings) are converted into
//! `invalid_request` payloads so every error body has the same shape.

use actix_web::error::{JsonPayloadError, QueryPayloadError};
use actix_web::{HttpRequest, HttpResponse, ResponseError, http::StatusCode};
use serde_json::json;
use tracing::{error, warn};

use crate::domain::{Error, ErrorCode, TRACE_ID_HEADER};

/// Result alias for HTTP handlers.
pub type ApiResult<T> = Result<T, Error>;

const REDACTED_MESSAGE: &str = "Internal server error";

fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::InvalidRequest => StatusCode::BAD_REQUEST,
        ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorCode::Forbidden => StatusCode::FORBIDDEN,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Conflict => StatusCode::CONFLICT,
        ErrorCode::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Payload safe to show a client.
fn client_payload(err: &Error) -> Error {
    if err.code() != ErrorCode::InternalError {
        return err.clone();
    }
    let redacted = Error::internal(REDACTED_MESSAGE);
    match err.trace_id() {
        Some(id) => redacted.with_trace_id(id.to_owned()),
        None => redacted,
    }
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        status_for(self.code())
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            error!(
                code = self.code().as_str(),
                trace_id = self.trace_id().unwrap_or_default(),
                message = self.message(),
                "request failed"
            );
        }

        let mut response = HttpResponse::build(status);
        if let Some(id) = self.trace_id() {
            response.insert_header((TRACE_ID_HEADER, id.to_owned()));
        }
        response.json(client_payload(self))
    }
}

impl From<actix_web::Error> for Error {
    fn from(err: actix_web::Error) -> Self {
        error!(error = %err, "framework error surfaced from a handler");
        Error::internal(REDACTED_MESSAGE)
    }
}

/// `JsonConfig` error handler turning body extraction failures into
/// `invalid_request` errors.
pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    warn!(error = %err, "rejected JSON body");
    let (message, code) = match &err {
        JsonPayloadError::ContentType => ("expected an application/json body", "content_type"),
        JsonPayloadError::Deserialize(_) => ("request body does not match the schema", "invalid_body"),
        JsonPayloadError::Overflow { .. } | JsonPayloadError::OverflowKnownLength { .. } => {
            ("request body is too large", "body_too_large")
        }
        _ => ("request body could not be read", "invalid_body"),
    };
    Error::invalid_request(message)
        .with_details(json!({ "code": code, "reason": err.to_string() }))
        .into()
}

/// `QueryConfig` error handler for malformed query strings.
pub fn query_error_handler(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    warn!(error = %err, "rejected query string");
    Error::invalid_request("query string is invalid")
        .with_details(json!({ "code": "invalid_query", "reason": err.to_string() }))
        .into()
}

#[cfg(test)]
mod tests;
