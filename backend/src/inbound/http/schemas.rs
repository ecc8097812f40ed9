//! OpenAPI schemas standing in for domain error types.
//!
//! The domain error does not derive `ToSchema`; these mirrors register it
//! under the domain type's name so handlers can reference
//! `body = ErrorSchema` in their `#[utoipa::path]` attributes.

use utoipa::ToSchema;

/// Machine-readable error identifier.
#[derive(ToSchema)]
#[schema(as = crate::domain::ErrorCode)]
pub enum ErrorCodeSchema {
    /// The request failed validation.
    #[schema(rename = "invalid_request")]
    InvalidRequest,
    /// No session, or the session user no longer exists.
    #[schema(rename = "unauthorized")]
    Unauthorized,
    /// The caller lacks the role or ownership required.
    #[schema(rename = "forbidden")]
    Forbidden,
    #[schema(rename = "not_found")]
    NotFound,
    /// The request clashes with current state, e.g. a full location.
    #[schema(rename = "conflict")]
    Conflict,
    /// A backing store is unreachable.
    #[schema(rename = "service_unavailable")]
    ServiceUnavailable,
    #[schema(rename = "internal_error")]
    InternalError,
}

/// Error body returned by every failing endpoint.
#[derive(ToSchema)]
#[schema(as = crate::domain::Error)]
#[schema(rename_all = "camelCase")]
#[expect(dead_code, reason = "only read by the OpenAPI generator")]
pub struct ErrorSchema {
    #[schema(example = "conflict")]
    code: ErrorCodeSchema,
    #[schema(example = "no spaces left for the requested window")]
    message: String,
    /// Correlates the response with server logs.
    #[schema(example = "6c0f53b4-9f9e-4f50-9a3e-3b1c2d4e5f60")]
    trace_id: Option<String>,
    /// Structured context, typically `{"field", "code"}` for validation.
    details: Option<serde_json::Value>,
}
