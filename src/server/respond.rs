use crate::errors::AnalysisError;
use crate::state::{AppState, PerfCounters};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};

const INTERNAL_MESSAGE: &str = "Internal server error";
const FETCH_FAILED: &str = "Failed to fetch data";

/// Errors surfaced to HTTP callers. Only `BadRequest` messages reach the
/// client; internal detail is logged and replaced.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("bad_request: {0}")]
    BadRequest(String),

    #[error("internal_error: {0}")]
    Internal(String),
}

impl From<AnalysisError> for ApiError {
    fn from(e: AnalysisError) -> Self {
        match e {
            AnalysisError::InvalidInput(msg) => Self::BadRequest(msg),
            AnalysisError::InsufficientData(msg) => {
                Self::BadRequest(format!("Insufficient data: {msg}"))
            }
            AnalysisError::UpstreamData(symbol) => {
                Self::BadRequest(format!("No data available for {symbol}"))
            }
            AnalysisError::Network(_) | AnalysisError::Parse(_) => {
                tracing::warn!(error = %e, "price fetch failed");
                Self::BadRequest(FETCH_FAILED.to_string())
            }
            AnalysisError::Numeric(_) | AnalysisError::Config(_) => Self::Internal(e.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::Internal(detail) => {
                tracing::error!(%detail, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MESSAGE.to_string())
            }
        };
        (status, Json(json!({ "success": false, "error": message }))).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Convert a result to JSON. Non-finite floats become `null` here, once,
/// for every payload.
pub fn to_data<T: serde::Serialize>(value: &T) -> ApiResult<Value> {
    serde_json::to_value(value).map_err(|e| ApiError::Internal(format!("serialize: {e}")))
}

/// Wrap a handler outcome in the response envelope and count it.
pub fn finish(state: &AppState, result: ApiResult<Value>) -> Response {
    let counters = &state.counters;
    match result {
        Ok(data) => {
            PerfCounters::bump(&counters.analyses_completed);
            (StatusCode::OK, Json(json!({ "success": true, "data": data }))).into_response()
        }
        Err(e) => {
            match &e {
                ApiError::BadRequest(_) => PerfCounters::bump(&counters.client_errors),
                ApiError::Internal(_) => PerfCounters::bump(&counters.server_errors),
            }
            e.into_response()
        }
    }
}
