//! HTTP body decoding and error encoding.
//!
//! Every response body is JSON; axum's plain-text extractor rejections are
//! folded into the same `{error: "bad_request", message}` shape.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::{json, value::RawValue};

use streamgate_core::error::{ClientCode, GateError};

/// `POST /streams/:id/access`
#[derive(Debug, Deserialize)]
pub struct AccessBody {
    pub subscriber: String,
    /// Absent is treated like empty and left to the geography policy.
    #[serde(default)]
    pub geography: String,
    pub signature: String,
}

/// `POST /streams/:id/publish`
#[derive(Debug, Deserialize)]
pub struct PublishBody {
    #[serde(default)]
    pub payload: Option<Box<RawValue>>,
    pub hash: String,
}

/// Unwrap a JSON extractor result into a `GateError::BadRequest`.
pub fn decode<T>(body: std::result::Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    body.map(|Json(v)| v)
        .map_err(|e| ApiError(GateError::BadRequest(e.body_text())))
}

/// Client-facing wrapper; collaborator details never reach the body.
#[derive(Debug)]
pub struct ApiError(pub GateError);

impl From<GateError> for ApiError {
    fn from(e: GateError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.0.client_code();
        let (status, body) = match (code, self.0) {
            (ClientCode::BadRequest, e) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": code.as_str(), "message": e.to_string() }),
            ),
            (ClientCode::SubscriptionNotFound, _) => {
                (StatusCode::NOT_FOUND, json!({ "error": code.as_str() }))
            }
            (ClientCode::RulesViolation, GateError::PolicyViolation(reasons)) => (
                StatusCode::FORBIDDEN,
                json!({ "error": code.as_str(), "reasons": reasons }),
            ),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": ClientCode::Internal.as_str() }),
            ),
        };
        (status, Json(body)).into_response()
    }
}
