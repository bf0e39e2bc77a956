//! Stream endpoints.
//!
//! - `POST /streams/:id/access`  : entitlement check + access record
//! - `POST /streams/:id/publish` : hash verification for a data payload

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde_json::{json, Value};
use tracing::Instrument;

use streamgate_core::error::GateError;
use streamgate_core::rules::StreamId;

use crate::app_state::AppState;
use crate::services::{AccessOutcome, AccessRequest};
use crate::transport::codec::{decode, AccessBody, ApiError, PublishBody};

pub async fn access(
    State(app): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<AccessBody>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let stream_id: StreamId = id.parse()?;
    let body = decode(body)?;

    let span = tracing::info_span!("access", %stream_id);
    let req = AccessRequest {
        stream_id,
        subscriber: body.subscriber,
        geography: body.geography,
        signature: body.signature,
    };

    match app.access().handle(req).instrument(span).await? {
        AccessOutcome::Granted { expires_at, usage } => Ok(Json(json!({
            "status": "granted",
            "expiresAt": expires_at,
            "usage": usage,
        }))),
        AccessOutcome::NotFound => Err(GateError::NotFound.into()),
        AccessOutcome::Denied { reasons } => Err(GateError::PolicyViolation(reasons).into()),
    }
}

pub async fn publish(
    State(app): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<PublishBody>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let stream_id: StreamId = id.parse()?;
    let body = decode(body)?;

    let stored = app
        .publish()
        .publish(stream_id, body.payload.as_deref(), &body.hash)
        .await?;

    Ok(Json(json!({ "status": "stored", "streamId": stored.0 })))
}
