//! REST handlers for the header-carried account variant
//!
//! The caller's account comes from `X-Account-Id`; every failure is a 500
//! with `{"detail": ...}` through `IntoResponse for Error`.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::HeaderMap,
    Json,
};
use tracing::info;

use crate::error::{Error, Result};
use crate::identity::AccountId;
use crate::protocol::rest::{
    FinalizeUploadBody, PrepareRetrieveBody, PrepareUploadBody, RegisterGroupBody,
    RegisterGroupResponse, UploadStored, ACCOUNT_HEADER,
};
use crate::protocol::{PrepareRetrieveResponse, PrepareUploadResponse};
use crate::server::AppState;

/// Caller account from `X-Account-Id`; absent or non-UTF-8 means empty
fn caller(headers: &HeaderMap) -> AccountId {
    headers
        .get(ACCOUNT_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(AccountId::from)
        .unwrap_or_default()
}

fn body<T>(body: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    body.map(|Json(inner)| inner)
        .map_err(|rejection| Error::MalformedRequest(rejection.body_text()))
}

/// POST /mcp/tools/register_group
/// Acknowledgment only; the group itself is registered on-chain by the SDK.
pub(super) async fn register_group(
    headers: HeaderMap,
    req: std::result::Result<Json<RegisterGroupBody>, JsonRejection>,
) -> Result<Json<RegisterGroupResponse>> {
    let req = body(req)?;
    info!(account = %caller(&headers), group = %req.group_id, "register_group called");
    Ok(Json(RegisterGroupResponse::acknowledge(req.group_id)))
}

/// POST /mcp/tools/prepare_upload
pub(super) async fn prepare_upload(
    State(state): State<AppState>,
    headers: HeaderMap,
    req: std::result::Result<Json<PrepareUploadBody>, JsonRejection>,
) -> Result<Json<PrepareUploadResponse>> {
    let req = body(req)?;
    let resp = state.rest.prepare_upload(&caller(&headers), req).await?;
    Ok(Json(resp))
}

/// POST /mcp/tools/finalize_upload
/// POST /mcp/api/finalize-upload (alias used by newer SDK builds)
pub(super) async fn finalize_upload(
    State(state): State<AppState>,
    headers: HeaderMap,
    req: std::result::Result<Json<FinalizeUploadBody>, JsonRejection>,
) -> Result<Json<UploadStored>> {
    let req = body(req)?;
    let resp = state.rest.finalize_upload(&caller(&headers), req).await?;
    Ok(Json(resp))
}

/// POST /mcp/tools/prepare_retrieve
pub(super) async fn prepare_retrieve(
    State(state): State<AppState>,
    headers: HeaderMap,
    req: std::result::Result<Json<PrepareRetrieveBody>, JsonRejection>,
) -> Result<Json<PrepareRetrieveResponse>> {
    let req = body(req)?;
    let resp = state.rest.prepare_retrieve(&caller(&headers), req).await?;
    Ok(Json(resp))
}
