//! JSON-RPC 2.0 transport for the tool-invocation variant
//!
//! Supports `initialize`, `ping`, `tools/list` and `tools/call`. Tool
//! failures are reported inside the result (`isError: true`) so the SDK
//! sees the original message; protocol mistakes are JSON-RPC errors.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::error::Result;
use crate::identity::AccountId;
use crate::protocol::tool::{self, FINALIZE_UPLOAD, PREPARE_RETRIEVE, PREPARE_UPLOAD};
use crate::server::{AppState, SERVICE_NAME};

/// Protocol revision announced on `initialize`
const PROTOCOL_VERSION: &str = "2025-06-18";

const PARSE_ERROR: i64 = -32700;
const METHOD_NOT_FOUND: i64 = -32601;
const INVALID_PARAMS: i64 = -32602;

#[derive(Debug, Deserialize)]
pub(super) struct RpcRequest {
    /// `None` only when the member is absent; `"id": null` is `Some(Null)`
    #[serde(default, deserialize_with = "present")]
    id: Option<Value>,
    method: String,
    #[serde(default)]
    params: Value,
}

fn present<'de, D>(deserializer: D) -> std::result::Result<Option<Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

#[derive(Debug, Default, Deserialize)]
struct CallParams {
    name: String,
    #[serde(default)]
    arguments: Value,
}

#[derive(Debug, Serialize)]
struct RpcError {
    code: i64,
    message: String,
}

impl RpcError {
    fn new(code: i64, message: impl Into<String>) -> Self {
        RpcError {
            code,
            message: message.into(),
        }
    }
}

fn reply(id: Value, outcome: std::result::Result<Value, RpcError>) -> Response {
    let body = match outcome {
        Ok(result) => json!({ "jsonrpc": "2.0", "id": id, "result": result }),
        Err(error) => json!({ "jsonrpc": "2.0", "id": id, "error": error }),
    };
    Json(body).into_response()
}

/// POST /mcp
pub(super) async fn handle(
    State(state): State<AppState>,
    req: std::result::Result<Json<RpcRequest>, JsonRejection>,
) -> Response {
    let req = match req {
        Ok(Json(req)) => req,
        Err(rejection) => {
            warn!("Rejected JSON-RPC body: {}", rejection.body_text());
            return reply(Value::Null, Err(RpcError::new(PARSE_ERROR, rejection.body_text())));
        }
    };

    // Notifications carry no id and get no reply body
    let Some(id) = req.id else {
        debug!("JSON-RPC notification: {}", req.method);
        return StatusCode::ACCEPTED.into_response();
    };

    let outcome = match req.method.as_str() {
        "initialize" => Ok(json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": { "tools": {} },
            "serverInfo": { "name": SERVICE_NAME, "version": env!("CARGO_PKG_VERSION") },
        })),
        "ping" => Ok(json!({})),
        "tools/list" => Ok(json!({ "tools": tool::catalog() })),
        "tools/call" => call_tool(&state, req.params).await,
        other => Err(RpcError::new(
            METHOD_NOT_FOUND,
            format!("Method not found: {}", other),
        )),
    };

    reply(id, outcome)
}

fn arguments<T: DeserializeOwned>(name: &str, arguments: Value) -> std::result::Result<T, RpcError> {
    serde_json::from_value(arguments).map_err(|e| {
        RpcError::new(INVALID_PARAMS, format!("Invalid arguments for {}: {}", name, e))
    })
}

async fn call_tool(state: &AppState, params: Value) -> std::result::Result<Value, RpcError> {
    let params: CallParams = serde_json::from_value(params)
        .map_err(|e| RpcError::new(INVALID_PARAMS, format!("Invalid tool call: {}", e)))?;

    // The tool variant carries the account in its arguments
    let caller = AccountId::default();
    let adapter = &state.tool;

    let outcome: Result<Value> = match params.name.as_str() {
        PREPARE_UPLOAD => {
            let args = arguments(PREPARE_UPLOAD, params.arguments)?;
            adapter
                .prepare_upload(&caller, args)
                .await
                .and_then(|r| Ok(serde_json::to_value(r)?))
        }
        FINALIZE_UPLOAD => {
            let args = arguments(FINALIZE_UPLOAD, params.arguments)?;
            adapter
                .finalize_upload(&caller, args)
                .await
                .and_then(|r| Ok(serde_json::to_value(r)?))
        }
        PREPARE_RETRIEVE => {
            let args = arguments(PREPARE_RETRIEVE, params.arguments)?;
            adapter
                .prepare_retrieve(&caller, args)
                .await
                .and_then(|r| Ok(serde_json::to_value(r)?))
        }
        other => {
            return Err(RpcError::new(
                INVALID_PARAMS,
                format!("Unknown tool: {}", other),
            ))
        }
    };

    Ok(match outcome {
        Ok(value) => json!({
            "content": [{ "type": "text", "text": value.to_string() }],
            "structuredContent": value,
            "isError": false,
        }),
        Err(e) => json!({
            "content": [{ "type": "text", "text": e.to_string() }],
            "isError": true,
        }),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::build_router;
    use crate::testing::{FakeBroker, MemoryStore};
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use std::sync::Arc;
    use tower::ServiceExt;

    async fn rpc(body: Value) -> (StatusCode, Value) {
        let app = build_router(AppState::new(
            Arc::new(FakeBroker::default()),
            Arc::new(MemoryStore::default()),
        ));
        let request = Request::builder()
            .method("POST")
            .uri("/mcp")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    #[tokio::test]
    async fn test_tools_list() {
        let (status, body) = rpc(json!({ "jsonrpc": "2.0", "id": 1, "method": "tools/list" })).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["result"]["tools"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_prepare_upload_tool() {
        let (_, body) = rpc(json!({
            "jsonrpc": "2.0",
            "id": 2,
            "method": "tools/call",
            "params": {
                "name": "prepare_upload",
                "arguments": { "account_id": "alice.near", "group_id": "vault.alice.near" },
            },
        }))
        .await;

        let result = &body["result"]["structuredContent"];
        assert_eq!(result["upload_id"], "512d17ae3a601990");
        assert_eq!(result["key"], "key-alice.near-vault.alice.near");
    }

    #[tokio::test]
    async fn test_unknown_method_and_tool() {
        let (_, body) = rpc(json!({ "jsonrpc": "2.0", "id": 3, "method": "resources/list" })).await;
        assert_eq!(body["error"]["code"], METHOD_NOT_FOUND);

        let (_, body) = rpc(json!({
            "jsonrpc": "2.0",
            "id": 4,
            "method": "tools/call",
            "params": { "name": "delete_file", "arguments": {} },
        }))
        .await;
        assert_eq!(body["error"]["code"], INVALID_PARAMS);
    }

    #[tokio::test]
    async fn test_bad_arguments_are_invalid_params() {
        // REST field name on the tool transport
        let (_, body) = rpc(json!({
            "jsonrpc": "2.0",
            "id": 5,
            "method": "tools/call",
            "params": {
                "name": "finalize_upload",
                "arguments": {
                    "account_id": "a",
                    "group_id": "g",
                    "encrypted_data": "aGk=",
                    "file_hash": "h",
                    "filename": "f",
                },
            },
        }))
        .await;
        assert_eq!(body["error"]["code"], INVALID_PARAMS);
    }

    #[tokio::test]
    async fn test_notification_has_no_body() {
        let (status, body) =
            rpc(json!({ "jsonrpc": "2.0", "method": "notifications/initialized" })).await;
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(body, Value::Null);
    }

    #[tokio::test]
    async fn test_null_id_gets_a_reply() {
        let (status, body) = rpc(json!({ "jsonrpc": "2.0", "id": null, "method": "ping" })).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["jsonrpc"], "2.0");
        assert_eq!(body["id"], Value::Null);
        assert_eq!(body["result"], json!({}));
    }
}
