//! The central Model Context Protocol engine
//!
//! Classified-message fanout, method dispatch, and the protocol-version
//! negotiation performed by `initialize`.

use chrono::{SecondsFormat, Utc};
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::domain::tools::{build_tools_list, handle_tools_call};
use crate::errors::RpcError;
use crate::mcp::rpc::{classify, is_json_rpc_error, json_rpc_error, json_rpc_result, Message};
use crate::AppState;

pub const SUPPORTED_PROTOCOL_VERSIONS: [&str; 2] = ["2024-11-05", "2024-10-07"];
pub const DEFAULT_PROTOCOL_VERSION: &str = "2024-11-05";

const SERVER_INSTRUCTIONS: &str = "Send one JSON-RPC 2.0 message per line over this TCP \
    connection. Call tools/list to discover the available tools, then tools/call to invoke \
    them.";

/// Turns one decoded payload into at most one response envelope.
/// Notifications are dispatched for their effects and never answered,
/// even when dispatch fails.
pub async fn handle_payload(state: &AppState, payload: Value) -> Option<Value> {
    match classify(payload) {
        Message::Request { id, method, params } => {
            let response = match dispatch(state, &method, params).await {
                Ok(result) => json_rpc_result(id, result),
                Err(err) => json_rpc_error(Some(id), err.code(), &err.to_string()),
            };

            info!(
                method = %method,
                outcome = if is_json_rpc_error(&response) { "failure" } else { "success" },
                "request dispatched"
            );
            Some(response)
        }
        Message::Notification { method, params } => {
            let _ = dispatch(state, &method, params).await;
            debug!(method = %method, "notification dispatched");
            None
        }
        Message::Malformed { id } => {
            let err = RpcError::InvalidRequest;
            Some(json_rpc_error(id, err.code(), &err.to_string()))
        }
    }
}

/// String-keyed method lookup. Handlers return the result payload or an
/// [`RpcError`]; the caller wraps either into the response envelope.
pub async fn dispatch(state: &AppState, method: &str, params: Value) -> Result<Value, RpcError> {
    match method {
        "initialize" => handle_initialize(&params),
        "tools/list" => Ok(json!({ "tools": build_tools_list() })),
        "tools/call" => handle_tools_call(state, params).await,
        "echo" => Ok(json!({ "echoed": params })),
        "get_time" => Ok(json!({
            "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
        })),
        "ping" => Ok(json!("pong")),
        _ => Err(RpcError::MethodNotFound(method.to_string())),
    }
}

fn handle_initialize(params: &Value) -> Result<Value, RpcError> {
    let protocol_version = negotiate_protocol_version(params)?;

    if let Some(client) = params.get("clientInfo").and_then(|info| info.get("name")) {
        info!(client = %client, "client initialized");
    }

    Ok(json!({
        "protocolVersion": protocol_version,
        "serverInfo": {
            "name": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION")
        },
        "capabilities": {
            "tools": {
                "listChanged": false
            }
        },
        "instructions": SERVER_INSTRUCTIONS
    }))
}

/// Pure function of the offered version string; absent or null falls back
/// to the default, so repeated `initialize` calls are independent.
pub fn negotiate_protocol_version(params: &Value) -> Result<&'static str, RpcError> {
    let offered = match params.get("protocolVersion") {
        None | Some(Value::Null) => return Ok(DEFAULT_PROTOCOL_VERSION),
        Some(value) => value
            .as_str()
            .ok_or_else(|| RpcError::invalid_params("protocolVersion must be a string"))?,
    };

    SUPPORTED_PROTOCOL_VERSIONS
        .iter()
        .find(|version| **version == offered)
        .copied()
        .ok_or_else(|| RpcError::UnsupportedProtocolVersion(offered.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn state() -> AppState {
        AppState::new(vec!["/srv/sandbox".to_string()])
    }

    #[test]
    fn negotiate_accepts_every_supported_version() {
        for version in SUPPORTED_PROTOCOL_VERSIONS {
            let params = json!({ "protocolVersion": version });
            assert_eq!(negotiate_protocol_version(&params), Ok(version));
        }
    }

    #[test]
    fn negotiate_defaults_when_version_is_absent() {
        assert_eq!(
            negotiate_protocol_version(&json!({})),
            Ok(DEFAULT_PROTOCOL_VERSION)
        );
        assert_eq!(
            negotiate_protocol_version(&json!({ "protocolVersion": null })),
            Ok(DEFAULT_PROTOCOL_VERSION)
        );
    }

    #[test]
    fn negotiate_rejects_unsupported_version() {
        let err = negotiate_protocol_version(&json!({ "protocolVersion": "1999-01-01" }))
            .expect_err("unsupported version must fail");
        assert_eq!(err.code(), -32602);
        assert!(err.to_string().contains("2024-11-05"));
        assert!(err.to_string().contains("2024-10-07"));
    }

    #[test]
    fn negotiate_rejects_non_string_version() {
        let err = negotiate_protocol_version(&json!({ "protocolVersion": 2024 }))
            .expect_err("non-string version must fail");
        assert_eq!(err.code(), -32602);
    }

    #[tokio::test]
    async fn initialize_returns_server_descriptor() {
        let result = dispatch(&state(), "initialize", json!({})).await.expect("success");
        assert_eq!(result["protocolVersion"], DEFAULT_PROTOCOL_VERSION);
        assert_eq!(result["serverInfo"]["name"], env!("CARGO_PKG_NAME"));
        assert_eq!(result["serverInfo"]["version"], env!("CARGO_PKG_VERSION"));
        assert_eq!(result["capabilities"]["tools"]["listChanged"], false);
        assert!(result["instructions"].is_string());
    }

    #[tokio::test]
    async fn initialize_with_default_version_matches_omitted() {
        let explicit = dispatch(
            &state(),
            "initialize",
            json!({ "protocolVersion": "2024-11-05" }),
        )
        .await
        .expect("success");
        let omitted = dispatch(&state(), "initialize", json!({})).await.expect("success");
        assert_eq!(explicit, omitted);
    }

    #[tokio::test]
    async fn echo_round_trips_params() {
        let params = json!({ "nested": { "values": [1, 2, 3] } });
        let result = dispatch(&state(), "echo", params.clone()).await.expect("success");
        assert_eq!(result["echoed"], params);

        let sequence = json!([1, "two", 3.0]);
        let result = dispatch(&state(), "echo", sequence.clone()).await.expect("success");
        assert_eq!(result["echoed"], sequence);
    }

    #[tokio::test]
    async fn ping_ignores_params() {
        let result = dispatch(&state(), "ping", json!({ "anything": true }))
            .await
            .expect("success");
        assert_eq!(result, json!("pong"));
    }

    #[tokio::test]
    async fn get_time_returns_utc_rfc3339() {
        let result = dispatch(&state(), "get_time", json!({})).await.expect("success");
        let timestamp = result["timestamp"].as_str().expect("timestamp string");
        assert!(timestamp.ends_with('Z'));
        chrono::DateTime::parse_from_rfc3339(timestamp).expect("valid rfc3339");
    }

    #[tokio::test]
    async fn unknown_method_names_the_method() {
        let err = dispatch(&state(), "shutdown", json!({}))
            .await
            .expect_err("unknown method must fail");
        assert_eq!(err.code(), -32601);
        assert_eq!(err.to_string(), "Method not found: shutdown");
    }

    #[tokio::test]
    async fn request_fanout_builds_result_envelope() {
        let payload = json!({ "jsonrpc": "2.0", "method": "ping", "id": 1 });
        let response = handle_payload(&state(), payload).await.expect("response");
        assert_eq!(response["result"], "pong");
        assert_eq!(response["id"], 1);
    }

    #[tokio::test]
    async fn notification_fanout_is_silent_even_on_failure() {
        let ok = json!({ "jsonrpc": "2.0", "method": "ping" });
        assert_eq!(handle_payload(&state(), ok).await, None);

        let failing = json!({ "jsonrpc": "2.0", "method": "no_such_method" });
        assert_eq!(handle_payload(&state(), failing).await, None);
    }

    #[tokio::test]
    async fn malformed_fanout_echoes_id_when_present() {
        let response = handle_payload(&state(), json!({ "id": 7, "foo": "bar" }))
            .await
            .expect("response");
        assert_eq!(response["error"]["code"], -32600);
        assert_eq!(response["error"]["message"], "Invalid Request");
        assert_eq!(response["id"], 7);

        let response = handle_payload(&state(), json!("scalar")).await.expect("response");
        assert_eq!(response["error"]["code"], -32600);
        assert_eq!(response["id"], Value::Null);
    }
}
