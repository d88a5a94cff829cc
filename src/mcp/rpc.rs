//! JSON-RPC protocol representations and formatting utilities
//!
//! Line codec, message classification, and standardized construction of
//! JSON-RPC result and error envelopes.

use serde_json::{json, Map, Value};

use crate::errors::RpcError;

pub const JSONRPC_VERSION: &str = "2.0";

/// A decoded line, classified for dispatch. Presence of the `id` key is
/// what separates a request from a notification; an object carrying an
/// `id` that fails the request shape still echoes that id in the error.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Request {
        id: Value,
        method: String,
        params: Value,
    },
    Notification {
        method: String,
        params: Value,
    },
    Malformed {
        id: Option<Value>,
    },
}

/// Decode one framed line into a JSON value, preserving the parser
/// diagnostic for the wire error message.
pub fn decode(line: &str) -> Result<Value, RpcError> {
    serde_json::from_str(line).map_err(|err| RpcError::Parse(err.to_string()))
}

/// Encode a response envelope as a single newline-terminated line.
/// Envelopes are built internally from well-typed values, so
/// serialization cannot fail here.
pub fn encode(value: &Value) -> String {
    let mut line = serde_json::to_string(value).expect("response envelope serialization");
    line.push('\n');
    line
}

pub fn classify(payload: Value) -> Message {
    let Value::Object(mut object) = payload else {
        return Message::Malformed { id: None };
    };

    let id = object.remove("id");
    let has_version = object.get("jsonrpc").and_then(Value::as_str) == Some(JSONRPC_VERSION);
    let method = object
        .get("method")
        .and_then(Value::as_str)
        .map(str::to_string);
    let params = object
        .remove("params")
        .unwrap_or_else(|| Value::Object(Map::new()));

    match (has_version, method, id) {
        (true, Some(method), Some(id)) => Message::Request { id, method, params },
        (true, Some(method), None) => Message::Notification { method, params },
        (_, _, id) => Message::Malformed { id },
    }
}

pub fn json_rpc_result(id: Value, result: Value) -> Value {
    json!({
        "jsonrpc": JSONRPC_VERSION,
        "id": id,
        "result": result
    })
}

pub fn json_rpc_error(id: Option<Value>, code: i64, message: &str) -> Value {
    json!({
        "jsonrpc": JSONRPC_VERSION,
        "id": id,
        "error": {
            "code": code,
            "message": message
        }
    })
}

pub fn is_json_rpc_error(value: &Value) -> bool {
    value.get("error").is_some()
}
