//! Interactive tools exposed via Model Context Protocol
//!
//! Provides the `eval_elixir_snippet` and `list_allowed_directories`
//! implementations and their static descriptors for `tools/list`.

use std::time::Duration;

use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::warn;

use crate::domain::eval;
use crate::errors::RpcError;
use crate::AppState;

pub const EVAL_SNIPPET_TOOL: &str = "eval_elixir_snippet";
pub const LIST_DIRECTORIES_TOOL: &str = "list_allowed_directories";

/// Wall-clock bound on a single snippet evaluation.
const EVAL_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, serde::Serialize)]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

#[derive(Debug, Deserialize)]
struct CallToolParams {
    name: String,
    #[serde(default)]
    arguments: Map<String, Value>,
}

pub fn build_tools_list() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor {
            name: EVAL_SNIPPET_TOOL,
            description: "Evaluate a small Elixir-style arithmetic snippet in a sandboxed \
                          interpreter and return its rendered value",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "code": {
                        "type": "string",
                        "description": "Arithmetic expression to evaluate, e.g. \"1 + 1\""
                    }
                },
                "required": ["code"]
            }),
        },
        ToolDescriptor {
            name: LIST_DIRECTORIES_TOOL,
            description: "List the directories this server is configured to expose",
            input_schema: json!({
                "type": "object",
                "properties": {},
                "required": []
            }),
        },
    ]
}

pub async fn handle_tools_call(state: &AppState, params: Value) -> Result<Value, RpcError> {
    let call: CallToolParams = serde_json::from_value(params)
        .map_err(|err| RpcError::invalid_params(err.to_string()))?;

    match call.name.as_str() {
        EVAL_SNIPPET_TOOL => {
            let code = call
                .arguments
                .get("code")
                .and_then(Value::as_str)
                .ok_or_else(|| RpcError::invalid_params("code must be a string"))?;
            Ok(eval_snippet_result(code.to_string()).await)
        }
        LIST_DIRECTORIES_TOOL => Ok(list_directories_result(state)),
        _ => Err(RpcError::UnknownTool(call.name)),
    }
}

/// Runs the snippet on the blocking pool under a wall-clock timeout.
///
/// Every failure path (lex/parse error, arithmetic fault, resource-limit
/// hit, timeout, worker panic) is folded into a SUCCESSFUL tool result
/// whose text is a failure banner: evaluation outcomes are inspectable
/// data, never protocol errors.
async fn eval_snippet_result(code: String) -> Value {
    let outcome = tokio::time::timeout(
        EVAL_TIMEOUT,
        tokio::task::spawn_blocking(move || eval::eval(&code)),
    )
    .await;

    let text = match outcome {
        Ok(Ok(Ok(rendered))) => rendered,
        Ok(Ok(Err(err))) => format!("** (EvalError) {err}"),
        Ok(Err(join_err)) => {
            warn!(error = %join_err, "snippet evaluation worker aborted");
            "** (EvalError) evaluation aborted".to_string()
        }
        Err(_) => format!(
            "** (EvalError) evaluation timed out after {}s",
            EVAL_TIMEOUT.as_secs()
        ),
    };

    text_content_result(text)
}

fn list_directories_result(state: &AppState) -> Value {
    let mut result = text_content_result(state.allowed_dirs.join("\n"));
    result["structuredContent"] = json!({
        "directories": state.allowed_dirs.as_ref()
    });
    result
}

fn text_content_result(text: String) -> Value {
    json!({
        "content": [
            {
                "type": "text",
                "text": text
            }
        ]
    })
}
