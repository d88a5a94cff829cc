use thiserror::Error;

use crate::mcp::server::SUPPORTED_PROTOCOL_VERSIONS;

/// Wire-level error taxonomy. Every variant maps onto a JSON-RPC error
/// code via [`RpcError::code`] and renders its wire message via `Display`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RpcError {
    /// A line failed JSON decoding; carries the parser diagnostic verbatim.
    #[error("Parse error: {0}")]
    Parse(String),
    /// Well-formed JSON that is not a valid request or notification.
    #[error("Invalid Request")]
    InvalidRequest,
    #[error("Method not found: {0}")]
    MethodNotFound(String),
    #[error("Unknown tool: {0}")]
    UnknownTool(String),
    #[error("Invalid params: {0}")]
    InvalidParams(String),
    #[error(
        "Unsupported protocol version: {0}. Supported versions: {supported}",
        supported = SUPPORTED_PROTOCOL_VERSIONS.join(", ")
    )]
    UnsupportedProtocolVersion(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl RpcError {
    pub fn code(&self) -> i64 {
        match self {
            Self::Parse(_) => -32700,
            Self::InvalidRequest => -32600,
            Self::MethodNotFound(_) | Self::UnknownTool(_) => -32601,
            Self::InvalidParams(_) | Self::UnsupportedProtocolVersion(_) => -32602,
            Self::Internal(_) => -32603,
        }
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::InvalidParams(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::RpcError;

    #[test]
    fn codes_follow_jsonrpc_spec() {
        assert_eq!(RpcError::Parse("eof".to_string()).code(), -32700);
        assert_eq!(RpcError::InvalidRequest.code(), -32600);
        assert_eq!(RpcError::MethodNotFound("x".to_string()).code(), -32601);
        assert_eq!(RpcError::UnknownTool("x".to_string()).code(), -32601);
        assert_eq!(RpcError::invalid_params("bad").code(), -32602);
        assert_eq!(
            RpcError::UnsupportedProtocolVersion("1999-01-01".to_string()).code(),
            -32602
        );
    }

    #[test]
    fn parse_error_carries_diagnostic() {
        let message = RpcError::Parse("expected value at line 1".to_string()).to_string();
        assert!(message.starts_with("Parse error: "));
        assert!(message.contains("expected value at line 1"));
    }

    #[test]
    fn unsupported_version_names_every_supported_version() {
        let message = RpcError::UnsupportedProtocolVersion("1999-01-01".to_string()).to_string();
        assert!(message.contains("1999-01-01"));
        assert!(message.contains("2024-11-05"));
        assert!(message.contains("2024-10-07"));
    }
}
