//! Protocol errors and their JSON-RPC codes.

use xhs_pilot::PilotError;

use super::message::{JsonRpcError, JsonRpcErrorObject, RequestId, JSONRPC_VERSION};

/// Standard JSON-RPC 2.0 error codes.
pub mod error_codes {
    pub const PARSE_ERROR: i32 = -32700;
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;
}

pub mod mcp_error_codes {
    pub const REQUEST_CANCELLED: i32 = -32800;
    pub const TOOL_NOT_FOUND: i32 = -32803;
    pub const PLATFORM_ERROR: i32 = -32850;

    /// Missing or invalid bearer token on the HTTP transport.
    pub const UNAUTHORIZED: i32 = -32900;
}

#[derive(thiserror::Error, Debug)]
pub enum McpError {
    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Method not found: {0}")]
    MethodNotFound(String),

    #[error("Invalid params: {0}")]
    InvalidParams(String),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("Request cancelled")]
    RequestCancelled,

    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// An operation failed in a way the client cannot fix by changing arguments.
    #[error("Platform error [{kind}]: {message}")]
    Platform { kind: &'static str, message: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unauthorized")]
    Unauthorized,
}

impl McpError {
    pub fn code(&self) -> i32 {
        use error_codes::*;
        use mcp_error_codes::*;
        match self {
            McpError::ParseError(_) | McpError::Json(_) => PARSE_ERROR,
            McpError::InvalidRequest(_) => INVALID_REQUEST,
            McpError::MethodNotFound(_) => METHOD_NOT_FOUND,
            McpError::InvalidParams(_) => INVALID_PARAMS,
            McpError::InternalError(_) | McpError::Transport(_) | McpError::Io(_) => INTERNAL_ERROR,
            McpError::RequestCancelled => REQUEST_CANCELLED,
            McpError::ToolNotFound(_) => TOOL_NOT_FOUND,
            McpError::Platform { .. } => PLATFORM_ERROR,
            McpError::Unauthorized => UNAUTHORIZED,
        }
    }

    pub fn to_json_rpc_error(&self, id: RequestId) -> JsonRpcError {
        JsonRpcError {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            error: JsonRpcErrorObject {
                code: self.code(),
                message: self.to_string(),
                data: None,
            },
        }
    }
}

impl From<PilotError> for McpError {
    fn from(e: PilotError) -> Self {
        match e {
            PilotError::Validation(msg) => McpError::InvalidParams(msg),
            PilotError::Cancelled => McpError::RequestCancelled,
            PilotError::Internal(msg) => McpError::InternalError(msg),
            other => McpError::Platform {
                kind: other.kind(),
                message: other.to_string(),
            },
        }
    }
}

pub type McpResult<T> = Result<T, McpError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pilot_errors_map_to_protocol_codes() {
        let invalid: McpError = PilotError::Validation("title is empty".into()).into();
        assert_eq!(invalid.code(), error_codes::INVALID_PARAMS);

        let cancelled: McpError = PilotError::Cancelled.into();
        assert_eq!(cancelled.code(), mcp_error_codes::REQUEST_CANCELLED);

        let missing: McpError = PilotError::NotFound {
            entity: "feed",
            id: "abc".into(),
        }
        .into();
        assert_eq!(missing.code(), mcp_error_codes::PLATFORM_ERROR);
        assert!(missing.to_string().contains("[not_found]"));
    }
}
