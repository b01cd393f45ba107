//! JSON-RPC 2.0 message types for the bridge protocol.
//!
//! The wire contract is deliberately small: one newline-terminated JSON
//! document per message, one request/response exchange per connection.
//!
//! # Correlation ids
//!
//! The request `id` is opaque caller-supplied data and is round-tripped
//! verbatim — any JSON value is accepted. A response whose request could not
//! be parsed far enough to recover an id carries `id: null`.
//!
//! # Failure taxonomy
//!
//! Transport/protocol failures (malformed JSON, unknown methods) use the
//! numeric `error` member of the envelope. Tool-level failures (bad
//! arguments, no open model, a scripting fault) are data: they travel inside
//! a *successful* envelope as a [`ToolCallResult`] with `isError = true`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A parsed request.
///
/// Parsing is lenient by design: a structurally odd request still yields a
/// `Request` whenever an `id` can be recovered, so the eventual error
/// response can be correlated.
#[derive(Debug, Clone)]
pub struct Request {
    /// Caller-supplied correlation id, `Null` when absent.
    pub id: Value,
    /// The method to invoke. Empty when absent or not a string.
    pub method: String,
    /// Optional parameters for the method.
    pub params: Option<Value>,
}

/// Parameters for a `tools/call` request.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolCallParams {
    /// Name of the tool to call.
    pub name: String,
    /// Arguments for the tool.
    #[serde(default)]
    pub arguments: Value,
}

/// Content item in a tool call response.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolContent {
    /// Text content.
    Text {
        /// The text content.
        text: String,
    },
}

/// Result of a tool call, successful or failed at the application level.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallResult {
    /// Content returned by the tool.
    pub content: Vec<ToolContent>,
    /// Whether the tool call resulted in an error.
    pub is_error: bool,
}

impl ToolCallResult {
    /// Creates a successful text result.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text { text: text.into() }],
            is_error: false,
        }
    }

    /// Creates an error text result.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text {
                text: message.into(),
            }],
            is_error: true,
        }
    }
}

/// Standard JSON-RPC 2.0 error codes used by the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Invalid JSON was received by the server.
    ParseError,
    /// The JSON sent is not a valid Request object.
    InvalidRequest,
    /// The method does not exist or is not available.
    MethodNotFound,
    /// Internal error.
    InternalError,
}

impl ErrorCode {
    /// Returns the numeric code for this error.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::ParseError => -32700,
            Self::InvalidRequest => -32600,
            Self::MethodNotFound => -32601,
            Self::InternalError => -32603,
        }
    }
}

/// A successful JSON-RPC 2.0 response.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcResponse {
    /// Always "2.0".
    pub jsonrpc: &'static str,

    /// The result of the method call.
    pub result: Value,

    /// The request id this response corresponds to, echoed verbatim.
    pub id: Value,
}

impl JsonRpcResponse {
    /// Creates a new success response.
    #[must_use]
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            result,
            id,
        }
    }
}

/// A JSON-RPC 2.0 error object.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcErrorData {
    /// The error code.
    pub code: i32,

    /// A short description of the error.
    pub message: String,
}

/// A JSON-RPC 2.0 error response.
///
/// The `id` member is always present; it is `null` when the triggering
/// request could not be parsed far enough to recover one.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcError {
    /// Always "2.0".
    pub jsonrpc: &'static str,

    /// The error details.
    pub error: JsonRpcErrorData,

    /// The request id this error corresponds to, `null` when unknown.
    pub id: Value,
}

impl JsonRpcError {
    /// Creates a new error response.
    #[must_use]
    pub fn new(id: Value, code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0",
            error: JsonRpcErrorData {
                code: code.code(),
                message: message.into(),
            },
            id,
        }
    }

    /// Creates a parse error response (id cannot be determined).
    #[must_use]
    pub fn parse_error(detail: impl Into<String>) -> Self {
        Self::new(Value::Null, ErrorCode::ParseError, detail)
    }

    /// Creates a method not found error response.
    #[must_use]
    pub fn method_not_found(id: Value, method: &str) -> Self {
        Self::new(
            id,
            ErrorCode::MethodNotFound,
            format!("Method not found: {method}"),
        )
    }

    /// Creates an authentication rejection response.
    ///
    /// Only written when the server is configured to reject loudly; the
    /// default is to close the connection without a response.
    #[must_use]
    pub fn authentication_failed() -> Self {
        Self::new(
            Value::Null,
            ErrorCode::InvalidRequest,
            "Authentication failed",
        )
    }

    /// Creates an internal error response.
    #[must_use]
    pub fn internal_error(id: Value, message: impl Into<String>) -> Self {
        Self::new(id, ErrorCode::InternalError, message)
    }
}

/// Parses one request line.
///
/// A line that is not valid JSON, or not a JSON object, is a protocol-level
/// parse failure. Beyond that, parsing stays lenient: a missing or
/// non-string `method` becomes the empty string (and later a method-not-found
/// error carrying the recovered `id`).
///
/// # Errors
///
/// Returns a [`JsonRpcError`] with code `-32700` and `id: null`, carrying
/// the decoder's diagnostic text.
pub fn parse_request(line: &str) -> Result<Request, JsonRpcError> {
    let value: Value = serde_json::from_str(line)
        .map_err(|e| JsonRpcError::parse_error(format!("Parse error: {e}")))?;

    let Value::Object(obj) = value else {
        return Err(JsonRpcError::parse_error(
            "Parse error: request must be a JSON object",
        ));
    };

    let id = obj.get("id").cloned().unwrap_or(Value::Null);
    let method = obj
        .get("method")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let params = obj.get("params").cloned();

    Ok(Request { id, method, params })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_valid_request() {
        let line = r#"{"jsonrpc":"2.0","id":7,"method":"tools/call","params":{"name":"describe_model","arguments":{}}}"#;
        let req = parse_request(line).unwrap();
        assert_eq!(req.id, json!(7));
        assert_eq!(req.method, "tools/call");
        assert!(req.params.is_some());
    }

    #[test]
    fn parse_preserves_opaque_ids() {
        let line = r#"{"method":"ping","id":{"trace":"abc","seq":2}}"#;
        let req = parse_request(line).unwrap();
        assert_eq!(req.id, json!({"trace":"abc","seq":2}));
    }

    #[test]
    fn parse_missing_id_defaults_to_null() {
        let req = parse_request(r#"{"method":"ping"}"#).unwrap();
        assert_eq!(req.id, Value::Null);
    }

    #[test]
    fn parse_invalid_json() {
        let err = parse_request("not valid json").unwrap_err();
        assert_eq!(err.error.code, ErrorCode::ParseError.code());
        assert_eq!(err.id, Value::Null);
        assert!(err.error.message.contains("Parse error"));
    }

    #[test]
    fn parse_non_object() {
        let err = parse_request("[1,2,3]").unwrap_err();
        assert_eq!(err.error.code, ErrorCode::ParseError.code());
    }

    #[test]
    fn parse_non_string_method_recovers_id() {
        let req = parse_request(r#"{"method":42,"id":5}"#).unwrap();
        assert_eq!(req.method, "");
        assert_eq!(req.id, json!(5));
    }

    #[test]
    fn serialise_success_response() {
        let response = JsonRpcResponse::success(json!(1), json!({"status":"ok"}));
        let encoded = serde_json::to_string(&response).unwrap();
        assert!(encoded.contains(r#""jsonrpc":"2.0""#));
        assert!(encoded.contains(r#""id":1"#));
        assert!(encoded.contains(r#""result":{"status":"ok"}"#));
    }

    #[test]
    fn serialise_error_keeps_null_id() {
        let error = JsonRpcError::parse_error("Parse error: bad input");
        let encoded = serde_json::to_string(&error).unwrap();
        assert!(encoded.contains(r#""code":-32700"#));
        assert!(encoded.contains(r#""id":null"#));
    }

    #[test]
    fn serialise_method_not_found() {
        let error = JsonRpcError::method_not_found(json!("req-9"), "models/list");
        let encoded = serde_json::to_string(&error).unwrap();
        assert!(encoded.contains(r#""code":-32601"#));
        assert!(encoded.contains("models/list"));
        assert!(encoded.contains(r#""id":"req-9""#));
    }

    #[test]
    fn tool_result_serialises_is_error_flag() {
        let ok = serde_json::to_value(ToolCallResult::text("done")).unwrap();
        assert_eq!(ok["isError"], json!(false));
        assert_eq!(ok["content"][0]["type"], json!("text"));
        assert_eq!(ok["content"][0]["text"], json!("done"));

        let failed = serde_json::to_value(ToolCallResult::error("boom")).unwrap();
        assert_eq!(failed["isError"], json!(true));
    }

    #[test]
    fn tool_call_params_default_arguments() {
        let params: ToolCallParams =
            serde_json::from_value(json!({"name": "describe_model"})).unwrap();
        assert_eq!(params.name, "describe_model");
        assert_eq!(params.arguments, Value::Null);
    }
}
