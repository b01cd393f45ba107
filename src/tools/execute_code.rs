//! `execute_code` — run a script in the host's execution context.
//!
//! This handler is the bridge's trust boundary: the supplied code runs at
//! the same privilege as the host's own script console, with no sandboxing
//! and no resource limits. The only mitigations are the loopback bind and
//! the optional shared secret. A runaway script blocks the host thread
//! until it finishes.
//!
//! Execution faults are application outcomes, not protocol errors: the
//! engine's diagnostic text is returned to the caller verbatim so the
//! assistant can correct its code and resubmit.

use serde_json::Value;
use tracing::info;

use super::ToolError;
use crate::host::Host;

/// Runs the `code` argument and returns the value of its final expression
/// as text.
pub(crate) fn run(host: &mut dyn Host, arguments: &Value) -> Result<String, ToolError> {
    let code = arguments
        .get("code")
        .and_then(Value::as_str)
        .unwrap_or_default();

    if code.trim().is_empty() {
        return Err(ToolError::NoCode);
    }

    info!(chars = code.len(), "executing code in host context");
    Ok(host.eval(code)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::memory::MemoryHost;
    use serde_json::json;

    #[test]
    fn returns_final_expression_value_as_text() {
        let mut host = MemoryHost::new();
        assert_eq!(run(&mut host, &json!({"code": "1+1"})).unwrap(), "2");
    }

    #[test]
    fn missing_code_is_rejected() {
        let mut host = MemoryHost::new();
        let err = run(&mut host, &json!({})).unwrap_err();
        assert_eq!(err.to_string(), "No code provided");
    }

    #[test]
    fn blank_code_is_rejected() {
        let mut host = MemoryHost::new();
        let err = run(&mut host, &json!({"code": "   \n  "})).unwrap_err();
        assert_eq!(err.to_string(), "No code provided");
    }

    #[test]
    fn non_string_code_is_rejected() {
        let mut host = MemoryHost::new();
        let err = run(&mut host, &json!({"code": 42})).unwrap_err();
        assert_eq!(err.to_string(), "No code provided");
    }

    #[test]
    fn engine_faults_carry_the_engine_message() {
        let mut host = MemoryHost::new();
        let err = run(&mut host, &json!({"code": "1/0"})).unwrap_err();
        assert!(err.to_string().contains("division by zero"));
    }
}
