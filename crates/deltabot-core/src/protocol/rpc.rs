//! JSON-RPC 2.0 line codec.
//!
//! Request: `{"jsonrpc":"2.0","method":..,"params":[..],"id":..}` + `\n`.
//! Response: `{"id":..,"result":..}` or `{"id":..,"error":{..}}`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{BotError, Result};

/// Protocol version tag.
pub const JSONRPC_VERSION: &str = "2.0";

/// Outgoing method call.
#[derive(Debug, Clone, Serialize)]
pub struct Request<'a> {
    pub jsonrpc: &'static str,
    pub method: &'a str,
    pub params: &'a [Value],
    pub id: u64,
}

impl<'a> Request<'a> {
    pub fn new(id: u64, method: &'a str, params: &'a [Value]) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            method,
            params,
            id,
        }
    }
}

/// Encode a request as one newline-terminated line.
pub fn encode_request(req: &Request<'_>) -> Result<String> {
    let mut line = serde_json::to_string(req)
        .map_err(|e| BotError::Encode(format!("request json: {e}")))?;
    line.push('\n');
    Ok(line)
}

/// Incoming line from the worker.
///
/// `id` is kept as raw JSON: a missing or non-integer id is a protocol
/// anomaly that the reader logs and drops, not a decode failure.
#[derive(Debug, Clone, Deserialize)]
pub struct Response {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<Value>,
}

/// Outcome of a response once correlated to its caller.
pub type Reply = std::result::Result<Value, BotError>;

impl Response {
    /// Id usable for correlation; `None` when absent, negative, fractional
    /// or not a number.
    pub fn request_id(&self) -> Option<u64> {
        self.id.as_ref().and_then(Value::as_u64)
    }

    /// Split into success value or `BotError::Remote`.
    ///
    /// A response carrying neither member resolves to `null`.
    pub fn into_reply(self) -> Reply {
        if let Some(err) = self.error {
            return Err(BotError::from_remote(&err));
        }
        Ok(self.result.unwrap_or(Value::Null))
    }
}

/// Decode one line read from the worker.
pub fn decode_response(line: &str) -> Result<Response> {
    serde_json::from_str(line.trim_end())
        .map_err(|e| BotError::Decode(format!("invalid response json: {e}")))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::panic)]

    use serde_json::json;

    use super::*;

    #[test]
    fn request_is_single_line() {
        let params = [json!(1), json!("addr"), json!({"k": "line\nbreak"})];
        let line = encode_request(&Request::new(7, "set_config", &params)).unwrap();
        assert!(line.ends_with('\n'));
        assert_eq!(line.matches('\n').count(), 1);
        let back: Value = serde_json::from_str(&line).unwrap();
        assert_eq!(back["jsonrpc"], "2.0");
        assert_eq!(back["method"], "set_config");
        assert_eq!(back["id"], 7);
        assert_eq!(back["params"][2]["k"], "line\nbreak");
    }

    #[test]
    fn error_wins_over_result() {
        let resp = decode_response(r#"{"id":1,"result":5,"error":{"code":-1,"message":"boom"}}"#).unwrap();
        match resp.into_reply() {
            Err(BotError::Remote { code, message }) => {
                assert_eq!(code, -1);
                assert_eq!(message, "boom");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn non_integer_ids_decode_without_correlation_id() {
        for line in [
            r#"{"id":"stray","result":1}"#,
            r#"{"id":-1,"result":1}"#,
            r#"{"id":1.5,"result":1}"#,
        ] {
            let resp = decode_response(line).unwrap();
            assert!(resp.id.is_some(), "{line}");
            assert_eq!(resp.request_id(), None, "{line}");
        }
        assert_eq!(decode_response(r#"{"id":4}"#).unwrap().request_id(), Some(4));
    }

    #[test]
    fn missing_result_is_null() {
        let resp = decode_response("{\"id\":2}\n").unwrap();
        assert_eq!(resp.into_reply().unwrap(), Value::Null);
    }
}
