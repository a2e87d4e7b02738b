#![forbid(unsafe_code)]

use crate::ServiceError;
use serde::Deserialize;
use serde_json::{Value, json};

pub const PARSE_ERROR: i64 = -32700;
pub const INVALID_REQUEST: i64 = -32600;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;

#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    #[serde(default)]
    #[serde(rename = "jsonrpc")]
    pub _jsonrpc: Option<String>,
    pub method: String,
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub params: Option<Value>,
}

pub fn json_rpc_response(id: Option<Value>, result: Value) -> Value {
    json!({ "jsonrpc": "2.0", "id": id, "result": result })
}

pub fn json_rpc_error(id: Option<Value>, code: i64, message: &str) -> Value {
    json!({ "jsonrpc": "2.0", "id": id, "error": { "code": code, "message": message } })
}

/// Domain outcomes travel inside a successful JSON-RPC result; protocol errors use
/// [`json_rpc_error`].
pub fn op_ok(result: Value) -> Value {
    json!({
        "success": true,
        "result": result,
        "error": null
    })
}

pub fn op_error(err: &ServiceError) -> Value {
    json!({
        "success": false,
        "result": {},
        "error": {
            "code": err.code(),
            "message": err.to_string()
        }
    })
}
