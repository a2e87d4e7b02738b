#![forbid(unsafe_code)]

use super::RpcServer;
use super::jsonrpc::{INVALID_REQUEST, JsonRpcRequest, PARSE_ERROR, json_rpc_error};
use serde_json::Value;
use std::io::{BufRead, Write};

/// Serves newline-delimited JSON-RPC until `reader` reaches EOF.
pub fn run_stdio<R, W>(server: &RpcServer, mut reader: R, mut writer: W) -> std::io::Result<()>
where
    R: BufRead,
    W: Write,
{
    let mut line = String::new();
    loop {
        line.clear();
        let read = reader.read_line(&mut line)?;
        if read == 0 {
            break;
        }
        let raw = line.trim();
        if raw.is_empty() {
            continue;
        }
        if let Some(resp) = handle_line(server, raw) {
            write_newline_json(&mut writer, &resp)?;
        }
    }
    tracing::debug!("stdin closed");
    Ok(())
}

/// One request line in, at most one response out.
pub fn handle_line(server: &RpcServer, raw: &str) -> Option<Value> {
    let data: Value = match serde_json::from_str(raw) {
        Ok(v) => v,
        Err(e) => {
            return Some(json_rpc_error(None, PARSE_ERROR, &format!("Parse error: {e}")));
        }
    };

    let (id, has_method) = match data.as_object() {
        Some(obj) => (obj.get("id").cloned(), obj.contains_key("method")),
        None => return Some(json_rpc_error(None, INVALID_REQUEST, "Invalid Request")),
    };
    if !has_method {
        return Some(json_rpc_error(id, INVALID_REQUEST, "Invalid Request"));
    }

    let request: JsonRpcRequest = match serde_json::from_value(data) {
        Ok(v) => v,
        Err(e) => {
            return Some(json_rpc_error(
                id,
                INVALID_REQUEST,
                &format!("Invalid Request: {e}"),
            ));
        }
    };

    server.handle(request)
}

fn write_newline_json<W: Write>(writer: &mut W, resp: &Value) -> std::io::Result<()> {
    let encoded = serde_json::to_string(resp).map_err(std::io::Error::other)?;
    writeln!(writer, "{encoded}")?;
    writer.flush()
}
