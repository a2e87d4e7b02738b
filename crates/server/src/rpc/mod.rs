#![forbid(unsafe_code)]

mod dispatch;
pub mod jsonrpc;
mod stdio;

pub use dispatch::RpcServer;
pub use jsonrpc::JsonRpcRequest;
pub use stdio::{handle_line, run_stdio};
