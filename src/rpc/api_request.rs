use serde::{Deserialize, Serialize};

/// Protocol version constant carried on every request.
pub const JSON_RPC_VERSION: &str = "2.0";

/// An outbound JSON-RPC request frame.
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
pub struct RpcRequest {
    pub jsonrpc: String,
    pub method: String,
    pub params: Vec<serde_json::Value>,
    pub id: u32,
}

impl RpcRequest {
    pub fn new(method: &str, params: Vec<serde_json::Value>, id: u32) -> RpcRequest {
        RpcRequest {
            jsonrpc: String::from(JSON_RPC_VERSION),
            method: String::from(method),
            params,
            id,
        }
    }
}

/// An inbound JSON-RPC response frame. `result` is the hex-encoded return
/// envelope; `id` correlates it with the request that caused it.
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
pub struct RpcResponse {
    pub jsonrpc: String,
    pub result: String,
    pub id: u32,
}
