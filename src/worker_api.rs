//! The narrow query surface composed from the dispatcher and the envelope
//! decoder: fetch the sidechain's metadata, fetch a storage value by key.

use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use crate::codec;
use crate::envelope::RpcReturnValue;
use crate::error::Error;
use crate::registry::TypeDecoder;
use crate::rpc::dispatcher::RequestDispatcher;
use crate::Result;

pub const METADATA_METHOD: &str = "state_getMetadata";
pub const STORAGE_METHOD: &str = "state_getStorage";

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_millis(6000);

/// Raw sidechain runtime metadata, ready for an external registry decoder.
/// The protocol layer never interprets these bytes itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SidechainMetadata(Vec<u8>);

impl SidechainMetadata {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn decode_with(&self, decoder: &dyn TypeDecoder) -> Result<serde_json::Value> {
        decoder.decode("SidechainMetadata", &self.0)
    }
}

/// Queries against one worker connection.
pub struct WorkerApi {
    dispatcher: Arc<RequestDispatcher>,
    request_timeout: Duration,
}

impl WorkerApi {
    pub fn new(dispatcher: Arc<RequestDispatcher>, request_timeout: Duration) -> WorkerApi {
        WorkerApi {
            dispatcher,
            request_timeout,
        }
    }

    pub fn with_default_timeout(dispatcher: Arc<RequestDispatcher>) -> WorkerApi {
        WorkerApi::new(dispatcher, DEFAULT_REQUEST_TIMEOUT)
    }

    /// Issue one request and apply the shared failure policy: an
    /// `Error`-status envelope becomes [`Error::WorkerResponse`] with the
    /// decoded diagnostic. A terminal-invalid trusted operation is passed
    /// through (the envelope then holds only a reference hash) so the
    /// caller can inspect it.
    async fn request(
        &self,
        method: &str,
        params: Vec<serde_json::Value>,
    ) -> Result<RpcReturnValue> {
        let envelope = self
            .dispatcher
            .send_request(method, params, self.request_timeout)
            .await?;
        if envelope.is_error() {
            let diagnostic = envelope
                .error_message()
                .unwrap_or_else(|_| String::from("<undecodable diagnostic>"));
            return Err(Error::WorkerResponse(diagnostic));
        }
        if envelope.is_terminal_invalid() {
            warn!(
                "trusted operation rejected as invalid, reference hash 0x{}",
                hex::encode(&envelope.value)
            );
        }
        Ok(envelope)
    }

    /// Fetch the sidechain's runtime metadata (`state_getMetadata`, no
    /// parameters).
    pub async fn get_metadata(&self) -> Result<SidechainMetadata> {
        let envelope = self.request(METADATA_METHOD, vec![]).await?;
        Ok(SidechainMetadata(envelope.value))
    }

    /// Fetch a storage value from the enclave identified by `enclave_id`
    /// under `storage_key` (both hex strings).
    pub async fn get_storage(
        &self,
        enclave_id: &str,
        storage_key: &str,
    ) -> Result<RpcReturnValue> {
        self.get_storage_with_method(STORAGE_METHOD, enclave_id, storage_key)
            .await
    }

    /// Strict variant of [`WorkerApi::get_storage`]: a pipeline rejection
    /// fails with [`Error::TerminalInvalid`] instead of handing back the
    /// envelope, and only the value bytes are returned. For callers that
    /// never inspect tracking statuses themselves.
    pub async fn get_storage_value(
        &self,
        enclave_id: &str,
        storage_key: &str,
    ) -> Result<Vec<u8>> {
        self.get_storage(enclave_id, storage_key)
            .await?
            .into_result()
    }

    /// Same as [`WorkerApi::get_storage`] with the RPC method injectable,
    /// for workers exposing storage lookups under a different name.
    pub async fn get_storage_with_method(
        &self,
        method: &str,
        enclave_id: &str,
        storage_key: &str,
    ) -> Result<RpcReturnValue> {
        self.request(
            method,
            vec![
                serde_json::json!(enclave_id),
                serde_json::json!(storage_key),
            ],
        )
        .await
    }
}

/// Decode a hex string carrying compact-length-prefixed UTF-8, the shape
/// the worker uses for human-readable diagnostics.
pub fn decode_rpc_bytes_as_string(hex_payload: &str) -> Result<String> {
    let raw = hex::decode(hex_payload.trim_start_matches("0x"))?;
    let (payload, _consumed) = codec::compact_strip_length(&raw)?;
    String::from_utf8(payload).map_err(|_| Error::BadUtf8Diagnostic)
}
