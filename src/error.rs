use thiserror::Error;

/// Everything that can go wrong between building a request and handing the
/// decoded envelope back to the caller. No variant is retried internally;
/// resend policy belongs to whoever composes the calls.
#[derive(Error, Debug)]
pub enum Error {
    /// The compact length prefix itself could not be read (empty buffer,
    /// header bytes missing, or a declared length beyond the supported cap).
    #[error("malformed compact length prefix")]
    MalformedLength,

    /// The prefix decoded fine but claims more payload bytes than remain.
    #[error("input truncated: length prefix declares more bytes than available")]
    TruncatedInput,

    /// A status tag byte the client does not know. This means client/worker
    /// version skew and is never coerced to a default.
    #[error("unknown status discriminant {0}")]
    UnknownStatusDiscriminant(u8),

    /// No response arrived within the configured window. The worker may
    /// still answer later; such late frames are discarded.
    #[error("request timed out waiting for worker response")]
    RequestTimedOut,

    /// The worker answered with an `Error`-status envelope. Carries the
    /// decoded diagnostic string.
    #[error("worker returned an error: {0}")]
    WorkerResponse(String),

    /// A trusted operation was accepted into the sidechain pipeline and then
    /// rejected as invalid. Distinct from [`Error::WorkerResponse`].
    #[error("trusted operation rejected as invalid by the sidechain")]
    TerminalInvalid,

    /// The `result` field was not valid hex.
    #[error("result payload is not valid hex: {0}")]
    BadHexPayload(#[from] hex::FromHexError),

    /// An outbound request could not be serialized. Inbound frames that fail
    /// to parse are logged and dropped by the dispatcher instead.
    #[error("malformed json-rpc frame: {0}")]
    Json(#[from] serde_json::Error),

    /// The connection task has gone away; nothing can be sent or resolved.
    #[error("connection closed while request was outstanding")]
    ConnectionClosed,

    #[error("websocket transport failure: {0}")]
    Transport(String),

    /// An `Error`-status diagnostic payload that is not UTF-8.
    #[error("diagnostic payload is not valid utf-8")]
    BadUtf8Diagnostic,
}
