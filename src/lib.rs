/*!
# Sidechain Client

A client-side protocol layer for talking to a trusted-execution sidechain
worker over a persistent websocket connection.

The worker exposes a JSON-RPC surface, but the interesting part of every
response is the `result` field: a hex string carrying the worker's own binary
return envelope. The envelope is a status tag (plain success, plain error, or
a trusted-operation tracking status) followed by a compact-length-prefixed
opaque byte payload. This crate owns that wire contract end to end:

- [`codec`] is the compact length-prefix encoding used for byte payloads.
- [`envelope`] is the return-value envelope and its status taxonomy.
- [`rpc`] covers request construction, the websocket connection, and the
  dispatcher that matches responses to in-flight requests by id.
- [`worker_api`] holds the narrow query operations built on top (metadata
  and storage lookups).
- [`registry`] is the seam for an external keyed-type decoder; payload bytes
  are opaque to this crate.

Nothing here retries. Timeouts, worker-signalled errors and pipeline
rejections are all surfaced as distinct [`Error`] variants so the caller can
decide what is worth resending.
*/
pub mod codec;
pub mod envelope;
pub mod error;
pub mod registry;
pub mod rpc;
pub mod worker_api;

pub use error::Error;

pub type Result<T> = std::result::Result<T, Error>;
