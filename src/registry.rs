//! The seam to an external keyed-type decoder.
//!
//! Envelope values are opaque bytes as far as the protocol layer is
//! concerned. Richer interpretation (runtime metadata, storage values,
//! operation-tracking data) lives behind this trait, keyed by a type name
//! the caller supplies.

use crate::Result;

pub trait TypeDecoder {
    fn decode(&self, type_name: &str, bytes: &[u8]) -> Result<serde_json::Value>;
}

/// Fallback decoder: renders any value as a `0x`-prefixed hex string. Good
/// enough for logging and for tests; real deployments plug in a registry
/// built from the sidechain's metadata.
pub struct HexDecoder;

impl TypeDecoder for HexDecoder {
    fn decode(&self, type_name: &str, bytes: &[u8]) -> Result<serde_json::Value> {
        Ok(serde_json::json!({
            "type": type_name,
            "value": format!("0x{}", hex::encode(bytes)),
        }))
    }
}
