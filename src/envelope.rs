//! The worker's binary return envelope.
//!
//! Every JSON-RPC response from the worker carries a hex string in its
//! `result` field. Decoded, it is a fixed-shape envelope:
//!
//! ```bytes
//! 0        status discriminant
//! 1        trusted-operation sub-status discriminant
//!          (present only when status == TrustedOperationStatus)
//! ..       compact-length-prefixed value bytes
//! ```
//!
//! The value bytes are opaque here; interpreting them is the job of an
//! external type registry (see [`crate::registry`]). The one exception is an
//! `Error` status, whose value holds a compact-length-prefixed UTF-8
//! diagnostic.

use crate::codec;
use crate::error::Error;
use crate::Result;

/// Sub-status of an operation the sidechain has accepted into its own
/// processing pipeline. The discriminant table is owned by the worker;
/// the byte values below must line up with its definition exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrustedOperationStatus {
    /// Submitted to the trusted operation pool.
    Submitted,
    /// Part of the future queue.
    Future,
    /// Part of the ready queue.
    Ready,
    /// Broadcast to sidechain peers.
    Broadcast,
    /// Included in a sidechain block.
    InSidechainBlock,
    /// The containing block was retracted.
    Retracted,
    /// Finality watcher limit reached before finalization.
    FinalityTimeout,
    /// Finalized by the sidechain's finality gadget.
    Finalized,
    /// Replaced in the pool by another operation with the same tags.
    Usurped,
    /// Dropped from the pool because of pool limits.
    Dropped,
    /// No longer valid in the current sidechain state.
    Invalid,
}

impl TrustedOperationStatus {
    fn from_discriminant(byte: u8) -> Result<TrustedOperationStatus> {
        match byte {
            0 => Ok(TrustedOperationStatus::Submitted),
            1 => Ok(TrustedOperationStatus::Future),
            2 => Ok(TrustedOperationStatus::Ready),
            3 => Ok(TrustedOperationStatus::Broadcast),
            4 => Ok(TrustedOperationStatus::InSidechainBlock),
            5 => Ok(TrustedOperationStatus::Retracted),
            6 => Ok(TrustedOperationStatus::FinalityTimeout),
            7 => Ok(TrustedOperationStatus::Finalized),
            8 => Ok(TrustedOperationStatus::Usurped),
            9 => Ok(TrustedOperationStatus::Dropped),
            10 => Ok(TrustedOperationStatus::Invalid),
            other => Err(Error::UnknownStatusDiscriminant(other)),
        }
    }

    fn discriminant(&self) -> u8 {
        match self {
            TrustedOperationStatus::Submitted => 0,
            TrustedOperationStatus::Future => 1,
            TrustedOperationStatus::Ready => 2,
            TrustedOperationStatus::Broadcast => 3,
            TrustedOperationStatus::InSidechainBlock => 4,
            TrustedOperationStatus::Retracted => 5,
            TrustedOperationStatus::FinalityTimeout => 6,
            TrustedOperationStatus::Finalized => 7,
            TrustedOperationStatus::Usurped => 8,
            TrustedOperationStatus::Dropped => 9,
            TrustedOperationStatus::Invalid => 10,
        }
    }

    /// The operation is still moving through the pipeline; further status
    /// changes may follow out of band.
    pub fn is_pending(&self) -> bool {
        matches!(
            self,
            TrustedOperationStatus::Submitted
                | TrustedOperationStatus::Future
                | TrustedOperationStatus::Ready
                | TrustedOperationStatus::Broadcast
                | TrustedOperationStatus::InSidechainBlock
        )
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, TrustedOperationStatus::Invalid)
    }
}

/// Top-level status tag of a return envelope. Exactly one form per response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectRequestStatus {
    /// Operation accepted or succeeded; the value holds the result payload.
    Ok,
    /// Accepted into the sidechain pipeline; the value typically holds only
    /// a reference hash, never the final result.
    TrustedOperationStatus(TrustedOperationStatus),
    /// Operation failed; the value holds a length-prefixed diagnostic.
    Error,
}

/// A decoded return envelope. Created fresh per response, never cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcReturnValue {
    pub status: DirectRequestStatus,
    pub value: Vec<u8>,
}

impl RpcReturnValue {
    pub fn new(status: DirectRequestStatus, value: Vec<u8>) -> RpcReturnValue {
        RpcReturnValue { status, value }
    }

    /// Decode an envelope from the hex string carried in the JSON-RPC
    /// `result` field. A leading `0x` is accepted and ignored.
    pub fn from_hex(hex_payload: &str) -> Result<RpcReturnValue> {
        let raw = hex::decode(hex_payload.trim_start_matches("0x"))?;
        RpcReturnValue::decode(&raw)
    }

    /// Decode an envelope from raw bytes. Pure and deterministic; malformed
    /// input yields a typed error, never a panic.
    pub fn decode(bytes: &[u8]) -> Result<RpcReturnValue> {
        let (&tag, rest) = bytes.split_first().ok_or(Error::TruncatedInput)?;
        let (status, rest) = match tag {
            0 => (DirectRequestStatus::Ok, rest),
            1 => {
                let (&sub, rest) = rest.split_first().ok_or(Error::TruncatedInput)?;
                let sub_status = TrustedOperationStatus::from_discriminant(sub)?;
                (DirectRequestStatus::TrustedOperationStatus(sub_status), rest)
            }
            2 => (DirectRequestStatus::Error, rest),
            other => return Err(Error::UnknownStatusDiscriminant(other)),
        };
        let (value, _consumed) = codec::compact_strip_length(rest)?;
        Ok(RpcReturnValue { status, value })
    }

    /// Encode the envelope back into its wire bytes.
    pub fn encode(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(2 + self.value.len() + 4);
        match self.status {
            DirectRequestStatus::Ok => bytes.push(0),
            DirectRequestStatus::TrustedOperationStatus(sub_status) => {
                bytes.push(1);
                bytes.push(sub_status.discriminant());
            }
            DirectRequestStatus::Error => bytes.push(2),
        }
        bytes.extend_from_slice(&codec::compact_add_length(&self.value));
        bytes
    }

    pub fn is_ok(&self) -> bool {
        matches!(self.status, DirectRequestStatus::Ok)
    }

    pub fn is_error(&self) -> bool {
        matches!(self.status, DirectRequestStatus::Error)
    }

    /// True iff the operation is in the sidechain pipeline and not yet
    /// terminal. Callers polling for a terminal status compose this across
    /// envelopes themselves; no state is kept here.
    pub fn is_pending(&self) -> bool {
        match self.status {
            DirectRequestStatus::TrustedOperationStatus(sub_status) => sub_status.is_pending(),
            _ => false,
        }
    }

    /// True iff the sidechain pipeline rejected the operation after
    /// accepting it. Distinct from [`RpcReturnValue::is_error`].
    pub fn is_terminal_invalid(&self) -> bool {
        match self.status {
            DirectRequestStatus::TrustedOperationStatus(sub_status) => sub_status.is_invalid(),
            _ => false,
        }
    }

    /// Convert the envelope into a typed result. An `Error` status becomes
    /// [`Error::WorkerResponse`] carrying the decoded diagnostic; a pipeline
    /// rejection becomes [`Error::TerminalInvalid`]. Anything else yields
    /// the value bytes (for a pending operation that is only a reference
    /// hash, never the final result).
    pub fn into_result(self) -> Result<Vec<u8>> {
        if self.is_error() {
            let diagnostic = self
                .error_message()
                .unwrap_or_else(|_| String::from("<undecodable diagnostic>"));
            return Err(Error::WorkerResponse(diagnostic));
        }
        if self.is_terminal_invalid() {
            return Err(Error::TerminalInvalid);
        }
        Ok(self.value)
    }

    /// Decode the value of an `Error`-status envelope: a compact-length-
    /// prefixed UTF-8 diagnostic.
    pub fn error_message(&self) -> Result<String> {
        let (diagnostic, _consumed) = codec::compact_strip_length(&self.value)?;
        String::from_utf8(diagnostic).map_err(|_| Error::BadUtf8Diagnostic)
    }
}
