//! LoRaWAN JoinAccept MIC core.
//!
//! Stateless primitives for deriving and verifying the 4-byte Message
//! Integrity Code on a JoinAccept frame, covering the LoRaWAN 1.0.x and
//! 1.1 framing/key-selection rules. The pipeline is
//! key selection ([`keys`]) → frame assembly ([`frame`]) → CMAC ([`mic`]).
//!
//! Every call is independent: no key cache, no session state, no I/O.
//! Key buffers are borrowed for the duration of one call only.

pub mod frame;
pub mod keys;
pub mod mic;

use std::fmt;

use thiserror::Error;

/// Errors surfaced by the MIC core.
///
/// A verification mismatch is NOT represented here — `verify_mic`
/// returning `false` is a valid protocol outcome (reject the join),
/// distinct from malformed input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MicError {
    /// Key material is not exactly 16 bytes.
    #[error("invalid key length: expected 16 bytes, got {actual}")]
    InvalidKeyLength { actual: usize },

    /// Payload length or required join-request context out of bounds
    /// for the chosen protocol version.
    #[error("malformed frame: {reason}")]
    MalformedFrame { reason: String },

    /// Unrecognized protocol version tag.
    #[error("unsupported LoRaWAN version tag {tag:?} (expected \"1.0.x\" or \"1.1\")")]
    UnsupportedVersion { tag: String },
}

/// LoRaWAN protocol version, as far as JoinAccept MIC rules differ.
///
/// 1.0.x computes the MIC under the root AppKey/NwkKey over the bare
/// decrypted payload; 1.1 computes it under JSIntKey over a prefixed
/// message carrying the join-request context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolVersion {
    /// LoRaWAN 1.0.x (1.0.2 through 1.0.4 share the JoinAccept MIC rules).
    V1_0,
    /// LoRaWAN 1.1.
    V1_1,
}

impl ProtocolVersion {
    /// Parse a textual version tag.
    ///
    /// Accepts the spelling used in device provisioning files ("1.0.x")
    /// as well as the concrete minor revisions.
    pub fn from_tag(tag: &str) -> Result<Self, MicError> {
        match tag.trim() {
            "1.0" | "1.0.x" | "1.0.2" | "1.0.3" | "1.0.4" => Ok(ProtocolVersion::V1_0),
            "1.1" => Ok(ProtocolVersion::V1_1),
            other => Err(MicError::UnsupportedVersion {
                tag: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolVersion::V1_0 => write!(f, "1.0.x"),
            ProtocolVersion::V1_1 => write!(f, "1.1"),
        }
    }
}
