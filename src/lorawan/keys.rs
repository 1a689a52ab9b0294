//! Key material types and JoinAccept key selection.
//!
//! Which key authenticates a JoinAccept depends on the protocol version:
//! - 1.0.x: the root AppKey/NwkKey directly.
//! - 1.1: JSIntKey, derived from NwkKey over the DevEUI.
//!
//! Keys are borrowed per call and never cached here; zeroing key buffers
//! after use is the caller's responsibility.

use std::fmt;

use aes::cipher::{generic_array::GenericArray, BlockEncrypt, KeyInit};
use aes::Aes128;

use super::{MicError, ProtocolVersion};

/// Derivation constant for JSIntKey: aes128_enc(NwkKey, 0x06 | DevEUI | pad).
const JS_INT_KEY_TYPE: u8 = 0x06;

/// A 128-bit AES key.
///
/// The only fallible way in is [`AES128::from_slice`], which is where
/// `InvalidKeyLength` originates — past that boundary a wrong-length key
/// is unrepresentable.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct AES128(pub(crate) [u8; 16]);

impl AES128 {
    /// Build a key from a byte slice, rejecting anything but 16 bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, MicError> {
        let key: [u8; 16] = bytes
            .try_into()
            .map_err(|_| MicError::InvalidKeyLength {
                actual: bytes.len(),
            })?;
        Ok(AES128(key))
    }

    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

impl From<[u8; 16]> for AES128 {
    fn from(v: [u8; 16]) -> Self {
        AES128(v)
    }
}

// Key bytes must never reach logs; Debug is deliberately opaque.
impl fmt::Debug for AES128 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AES128(..)")
    }
}

/// A 4-byte LoRaWAN Message Integrity Code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mic(pub [u8; 4]);

impl From<[u8; 4]> for Mic {
    fn from(v: [u8; 4]) -> Self {
        Mic(v)
    }
}

impl fmt::Display for Mic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

/// What the selected key is for. JoinAccept MIC is the only role this
/// core serves; the enum keeps the selection contract explicit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyRole {
    JoinAcceptMic,
}

/// Root key material supplied by the caller for one selection.
///
/// `dev_eui` (little-endian byte order, as carried in the JoinRequest)
/// is only needed for 1.1, where JSIntKey is derived from it.
#[derive(Debug, Clone, Copy)]
pub struct KeyMaterial<'a> {
    pub nwk_key: &'a AES128,
    pub dev_eui: Option<[u8; 8]>,
}

/// Derive the 1.1 Join Server integrity key from the root NwkKey.
///
/// JSIntKey = aes128_encrypt(NwkKey, 0x06 | DevEUI | pad16), with DevEUI
/// in the little-endian byte order it has on the wire.
pub fn derive_js_int_key(nwk_key: &AES128, dev_eui: &[u8; 8]) -> AES128 {
    let mut block = [0u8; 16];
    block[0] = JS_INT_KEY_TYPE;
    block[1..9].copy_from_slice(dev_eui);

    let cipher = Aes128::new(GenericArray::from_slice(&nwk_key.0));
    let mut block = GenericArray::from(block);
    cipher.encrypt_block(&mut block);

    AES128(block.into())
}

/// Pick the key that authenticates a JoinAccept under the given version.
///
/// 1.0.x uses the root key as-is; 1.1 derives JSIntKey on the fly (callers
/// with a key store can pre-derive via [`derive_js_int_key`] instead).
pub fn select_key(
    version: ProtocolVersion,
    role: KeyRole,
    material: &KeyMaterial<'_>,
) -> Result<AES128, MicError> {
    let KeyRole::JoinAcceptMic = role;

    match version {
        ProtocolVersion::V1_0 => Ok(*material.nwk_key),
        ProtocolVersion::V1_1 => {
            let dev_eui = material.dev_eui.ok_or_else(|| MicError::MalformedFrame {
                reason: "LoRaWAN 1.1 JSIntKey derivation requires a DevEUI".to_string(),
            })?;
            Ok(derive_js_int_key(material.nwk_key, &dev_eui))
        }
    }
}
