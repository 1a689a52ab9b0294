//! JoinAccept MIC derivation and verification for LoRaWAN 1.0.x and 1.1.
//!
//! This crate is the integrity-check primitive a join server or device
//! stack calls once per join attempt. The caller owns key storage, replay
//! protection, and transport; this core only selects the right key for
//! the protocol version, assembles the version-mandated MIC input, and
//! runs CMAC-AES128 truncated to 4 bytes.
//!
//! ```
//! use lora_join_mic::{join_accept_mic, DevNonce, ProtocolVersion};
//!
//! let nwk_key = [0x2Bu8; 16];
//! let payload = [0x01u8; 12]; // decrypted JoinAccept fields
//! let mic = join_accept_mic(
//!     ProtocolVersion::V1_0,
//!     &nwk_key,
//!     &payload,
//!     DevNonce::from(0x0000),
//!     None,
//! )
//! .unwrap();
//! println!("MIC: {mic}");
//! ```

pub mod lorawan;

pub use lorawan::frame::{assemble_for_mic, DevNonce, JoinRequestContext};
pub use lorawan::keys::{derive_js_int_key, select_key, KeyMaterial, KeyRole, Mic, AES128};
pub use lorawan::mic::{compute_mic, verify_mic};
pub use lorawan::{MicError, ProtocolVersion};

/// Compute a JoinAccept MIC end to end: select the version's key,
/// assemble the MIC input, run the CMAC.
///
/// `nwk_key` is the 16-byte root key (AppKey/NwkKey); anything else is
/// `InvalidKeyLength`. `payload` is the DECRYPTED JoinAccept field block
/// (12–17 bytes, MHDR and MIC stripped). `context` carries the
/// JoinRequest's JoinEUI/DevEUI and is mandatory for 1.1.
pub fn join_accept_mic(
    version: ProtocolVersion,
    nwk_key: &[u8],
    payload: &[u8],
    dev_nonce: DevNonce,
    context: Option<&JoinRequestContext>,
) -> Result<Mic, MicError> {
    let nwk_key = AES128::from_slice(nwk_key)?;
    let material = KeyMaterial {
        nwk_key: &nwk_key,
        dev_eui: context.map(|c| c.dev_eui),
    };
    let key = select_key(version, KeyRole::JoinAcceptMic, &material)?;
    let frame = assemble_for_mic(version, payload, dev_nonce, context)?;
    Ok(compute_mic(&key, &frame))
}

/// Verify a received JoinAccept MIC.
///
/// `Ok(false)` is a mismatch — reject the join, but the inputs were
/// well-formed. Errors are reserved for malformed input.
pub fn verify_join_accept_mic(
    version: ProtocolVersion,
    nwk_key: &[u8],
    payload: &[u8],
    dev_nonce: DevNonce,
    context: Option<&JoinRequestContext>,
    candidate: &Mic,
) -> Result<bool, MicError> {
    let nwk_key = AES128::from_slice(nwk_key)?;
    let material = KeyMaterial {
        nwk_key: &nwk_key,
        dev_eui: context.map(|c| c.dev_eui),
    };
    let key = select_key(version, KeyRole::JoinAcceptMic, &material)?;
    let frame = assemble_for_mic(version, payload, dev_nonce, context)?;
    Ok(verify_mic(&key, &frame, candidate))
}
