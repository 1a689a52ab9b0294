//! JoinAccept frame assembly for MIC computation.
//!
//! Builds the exact byte sequence the CMAC runs over. The layout is
//! version-dependent and order-sensitive:
//!
//!   1.0.x:  JoinAccept fields (decrypted, MHDR/MIC stripped)
//!   1.1:    0xFF | JoinEUI(8,LE) | DevEUI(8,LE) | DevNonce(2,LE) | fields
//!
//! Both variants take the DECRYPTED payload — the pre-encryption
//! plaintext the server MICs before encrypting for the air. Feeding the
//! encrypted-on-wire bytes yields a MIC that never validates against a
//! compliant peer.

use super::{MicError, ProtocolVersion};

/// JoinNonce(3) + NetID(3) + DevAddr(4) + DLSettings(1) + RxDelay(1).
pub const JOIN_ACCEPT_MIN_LEN: usize = 12;
/// Minimum fields plus a short CFList fragment; anything longer is not a
/// JoinAccept field block.
pub const JOIN_ACCEPT_MAX_LEN: usize = 17;

/// MIC-type marker prepended in the 1.1 layout (JoinReqType for a
/// JoinRequest-answering JoinAccept).
const JOIN_REQ_TYPE: u8 = 0xFF;

/// Per-join-attempt nonce chosen by the device, little-endian byte order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DevNonce(pub [u8; 2]);

impl From<u16> for DevNonce {
    fn from(v: u16) -> Self {
        DevNonce(v.to_le_bytes())
    }
}

/// Fields echoed from the JoinRequest that 1.1 folds into the MIC input.
/// EUIs are in the little-endian byte order they have on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinRequestContext {
    pub join_eui: [u8; 8],
    pub dev_eui: [u8; 8],
}

/// Assemble the byte sequence the JoinAccept MIC is computed over.
///
/// `payload` is the decrypted JoinAccept field block (12–17 bytes, MHDR
/// and MIC excluded). `context` is required for 1.1 and ignored for
/// 1.0.x, where the MIC covers only the fields themselves.
pub fn assemble_for_mic(
    version: ProtocolVersion,
    payload: &[u8],
    dev_nonce: DevNonce,
    context: Option<&JoinRequestContext>,
) -> Result<Vec<u8>, MicError> {
    if payload.len() < JOIN_ACCEPT_MIN_LEN || payload.len() > JOIN_ACCEPT_MAX_LEN {
        return Err(MicError::MalformedFrame {
            reason: format!(
                "JoinAccept payload must be {}-{} bytes, got {}",
                JOIN_ACCEPT_MIN_LEN,
                JOIN_ACCEPT_MAX_LEN,
                payload.len()
            ),
        });
    }

    match version {
        ProtocolVersion::V1_0 => Ok(payload.to_vec()),
        ProtocolVersion::V1_1 => {
            let ctx = context.ok_or_else(|| MicError::MalformedFrame {
                reason: "LoRaWAN 1.1 MIC input requires JoinEUI and DevEUI".to_string(),
            })?;

            // Field order is protocol-mandated; do not reorder.
            let mut msg = Vec::with_capacity(1 + 8 + 8 + 2 + payload.len());
            msg.push(JOIN_REQ_TYPE);
            msg.extend_from_slice(&ctx.join_eui);
            msg.extend_from_slice(&ctx.dev_eui);
            msg.extend_from_slice(&dev_nonce.0);
            msg.extend_from_slice(payload);
            Ok(msg)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAYLOAD_12: [u8; 12] = [
        0x01, 0x02, 0x03, 0x20, 0x00, 0x13, 0x04, 0x03, 0x02, 0x01, 0x03, 0x01,
    ];
    const CTX: JoinRequestContext = JoinRequestContext {
        join_eui: [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08],
        dev_eui: [0x11, 0x12, 0x13, 0x14, 0x15, 0x16, 0x17, 0x18],
    };

    #[test]
    fn test_v1_0_message_is_bare_payload() {
        let msg =
            assemble_for_mic(ProtocolVersion::V1_0, &PAYLOAD_12, DevNonce::from(0), None).unwrap();
        assert_eq!(msg, PAYLOAD_12.to_vec());
    }

    #[test]
    fn test_v1_1_message_layout() {
        let msg = assemble_for_mic(
            ProtocolVersion::V1_1,
            &PAYLOAD_12,
            DevNonce::from(0x1234),
            Some(&CTX),
        )
        .unwrap();

        // 0xFF | JoinEUI(8) | DevEUI(8) | DevNonce(2) | payload(12)
        assert_eq!(msg.len(), 1 + 8 + 8 + 2 + 12);
        assert_eq!(msg[0], 0xFF);
        assert_eq!(&msg[1..9], &CTX.join_eui);
        assert_eq!(&msg[9..17], &CTX.dev_eui);
        assert_eq!(&msg[17..19], &[0x34, 0x12]); // little-endian
        assert_eq!(&msg[19..], &PAYLOAD_12);
    }

    #[test]
    fn test_framing_differs_between_versions() {
        let v10 =
            assemble_for_mic(ProtocolVersion::V1_0, &PAYLOAD_12, DevNonce::from(7), None).unwrap();
        let v11 = assemble_for_mic(
            ProtocolVersion::V1_1,
            &PAYLOAD_12,
            DevNonce::from(7),
            Some(&CTX),
        )
        .unwrap();
        assert_ne!(v10, v11);
    }

    #[test]
    fn test_payload_length_bounds() {
        for len in [0usize, 11, 18, 29] {
            let payload = vec![0xAAu8; len];
            let err = assemble_for_mic(ProtocolVersion::V1_0, &payload, DevNonce::from(0), None)
                .unwrap_err();
            assert!(matches!(err, MicError::MalformedFrame { .. }), "len {len}");
        }
        // Both inclusive bounds are accepted
        for len in [12usize, 17] {
            let payload = vec![0xAAu8; len];
            assert!(
                assemble_for_mic(ProtocolVersion::V1_0, &payload, DevNonce::from(0), None).is_ok()
            );
        }
    }

    #[test]
    fn test_v1_1_requires_context() {
        let err = assemble_for_mic(ProtocolVersion::V1_1, &PAYLOAD_12, DevNonce::from(0), None)
            .unwrap_err();
        assert!(matches!(err, MicError::MalformedFrame { .. }));
    }

    #[test]
    fn test_dev_nonce_is_little_endian() {
        assert_eq!(DevNonce::from(0x0042).0, [0x42, 0x00]);
    }
}
