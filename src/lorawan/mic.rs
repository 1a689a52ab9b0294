//! CMAC-AES128 MIC computation and constant-time verification.
//!
//! The LoRaWAN MIC is the first 4 bytes of the AES-CMAC tag. The
//! truncation is protocol-mandated, not a tunable. Verification compares
//! in constant time so match-prefix length never shows up as a timing
//! difference to an on-path attacker probing a join server.

use aes::cipher::generic_array::GenericArray;
use aes::Aes128;
use cmac::{Cmac, Mac};

use super::keys::{Mic, AES128};

fn cmac(key: &AES128, frame: &[u8]) -> Cmac<Aes128> {
    let mut mac = <Cmac<Aes128> as Mac>::new(GenericArray::from_slice(key.as_bytes()));
    mac.update(frame);
    mac
}

/// Compute the 4-byte MIC over an assembled frame.
///
/// Pure and deterministic: same (key, frame) always yields the same MIC.
pub fn compute_mic(key: &AES128, frame: &[u8]) -> Mic {
    let tag = cmac(key, frame).finalize().into_bytes();
    let mut mic = [0u8; 4];
    mic.copy_from_slice(&tag[..4]);
    Mic(mic)
}

/// Check a candidate MIC against the frame.
///
/// Constant-time over the candidate bytes (`verify_truncated_left`
/// compares via `subtle` under the hood). `false` means "reject the
/// join" — a protocol outcome, not an input error.
pub fn verify_mic(key: &AES128, frame: &[u8], candidate: &Mic) -> bool {
    cmac(key, frame).verify_truncated_left(&candidate.0).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    // RFC 4493 test key and vectors anchor the CMAC wiring.
    const RFC4493_KEY: [u8; 16] = [
        0x2B, 0x7E, 0x15, 0x16, 0x28, 0xAE, 0xD2, 0xA6, 0xAB, 0xF7, 0x15, 0x88, 0x09, 0xCF,
        0x4F, 0x3C,
    ];

    #[test]
    fn test_rfc4493_empty_message() {
        let key = AES128::from(RFC4493_KEY);
        // AES-CMAC("") = bb1d6929 e9593728 7fa37d12 9b756746
        assert_eq!(compute_mic(&key, &[]), Mic([0xBB, 0x1D, 0x69, 0x29]));
    }

    #[test]
    fn test_rfc4493_single_block() {
        let key = AES128::from(RFC4493_KEY);
        let msg = [
            0x6B, 0xC1, 0xBE, 0xE2, 0x2E, 0x40, 0x9F, 0x96, 0xE9, 0x3D, 0x7E, 0x11, 0x73, 0x93,
            0x17, 0x2A,
        ];
        // AES-CMAC(msg) = 070a16b4 6b4d4144 f79bdd9d d04a287c
        assert_eq!(compute_mic(&key, &msg), Mic([0x07, 0x0A, 0x16, 0xB4]));
    }

    #[test]
    fn test_compute_is_deterministic() {
        let key = AES128::from(RFC4493_KEY);
        let frame = [0x20, 0x8F, 0x00, 0x00, 0x13, 0x00];
        assert_eq!(compute_mic(&key, &frame), compute_mic(&key, &frame));
    }

    #[test]
    fn test_verify_roundtrip() {
        let key = AES128::from(RFC4493_KEY);
        let frame = b"joinaccept field block";
        let mic = compute_mic(&key, frame);
        assert!(verify_mic(&key, frame, &mic));

        let mut wrong = mic;
        wrong.0[3] ^= 0x01; // last byte flipped
        assert!(!verify_mic(&key, frame, &wrong));
    }

    #[test]
    fn test_mismatch_at_every_byte_position() {
        let key = AES128::from(RFC4493_KEY);
        let frame = [0x42u8; 12];
        let mic = compute_mic(&key, &frame);
        for i in 0..4 {
            let mut wrong = mic;
            wrong.0[i] ^= 0x80;
            assert!(!verify_mic(&key, &frame, &wrong), "byte {i}");
        }
    }

    #[test]
    fn test_single_bit_flip_sensitivity() {
        let key = AES128::from(RFC4493_KEY);
        let frame = [0x5Au8; 16];
        let base = compute_mic(&key, &frame);

        // Deterministic xorshift picks the bit positions
        let mut state: u32 = 0xDEAD_BEEF;
        let mut rng = || {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            state
        };

        for _ in 0..10 {
            let bit = (rng() as usize) % (frame.len() * 8);
            let mut flipped = frame;
            flipped[bit / 8] ^= 1 << (bit % 8);
            assert_ne!(compute_mic(&key, &flipped), base, "frame bit {bit}");
        }
        for _ in 0..10 {
            let bit = (rng() as usize) % 128;
            let mut key_bytes = RFC4493_KEY;
            key_bytes[bit / 8] ^= 1 << (bit % 8);
            assert_ne!(
                compute_mic(&AES128::from(key_bytes), &frame),
                base,
                "key bit {bit}"
            );
        }
    }
}
