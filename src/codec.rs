use alloy::primitives::{U256, hex};

use crate::error::{Error, Result};

// Counters on the wire (deposit amounts, the contract's deposit count and the
// event's packed index) are little-endian byte strings. The deposit count is
// 8 bytes today but the decoder accepts any width up to a full word.
pub const MAX_COUNTER_BYTES: usize = 32;

pub fn decode_le(bytes: &[u8]) -> Result<U256> {
    if bytes.len() > MAX_COUNTER_BYTES {
        return Err(Error::MalformedEncoding(format!(
            "counter is {} bytes, max {}",
            bytes.len(),
            MAX_COUNTER_BYTES
        )));
    }
    Ok(U256::from_le_slice(bytes))
}

pub fn encode_le(value: U256, width: usize) -> Result<Vec<u8>> {
    if width > MAX_COUNTER_BYTES {
        return Err(Error::MalformedEncoding(format!(
            "counter width {} exceeds max {}",
            width, MAX_COUNTER_BYTES
        )));
    }
    let bytes = value.to_le_bytes::<MAX_COUNTER_BYTES>();
    if bytes[width..].iter().any(|b| *b != 0) {
        return Err(Error::MalformedEncoding(format!(
            "value {} does not fit in {} bytes",
            value, width
        )));
    }
    Ok(bytes[..width].to_vec())
}

/// Hex string to raw bytes, an optional `0x` prefix is tolerated. Byte
/// pairing requires an even number of digits, odd-length input is an error
/// rather than getting zero padded on either end.
pub fn hex_to_bytes(s: &str) -> Result<Vec<u8>> {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    if digits.len() % 2 != 0 {
        return Err(Error::MalformedEncoding(format!(
            "odd-length hex string ({} digits)",
            digits.len()
        )));
    }
    hex::decode(digits).map_err(|e| Error::MalformedEncoding(e.to_string()))
}

pub fn decode_le_hex(s: &str) -> Result<U256> {
    decode_le(&hex_to_bytes(s)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn le_round_trip() {
        for (value, width) in [
            (0u64, 1usize),
            (1, 1),
            (255, 1),
            (256, 2),
            (44427, 8),
            (u64::MAX, 8),
            (u64::MAX, 16),
        ] {
            let value = U256::from(value);
            let encoded = encode_le(value, width).unwrap();
            assert_eq!(encoded.len(), width);
            assert_eq!(decode_le(&encoded).unwrap(), value);
        }
    }

    #[test]
    fn le_round_trip_wide() {
        let value = U256::from(1u128 << 100);
        let encoded = encode_le(value, 32).unwrap();
        assert_eq!(decode_le(&encoded).unwrap(), value);
    }

    #[test]
    fn decode_le_hex_fixture() {
        // 0xad8b little-endian
        assert_eq!(
            decode_le_hex("8bad000000000000").unwrap(),
            U256::from(44427u64)
        );
        assert_eq!(
            decode_le_hex("0x8bad000000000000").unwrap(),
            U256::from(44427u64)
        );
    }

    #[test]
    fn decode_zero_width() {
        assert_eq!(decode_le(&[]).unwrap(), U256::ZERO);
        assert_eq!(decode_le(&[0u8; 8]).unwrap(), U256::ZERO);
    }

    #[test]
    fn odd_length_hex_is_rejected() {
        for input in ["abc", "0xabc", "f"] {
            match hex_to_bytes(input) {
                Err(Error::MalformedEncoding(_)) => (),
                other => panic!("expected MalformedEncoding, got {:?}", other),
            }
        }
    }

    #[test]
    fn invalid_hex_digits_are_rejected() {
        assert!(matches!(
            hex_to_bytes("zz"),
            Err(Error::MalformedEncoding(_))
        ));
    }

    #[test]
    fn encode_rejects_value_wider_than_width() {
        assert!(matches!(
            encode_le(U256::from(256u64), 1),
            Err(Error::MalformedEncoding(_))
        ));
    }

    #[test]
    fn decode_rejects_overlong_input() {
        assert!(matches!(
            decode_le(&[0u8; 33]),
            Err(Error::MalformedEncoding(_))
        ));
    }
}
