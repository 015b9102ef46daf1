//! INTEGER / ENUMERATED content codec
//!
//! Content is the big-endian two's complement representation in the
//! minimum number of octets.

use dermodel_core::{BigInt, CodecResult, ErrorKind};

/// Minimal two's complement bytes of `value`
///
/// `128` encodes as `00 80`, `-129` as `FF 7F`, zero as a single `00`.
pub fn encode_integer(value: &BigInt) -> Vec<u8> {
    value.to_signed_bytes_be()
}

/// Decode two's complement content
///
/// Empty content is malformed. Redundant leading sign octets are accepted.
pub fn decode_integer(content: &[u8]) -> CodecResult<BigInt> {
    if content.is_empty() {
        return Err(ErrorKind::MalformedContent(
            "empty INTEGER content".to_string(),
        ));
    }
    Ok(BigInt::from_signed_bytes_be(content))
}

/// Inclusive range check
pub fn check_range(value: &BigInt, min: &BigInt, max: &BigInt) -> CodecResult<()> {
    if value < min || value > max {
        return Err(ErrorKind::ValueOutOfRange {
            value: value.to_string(),
            min: min.to_string(),
            max: max.to_string(),
        });
    }
    Ok(())
}
