//! BIT STRING value type

use crate::error::{CodecResult, ErrorKind};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Arbitrary string of bits, stored MSB-first in whole bytes.
///
/// The last byte may carry up to 7 padding bits, which is exactly what the
/// leading "unused bits" octet of a BER BIT STRING describes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawBitString")]
pub struct BitString {
    #[serde(with = "serde_bytes")]
    bytes: Vec<u8>,
    num_bits: usize,
}

#[derive(Deserialize)]
struct RawBitString {
    #[serde(with = "serde_bytes")]
    bytes: Vec<u8>,
    num_bits: usize,
}

impl TryFrom<RawBitString> for BitString {
    type Error = ErrorKind;

    fn try_from(raw: RawBitString) -> Result<Self, Self::Error> {
        Self::new(raw.bytes, raw.num_bits)
    }
}

impl BitString {
    /// Construct a new bit string object.
    ///
    /// # Errors
    ///
    /// Returns an error if `num_bits` does not fit `bytes`, or leaves more
    /// than 7 unused bits in the final byte.
    pub fn new(bytes: Vec<u8>, num_bits: usize) -> CodecResult<Self> {
        let capacity = bytes.len() * 8;
        if num_bits > capacity || capacity - num_bits > 7 {
            return Err(ErrorKind::MalformedContent(format!(
                "{} bits do not fit {} bytes",
                num_bits,
                bytes.len()
            )));
        }

        Ok(Self { bytes, num_bits })
    }

    /// Bit string whose length is a whole number of bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        let num_bits = bytes.len() * 8;
        Self { bytes, num_bits }
    }

    /// Build from the pieces of a BER content: unused-bit count plus data bytes.
    pub fn from_unused_bits(bytes: Vec<u8>, unused_bits: u8) -> CodecResult<Self> {
        if unused_bits > 7 || (bytes.is_empty() && unused_bits != 0) {
            return Err(ErrorKind::MalformedContent(format!(
                "invalid unused bit count {} for {} data bytes",
                unused_bits,
                bytes.len()
            )));
        }
        let num_bits = bytes.len() * 8 - unused_bits as usize;
        Ok(Self { bytes, num_bits })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn num_bits(&self) -> usize {
        self.num_bits
    }

    /// Number of padding bits in the last byte (0-7).
    pub fn unused_bits(&self) -> u8 {
        (self.bytes.len() * 8 - self.num_bits) as u8
    }

    /// Get the bit at a specific position (0 = MSB of the first byte)
    pub fn get_bit(&self, index: usize) -> Option<bool> {
        if index >= self.num_bits {
            return None;
        }
        let byte_index = index / 8;
        let bit_index = 7 - (index % 8); // MSB first
        Some((self.bytes[byte_index] >> bit_index) & 1 == 1)
    }
}

impl fmt::Display for BitString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in 0..self.num_bits {
            let bit = self.get_bit(i).unwrap_or(false);
            write!(f, "{}", if bit { '1' } else { '0' })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_string_new() {
        let bytes = vec![0xFF, 0x00, 0xAA];
        let bit_string = BitString::new(bytes.clone(), 24).unwrap();
        assert_eq!(bit_string.as_bytes(), &bytes);
        assert_eq!(bit_string.num_bits(), 24);
        assert_eq!(bit_string.unused_bits(), 0);
    }

    #[test]
    fn test_bit_string_invalid() {
        assert!(BitString::new(vec![0xFF], 16).is_err());
        // more than 7 padding bits
        assert!(BitString::new(vec![0xFF, 0x00], 4).is_err());
    }

    #[test]
    fn test_bit_string_deserialize_validates() {
        let bits = BitString::new(vec![0xF0], 4).unwrap();
        let json = serde_json::to_string(&bits).unwrap();
        assert_eq!(serde_json::from_str::<BitString>(&json).unwrap(), bits);

        assert!(serde_json::from_str::<BitString>(r#"{"bytes":[1],"num_bits":64}"#).is_err());
        assert!(serde_json::from_str::<BitString>(r#"{"bytes":[1,2],"num_bits":3}"#).is_err());
    }

    #[test]
    fn test_bit_string_partial_byte() {
        let bit_string = BitString::new(vec![0xF0], 4).unwrap();
        assert_eq!(bit_string.num_bits(), 4);
        assert_eq!(bit_string.unused_bits(), 4);
        assert_eq!(bit_string.to_string(), "1111");
    }

    #[test]
    fn test_from_unused_bits() {
        let bits = BitString::from_unused_bits(vec![0x6E, 0x5D, 0xC0], 6).unwrap();
        assert_eq!(bits.num_bits(), 18);
        assert_eq!(bits.get_bit(1), Some(true));
        assert_eq!(bits.get_bit(18), None);
        assert!(BitString::from_unused_bits(vec![], 1).is_err());
        assert!(BitString::from_unused_bits(vec![0x00], 8).is_err());
    }
}
