//! BER encoding types (Tag, Length)

use dermodel_core::{CodecResult, ErrorKind};
use std::fmt;

/// BER Tag Class
///
/// ASN.1 defines four tag classes:
/// - **Universal**: Standard ASN.1 types (INTEGER, OCTET STRING, etc.)
/// - **Application**: Application-specific types
/// - **Context-specific**: Context-dependent types (used in SEQUENCE/SET)
/// - **Private**: Private/implementation-specific types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BerTagClass {
    /// Universal class (00)
    Universal = 0,
    /// Application class (01)
    Application = 1,
    /// Context-specific class (10)
    ContextSpecific = 2,
    /// Private class (11)
    Private = 3,
}

impl BerTagClass {
    /// Get tag class from bits (bits 7-6 of tag byte)
    pub fn from_bits(bits: u8) -> Self {
        match (bits >> 6) & 0x03 {
            0 => BerTagClass::Universal,
            1 => BerTagClass::Application,
            2 => BerTagClass::ContextSpecific,
            _ => BerTagClass::Private,
        }
    }

    /// Convert tag class to bits (for encoding)
    pub fn to_bits(self) -> u8 {
        (self as u8) << 6
    }

    pub fn name(self) -> &'static str {
        match self {
            BerTagClass::Universal => "UNIVERSAL",
            BerTagClass::Application => "APPLICATION",
            BerTagClass::ContextSpecific => "CONTEXT",
            BerTagClass::Private => "PRIVATE",
        }
    }
}

/// BER Tag
///
/// A BER tag identifies the type of an ASN.1 value. It consists of:
/// - **Class**: Universal, Application, Context-specific, or Private
/// - **Constructed/Primitive**: Whether the value is constructed (contains other values)
/// - **Tag Number**: The actual tag number (0-30 for short form, or extended)
///
/// # Encoding Format
///
/// Short form (tag number 0-30):
/// ```text
/// Bits: 8 7 6 5 4 3 2 1
///       C C P T T T T T
/// ```
///
/// Extended form (tag number > 30):
/// ```text
/// First byte:  C C P 1 1 1 1 1  (all tag bits set to 1)
/// Following bytes: 1 T T T T T T T  (continuation bytes, last byte has bit 7 = 0)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BerTag {
    class: BerTagClass,
    constructed: bool,
    number: u32,
}

impl BerTag {
    pub fn new(class: BerTagClass, constructed: bool, number: u32) -> Self {
        Self {
            class,
            constructed,
            number,
        }
    }

    /// Create a Universal class tag
    pub fn universal(constructed: bool, number: u32) -> Self {
        Self::new(BerTagClass::Universal, constructed, number)
    }

    /// Create a Context-specific class tag
    pub fn context_specific(constructed: bool, number: u32) -> Self {
        Self::new(BerTagClass::ContextSpecific, constructed, number)
    }

    pub fn class(&self) -> BerTagClass {
        self.class
    }

    pub fn is_constructed(&self) -> bool {
        self.constructed
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    /// Same class and number, ignoring the constructed bit
    pub fn same_identity(&self, other: &BerTag) -> bool {
        self.class == other.class && self.number == other.number
    }

    /// True for the first octet of an End-of-Contents marker
    pub fn is_end_of_contents(&self) -> bool {
        self.class == BerTagClass::Universal && !self.constructed && self.number == 0
    }

    /// Encode tag to bytes
    ///
    /// Tag numbers up to 30 use the single-byte short form, larger numbers
    /// the extended form.
    pub fn encode(&self) -> Vec<u8> {
        let mut result = Vec::with_capacity(2);

        let class_bits = self.class.to_bits();
        let constructed_bit = if self.constructed { 0x20 } else { 0x00 };

        if self.number <= 30 {
            result.push(class_bits | constructed_bit | (self.number as u8 & 0x1F));
        } else {
            result.push(class_bits | constructed_bit | 0x1F);

            let mut remaining = self.number;
            let mut bytes = Vec::new();
            while remaining > 0 {
                bytes.push((remaining & 0x7F) as u8);
                remaining >>= 7;
            }

            // Most significant group first, continuation bit on all but the last
            for (i, &byte) in bytes.iter().rev().enumerate() {
                if i < bytes.len() - 1 {
                    result.push(byte | 0x80);
                } else {
                    result.push(byte);
                }
            }
        }

        result
    }

    /// Decode tag from bytes
    ///
    /// # Returns
    /// Returns `Ok((BerTag, bytes_consumed))` if successful
    ///
    /// # Error Handling
    /// Returns error if:
    /// - Buffer is too short
    /// - The extended form has a leading zero group or overflows `u32`
    pub fn decode(data: &[u8]) -> CodecResult<(Self, usize)> {
        let first_byte = *data.first().ok_or(ErrorKind::Truncated {
            needed: 1,
            available: 0,
        })?;
        let class = BerTagClass::from_bits(first_byte);
        let constructed = (first_byte & 0x20) != 0;
        let tag_bits = first_byte & 0x1F;

        if tag_bits < 31 {
            return Ok((Self::new(class, constructed, tag_bits as u32), 1));
        }

        let mut tag_number = 0u32;
        let mut pos = 1;
        loop {
            let byte = *data.get(pos).ok_or(ErrorKind::Truncated {
                needed: pos + 1,
                available: data.len(),
            })?;
            if pos == 1 && byte == 0x80 {
                return Err(ErrorKind::MalformedContent(
                    "extended tag number has a leading zero group".to_string(),
                ));
            }
            tag_number = tag_number
                .checked_mul(128)
                .map(|n| n | (byte & 0x7F) as u32)
                .ok_or_else(|| ErrorKind::MalformedContent("tag number too large".to_string()))?;
            pos += 1;
            if byte & 0x80 == 0 {
                break;
            }
        }

        Ok((Self::new(class, constructed, tag_number), pos))
    }
}

impl fmt::Display for BerTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} {}]", self.class.name(), self.number)?;
        if self.constructed {
            write!(f, " constructed")?;
        }
        Ok(())
    }
}

/// BER Length encoding
///
/// - **Short form**: lengths 0-127 in one byte
/// - **Long form**: `0x80 | n` followed by `n` big-endian length bytes
/// - **Indefinite form**: the single byte `0x80`; content runs until an
///   End-of-Contents marker (`00 00`). Only valid for constructed encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BerLength {
    Definite(usize),
    Indefinite,
}

impl BerLength {
    pub fn new(length: usize) -> Self {
        BerLength::Definite(length)
    }

    /// Get the length value, `None` for the indefinite form
    pub fn value(&self) -> Option<usize> {
        match self {
            BerLength::Definite(l) => Some(*l),
            BerLength::Indefinite => None,
        }
    }

    pub fn is_indefinite(&self) -> bool {
        matches!(self, BerLength::Indefinite)
    }

    /// Encode length to bytes, always in the minimal definite form
    ///
    /// The indefinite form encodes as the single byte `0x80`.
    pub fn encode(&self) -> Vec<u8> {
        let length = match self {
            BerLength::Indefinite => return vec![0x80],
            BerLength::Definite(length) => *length,
        };

        if length < 128 {
            return vec![length as u8];
        }

        let significant = length.to_be_bytes();
        let skip = significant.iter().take_while(|b| **b == 0).count();
        let mut result = Vec::with_capacity(1 + significant.len() - skip);
        result.push(0x80 | (significant.len() - skip) as u8);
        result.extend_from_slice(&significant[skip..]);
        result
    }

    /// Decode length from bytes
    ///
    /// With `strict` set, long forms that are not minimal are rejected with
    /// [`ErrorKind::NonMinimalLength`].
    ///
    /// # Returns
    /// Returns `Ok((BerLength, bytes_consumed))` if successful
    pub fn decode(data: &[u8], strict: bool) -> CodecResult<(Self, usize)> {
        let first_byte = *data.first().ok_or(ErrorKind::Truncated {
            needed: 1,
            available: 0,
        })?;

        if (first_byte & 0x80) == 0 {
            return Ok((BerLength::Definite(first_byte as usize), 1));
        }

        let num_bytes = (first_byte & 0x7F) as usize;
        if num_bytes == 0 {
            return Ok((BerLength::Indefinite, 1));
        }
        if num_bytes == 0x7F {
            return Err(ErrorKind::MalformedContent(
                "reserved length octet 0xFF".to_string(),
            ));
        }
        if data.len() < 1 + num_bytes {
            return Err(ErrorKind::Truncated {
                needed: 1 + num_bytes,
                available: data.len(),
            });
        }

        let length_bytes = &data[1..1 + num_bytes];
        let leading_zeros = length_bytes.iter().take_while(|b| **b == 0).count();
        if num_bytes - leading_zeros > std::mem::size_of::<usize>() {
            return Err(ErrorKind::MalformedContent(format!(
                "length field of {} bytes is too large",
                num_bytes
            )));
        }

        let length = length_bytes[leading_zeros..]
            .iter()
            .fold(0usize, |acc, b| (acc << 8) | *b as usize);

        if strict && (leading_zeros > 0 || length < 128) {
            return Err(ErrorKind::NonMinimalLength);
        }

        Ok((BerLength::Definite(length), 1 + num_bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ber_tag_short_form() {
        let tag = BerTag::universal(false, 2);
        assert_eq!(tag.encode(), vec![0x02]);
    }

    #[test]
    fn test_ber_tag_constructed() {
        let tag = BerTag::context_specific(true, 0);
        assert_eq!(tag.encode(), vec![0xA0]);
        assert_eq!(tag.to_string(), "[CONTEXT 0] constructed");
    }

    #[test]
    fn test_ber_tag_extended_form() {
        let tag = BerTag::context_specific(false, 201);
        let encoded = tag.encode();
        assert_eq!(encoded, vec![0x9F, 0x81, 0x49]);
        let (decoded, consumed) = BerTag::decode(&encoded).unwrap();
        assert_eq!(consumed, 3);
        assert_eq!(decoded, tag);
    }

    #[test]
    fn test_ber_tag_decode() {
        let (tag, consumed) = BerTag::decode(&[0x02]).unwrap();
        assert_eq!(consumed, 1);
        assert_eq!(tag.class(), BerTagClass::Universal);
        assert!(!tag.is_constructed());
        assert_eq!(tag.number(), 2);
    }

    #[test]
    fn test_ber_tag_decode_errors() {
        assert!(matches!(BerTag::decode(&[]), Err(ErrorKind::Truncated { .. })));
        assert!(matches!(
            BerTag::decode(&[0x1F, 0x81]),
            Err(ErrorKind::Truncated { .. })
        ));
        assert!(matches!(
            BerTag::decode(&[0x1F, 0x80, 0x01]),
            Err(ErrorKind::MalformedContent(_))
        ));
    }

    #[test]
    fn test_ber_length_short() {
        assert_eq!(BerLength::new(100).encode(), vec![100]);
    }

    #[test]
    fn test_ber_length_long() {
        assert_eq!(BerLength::new(1000).encode(), vec![0x82, 0x03, 0xE8]);
        assert_eq!(BerLength::new(200).encode(), vec![0x81, 0xC8]);
    }

    #[test]
    fn test_ber_length_decode() {
        let (length, consumed) = BerLength::decode(&[100], true).unwrap();
        assert_eq!(consumed, 1);
        assert_eq!(length.value(), Some(100));

        let (length, consumed) = BerLength::decode(&[0x82, 0x03, 0xE8], true).unwrap();
        assert_eq!(consumed, 3);
        assert_eq!(length, BerLength::Definite(1000));

        let (length, _) = BerLength::decode(&[0x80], true).unwrap();
        assert!(length.is_indefinite());
    }

    #[test]
    fn test_ber_length_minimality() {
        assert_eq!(
            BerLength::decode(&[0x81, 0x05], true),
            Err(ErrorKind::NonMinimalLength)
        );
        assert_eq!(
            BerLength::decode(&[0x82, 0x00, 0xC8], true),
            Err(ErrorKind::NonMinimalLength)
        );
        assert_eq!(
            BerLength::decode(&[0x81, 0x05], false),
            Ok((BerLength::Definite(5), 2))
        );
        assert!(matches!(
            BerLength::decode(&[0x82, 0x01], false),
            Err(ErrorKind::Truncated { .. })
        ));
    }
}
