//! BER (Basic Encoding Rules) framing for ASN.1
//!
//! Each ASN.1 value is encoded as a TLV (Tag-Length-Value) triplet:
//!
//! ```text
//! [Tag] [Length] [Value]
//! ```
//!
//! ## Tag Encoding
//!
//! - **Class** (2 bits): Universal (00), Application (01), Context-specific (10), Private (11)
//! - **Constructed/Primitive** (1 bit): 0 = Primitive, 1 = Constructed
//! - **Tag Number** (5 bits): The tag number (0-30), or 11111 for the extended form
//!
//! ## Length Encoding
//!
//! - **Short form** (1 byte): lengths 0-127
//! - **Long form**: `0x80 | n` followed by `n` big-endian bytes
//! - **Indefinite form**: `0x80`, content closed by the End-of-Contents
//!   marker `00 00` (decode only, constructed values only)
//!
//! The [`Cursor`] reads framed input, the [`BerWriter`] produces DER.

pub mod cursor;
pub mod types;
pub mod writer;

pub use cursor::{Cursor, Mark, View};
pub use types::{BerLength, BerTag, BerTagClass};
pub use writer::{BerWriter, tlv};
