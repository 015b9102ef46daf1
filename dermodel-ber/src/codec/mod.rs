//! Content codecs for the primitive ASN.1 types
//!
//! These operate on content octets only; tag and length framing is handled
//! by the engines.

pub mod integer;
pub mod oid;
pub mod primitive;
pub mod real;
pub mod string;
pub mod time;

pub use primitive::{decode_primitive, encode_primitive};
