//! Schema engines
//!
//! [`Decoder`] and [`Encoder`] walk a [`Node`] tree alongside the bytes or
//! the value being converted. Each engine is single-use for one top-level
//! call; the free functions below construct one per call.

pub mod decoder;
pub mod encoder;

pub use decoder::Decoder;
pub use encoder::Encoder;

use crate::config::CodecConfig;
use crate::schema::Node;
use dermodel_core::{DecodeResult, EncodeResult, Value};

/// Decode `input` against `node`; the whole input must be consumed
pub fn decode(node: &Node, input: &[u8], config: &CodecConfig) -> DecodeResult<Value> {
    Decoder::new(config).decode(node, input)
}

/// Encode `value` against `node` as DER
pub fn encode(node: &Node, value: &Value, config: &CodecConfig) -> EncodeResult<Vec<u8>> {
    Encoder::new(config).encode(node, value)
}
