//! dermodel - schema-driven ASN.1 BER/DER codec
//!
//! A model is a named schema tree. Decoding walks the tree against a byte
//! buffer and produces a [`Value`]; encoding walks it against a value and
//! produces canonical DER.
//!
//! # Architecture
//!
//! This library is organized as a workspace with multiple crates:
//!
//! - `dermodel-core`: value model, error types and datatypes
//! - `dermodel-ber`: tag/length framing, content codecs, schema tree and engines
//! - `dermodel`: named models and the model registry
//!
//! # Usage
//!
//! ```
//! use dermodel::{Model, Node, Value};
//!
//! let model = Model::define("Pair", |_| {
//!     Node::seq([("key", Node::bool()), ("value", Node::int().optional())])
//! })?;
//!
//! let value = model.decode(&[0x30, 0x03, 0x01, 0x01, 0xFF])?;
//! assert_eq!(value.get("key"), Some(&Value::Bool(true)));
//! assert_eq!(model.encode(&value)?, vec![0x30, 0x03, 0x01, 0x01, 0xFF]);
//! # Ok::<(), dermodel::DermodelError>(())
//! ```

pub mod model;
pub mod registry;

#[cfg(test)]
mod vectors;

pub use model::Model;
pub use registry::ModelRegistry;

// Re-export core types
pub use dermodel_core::datatypes::*;
pub use dermodel_core::{
    BigInt, DecodeError, DecodeResult, DermodelError, DermodelResult, EncodeError, EncodeResult,
    ErrorKind, Fields, SchemaError, SchemaPath, Value,
};

// Re-export codec API
pub use dermodel_ber::{
    BerTagClass, CodecConfig, Encoding, Node, NodeKind, PrimitiveKind, Reference, SchemaRef,
    TagOverride,
};

pub mod ber {
    pub use dermodel_ber::ber::*;
}

pub mod engine {
    pub use dermodel_ber::engine::*;
}
