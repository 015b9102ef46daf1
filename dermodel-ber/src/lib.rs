//! BER/DER framing and schema engines for the dermodel ASN.1 codec
//!
//! - [`ber`]: tag and length framing, the input cursor and the output writer
//! - [`codec`]: content octets of the primitive types
//! - [`schema`]: the node tree describing a data shape
//! - [`engine`]: decoder and encoder driven by a schema
//!
//! ```
//! use dermodel_ber::{CodecConfig, Node, engine};
//! use dermodel_core::Value;
//!
//! let schema = Node::seq([("id", Node::int()), ("name", Node::utf8str())]);
//! let config = CodecConfig::default();
//! let value = engine::decode(&schema, &[0x30, 0x06, 0x02, 0x01, 0x07, 0x0C, 0x01, 0x61], &config)?;
//! assert_eq!(value.get("name"), Some(&Value::from("a")));
//! # Ok::<(), dermodel_core::DecodeError>(())
//! ```

pub mod ber;
pub mod codec;
pub mod config;
pub mod engine;
pub mod schema;

pub use ber::{BerLength, BerTag, BerTagClass, BerWriter, Cursor};
pub use config::{CodecConfig, DEFAULT_MAX_DEPTH, Encoding};
pub use engine::{Decoder, Encoder};
pub use schema::{
    CompositeKind, Constraints, Labels, Node, NodeKind, PrimitiveKind, Reference, RepeatedKind,
    Resolver, SchemaRef, TagOverride,
};
