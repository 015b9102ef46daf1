//! Core types for the dermodel ASN.1 codec
//!
//! This crate provides the value model, error types and datatypes shared by
//! the schema engines in `dermodel-ber` and the `dermodel` facade.

pub mod datatypes;
pub mod error;
pub mod value;

pub use datatypes::{BitString, CivilDateTime, ObjectIdentifier, Timestamp};
pub use error::{
    CodecResult, DecodeError, DecodeResult, DermodelError, DermodelResult, EncodeError,
    EncodeResult, ErrorKind, SchemaError, SchemaPath,
};
pub use num_bigint::BigInt;
pub use value::{Fields, Value};
