//! Declarative description of an ASN.1 data shape

pub mod builder;
pub mod node;
pub mod reference;

pub use node::{
    CompositeKind, Constraints, Labels, Node, NodeKind, PrimitiveKind, RepeatedKind, TagOverride,
};
pub use reference::{Reference, Resolver, SchemaRef};
