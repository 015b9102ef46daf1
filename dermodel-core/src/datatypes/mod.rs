//! Value datatypes that need more structure than a Rust primitive

pub mod bit_string;
pub mod object_identifier;
pub mod timestamp;

pub use bit_string::BitString;
pub use object_identifier::ObjectIdentifier;
pub use timestamp::{CivilDateTime, Timestamp};
