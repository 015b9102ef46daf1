use std::fmt;

use thiserror::Error;

/// Reason a single codec step failed
///
/// Leaf codecs (integers, reals, strings, object identifiers, times) return
/// this directly; the engines attach the schema path and byte offset by
/// wrapping it in [`DecodeError`] or [`EncodeError`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    #[error("truncated input: need {needed} bytes, {available} available")]
    Truncated { needed: usize, available: usize },

    #[error("tag mismatch: expected {expected}, found {found}")]
    TagMismatch { expected: String, found: String },

    #[error("length {length} outside allowed range {min}..={max}")]
    LengthOutOfRange { length: usize, min: usize, max: usize },

    #[error("value {value} outside allowed range {min}..={max}")]
    ValueOutOfRange {
        value: String,
        min: String,
        max: String,
    },

    #[error("{remaining} unconsumed bytes at end of region")]
    TrailingData { remaining: usize },

    #[error("no choice alternative matches tag {found}")]
    NoMatchingChoice { found: String },

    #[error("choice value must select exactly one alternative: {0}")]
    AmbiguousOrMissingChoice(String),

    #[error("invalid date: {0}")]
    InvalidDate(String),

    #[error("malformed REAL: {0}")]
    MalformedReal(String),

    #[error("malformed OBJECT IDENTIFIER: {0}")]
    MalformedObjectIdentifier(String),

    #[error("unresolved schema reference: {0}")]
    UnresolvedReference(String),

    #[error("malformed content: {0}")]
    MalformedContent(String),

    #[error("non-minimal length encoding")]
    NonMinimalLength,

    #[error("invalid value: expected {expected}, found {found}")]
    InvalidValue { expected: String, found: String },

    #[error("missing required field `{0}`")]
    MissingField(String),

    #[error("nesting depth limit of {limit} exceeded")]
    DepthExceeded { limit: usize },
}

impl ErrorKind {
    /// Shorthand for an [`ErrorKind::InvalidValue`]
    pub fn invalid_value(expected: impl Into<String>, found: impl Into<String>) -> Self {
        ErrorKind::InvalidValue {
            expected: expected.into(),
            found: found.into(),
        }
    }
}

/// Result type for leaf codec operations
pub type CodecResult<T> = Result<T, ErrorKind>;

/// Location of a node inside a schema tree
///
/// Rendered as dotted field keys with `[i]` for repetition indices, e.g.
/// `tbsCertificate.extensions[2].extnID`. The root renders as `<root>`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct SchemaPath {
    segments: Vec<String>,
}

impl SchemaPath {
    pub fn new(segments: Vec<String>) -> Self {
        Self { segments }
    }

    pub fn root() -> Self {
        Self::default()
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }
}

impl fmt::Display for SchemaPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return write!(f, "<root>");
        }
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 && !segment.starts_with('[') {
                write!(f, ".")?;
            }
            write!(f, "{}", segment)?;
        }
        Ok(())
    }
}

/// Decode failure with the schema path and input offset where it occurred
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("decode failed at `{path}` (offset {offset}): {kind}")]
pub struct DecodeError {
    pub kind: ErrorKind,
    pub path: SchemaPath,
    pub offset: usize,
}

impl DecodeError {
    pub fn new(kind: ErrorKind, path: SchemaPath, offset: usize) -> Self {
        Self { kind, path, offset }
    }
}

/// Encode failure with the schema path of the offending node
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("encode failed at `{path}`: {kind}")]
pub struct EncodeError {
    pub kind: ErrorKind,
    pub path: SchemaPath,
}

impl EncodeError {
    pub fn new(kind: ErrorKind, path: SchemaPath) -> Self {
        Self { kind, path }
    }
}

/// Problems detected while validating a schema tree
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("duplicate field key `{key}` at `{path}`")]
    DuplicateKey { key: String, path: SchemaPath },

    #[error("duplicate choice label `{label}` at `{path}`")]
    DuplicateLabel { label: String, path: SchemaPath },

    #[error("choice at `{0}` has no alternatives")]
    EmptyChoice(SchemaPath),

    #[error("invalid constraint at `{path}`: {reason}")]
    InvalidConstraint { reason: String, path: SchemaPath },

    #[error("schema `{0}` is already bound")]
    AlreadyBound(String),

    #[error("model `{0}` is already registered")]
    DuplicateModel(String),
}

/// Umbrella error for callers that mix schema building, decoding and encoding
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DermodelError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("unknown model `{0}`")]
    UnknownModel(String),
}

pub type DecodeResult<T> = Result<T, DecodeError>;
pub type EncodeResult<T> = Result<T, EncodeError>;
pub type DermodelResult<T> = Result<T, DermodelError>;
