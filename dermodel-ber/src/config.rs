//! Codec configuration

use dermodel_core::ErrorKind;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default nesting depth limit for decode and encode
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Input strictness
///
/// Output is always DER; this only affects what the decoder accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    /// Reject non-minimal length fields and non-canonical booleans
    #[default]
    Der,
    /// Accept any valid BER length and boolean form
    Ber,
}

impl Encoding {
    pub fn is_strict(&self) -> bool {
        matches!(self, Encoding::Der)
    }
}

impl FromStr for Encoding {
    type Err = ErrorKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "der" => Ok(Encoding::Der),
            "ber" => Ok(Encoding::Ber),
            other => Err(ErrorKind::invalid_value("`der` or `ber`", other)),
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Encoding::Der => write!(f, "der"),
            Encoding::Ber => write!(f, "ber"),
        }
    }
}

/// Options shared by the decoder and encoder
///
/// # Example
///
/// ```
/// use dermodel_ber::{CodecConfig, Encoding};
///
/// let config = CodecConfig::default()
///     .with_encoding(Encoding::Ber)
///     .with_max_depth(16);
/// assert_eq!(config.max_depth, 16);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    pub encoding: Encoding,
    pub max_depth: usize,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            encoding: Encoding::Der,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl CodecConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn der() -> Self {
        Self::default()
    }

    pub fn ber() -> Self {
        Self::default().with_encoding(Encoding::Ber)
    }

    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}
