//! Error type shared by every loader, codec and manager in the engine.

use std::io;
use std::path::PathBuf;

/// Engine error
///
/// Errors propagate to the operation boundary (`load`, `save`, `inject`) and
/// are never retried.
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    /// A well-known label or asset is absent from the project or model
    #[error("missing asset: {0}")]
    MissingAsset(String),

    /// Byte length inconsistent with the declared structure
    #[error("size mismatch for {name}: expected {expected}, got {actual} bytes")]
    SizeMismatch {
        name: String,
        expected: String,
        actual: usize,
    },

    /// `goto` could not find a label in an assembly source
    #[error("label {label} not found in {path}")]
    LabelNotFound { label: String, path: PathBuf },

    /// A label could not be resolved in the ROM symbol table
    #[error("unknown symbol: {0}")]
    UnknownSymbol(String),

    /// A read or write fell outside the image
    #[error("access of {len} bytes at {offset:#08X} is outside the image ({size} bytes)")]
    OutOfRange { offset: u32, len: usize, size: usize },

    /// A PC-relative target is further than a signed 16-bit displacement
    #[error("displacement from {symbol:#08X} to {data:#08X} does not fit in 16 bits")]
    DisplacementOverflow { symbol: u32, data: u32 },

    /// A pending write does not fit in its section or the image
    #[error("write to {target} needs {needed} bytes but only {available} are available")]
    CapacityOverflow {
        target: String,
        needed: usize,
        available: usize,
    },

    /// Filesystem failure
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Malformed assembly source, or a token of the wrong kind
    #[error("{path}:{line}: {message}")]
    Syntax {
        path: PathBuf,
        line: usize,
        message: String,
    },

    /// Two assets would share a name
    #[error("an asset named {0} already exists")]
    DuplicateName(String),

    /// Text with a character the game's one-byte, zero-terminated strings
    /// cannot hold
    #[error("cannot encode {character:?} in {text:?}")]
    Unencodable { text: String, character: char },

    /// Room, string or table index out of bounds
    #[error("index {index} out of range (count {count})")]
    InvalidIndex { index: usize, count: usize },
}

impl DataError {
    /// Wrap an I/O error with the path it occurred on.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn size_mismatch(
        name: impl Into<String>,
        expected: impl Into<String>,
        actual: usize,
    ) -> Self {
        Self::SizeMismatch {
            name: name.into(),
            expected: expected.into(),
            actual,
        }
    }
}

/// Result alias used throughout the engine.
pub type Result<T> = std::result::Result<T, DataError>;
