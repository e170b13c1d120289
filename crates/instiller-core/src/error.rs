use thiserror::Error;

/// Core error type shared across instiller crates.
#[derive(Debug, Error)]
pub enum Error {
    /// A type was referenced but never described to the registry.
    #[error("unknown type: {0}")]
    UnknownType(String),
    /// A synthesized value cannot be represented as its declared type.
    #[error("invalid value: {0}")]
    InvalidValue(String),
    /// A requested shape is not supported.
    #[error("unsupported: {0}")]
    Unsupported(String),
}

/// Convenience alias for results returned by instiller crates.
pub type Result<T> = std::result::Result<T, Error>;
