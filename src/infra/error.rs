//! Error types for legacy signature conversion.
//! One flat taxonomy: format rejections, read failures, bad arguments.

use thiserror::Error;

/// Result type for conversion operations
pub type ConvertResult<T> = Result<T, ConvertError>;

/// Errors surfaced by the converter.
///
/// `Format` and `Argument` carry stable, test-assertable messages; their
/// `Display` output is the message alone. A conversion stops at the first
/// failure, no partial output is produced.
#[derive(Error, Debug, miette::Diagnostic)]
pub enum ConvertError {
    /// Structural or semantic rejection of the input token.
    #[error("{0}")]
    Format(String),

    /// Read failure on the caller-supplied stream.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Missing or structurally invalid caller argument.
    #[error("{0}")]
    Argument(String),
}
