//! Error types for symbol encoding.

use thiserror::Error;

pub type QrResult<T> = Result<T, QrError>;

/// Errors that can occur while encoding a symbol. Every failure carries a
/// human-readable message; none of the encoding paths panic.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum QrError {
    /// No permitted version can hold the data with the chosen parameters.
    #[error("data overflow: {0}")]
    DataOverflow(String),

    /// Version out of range, or a version/micro-preference conflict.
    #[error("invalid version: {0}")]
    InvalidVersion(String),

    /// Content cannot be represented in the requested mode, or the mode is
    /// not available in the chosen symbol.
    #[error("invalid mode: {0}")]
    InvalidMode(String),

    /// Error correction level not permitted for the chosen symbol.
    #[error("invalid error correction level: {0}")]
    InvalidErrorLevel(String),

    /// Mask index out of range for the symbol kind.
    #[error("invalid mask: {0}")]
    InvalidMask(String),

    /// Malformed request, e.g. empty content.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Content that no supported byte encoding can represent.
    #[error("invalid content: {0}")]
    InvalidContent(String),

    /// Unknown encoding label, or an encoding that cannot be signalled in
    /// the chosen symbol.
    #[error("invalid encoding: {0}")]
    InvalidEncoding(String),
}

impl QrError {
    pub fn data_overflow(msg: impl Into<String>) -> Self {
        QrError::DataOverflow(msg.into())
    }

    pub fn invalid_version(msg: impl Into<String>) -> Self {
        QrError::InvalidVersion(msg.into())
    }

    pub fn invalid_mode(msg: impl Into<String>) -> Self {
        QrError::InvalidMode(msg.into())
    }

    pub fn invalid_error_level(msg: impl Into<String>) -> Self {
        QrError::InvalidErrorLevel(msg.into())
    }

    pub fn invalid_mask(msg: impl Into<String>) -> Self {
        QrError::InvalidMask(msg.into())
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        QrError::InvalidInput(msg.into())
    }

    pub fn invalid_content(msg: impl Into<String>) -> Self {
        QrError::InvalidContent(msg.into())
    }

    pub fn invalid_encoding(msg: impl Into<String>) -> Self {
        QrError::InvalidEncoding(msg.into())
    }
}
