//! Error types for container I/O

use thiserror::Error;

/// Errors that can occur while opening or saving a deck package
#[derive(Debug, Error)]
pub enum StoreError {
    /// IO error (file not found, permission denied, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// ZIP archive error
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// XML parsing error
    #[error("XML parsing error: {0}")]
    XmlParse(String),

    /// Missing required part
    #[error("Missing required part: {0}")]
    MissingPart(String),

    /// Invalid package structure
    #[error("Invalid package structure: {0}")]
    InvalidPackage(String),

    /// Package model error
    #[error("Model error: {0}")]
    Model(#[from] deck_model::ModelError),

    /// UTF-8 encoding error
    #[error("UTF-8 encoding error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

impl From<quick_xml::Error> for StoreError {
    fn from(err: quick_xml::Error) -> Self {
        StoreError::XmlParse(err.to_string())
    }
}

/// Result type for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;
