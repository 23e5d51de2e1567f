// Domain errors - Error types for the domain layer

use std::fmt;

/// Domain-specific error types
#[derive(Debug, Clone, PartialEq)]
pub enum DomainError {
    /// Invalid arguments or configuration values
    BadArgs(String),
    /// File or directory not found
    FileNotFound(String),
    /// Annotation document could not be read or is missing required fields
    MalformedAnnotations(String),
    /// Half indicator other than '1' or '2'
    InvalidHalf(String),
    /// Window category not present in the window table
    UnknownWindow(String),
    /// A video source could not be opened or probed
    SourceOpen(String),
    /// Decoding or encoding failed for a single artifact
    ExtractionFailed(String),
    /// Filesystem failure while routing or writing output
    FsFail(String),
    /// Internal error
    InternalError(String),
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomainError::BadArgs(msg) => write!(f, "Bad arguments: {}", msg),
            DomainError::FileNotFound(msg) => write!(f, "File not found: {}", msg),
            DomainError::MalformedAnnotations(msg) => write!(f, "Malformed annotations: {}", msg),
            DomainError::InvalidHalf(msg) => write!(f, "Invalid half indicator: {}", msg),
            DomainError::UnknownWindow(msg) => write!(f, "Unknown extraction window: {}", msg),
            DomainError::SourceOpen(msg) => write!(f, "Failed to open video source: {}", msg),
            DomainError::ExtractionFailed(msg) => write!(f, "Extraction failed: {}", msg),
            DomainError::FsFail(msg) => write!(f, "Filesystem error: {}", msg),
            DomainError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for DomainError {}
