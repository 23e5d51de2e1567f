//! Error handling for the media layer

use thiserror::Error;

use crate::domain::errors::DomainError;

/// Errors raised while reading or writing media through libav
#[derive(Error, Debug)]
pub enum MediaError {
    /// FFmpeg initialization error
    #[error("Failed to initialize FFmpeg: {message}")]
    FFmpegInitError { message: String },

    /// Video source could not be opened
    #[error("Failed to open {path}: {message}")]
    OpenError { path: String, message: String },

    /// Source has no usable video stream
    #[error("No video stream in {path}")]
    NoVideoStream { path: String },

    /// Source reports no frame rate
    #[error("Unknown frame rate in {path}")]
    UnknownFrameRate { path: String },

    /// Requested frame could not be decoded
    #[error("Failed to decode frame {frame}: {message}")]
    DecodeError { frame: i64, message: String },

    /// Clip encoding failed
    #[error("Failed to encode clip: {message}")]
    EncodeError { message: String },

    /// Encoder not available in this libav build
    #[error("Encoder not found: {name}")]
    EncoderNotFound { name: String },

    /// Image write error
    #[error("Failed to write image: {0}")]
    ImageError(#[from] image::ImageError),

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// FFmpeg error
    #[error("FFmpeg error: {0}")]
    FFmpegError(#[from] ffmpeg_next::Error),
}

/// Result type alias for media operations
pub type MediaResult<T> = std::result::Result<T, MediaError>;

impl From<MediaError> for DomainError {
    fn from(error: MediaError) -> Self {
        match error {
            MediaError::FFmpegInitError { .. }
            | MediaError::OpenError { .. }
            | MediaError::NoVideoStream { .. }
            | MediaError::UnknownFrameRate { .. } => DomainError::SourceOpen(error.to_string()),
            _ => DomainError::ExtractionFailed(error.to_string()),
        }
    }
}
