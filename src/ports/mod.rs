// Ports - Interface definitions (contracts)

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::domain::errors::*;
use crate::domain::model::*;

/// Port for reading a match's annotation document
#[async_trait]
pub trait AnnotationPort: Send + Sync {
    /// Load every annotation of the document, in file order
    async fn load_annotations(&self, file_path: &Path) -> Result<Vec<Annotation>, DomainError>;
}

/// Port for opening the two video halves of a match
pub trait MediaPort: Send + Sync {
    /// Open both halves. Failure here is fatal for the match.
    ///
    /// The returned sources stay open until dropped; callers keep them for a
    /// whole batch and drop them once.
    fn open_match(&self, halves: &HalfPair<PathBuf>) -> Result<Box<dyn MatchMedia>, DomainError>;
}

/// Both open halves of one match.
///
/// Decoders are stateful, so items are extracted one after another.
pub trait MatchMedia {
    /// Frame rate, frame count and duration of one half
    fn half_info(&self, half: Half) -> HalfInfo;

    /// Seek to `frame_index`, decode exactly one frame and write it as an image
    fn extract_frame(&mut self, half: Half, frame_index: i64, destination: &Path) -> Result<(), DomainError>;

    /// Cut `range` out of one half, re-encoding video and keeping audio.
    /// An end past the source duration truncates the clip.
    fn extract_clip(&mut self, half: Half, range: &ClipRange, destination: &Path) -> Result<(), DomainError>;
}

/// Port for configuration management
pub trait ConfigPort: Send + Sync {
    /// Load configuration from an explicit file, or from the default locations
    fn load_config(&self, file_path: Option<&Path>) -> Result<ExtractionConfig, DomainError>;

    /// Files searched when no explicit path is given
    fn default_config_paths(&self) -> Vec<PathBuf>;
}
