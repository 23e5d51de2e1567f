// Adapters - External system implementations

pub mod json_annotations;
pub mod libav_media;
pub mod toml_config;

// Re-export adapters
pub use json_annotations::JsonAnnotationAdapter;
pub use libav_media::{LibavMatchMedia, LibavMediaAdapter};
pub use toml_config::TomlConfigAdapter;
