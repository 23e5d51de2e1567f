// TOML config adapter - Configuration management using TOML files

use std::path::{Path, PathBuf};

use tracing::info;

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::ports::*;

/// TOML configuration adapter
pub struct TomlConfigAdapter {
    search_paths: Vec<PathBuf>,
}

impl TomlConfigAdapter {
    /// Create new TOML config adapter searching the standard locations
    pub fn new() -> Self {
        Self {
            search_paths: vec![
                PathBuf::from("eventcut.toml"),
                PathBuf::from("config").join("eventcut.toml"),
            ],
        }
    }

    /// Create an adapter searching only the given locations
    pub fn with_search_paths(search_paths: Vec<PathBuf>) -> Self {
        Self { search_paths }
    }

    /// Parse configuration from a TOML string
    pub fn parse(content: &str) -> Result<ExtractionConfig, DomainError> {
        toml::from_str(content)
            .map_err(|e| DomainError::BadArgs(format!("Failed to parse TOML config: {}", e)))
    }

    fn read_file(path: &Path) -> Result<ExtractionConfig, DomainError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            DomainError::FsFail(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        Self::parse(&content)
    }
}

impl Default for TomlConfigAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigPort for TomlConfigAdapter {
    fn load_config(&self, file_path: Option<&Path>) -> Result<ExtractionConfig, DomainError> {
        if let Some(path) = file_path {
            if !path.exists() {
                return Err(DomainError::FileNotFound(format!(
                    "Config file does not exist: {}",
                    path.display()
                )));
            }
            info!("Loading configuration from: {}", path.display());
            return Self::read_file(path);
        }

        for path in &self.search_paths {
            if path.exists() {
                info!("Loading configuration from: {}", path.display());
                return Self::read_file(path);
            }
        }

        info!("No config file found, using defaults");
        Ok(ExtractionConfig::default())
    }

    fn default_config_paths(&self) -> Vec<PathBuf> {
        self.search_paths.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_when_no_file_found() {
        let dir = TempDir::new().unwrap();
        let adapter = TomlConfigAdapter::with_search_paths(vec![dir.path().join("missing.toml")]);
        let config = adapter.load_config(None).unwrap();
        assert_eq!(config, ExtractionConfig::default());
    }

    #[test]
    fn test_first_existing_search_path_wins() {
        let dir = TempDir::new().unwrap();
        let second = dir.path().join("second.toml");
        std::fs::write(&second, "label_field = \"change_type\"\nevent = \"logo\"\nmode = \"frame\"\n").unwrap();

        let adapter = TomlConfigAdapter::with_search_paths(vec![dir.path().join("first.toml"), second]);
        let config = adapter.load_config(None).unwrap();
        assert_eq!(config.label_field, "change_type");
        assert_eq!(config.event.as_deref(), Some("logo"));
        assert_eq!(config.mode, ExtractionMode::Frame);
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let adapter = TomlConfigAdapter::with_search_paths(vec![]);
        let result = adapter.load_config(Some(Path::new("/nonexistent/eventcut.toml")));
        assert!(matches!(result, Err(DomainError::FileNotFound(_))));
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        assert!(TomlConfigAdapter::parse("evnet = \"Corner\"").is_err());
        assert!(TomlConfigAdapter::parse("[encoding]\ncrf = \"high\"").is_err());
    }
}
