// JSON annotation adapter - Reads per-match label files

use std::path::Path;

use async_trait::async_trait;
use tracing::debug;

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::ports::*;

/// Reads `Labels-v2.json` style documents from disk
pub struct JsonAnnotationAdapter;

impl JsonAnnotationAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for JsonAnnotationAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AnnotationPort for JsonAnnotationAdapter {
    async fn load_annotations(&self, file_path: &Path) -> Result<Vec<Annotation>, DomainError> {
        let content = tokio::fs::read_to_string(file_path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                DomainError::FileNotFound(file_path.display().to_string())
            } else {
                DomainError::MalformedAnnotations(format!("{}: {}", file_path.display(), e))
            }
        })?;

        let annotations = AnnotationDocument::from_json_str(&content)
            .map_err(|e| match e {
                DomainError::MalformedAnnotations(msg) => {
                    DomainError::MalformedAnnotations(format!("{}: {}", file_path.display(), msg))
                }
                other => other,
            })?
            .into_annotations();

        debug!(path = %file_path.display(), count = annotations.len(), "Loaded annotations");
        Ok(annotations)
    }
}
