use std::sync::Arc;

use crate::adapters::{JsonAnnotationAdapter, LibavMediaAdapter};
use crate::app::extract_interactor::ExtractInteractor;
use crate::domain::errors::DomainError;
use crate::domain::model::EncodingConfig;
use crate::ports::{AnnotationPort, MediaPort};

pub trait AppContainer: Send + Sync {
    fn extract_interactor(&self) -> Arc<ExtractInteractor>;
}

pub struct DefaultAppContainer {
    extract_interactor: Arc<ExtractInteractor>,
}

impl DefaultAppContainer {
    /// Wire the JSON annotation reader and the libav media backend
    pub fn new(encoding: EncodingConfig) -> Result<Self, DomainError> {
        let annotation_port = Arc::new(JsonAnnotationAdapter::new());
        let media_port = Arc::new(LibavMediaAdapter::new(encoding)?);

        let extract_interactor = Arc::new(ExtractInteractor::new(
            annotation_port as Arc<dyn AnnotationPort>,
            media_port as Arc<dyn MediaPort>,
        ));

        Ok(Self { extract_interactor })
    }
}

impl AppContainer for DefaultAppContainer {
    fn extract_interactor(&self) -> Arc<ExtractInteractor> {
        Arc::clone(&self.extract_interactor)
    }
}
