//! EventCut
//!
//! Extracts single frames or short clips around annotated events from
//! football match recordings. A corpus is organized as
//! `<league>/<season>/<match>/`, each match holding two half videos and a
//! JSON annotation document.

pub mod adapters;
pub mod app;
pub mod cli;
pub mod corpus;
pub mod domain;
pub mod error;
pub mod output;
pub mod ports;
pub mod utils;

// Re-export commonly used types
pub use app::ExtractInteractor;
pub use domain::errors::DomainError;
pub use domain::model::{
    Annotation, BatchReport, CorpusReport, ExtractionConfig, ExtractionMode, Half, HalfInfo, HalfPair,
    ItemOutcome, SkipReason, TemporalTarget, Window,
};
pub use error::{MediaError, MediaResult};
pub use output::OutputRouter;
