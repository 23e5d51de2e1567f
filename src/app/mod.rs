// Application layer - Use case interactors

pub mod container;
pub mod extract_interactor;

// Re-export interactors
pub use extract_interactor::{run_batch, ExtractInteractor};
