//! Application layer: generation dispatch, the study session use case and
//! the Generate/Chat endpoints.

pub mod api;
pub mod generation_service;
pub mod study_usecase;

pub use api::{ChatEndpoint, GenerateEndpoint};
pub use generation_service::{GenerationService, SourceInput};
pub use study_usecase::StudyUseCase;
