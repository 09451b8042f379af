pub mod config_service;
pub mod document_extractor;
pub mod paths;
pub mod secret_service;
pub mod state_repository;
pub mod storage;
pub mod transcript_source;

pub use config_service::ConfigService;
pub use document_extractor::PlainTextExtractor;
pub use paths::StudyPaths;
pub use secret_service::SecretService;
pub use state_repository::FileStateRepository;
pub use transcript_source::FileTranscriptSource;
