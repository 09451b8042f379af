pub mod bundle;
pub mod config;
pub mod error;
pub mod exam;
pub mod graph;
pub mod prompt;
pub mod provider;
pub mod request;
pub mod response;
pub mod session;
pub mod state;
pub mod transcript;

// Re-export common error type
pub use error::{Result, StudyError};
