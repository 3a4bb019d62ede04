pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;

/// Re-export the items the binaries and integration tests use
pub use application::flashcard_service::{generate_demo, FlashcardService};
pub use application::session::FlashcardSession;
pub use application::term_extractor::{extract_terms, extract_terms_with_limit};
pub use config::{load_config, FlashgenConfig};
pub use domain::flashcard::{Difficulty, FlashcardRecord};
pub use domain::generation::GenerationBackend;
pub use error::{FlashgenError, Result};
pub use infrastructure::export::{ExportFormat, ExportPayload};
pub use infrastructure::{Backend, LocalBackend, RemoteBackend, TextExtractor, UploadedFile};
