pub mod backend;
pub mod export;
pub mod local_model;
pub mod remote;
pub mod text_extractor;

// Re-export key types for easier access from the application layer
pub use backend::Backend;
pub use local_model::LocalBackend;
pub use remote::RemoteBackend;
pub use text_extractor::{TextEncoding, TextExtractor, UploadedFile};
