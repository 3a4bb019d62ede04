use thiserror::Error;

pub type Result<T> = std::result::Result<T, FlashgenError>;

/// Every failure the library can surface. Nothing here is retried; callers display the
/// message and keep whatever batch they already had.
#[derive(Error, Debug)]
pub enum FlashgenError {
    #[error("Unsupported file format: {extension}")]
    UnsupportedFormat { extension: String },

    #[error("Could not decode text file (tried {tried})")]
    UnsupportedEncoding { tried: String },

    #[error("No text could be extracted from the PDF. The PDF might contain only images or be password protected.")]
    EmptyExtraction,

    #[error("Failed to parse PDF: {0}")]
    PdfParse(String),

    #[error("Failed to load model '{model}': {reason}")]
    ModelLoad { model: String, reason: String },

    #[error("Generation failed: {0}")]
    Generation(String),

    #[error("{0}")]
    NotImplemented(String),

    #[error("Please provide some educational content to process.")]
    EmptyContent,

    #[error("Number of flashcards must be between {min} and {max}, got {count}")]
    InvalidCardCount { count: usize, min: usize, max: usize },

    #[error("Backend '{backend}' is not available. Check your API key and model selection.")]
    BackendUnavailable { backend: String },

    #[error("No flashcards were generated. Please check your content and try again.")]
    NoFlashcards,

    #[error("Export failed: {0}")]
    Export(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}
