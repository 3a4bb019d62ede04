pub mod flashcard_service;
pub mod prompts;
pub mod session;
pub mod term_extractor;
