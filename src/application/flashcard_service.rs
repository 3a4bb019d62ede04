use crate::application::prompts::PromptBuilder;
use crate::application::term_extractor::{extract_demo_terms, extract_terms_with_limit, MAX_TERMS};
use crate::domain::flashcard::{Difficulty, FlashcardRecord, GENERAL_TOPIC};
use crate::domain::generation::GenerationBackend;
use crate::error::Result;
use log::{debug, info};

/// Turns source text into a batch of flashcards using a generation backend.
///
/// The service is stateless between calls apart from the backend it owns. A batch either
/// completes with exactly `count` records or fails as a whole.
pub struct FlashcardService<B: GenerationBackend> {
    backend: B,
    max_terms: usize,
}

impl<B: GenerationBackend> FlashcardService<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            max_terms: MAX_TERMS,
        }
    }

    /// Caps how many terms the extractor may return before selection.
    pub fn with_max_terms(mut self, max_terms: usize) -> Self {
        self.max_terms = max_terms;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn into_backend(self) -> B {
        self.backend
    }

    /// Generates `count` cards about `subject` from `content`.
    ///
    /// One backend call per extracted term, in extraction order. When the content yields
    /// fewer than `count` terms the batch is padded with filler cards that do not touch
    /// the backend. The first backend error is returned as-is.
    pub fn generate(
        &mut self,
        content: &str,
        subject: &str,
        count: usize,
    ) -> Result<Vec<FlashcardRecord>> {
        // 1. Select terms in extraction order
        let terms: Vec<String> = extract_terms_with_limit(content, self.max_terms)
            .into_iter()
            .take(count)
            .collect();
        info!(
            "Generating {} flashcards for '{}' with backend '{}' ({} terms found)",
            count,
            subject,
            self.backend.name(),
            terms.len()
        );

        // 2. One backend call per term; the first error aborts the batch
        let mut flashcards = Vec::with_capacity(count);
        for (i, term) in terms.iter().enumerate() {
            let prompt = PromptBuilder::flashcard_prompt(term, subject);
            debug!("Prompting for term {}/{}: {}", i + 1, terms.len(), term);
            let answer = self.backend.generate(&prompt)?;
            flashcards.push(FlashcardRecord {
                id: card_id(i),
                question: PromptBuilder::term_question(term),
                answer,
                subject: subject.to_string(),
                difficulty: Difficulty::Medium,
                topic: term.clone(),
            });
        }

        // 3. Pad to `count` without touching the backend
        pad_with_fillers(&mut flashcards, subject, count, PromptBuilder::filler_answer);
        info!("Generated {} flashcards", flashcards.len());
        Ok(flashcards)
    }
}

/// Builds a batch without any model: answers are templated around each term.
pub fn generate_demo(content: &str, subject: &str, count: usize) -> Vec<FlashcardRecord> {
    let mut flashcards: Vec<FlashcardRecord> = extract_demo_terms(content, count)
        .into_iter()
        .enumerate()
        .map(|(i, term)| FlashcardRecord {
            id: card_id(i),
            question: PromptBuilder::term_question(&term),
            answer: PromptBuilder::demo_answer(&term, subject),
            subject: subject.to_string(),
            difficulty: Difficulty::Medium,
            topic: capitalize(&term),
        })
        .collect();
    pad_with_fillers(&mut flashcards, subject, count, PromptBuilder::demo_filler_answer);
    flashcards
}

fn pad_with_fillers(
    flashcards: &mut Vec<FlashcardRecord>,
    subject: &str,
    count: usize,
    answer: fn(&str) -> String,
) {
    let missing = count.saturating_sub(flashcards.len());
    if missing > 0 {
        debug!("Padding batch with {} filler cards", missing);
    }
    while flashcards.len() < count {
        flashcards.push(FlashcardRecord {
            id: card_id(flashcards.len()),
            question: PromptBuilder::filler_question(subject),
            answer: answer(subject),
            subject: subject.to_string(),
            difficulty: Difficulty::Easy,
            topic: GENERAL_TOPIC.to_string(),
        });
    }
}

fn card_id(index: usize) -> u32 {
    u32::try_from(index + 1).unwrap_or(u32::MAX)
}

// First letter upper, rest lower.
fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
