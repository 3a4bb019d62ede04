use crate::application::flashcard_service::FlashcardService;
use crate::domain::flashcard::{is_known_subject, FlashcardRecord};
use crate::domain::generation::GenerationBackend;
use crate::error::{FlashgenError, Result};
use crate::infrastructure::export::{export, ExportFormat, ExportPayload};
use log::{info, warn};
use std::ops::RangeInclusive;

/// Caller-held result state: the last successful batch, replaced wholesale by the next
/// one and untouched by failed attempts.
#[derive(Debug, Clone, Default)]
pub struct FlashcardSession {
    flashcards: Vec<FlashcardRecord>,
    generated: bool,
}

impl FlashcardSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn flashcards(&self) -> &[FlashcardRecord] {
        &self.flashcards
    }

    pub fn is_generated(&self) -> bool {
        self.generated && !self.flashcards.is_empty()
    }

    pub fn clear(&mut self) {
        self.flashcards.clear();
        self.generated = false;
    }

    /// Runs one batch and commits it only if it succeeded and is non-empty.
    ///
    /// Checks the request first: blank content, a count outside `allowed`, and a
    /// backend whose `test_connection` is false are rejected before any generation.
    pub fn generate<B: GenerationBackend>(
        &mut self,
        service: &mut FlashcardService<B>,
        content: &str,
        subject: &str,
        count: usize,
        allowed: RangeInclusive<usize>,
    ) -> Result<usize> {
        validate_request(content, subject, count, &allowed)?;
        // Remote placeholder reports false here and never reaches generation
        if !service.backend().test_connection() {
            return Err(FlashgenError::BackendUnavailable {
                backend: service.backend().name().to_string(),
            });
        }
        let batch = service.generate(content, subject, count)?;
        self.commit(batch)
    }

    /// Same as [`generate`](Self::generate) but with a caller-supplied batch builder,
    /// used for demo mode.
    pub fn generate_with<F>(&mut self, content: &str, build: F) -> Result<usize>
    where
        F: FnOnce(&str) -> Result<Vec<FlashcardRecord>>,
    {
        if content.trim().is_empty() {
            return Err(FlashgenError::EmptyContent);
        }
        let batch = build(content)?;
        self.commit(batch)
    }

    /// Export of the current batch; an empty session exports empty payloads.
    pub fn export(&self, format: ExportFormat) -> Result<ExportPayload> {
        export(format, &self.flashcards)
    }

    /// The payloads offered for download: CSV and JSON.
    pub fn downloads(&self) -> Result<Vec<ExportPayload>> {
        [ExportFormat::Csv, ExportFormat::Json]
            .into_iter()
            .map(|format| self.export(format))
            .collect()
    }

    fn commit(&mut self, batch: Vec<FlashcardRecord>) -> Result<usize> {
        if batch.is_empty() {
            return Err(FlashgenError::NoFlashcards);
        }
        let count = batch.len();
        self.flashcards = batch;
        self.generated = true;
        info!("Session now holds {} flashcards", count);
        Ok(count)
    }
}

fn validate_request(
    content: &str,
    subject: &str,
    count: usize,
    allowed: &RangeInclusive<usize>,
) -> Result<()> {
    if content.trim().is_empty() {
        return Err(FlashgenError::EmptyContent);
    }
    if !allowed.contains(&count) {
        return Err(FlashgenError::InvalidCardCount {
            count,
            min: *allowed.start(),
            max: *allowed.end(),
        });
    }
    if !is_known_subject(subject) {
        warn!("Subject '{}' is not one of the predefined subjects", subject);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::flashcard_service::generate_demo;
    use crate::domain::generation::MockGenerationBackend;
    use assert_matches::assert_matches;

    const CONTENT: &str = "Photosynthesis converts light energy into chemical energy \
        stored in glucose molecules inside chloroplasts.";

    fn working_service() -> FlashcardService<MockGenerationBackend> {
        let mut mock = MockGenerationBackend::new();
        mock.expect_test_connection().return_const(true);
        mock.expect_name().return_const("mock".to_string());
        mock.expect_generate().returning(|_| Ok("generated".to_string()));
        FlashcardService::new(mock)
    }

    fn failing_service() -> FlashcardService<MockGenerationBackend> {
        let mut mock = MockGenerationBackend::new();
        mock.expect_test_connection().return_const(true);
        mock.expect_name().return_const("mock".to_string());
        mock.expect_generate()
            .returning(|_| Err(FlashgenError::Generation("out of memory".to_string())));
        FlashcardService::new(mock)
    }

    #[test]
    fn test_successful_batch_is_committed() {
        let mut session = FlashcardSession::new();
        assert!(!session.is_generated());

        let count = session
            .generate(&mut working_service(), CONTENT, "Biology", 5, 5..=25)
            .unwrap();

        assert_eq!(count, 5);
        assert!(session.is_generated());
        assert_eq!(session.flashcards().len(), 5);
    }

    #[test]
    fn test_failed_batch_keeps_previous_state() {
        let mut session = FlashcardSession::new();
        session
            .generate(&mut working_service(), CONTENT, "Biology", 5, 5..=25)
            .unwrap();
        let before = session.flashcards().to_vec();

        let result = session.generate(&mut failing_service(), CONTENT, "Biology", 7, 5..=25);

        assert_matches!(result, Err(FlashgenError::Generation(_)));
        assert_eq!(session.flashcards(), before.as_slice());
    }

    #[test]
    fn test_new_batch_replaces_old_one() {
        let mut session = FlashcardSession::new();
        session
            .generate(&mut working_service(), CONTENT, "Biology", 10, 5..=25)
            .unwrap();
        session
            .generate(&mut working_service(), CONTENT, "Chemistry", 5, 5..=25)
            .unwrap();

        assert_eq!(session.flashcards().len(), 5);
        assert!(session.flashcards().iter().all(|c| c.subject == "Chemistry"));
    }

    #[test]
    fn test_rejects_invalid_requests_before_generating() {
        let mut mock = MockGenerationBackend::new();
        mock.expect_generate().never();
        mock.expect_test_connection().return_const(true);
        let mut service = FlashcardService::new(mock);
        let mut session = FlashcardSession::new();

        assert_matches!(
            session.generate(&mut service, "   \n", "Biology", 5, 5..=25),
            Err(FlashgenError::EmptyContent)
        );
        assert_matches!(
            session.generate(&mut service, CONTENT, "Biology", 30, 5..=25),
            Err(FlashgenError::InvalidCardCount { count: 30, min: 5, max: 25 })
        );
        assert!(!session.is_generated());
    }

    #[test]
    fn test_unavailable_backend_short_circuits() {
        let mut mock = MockGenerationBackend::new();
        mock.expect_test_connection().return_const(false);
        mock.expect_name().return_const("remote".to_string());
        mock.expect_generate().never();
        let mut service = FlashcardService::new(mock);
        let mut session = FlashcardSession::new();

        let result = session.generate(&mut service, CONTENT, "Biology", 5, 5..=25);
        assert_matches!(result, Err(FlashgenError::BackendUnavailable { backend }) if backend == "remote");
    }

    #[test]
    fn test_empty_batch_is_not_committed() {
        let mut session = FlashcardSession::new();
        let result = session.generate_with(CONTENT, |_| Ok(Vec::new()));
        assert_matches!(result, Err(FlashgenError::NoFlashcards));
        assert!(!session.is_generated());
    }

    #[test]
    fn test_demo_batch_and_clear() {
        let mut session = FlashcardSession::new();
        session
            .generate_with(CONTENT, |content| Ok(generate_demo(content, "Biology", 8)))
            .unwrap();
        assert_eq!(session.flashcards().len(), 8);

        session.clear();
        assert!(!session.is_generated());
        assert!(session.flashcards().is_empty());
    }

    #[test]
    fn test_downloads_offer_csv_and_json() {
        let mut session = FlashcardSession::new();
        session
            .generate(&mut working_service(), CONTENT, "Biology", 5, 5..=25)
            .unwrap();

        let downloads = session.downloads().unwrap();
        assert_eq!(downloads.len(), 2);
        assert_eq!(downloads[0].mime_type, "text/csv");
        assert_eq!(downloads[0].filename, "flashcards.csv");
        assert_eq!(downloads[1].mime_type, "application/json");
        assert!(!downloads[1].bytes.is_empty());
    }
}
