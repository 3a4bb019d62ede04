pub struct PromptBuilder;

impl PromptBuilder {
    pub fn flashcard_prompt(term: &str, subject: &str) -> String {
        format!(
            "Generate a flashcard question and answer about: {} in the context of {}.",
            term, subject
        )
    }

    pub fn term_question(term: &str) -> String {
        format!("What is {}?", term)
    }

    pub fn filler_question(subject: &str) -> String {
        format!("What is a key concept in {}?", subject)
    }

    pub fn filler_answer(subject: &str) -> String {
        format!(
            "This is a general review card for {}. Add more source material for topic-specific cards.",
            subject
        )
    }

    pub fn demo_answer(term: &str, subject: &str) -> String {
        format!(
            "{} is an important concept in {}. (Demo mode - load a model for AI-generated content)",
            term, subject
        )
    }

    pub fn demo_filler_answer(subject: &str) -> String {
        format!(
            "This is a demo flashcard for {}. Load a model for AI-generated content.",
            subject
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flashcard_prompt_mentions_term_and_subject() {
        assert_eq!(
            PromptBuilder::flashcard_prompt("Mitosis", "Biology"),
            "Generate a flashcard question and answer about: Mitosis in the context of Biology."
        );
    }

    #[test]
    fn test_filler_text_only_references_subject() {
        assert_eq!(PromptBuilder::filler_question("History"), "What is a key concept in History?");
        assert!(PromptBuilder::filler_answer("History").contains("History"));
    }
}
