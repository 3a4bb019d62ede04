use serde::{Deserialize, Serialize};
use std::fmt;

/// Topic given to padding cards that were not generated from a source term.
pub const GENERAL_TOPIC: &str = "General";

/// Subjects offered to users. The pipeline treats the subject as an opaque label, so
/// anything outside this list is still accepted.
pub const KNOWN_SUBJECTS: &[&str] = &[
    "General",
    "Biology",
    "History",
    "Computer Science",
    "Mathematics",
    "Physics",
    "Chemistry",
    "Literature",
    "Psychology",
    "Economics",
];

pub fn is_known_subject(subject: &str) -> bool {
    KNOWN_SUBJECTS.contains(&subject)
}

// Informational only, never derived from the content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One question/answer card. Field order matches the exported column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashcardRecord {
    pub id: u32,
    pub question: String,
    pub answer: String,
    pub subject: String,
    pub difficulty: Difficulty,
    pub topic: String,
}

impl FlashcardRecord {
    pub fn is_filler(&self) -> bool {
        self.topic == GENERAL_TOPIC && self.difficulty == Difficulty::Easy
    }
}
