use crate::domain::flashcard::FlashcardRecord;
use crate::error::{FlashgenError, Result};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

pub const EXPORT_FORMAT_TAG: &str = "LLM Flashcard Generator v1.0";

const CSV_HEADER: [&str; 6] = ["id", "question", "answer", "subject", "difficulty", "topic"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
    Anki,
    Quizlet,
}

impl ExportFormat {
    pub fn filename(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "flashcards.csv",
            ExportFormat::Json => "flashcards.json",
            ExportFormat::Anki => "flashcards_anki.txt",
            ExportFormat::Quizlet => "flashcards_quizlet.txt",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv",
            ExportFormat::Json => "application/json",
            ExportFormat::Anki | ExportFormat::Quizlet => "text/tab-separated-values",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
            ExportFormat::Anki => "anki",
            ExportFormat::Quizlet => "quizlet",
        };
        f.write_str(name)
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            "anki" => Ok(ExportFormat::Anki),
            "quizlet" => Ok(ExportFormat::Quizlet),
            other => Err(format!(
                "unknown export format '{}' (expected csv, json, anki or quizlet)",
                other
            )),
        }
    }
}

/// A downloadable export: file name, MIME type and body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportPayload {
    pub filename: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

pub fn export(format: ExportFormat, flashcards: &[FlashcardRecord]) -> Result<ExportPayload> {
    let body = match format {
        ExportFormat::Csv => to_csv(flashcards)?,
        ExportFormat::Json => to_json(flashcards)?,
        ExportFormat::Anki => to_anki_format(flashcards),
        ExportFormat::Quizlet => to_quizlet_format(flashcards),
    };
    Ok(ExportPayload {
        filename: format.filename().to_string(),
        mime_type: format.mime_type().to_string(),
        bytes: body.into_bytes(),
    })
}

/// CSV with a fixed header row. Empty input gives an empty string, not a lone header.
pub fn to_csv(flashcards: &[FlashcardRecord]) -> Result<String> {
    if flashcards.is_empty() {
        return Ok(String::new());
    }

    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::CRLF)
        .from_writer(Vec::new());
    writer.write_record(CSV_HEADER)?;
    for card in flashcards {
        writer.write_record([
            card.id.to_string().as_str(),
            card.question.as_str(),
            card.answer.as_str(),
            card.subject.as_str(),
            card.difficulty.as_str(),
            card.topic.as_str(),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| FlashgenError::Io(e.into_error()))?;
    String::from_utf8(bytes).map_err(|e| FlashgenError::Export(e.to_string()))
}

#[derive(Serialize)]
struct JsonExport<'a> {
    flashcards: &'a [FlashcardRecord],
    metadata: JsonMetadata<'a>,
}

#[derive(Serialize)]
struct JsonMetadata<'a> {
    total_cards: usize,
    subjects: BTreeSet<&'a str>,
    difficulties: BTreeSet<&'a str>,
    export_format: &'static str,
}

/// Pretty-printed JSON with the cards and summary metadata, or `[]` for no cards.
pub fn to_json(flashcards: &[FlashcardRecord]) -> Result<String> {
    if flashcards.is_empty() {
        return Ok("[]".to_string());
    }

    let export = JsonExport {
        flashcards,
        metadata: JsonMetadata {
            total_cards: flashcards.len(),
            subjects: flashcards.iter().map(|c| c.subject.as_str()).collect(),
            difficulties: flashcards.iter().map(|c| c.difficulty.as_str()).collect(),
            export_format: EXPORT_FORMAT_TAG,
        },
    };
    Ok(serde_json::to_string_pretty(&export)?)
}

/// Anki import text: `front<TAB>back<TAB>tags`, newlines inside fields become `<br>`.
pub fn to_anki_format(flashcards: &[FlashcardRecord]) -> String {
    let mut output = String::new();
    for card in flashcards {
        let question = card.question.replace('\t', " ").replace('\n', "<br>");
        let answer = card.answer.replace('\t', " ").replace('\n', "<br>");
        let tags = format!("{} {} {}", card.subject, card.difficulty, card.topic)
            .trim()
            .replace(' ', "_");
        output.push_str(&format!("{}\t{}\t{}\n", question, answer, tags));
    }
    output
}

/// Quizlet import text: `term<TAB>definition`. Newlines are left as they are.
pub fn to_quizlet_format(flashcards: &[FlashcardRecord]) -> String {
    let mut output = String::new();
    for card in flashcards {
        let question = card.question.replace('\t', " ");
        let answer = card.answer.replace('\t', " ");
        output.push_str(&format!("{}\t{}\n", question, answer));
    }
    output
}
