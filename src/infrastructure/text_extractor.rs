use crate::error::{FlashgenError, Result};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Longest preprocessed text handed to the model prompt builder.
pub const DEFAULT_MAX_CHARS: usize = 8000;
pub const DEFAULT_PREVIEW_CHARS: usize = 1000;
const ELLIPSIS: &str = "...";

/// Text encodings tried, in order, when decoding a `.txt` upload.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    #[serde(rename = "utf-8")]
    Utf8,
    #[serde(rename = "latin-1")]
    Latin1,
    #[serde(rename = "windows-1252")]
    Windows1252,
}

impl TextEncoding {
    pub fn default_chain() -> Vec<TextEncoding> {
        vec![TextEncoding::Utf8, TextEncoding::Latin1, TextEncoding::Windows1252]
    }

    pub fn label(&self) -> &'static str {
        match self {
            TextEncoding::Utf8 => "utf-8",
            TextEncoding::Latin1 => "latin-1",
            TextEncoding::Windows1252 => "windows-1252",
        }
    }

    fn decode(&self, bytes: &[u8]) -> Option<String> {
        match self {
            TextEncoding::Utf8 => std::str::from_utf8(bytes).ok().map(str::to_owned),
            // ISO-8859-1 maps every byte to the code point of the same value.
            TextEncoding::Latin1 => Some(bytes.iter().map(|&b| char::from(b)).collect()),
            TextEncoding::Windows1252 => encoding_rs::WINDOWS_1252
                .decode_without_bom_handling_and_without_replacement(bytes)
                .map(|text| text.into_owned()),
        }
    }
}

/// An uploaded document: its original file name and raw bytes.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    /// Lowercased text after the last `.`; a name without a dot is its own extension.
    pub fn extension(&self) -> String {
        self.name
            .rsplit('.')
            .next()
            .unwrap_or_default()
            .to_lowercase()
    }
}

/// Extracts plain text from `.txt` and `.pdf` uploads.
pub struct TextExtractor {
    encodings: Vec<TextEncoding>,
}

impl Default for TextExtractor {
    fn default() -> Self {
        Self::new(TextEncoding::default_chain())
    }
}

impl TextExtractor {
    pub fn new(encodings: Vec<TextEncoding>) -> Self {
        Self { encodings }
    }

    pub fn extract(&self, file: &UploadedFile) -> Result<String> {
        let extension = file.extension();
        debug!("Extracting '{}' ({} bytes)", file.name, file.bytes.len());
        let text = match extension.as_str() {
            "txt" => self.extract_txt(&file.bytes)?,
            "pdf" => extract_pdf(&file.bytes)?,
            _ => return Err(FlashgenError::UnsupportedFormat { extension }),
        };
        info!("Extracted {} characters from {}", text.chars().count(), file.name);
        Ok(text)
    }

    pub fn extract_path(&self, path: &Path) -> Result<String> {
        let bytes = fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        self.extract(&UploadedFile::new(name, bytes))
    }

    fn extract_txt(&self, bytes: &[u8]) -> Result<String> {
        for encoding in &self.encodings {
            match encoding.decode(bytes) {
                Some(text) => {
                    debug!("Decoded text file as {}", encoding.label());
                    return Ok(text.trim().to_string());
                }
                None => debug!("Text file is not valid {}", encoding.label()),
            }
        }
        let tried = self
            .encodings
            .iter()
            .map(TextEncoding::label)
            .collect::<Vec<_>>()
            .join(", ");
        Err(FlashgenError::UnsupportedEncoding { tried })
    }
}

fn extract_pdf(bytes: &[u8]) -> Result<String> {
    let document =
        lopdf::Document::load_mem(bytes).map_err(|e| FlashgenError::PdfParse(e.to_string()))?;
    if document.is_encrypted() {
        return Err(FlashgenError::EmptyExtraction);
    }

    // One newline between pages, whatever line endings lopdf leaves on each page.
    let mut text = String::new();
    for page_number in document.get_pages().keys() {
        match document.extract_text(&[*page_number]) {
            Ok(page_text) => text.push_str(page_text.trim_end_matches(['\r', '\n'])),
            Err(e) => warn!("Could not extract text from page {}: {}", page_number, e),
        }
        text.push('\n');
    }

    let text = text.trim();
    if text.is_empty() {
        return Err(FlashgenError::EmptyExtraction);
    }
    Ok(text.to_string())
}

/// Drops blank lines, trims the rest, and caps the result at `max_chars` characters
/// (plus a trailing `...` when cut).
pub fn preprocess(content: &str, max_chars: usize) -> String {
    let processed = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n");
    truncate_chars(&processed, max_chars)
}

/// Short excerpt for showing the user what was extracted.
pub fn preview(content: &str, max_chars: usize) -> String {
    truncate_chars(content, max_chars)
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => format!("{}{}", &text[..byte_index], ELLIPSIS),
        None => text.to_string(),
    }
}
