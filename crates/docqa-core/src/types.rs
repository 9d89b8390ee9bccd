//! Core domain types for Docqa.

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Unique identifier for chunks.
pub type ChunkId = String;

/// Unique identifier for conversations.
pub type ConversationId = String;

/// Generate a new unique ID.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// A file discovered for loading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    pub path: PathBuf,
    pub file_name: String,
    /// Lower-cased extension without the leading dot, empty when absent.
    pub extension: String,
    pub exists: bool,
}

impl SourceFile {
    /// Describe the file at `path`, making the path absolute.
    ///
    /// The path does not have to exist; `exists` records whether it did at
    /// the time of the call.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()?.join(path)
        };

        // Names that are not valid UTF-8 are kept lossily for display
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| Error::NoFileName(path.clone()))?;

        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        let exists = path.is_file();

        Ok(Self {
            path,
            file_name,
            extension,
            exists,
        })
    }
}

impl std::fmt::Display for SourceFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.file_name)
    }
}

/// Where inside its source file a unit came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum UnitLocation {
    /// A 1-indexed page of a paged document.
    Page { number: u32 },
    /// A named worksheet.
    Sheet { name: String },
}

impl std::fmt::Display for UnitLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnitLocation::Page { number } => write!(f, "page {}", number),
            UnitLocation::Sheet { name } => write!(f, "sheet {}", name),
        }
    }
}

/// Text loaded from one source file, ready to hand off for indexing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadedUnit {
    /// File name of the originating source.
    pub source: String,
    pub content: String,
    pub location: Option<UnitLocation>,
    pub metadata: serde_json::Value,
}

impl LoadedUnit {
    pub fn new(source: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            content: content.into(),
            location: None,
            metadata: serde_json::json!({}),
        }
    }

    pub fn with_location(mut self, location: UnitLocation) -> Self {
        self.location = Some(location);
        self
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }

    /// Human readable label, e.g. `report.pdf (page 2)`.
    pub fn label(&self) -> String {
        match &self.location {
            Some(location) => format!("{} ({})", self.source, location),
            None => self.source.clone(),
        }
    }
}

/// A chunk of unit text prepared for embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: ChunkId,
    pub source: String,
    /// Position of the originating unit in the corpus.
    pub unit_index: usize,
    pub chunk_index: usize,
    pub content: String,
    pub location: Option<UnitLocation>,
}

impl Chunk {
    pub fn new(
        source: impl Into<String>,
        unit_index: usize,
        chunk_index: usize,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: new_id(),
            source: source.into(),
            unit_index,
            chunk_index,
            content: content.into(),
            location: None,
        }
    }

    pub fn with_location(mut self, location: Option<UnitLocation>) -> Self {
        self.location = location;
        self
    }

    /// Human readable label of the chunk's origin.
    pub fn label(&self) -> String {
        match &self.location {
            Some(location) => format!("{} ({})", self.source, location),
            None => self.source.clone(),
        }
    }
}

/// One completed question/answer exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub question: String,
    pub answer: String,
    pub asked_at: DateTime<Utc>,
}

/// Conversation state owned by the caller and passed into every query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: ConversationId,
    pub turns: Vec<Turn>,
    pub started_at: DateTime<Utc>,
}

impl Conversation {
    pub fn new() -> Self {
        Self {
            id: new_id(),
            turns: Vec::new(),
            started_at: Utc::now(),
        }
    }

    /// Append a completed exchange.
    pub fn record(&mut self, question: impl Into<String>, answer: impl Into<String>) {
        self.turns.push(Turn {
            question: question.into(),
            answer: answer.into(),
            asked_at: Utc::now(),
        });
    }

    /// The last `n` turns, oldest first.
    pub fn recent(&self, n: usize) -> &[Turn] {
        let skip = self.turns.len().saturating_sub(n);
        &self.turns[skip..]
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }

    /// Serialize the transcript as pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_file_lowercases_extension() {
        let file = SourceFile::from_path("/tmp/docs/Report.PDF").unwrap();
        assert_eq!(file.file_name, "Report.PDF");
        assert_eq!(file.extension, "pdf");
        assert!(file.path.is_absolute());
    }

    #[test]
    fn test_source_file_without_extension() {
        let file = SourceFile::from_path("/tmp/docs/Makefile").unwrap();
        assert_eq!(file.extension, "");

        // Dotfiles have no extension either
        let file = SourceFile::from_path("/tmp/docs/.DS_Store").unwrap();
        assert_eq!(file.extension, "");
    }

    #[test]
    fn test_source_file_relative_path_made_absolute() {
        let file = SourceFile::from_path("notes.txt").unwrap();
        assert!(file.path.is_absolute());
        assert!(file.path.ends_with("notes.txt"));
    }

    #[cfg(unix)]
    #[test]
    fn test_source_file_non_utf8_name() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let path = Path::new("/tmp/docs").join(OsStr::from_bytes(b"caf\xe9.TXT"));
        let file = SourceFile::from_path(&path).unwrap();
        assert_eq!(file.path, path);
        assert_eq!(file.file_name, "caf\u{fffd}.TXT");
        assert_eq!(file.extension, "txt");
    }

    #[test]
    fn test_source_file_rejects_root() {
        let err = SourceFile::from_path("/").unwrap_err();
        assert!(matches!(err, Error::NoFileName(_)));
    }

    #[test]
    fn test_unit_label() {
        let unit = LoadedUnit::new("report.pdf", "text")
            .with_location(UnitLocation::Page { number: 2 });
        assert_eq!(unit.label(), "report.pdf (page 2)");

        let unit = LoadedUnit::new("notes.txt", "text");
        assert_eq!(unit.label(), "notes.txt");
    }

    #[test]
    fn test_conversation_recent() {
        let mut conversation = Conversation::new();
        assert!(conversation.is_empty());

        conversation.record("q1", "a1");
        conversation.record("q2", "a2");
        conversation.record("q3", "a3");

        let recent = conversation.recent(2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].question, "q2");
        assert_eq!(recent[1].question, "q3");

        assert_eq!(conversation.recent(10).len(), 3);
    }

    #[test]
    fn test_conversations_are_independent() {
        let mut first = Conversation::new();
        let second = Conversation::new();

        first.record("What is SAML?", "An XML-based standard.");

        assert_eq!(first.len(), 1);
        assert!(second.is_empty());
        assert_ne!(first.id, second.id);
    }

    #[test]
    fn test_conversation_to_json() {
        let mut conversation = Conversation::new();
        conversation.record("Hello?", "Hi.");

        let json = conversation.to_json().unwrap();
        let parsed: Conversation = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.turns, conversation.turns);
    }
}
