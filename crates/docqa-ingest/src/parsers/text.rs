//! Plain text document parser.

use super::{read_bytes, DocumentParser};
use crate::error::{LoadError, LoadResult};
use docqa_core::{LoadedUnit, SourceFile};

/// Parser for plain text files.
pub struct TextParser;

impl TextParser {
    /// Create a new text parser.
    pub fn new() -> Self {
        Self
    }
}

impl Default for TextParser {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentParser for TextParser {
    fn parse(&self, file: &SourceFile) -> LoadResult<Vec<LoadedUnit>> {
        let bytes = read_bytes(file)?;
        let content = String::from_utf8(bytes).map_err(|e| {
            LoadError::parse(
                &file.path,
                format!("File is not valid UTF-8: {}", e.utf8_error()),
            )
        })?;
        let content = content.trim_start_matches('\u{feff}');

        if content.trim().is_empty() {
            return Ok(vec![]);
        }

        let metadata = serde_json::json!({
            "format": "text",
            "strategy": "plain_text",
            "length": content.len(),
            "lines": content.lines().count(),
        });

        Ok(vec![LoadedUnit::new(&file.file_name, content).with_metadata(metadata)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_text() {
        let mut file = NamedTempFile::with_suffix(".txt").unwrap();
        writeln!(file, "This is a plain text file.\nWith multiple lines.").unwrap();

        let source = SourceFile::from_path(file.path()).unwrap();
        let units = TextParser::new().parse(&source).unwrap();

        assert_eq!(units.len(), 1);
        assert!(units[0].content.contains("plain text file"));
        assert_eq!(units[0].source, source.file_name);
        assert_eq!(units[0].metadata["format"], "text");
        assert_eq!(units[0].metadata["lines"], 2);
        assert!(units[0].location.is_none());
    }

    #[test]
    fn test_parse_strips_bom() {
        let mut file = NamedTempFile::with_suffix(".txt").unwrap();
        file.write_all("\u{feff}hello".as_bytes()).unwrap();

        let source = SourceFile::from_path(file.path()).unwrap();
        let units = TextParser::new().parse(&source).unwrap();
        assert_eq!(units[0].content, "hello");
    }

    #[test]
    fn test_empty_file_yields_no_units() {
        let mut file = NamedTempFile::with_suffix(".txt").unwrap();
        writeln!(file, "   ").unwrap();

        let source = SourceFile::from_path(file.path()).unwrap();
        assert!(TextParser::new().parse(&source).unwrap().is_empty());
    }

    #[test]
    fn test_invalid_utf8_is_a_parse_error() {
        let mut file = NamedTempFile::with_suffix(".txt").unwrap();
        file.write_all(&[0x66, 0x6f, 0xff, 0xfe, 0x6f]).unwrap();

        let source = SourceFile::from_path(file.path()).unwrap();
        let err = TextParser::new().parse(&source).unwrap_err();
        assert!(matches!(err, LoadError::Parse { .. }));
    }

    #[test]
    fn test_missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = SourceFile::from_path(dir.path().join("gone.txt")).unwrap();

        let err = TextParser::new().parse(&source).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }
}
