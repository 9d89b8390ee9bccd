//! Word document parser.

use super::{read_bytes, DocumentParser};
use crate::error::{LoadError, LoadResult};
use docqa_core::{LoadedUnit, SourceFile};
use docx_rs::{DocumentChild, ParagraphChild, RunChild};

/// Parser for `.docx` files. The paragraphs become a single unit.
pub struct DocxParser;

impl DocxParser {
    /// Create a new docx parser.
    pub fn new() -> Self {
        Self
    }

    /// Text of every body paragraph, in order. Tables are not read.
    pub(crate) fn paragraphs(bytes: &[u8]) -> Result<Vec<String>, String> {
        let docx = docx_rs::read_docx(bytes).map_err(|e| e.to_string())?;

        let mut paragraphs = Vec::new();
        for child in docx.document.children {
            if let DocumentChild::Paragraph(paragraph) = child {
                let mut line = String::new();
                for child in paragraph.children {
                    if let ParagraphChild::Run(run) = child {
                        for child in run.children {
                            if let RunChild::Text(t) = child {
                                line.push_str(&t.text);
                            }
                        }
                    }
                }
                paragraphs.push(line);
            }
        }

        Ok(paragraphs)
    }

    /// Build the unit for a list of paragraphs, `None` if there is no text.
    pub(crate) fn unit_from_paragraphs(
        source: &str,
        paragraphs: &[String],
        strategy: &str,
    ) -> Option<LoadedUnit> {
        let content = paragraphs
            .iter()
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
            .collect::<Vec<_>>()
            .join("\n");

        if content.is_empty() {
            return None;
        }

        let metadata = serde_json::json!({
            "format": "docx",
            "strategy": strategy,
            "paragraphs": paragraphs.len(),
        });

        Some(LoadedUnit::new(source, content).with_metadata(metadata))
    }
}

impl Default for DocxParser {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentParser for DocxParser {
    fn parse(&self, file: &SourceFile) -> LoadResult<Vec<LoadedUnit>> {
        let bytes = read_bytes(file)?;
        let paragraphs = Self::paragraphs(&bytes).map_err(|e| {
            LoadError::parse(&file.path, format!("Failed to read Word document: {}", e))
        })?;

        Ok(Self::unit_from_paragraphs(&file.file_name, &paragraphs, "docx")
            .into_iter()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docx_rs::{Docx, Paragraph, Run};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_docx(lines: &[&str]) -> NamedTempFile {
        let file = NamedTempFile::with_suffix(".docx").unwrap();
        let mut docx = Docx::new();
        for line in lines {
            docx = docx.add_paragraph(Paragraph::new().add_run(Run::new().add_text(*line)));
        }
        docx.build().pack(file.reopen().unwrap()).unwrap();
        file
    }

    #[test]
    fn test_parse_docx() {
        let file = write_docx(&["SAML Configuration", "", "Set the entity ID first."]);

        let source = SourceFile::from_path(file.path()).unwrap();
        let units = DocxParser::new().parse(&source).unwrap();

        assert_eq!(units.len(), 1);
        assert_eq!(
            units[0].content,
            "SAML Configuration\nSet the entity ID first."
        );
        assert_eq!(units[0].metadata["format"], "docx");
    }

    #[test]
    fn test_empty_docx_yields_no_units() {
        let file = write_docx(&[]);

        let source = SourceFile::from_path(file.path()).unwrap();
        assert!(DocxParser::new().parse(&source).unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_docx_is_a_parse_error() {
        let mut file = NamedTempFile::with_suffix(".docx").unwrap();
        writeln!(file, "definitely not a zip archive").unwrap();

        let source = SourceFile::from_path(file.path()).unwrap();
        let err = DocxParser::new().parse(&source).unwrap_err();
        assert!(matches!(err, LoadError::Parse { .. }));
    }
}
