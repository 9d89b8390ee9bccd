//! Page-aware PDF parser.

use super::{read_bytes, tidy_lines, DocumentParser};
use crate::error::{LoadError, LoadResult};
use docqa_core::{LoadedUnit, SourceFile, UnitLocation};
use tracing::debug;

/// Parser for PDF files. Produces one unit per page that has text.
pub struct PdfParser;

impl PdfParser {
    /// Create a new PDF parser.
    pub fn new() -> Self {
        Self
    }
}

impl Default for PdfParser {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentParser for PdfParser {
    fn parse(&self, file: &SourceFile) -> LoadResult<Vec<LoadedUnit>> {
        debug!("Parsing PDF: {:?}", file.path);

        let bytes = read_bytes(file)?;
        let document = lopdf::Document::load_mem(&bytes)
            .map_err(|e| LoadError::parse(&file.path, format!("Failed to open PDF: {}", e)))?;

        let pages = document.get_pages();
        let total_pages = pages.len();
        let mut units = Vec::new();

        for &page_number in pages.keys() {
            let text = document.extract_text(&[page_number]).map_err(|e| {
                LoadError::parse(
                    &file.path,
                    format!("Failed to extract text from page {}: {}", page_number, e),
                )
            })?;

            let text = clean_pdf_text(&text);
            if text.is_empty() {
                debug!("Page {} of {} has no text", page_number, file.file_name);
                continue;
            }

            let metadata = serde_json::json!({
                "format": "pdf",
                "strategy": "pdf",
                "page": page_number,
                "total_pages": total_pages,
            });

            units.push(
                LoadedUnit::new(&file.file_name, text)
                    .with_location(UnitLocation::Page {
                        number: page_number,
                    })
                    .with_metadata(metadata),
            );
        }

        // Image-only or empty documents: let the fallback have a go
        if units.is_empty() {
            return Err(LoadError::no_text(&file.path));
        }

        debug!(
            "Extracted {} of {} pages from {}",
            units.len(),
            total_pages,
            file.file_name
        );

        Ok(units)
    }
}

/// Clean up extracted PDF text.
pub(crate) fn clean_pdf_text(text: &str) -> String {
    tidy_lines(&text.replace('\0', "").replace('\x0C', "\n\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::fixtures::write_pdf;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_clean_pdf_text() {
        let messy = "  Hello  \n\n\n\nWorld\x0C  \n\nTest\0";
        let cleaned = clean_pdf_text(messy);
        assert!(!cleaned.contains("\n\n\n"));
        assert!(!cleaned.contains('\x0C'));
        assert!(!cleaned.contains('\0'));
        assert!(cleaned.starts_with("Hello"));
    }

    #[test]
    fn test_not_a_pdf_is_a_parse_error() {
        let mut file = NamedTempFile::with_suffix(".pdf").unwrap();
        writeln!(file, "this is not a pdf at all").unwrap();

        let source = SourceFile::from_path(file.path()).unwrap();
        let err = PdfParser::new().parse(&source).unwrap_err();
        assert!(matches!(err, LoadError::Parse { .. }));
    }

    #[test]
    fn test_one_unit_per_page() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.pdf");
        write_pdf(&path, &["Page number 1", "Page number 2", "Page number 3"]);

        let source = SourceFile::from_path(&path).unwrap();
        let units = PdfParser::new().parse(&source).unwrap();

        assert_eq!(units.len(), 3);
        for (i, unit) in units.iter().enumerate() {
            let number = i as u32 + 1;
            assert_eq!(unit.location, Some(UnitLocation::Page { number }));
            assert_eq!(unit.label(), format!("report.pdf (page {})", number));
            assert!(unit.content.contains(&format!("Page number {}", number)));
        }
    }

    #[test]
    fn test_pages_without_text_are_left_out() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.pdf");
        write_pdf(&path, &["Cover", "", "Appendix"]);

        let source = SourceFile::from_path(&path).unwrap();
        let units = PdfParser::new().parse(&source).unwrap();

        let pages: Vec<_> = units.iter().map(|u| u.location.clone()).collect();
        assert_eq!(
            pages,
            vec![
                Some(UnitLocation::Page { number: 1 }),
                Some(UnitLocation::Page { number: 3 })
            ]
        );
    }

    #[test]
    fn test_pdf_without_any_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blank.pdf");
        write_pdf(&path, &["", ""]);

        let source = SourceFile::from_path(&path).unwrap();
        let err = PdfParser::new().parse(&source).unwrap_err();
        assert!(matches!(err, LoadError::NoText { .. }));
    }

    #[test]
    fn test_empty_file_fails() {
        let file = NamedTempFile::with_suffix(".pdf").unwrap();

        let source = SourceFile::from_path(file.path()).unwrap();
        assert!(PdfParser::new().parse(&source).is_err());
    }
}
