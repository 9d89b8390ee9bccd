//! Best-effort parser used when a structured parser gives up.
//!
//! The file extension is ignored. The bytes are sniffed instead:
//! - `%PDF` goes through whole-document text extraction
//! - a zip container is tried as a workbook, then as a Word document
//! - anything else is read as text, keeping printable runs of binary data

use super::{pdf::clean_pdf_text, read_bytes, tidy_lines, DocumentParser, DocxParser, XlsxParser};
use crate::error::{LoadError, LoadResult};
use docqa_core::{LoadedUnit, SourceFile};
use std::io::Cursor;
use tracing::debug;

const PDF_MAGIC: &[u8] = b"%PDF";
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

/// Shortest run of printable characters kept from binary input.
const MIN_RUN_LEN: usize = 4;

/// Generic parser producing a single unit of whatever text can be found.
pub struct UnstructuredParser;

impl UnstructuredParser {
    /// Create a new unstructured parser.
    pub fn new() -> Self {
        Self
    }

    fn parse_pdf(&self, file: &SourceFile, bytes: &[u8]) -> LoadResult<Vec<LoadedUnit>> {
        let text = pdf_extract::extract_text_from_mem(bytes).map_err(|e| {
            LoadError::parse(&file.path, format!("Failed to extract text from PDF: {}", e))
        })?;

        let text = clean_pdf_text(&text);
        if text.is_empty() {
            return Err(LoadError::no_text(&file.path));
        }

        let metadata = serde_json::json!({
            "format": "pdf",
            "strategy": "unstructured",
            "length": text.len(),
        });
        Ok(vec![LoadedUnit::new(&file.file_name, text).with_metadata(metadata)])
    }

    fn parse_archive(&self, file: &SourceFile, bytes: &[u8]) -> LoadResult<Vec<LoadedUnit>> {
        let workbook_error = match calamine::open_workbook_auto_from_rs(Cursor::new(bytes)) {
            Ok(mut workbook) => {
                match XlsxParser::sheets_to_units(&mut workbook, &file.file_name, "unstructured") {
                    Ok(units) if !units.is_empty() => return Ok(units),
                    Ok(_) => "workbook has no cells".to_string(),
                    Err(e) => e,
                }
            }
            Err(e) => e.to_string(),
        };
        debug!("{} is not a readable workbook: {}", file.file_name, workbook_error);

        match DocxParser::paragraphs(bytes) {
            Ok(paragraphs) => {
                match DocxParser::unit_from_paragraphs(&file.file_name, &paragraphs, "unstructured") {
                    Some(unit) => Ok(vec![unit]),
                    None => Err(LoadError::no_text(&file.path)),
                }
            }
            Err(docx_error) => Err(LoadError::parse(
                &file.path,
                format!(
                    "Unrecognised archive (workbook: {}; word document: {})",
                    workbook_error, docx_error
                ),
            )),
        }
    }

    fn parse_text(&self, file: &SourceFile, bytes: &[u8]) -> LoadResult<Vec<LoadedUnit>> {
        let (text, binary) = decode_text(bytes);
        if text.is_empty() {
            return Err(LoadError::no_text(&file.path));
        }

        let metadata = serde_json::json!({
            "format": if binary { "binary" } else { "text" },
            "strategy": "unstructured",
            "length": text.len(),
        });
        Ok(vec![LoadedUnit::new(&file.file_name, text).with_metadata(metadata)])
    }
}

impl Default for UnstructuredParser {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentParser for UnstructuredParser {
    fn parse(&self, file: &SourceFile) -> LoadResult<Vec<LoadedUnit>> {
        let bytes = read_bytes(file)?;

        if bytes.starts_with(PDF_MAGIC) {
            debug!("Unstructured: {} looks like a PDF", file.file_name);
            self.parse_pdf(file, &bytes)
        } else if bytes.starts_with(ZIP_MAGIC) {
            debug!("Unstructured: {} looks like a zip container", file.file_name);
            self.parse_archive(file, &bytes)
        } else {
            self.parse_text(file, &bytes)
        }
    }
}

/// Decode bytes as text. Returns the text and whether the input was binary.
///
/// Clean UTF-8 is returned as is (tidied). Otherwise only runs of at least
/// [`MIN_RUN_LEN`] printable characters survive, one per line.
fn decode_text(bytes: &[u8]) -> (String, bool) {
    if let Ok(text) = std::str::from_utf8(bytes) {
        if !text.contains('\0') {
            return (tidy_lines(text.trim_start_matches('\u{feff}')), false);
        }
    }

    let lossy = String::from_utf8_lossy(bytes);
    let mut runs: Vec<String> = Vec::new();
    let mut current = String::new();

    for c in lossy.chars() {
        let printable = c != char::REPLACEMENT_CHARACTER && (!c.is_control() || c == '\t');
        if printable {
            current.push(c);
        } else {
            flush_run(&mut runs, &mut current);
        }
    }
    flush_run(&mut runs, &mut current);

    (runs.join("\n"), true)
}

fn flush_run(runs: &mut Vec<String>, current: &mut String) {
    let run = current.trim();
    if run.chars().count() >= MIN_RUN_LEN {
        runs.push(run.to_string());
    }
    current.clear();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::fixtures::write_workbook;
    use docqa_core::UnitLocation;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn source_with(suffix: &str, bytes: &[u8]) -> (NamedTempFile, SourceFile) {
        let mut file = NamedTempFile::with_suffix(suffix).unwrap();
        file.write_all(bytes).unwrap();
        let source = SourceFile::from_path(file.path()).unwrap();
        (file, source)
    }

    #[test]
    fn test_zip_read_as_workbook() {
        let dir = tempfile::tempdir().unwrap();
        // Saved with the wrong extension, so only the content says what it is
        let path = dir.path().join("export.pdf");
        write_workbook(&path, &[("Budget", vec![vec!["team", "amount"], vec!["ops", "1200"]])]);

        let source = SourceFile::from_path(&path).unwrap();
        let units = UnstructuredParser::new().parse(&source).unwrap();

        assert_eq!(units.len(), 1);
        assert_eq!(
            units[0].location,
            Some(UnitLocation::Sheet {
                name: "Budget".to_string()
            })
        );
        assert!(units[0].content.contains("ops | 1200"));
        assert_eq!(units[0].metadata["strategy"], "unstructured");
    }

    #[test]
    fn test_text_disguised_as_pdf() {
        let (_file, source) = source_with(".pdf", b"Plain words saved with the wrong extension.\n");

        let units = UnstructuredParser::new().parse(&source).unwrap();
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].content, "Plain words saved with the wrong extension.");
        assert_eq!(units[0].metadata["strategy"], "unstructured");
        assert_eq!(units[0].metadata["format"], "text");
    }

    #[test]
    fn test_binary_keeps_printable_runs() {
        let (_file, source) = source_with(".bin", b"\x00\x01\x02Hello World\x00\xff\xfeab\x00Second run\x07");

        let units = UnstructuredParser::new().parse(&source).unwrap();
        assert_eq!(units[0].content, "Hello World\nSecond run");
        assert_eq!(units[0].metadata["format"], "binary");
    }

    #[test]
    fn test_empty_file_has_no_text() {
        let (_file, source) = source_with(".pdf", b"");

        let err = UnstructuredParser::new().parse(&source).unwrap_err();
        assert!(matches!(err, LoadError::NoText { .. }));
    }

    #[test]
    fn test_garbage_only_has_no_text() {
        let (_file, source) = source_with(".xlsx", b"\x00\x01\xff\x02ab\x03");

        let err = UnstructuredParser::new().parse(&source).unwrap_err();
        assert!(matches!(err, LoadError::NoText { .. }));
    }

    #[test]
    fn test_broken_archive_fails() {
        let (_file, source) = source_with(".docx", b"PK\x03\x04not really a zip");

        let err = UnstructuredParser::new().parse(&source).unwrap_err();
        assert!(matches!(err, LoadError::Parse { .. }));
    }

    #[test]
    fn test_decode_clean_utf8() {
        let (text, binary) = decode_text("Grüße\n\n\n  aus Köln  ".as_bytes());
        assert_eq!(text, "Grüße\n\naus Köln");
        assert!(!binary);
    }
}
