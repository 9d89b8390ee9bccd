//! Document parsers, one per loading strategy.

mod docx;
#[cfg(test)]
pub(crate) mod fixtures;
mod markdown;
mod pdf;
mod text;
mod unstructured;
mod xlsx;

pub use docx::DocxParser;
pub use markdown::MarkdownParser;
pub use pdf::PdfParser;
pub use text::TextParser;
pub use unstructured::UnstructuredParser;
pub use xlsx::XlsxParser;

use crate::error::{LoadError, LoadResult};
use docqa_core::{LoadedUnit, SourceFile};

/// Trait for document parsers.
pub trait DocumentParser: Send + Sync {
    /// Load a file into zero or more units, in document order.
    fn parse(&self, file: &SourceFile) -> LoadResult<Vec<LoadedUnit>>;
}

/// Read the whole file, mapping failures to a load error.
fn read_bytes(file: &SourceFile) -> LoadResult<Vec<u8>> {
    std::fs::read(&file.path).map_err(|e| LoadError::io(&file.path, e))
}

/// Collapse runs of blank lines and trim each line.
fn tidy_lines(text: &str) -> String {
    text.lines()
        .map(|line| line.trim())
        .fold(Vec::new(), |mut acc: Vec<&str>, line| {
            let last_was_empty = acc.last().map(|s| s.is_empty()).unwrap_or(false);
            if !(line.is_empty() && last_was_empty) {
                acc.push(line);
            }
            acc
        })
        .join("\n")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tidy_lines() {
        let messy = "  Hello  \n\n\n\nWorld  \n\nTest\n\n";
        assert_eq!(tidy_lines(messy), "Hello\n\nWorld\n\nTest");
    }
}
