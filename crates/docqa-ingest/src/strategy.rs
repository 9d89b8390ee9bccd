//! The fixed table of loading strategies.

use crate::error::LoadResult;
use crate::parsers::{
    DocumentParser, DocxParser, MarkdownParser, PdfParser, TextParser, UnstructuredParser,
    XlsxParser,
};
use docqa_core::{LoadedUnit, SourceFile};
use serde::Serialize;

/// How a file gets turned into text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Page-aware PDF extraction.
    Pdf,
    PlainText,
    Markdown,
    /// Paragraphs of a Word document.
    Docx,
    /// One unit per worksheet.
    Xlsx,
    /// Best-effort extraction from whatever bytes are there. Only used as a
    /// fallback.
    Unstructured,
}

impl Strategy {
    /// Extensions with a strategy, lower-case and without the dot.
    pub const SUPPORTED_EXTENSIONS: &'static [&'static str] = &["pdf", "txt", "md", "docx", "xlsx"];

    /// Select the strategy for a file extension.
    pub fn for_extension(extension: &str) -> Option<Self> {
        match extension.trim_start_matches('.').to_lowercase().as_str() {
            "pdf" => Some(Strategy::Pdf),
            "txt" => Some(Strategy::PlainText),
            "md" => Some(Strategy::Markdown),
            "docx" => Some(Strategy::Docx),
            "xlsx" => Some(Strategy::Xlsx),
            _ => None,
        }
    }

    /// The strategy to try when this one fails.
    pub fn fallback(self) -> Option<Self> {
        match self {
            Strategy::Pdf | Strategy::Docx | Strategy::Xlsx => Some(Strategy::Unstructured),
            Strategy::PlainText | Strategy::Markdown | Strategy::Unstructured => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Pdf => "pdf",
            Strategy::PlainText => "plain_text",
            Strategy::Markdown => "markdown",
            Strategy::Docx => "docx",
            Strategy::Xlsx => "xlsx",
            Strategy::Unstructured => "unstructured",
        }
    }

    /// The parser implementing this strategy.
    pub fn parser(self) -> Box<dyn DocumentParser> {
        match self {
            Strategy::Pdf => Box::new(PdfParser::new()),
            Strategy::PlainText => Box::new(TextParser::new()),
            Strategy::Markdown => Box::new(MarkdownParser::new()),
            Strategy::Docx => Box::new(DocxParser::new()),
            Strategy::Xlsx => Box::new(XlsxParser::new()),
            Strategy::Unstructured => Box::new(UnstructuredParser::new()),
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Executes a strategy against a file.
///
/// The pipeline only talks to this trait, so tests can substitute
/// deterministic loaders.
pub trait StrategyRunner: Send + Sync {
    fn run(&self, strategy: Strategy, file: &SourceFile) -> LoadResult<Vec<LoadedUnit>>;
}

/// Runs the built-in parsers.
#[derive(Debug, Default, Clone, Copy)]
pub struct BuiltinStrategies;

impl StrategyRunner for BuiltinStrategies {
    fn run(&self, strategy: Strategy, file: &SourceFile) -> LoadResult<Vec<LoadedUnit>> {
        strategy.parser().parse(file)
    }
}
