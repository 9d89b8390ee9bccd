//! Markdown document parser.

use super::{read_bytes, DocumentParser};
use crate::error::{LoadError, LoadResult};
use docqa_core::{LoadedUnit, SourceFile};
use pulldown_cmark::{Event, HeadingLevel, Parser, Tag};

/// Rendered markdown: plain text, first H1 and link targets.
struct Rendered {
    text: String,
    title: Option<String>,
    links: Vec<String>,
}

/// Parser for Markdown files. Markup is dropped, text and code are kept.
pub struct MarkdownParser;

impl MarkdownParser {
    /// Create a new markdown parser.
    pub fn new() -> Self {
        Self
    }

    fn render(markdown: &str) -> Rendered {
        let mut text = String::new();
        let mut title: Option<String> = None;
        let mut links = Vec::new();
        let mut heading: Option<(HeadingLevel, String)> = None;

        for event in Parser::new(markdown) {
            match event {
                Event::Start(Tag::Heading(level, _, _)) => {
                    heading = Some((level, String::new()));
                }
                Event::End(Tag::Heading(_, _, _)) => {
                    if let Some((level, content)) = heading.take() {
                        let content = content.trim();
                        if level == HeadingLevel::H1 && title.is_none() {
                            title = Some(content.to_string());
                        }
                        text.push_str(content);
                        text.push_str("\n\n");
                    }
                }
                Event::Start(Tag::CodeBlock(_)) => text.push('\n'),
                Event::End(Tag::CodeBlock(_)) => text.push('\n'),
                Event::Start(Tag::Link(_, dest, _)) => links.push(dest.to_string()),
                Event::End(Tag::Paragraph) => text.push_str("\n\n"),
                Event::End(Tag::List(_)) => text.push('\n'),
                Event::Start(Tag::Item) => text.push_str("- "),
                Event::End(Tag::Item) => text.push('\n'),
                Event::Text(t) | Event::Code(t) => match heading.as_mut() {
                    Some((_, content)) => content.push_str(&t),
                    None => text.push_str(&t),
                },
                Event::SoftBreak | Event::HardBreak => text.push('\n'),
                _ => {}
            }
        }

        Rendered {
            text: text.trim().to_string(),
            title,
            links,
        }
    }
}

impl Default for MarkdownParser {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentParser for MarkdownParser {
    fn parse(&self, file: &SourceFile) -> LoadResult<Vec<LoadedUnit>> {
        let bytes = read_bytes(file)?;
        let markdown = String::from_utf8(bytes).map_err(|e| {
            LoadError::parse(
                &file.path,
                format!("File is not valid UTF-8: {}", e.utf8_error()),
            )
        })?;

        let rendered = Self::render(&markdown);
        if rendered.text.is_empty() {
            return Ok(vec![]);
        }

        let metadata = serde_json::json!({
            "format": "markdown",
            "strategy": "markdown",
            "title": rendered.title,
            "links": rendered.links,
            "original_length": markdown.len(),
        });

        Ok(vec![
            LoadedUnit::new(&file.file_name, rendered.text).with_metadata(metadata)
        ])
    }
}
