//! Content chunking for retrieval.
//!
//! Splits unit text on paragraph boundaries, then sentence boundaries, and
//! only cuts inside a sentence when a single sentence is longer than a chunk.

use docqa_config::ChunkingConfig;
use docqa_core::{Chunk, LoadedUnit, UnitLocation};

/// Configuration for chunking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkConfig {
    /// Target size of each chunk in characters.
    pub chunk_size: usize,
    /// Number of characters carried over from the previous chunk.
    pub chunk_overlap: usize,
    /// A chunk is not closed before it holds this many new characters.
    pub min_chunk_size: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            chunk_overlap: 50,
            min_chunk_size: 50,
        }
    }
}

impl ChunkConfig {
    /// Create config from the `[chunking]` settings.
    pub fn from_chunking_config(config: &ChunkingConfig) -> Self {
        Self {
            chunk_size: config.chunk_size.max(1),
            chunk_overlap: config.chunk_overlap.min(config.chunk_size.saturating_sub(1)),
            min_chunk_size: config.min_chunk_size,
        }
    }
}

/// Content chunker for splitting text.
pub struct Chunker {
    config: ChunkConfig,
}

impl Chunker {
    /// Create a new chunker with the given configuration.
    pub fn new(config: ChunkConfig) -> Self {
        Self { config }
    }

    /// Create a chunker with default configuration.
    pub fn default_chunker() -> Self {
        Self::new(ChunkConfig::default())
    }

    pub fn config(&self) -> &ChunkConfig {
        &self.config
    }

    /// Chunk every unit of a corpus. `unit_index` is the unit's position in
    /// `units`.
    pub fn chunk_units(&self, units: &[LoadedUnit]) -> Vec<Chunk> {
        units
            .iter()
            .enumerate()
            .flat_map(|(i, unit)| {
                self.chunk_text(&unit.source, i, unit.location.clone(), &unit.content)
            })
            .collect()
    }

    /// Split one unit's text into chunks.
    pub fn chunk_text(
        &self,
        source: &str,
        unit_index: usize,
        location: Option<UnitLocation>,
        text: &str,
    ) -> Vec<Chunk> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return vec![];
        }

        if trimmed.chars().count() <= self.config.chunk_size {
            return vec![Chunk::new(source, unit_index, 0, trimmed).with_location(location)];
        }

        let mut acc = Accumulator::new(&self.config, source, unit_index, location);

        for para in trimmed.split("\n\n") {
            let para = para.trim();
            if para.is_empty() {
                continue;
            }

            if para.chars().count() <= self.config.chunk_size {
                acc.push(para, "\n\n");
                continue;
            }

            let mut sep = "\n\n";
            for sentence in split_sentences(para) {
                if sentence.chars().count() <= self.config.chunk_size {
                    acc.push(sentence, sep);
                } else {
                    // No usable boundary (tables, JSON, long URLs)
                    for piece in self.force_split_by_chars(sentence) {
                        acc.push(&piece, sep);
                        sep = " ";
                    }
                }
                sep = " ";
            }
        }

        acc.finish()
    }

    /// Cut text into pieces of at most `chunk_size` characters.
    fn force_split_by_chars(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        chars
            .chunks(self.config.chunk_size.max(1))
            .map(|piece| piece.iter().collect::<String>().trim().to_string())
            .filter(|piece| !piece.is_empty())
            .collect()
    }
}

/// Builds chunks from pieces that each fit in a chunk.
struct Accumulator<'a> {
    config: &'a ChunkConfig,
    source: &'a str,
    unit_index: usize,
    location: Option<UnitLocation>,
    current: String,
    /// Characters at the start of `current` copied from the previous chunk.
    carried: usize,
    chunks: Vec<Chunk>,
}

impl<'a> Accumulator<'a> {
    fn new(
        config: &'a ChunkConfig,
        source: &'a str,
        unit_index: usize,
        location: Option<UnitLocation>,
    ) -> Self {
        Self {
            config,
            source,
            unit_index,
            location,
            current: String::new(),
            carried: 0,
            chunks: Vec::new(),
        }
    }

    fn push(&mut self, piece: &str, sep: &str) {
        let piece_len = piece.chars().count();
        let current_len = self.current.chars().count();
        let fresh = current_len - self.carried;

        if fresh > 0
            && fresh >= self.config.min_chunk_size
            && current_len + sep.len() + piece_len > self.config.chunk_size
        {
            self.flush();
            if self.carried + sep.len() + piece_len > self.config.chunk_size {
                self.current.clear();
                self.carried = 0;
            }
        }

        if !self.current.is_empty() {
            self.current.push_str(sep);
        }
        self.current.push_str(piece);
    }

    /// Close the current chunk and start the next with the overlap tail.
    fn flush(&mut self) {
        let text = self.current.trim();
        if !text.is_empty() {
            self.chunks.push(
                Chunk::new(self.source, self.unit_index, self.chunks.len(), text)
                    .with_location(self.location.clone()),
            );
        }

        let chars: Vec<char> = self.current.chars().collect();
        let skip = chars.len().saturating_sub(self.config.chunk_overlap);
        let tail: String = chars[skip..].iter().collect();
        self.current = tail.trim_start().to_string();
        self.carried = self.current.chars().count();
    }

    fn finish(mut self) -> Vec<Chunk> {
        if self.current.chars().count() > self.carried || self.chunks.is_empty() {
            self.flush();
        }
        self.chunks
    }
}

/// Split text into sentences on `.`, `!` or `?` followed by whitespace.
fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;

    for (i, c) in text.char_indices() {
        if c == '.' || c == '!' || c == '?' {
            let next_idx = i + c.len_utf8();
            let at_boundary = text[next_idx..]
                .chars()
                .next()
                .map_or(true, char::is_whitespace);
            if at_boundary {
                let sentence = text[start..next_idx].trim();
                if !sentence.is_empty() {
                    sentences.push(sentence);
                }
                start = next_idx;
            }
        }
    }

    let remaining = text[start..].trim();
    if !remaining.is_empty() {
        sentences.push(remaining);
    }

    sentences
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_chunker() -> Chunker {
        Chunker::new(ChunkConfig {
            chunk_size: 100,
            chunk_overlap: 20,
            min_chunk_size: 20,
        })
    }

    #[test]
    fn test_small_text_single_chunk() {
        let chunker = Chunker::default_chunker();
        let chunks = chunker.chunk_text("notes.txt", 0, None, "This is a small piece of text.");

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, "This is a small piece of text.");
        assert_eq!(chunks[0].chunk_index, 0);
        assert_eq!(chunks[0].source, "notes.txt");
    }

    #[test]
    fn test_large_text_multiple_chunks() {
        let chunker = small_chunker();

        let text = "This is sentence one. This is sentence two. This is sentence three. \
                    This is sentence four. This is sentence five. This is sentence six. \
                    This is sentence seven. This is sentence eight. This is sentence nine.";

        let chunks = chunker.chunk_text("notes.txt", 0, None, text);

        assert!(chunks.len() > 1, "Should create multiple chunks, got {}", chunks.len());
        for (i, chunk) in chunks.iter().enumerate() {
            assert!(!chunk.content.is_empty());
            assert!(chunk.content.chars().count() <= 100, "chunk too long: {:?}", chunk.content);
            assert_eq!(chunk.chunk_index, i);
        }
        assert!(chunks.last().unwrap().content.ends_with("sentence nine."));
    }

    #[test]
    fn test_overlap_is_carried() {
        let chunker = small_chunker();
        let text = "Alpha bravo charlie delta echo foxtrot. Golf hotel india juliet kilo lima. \
                    Mike november oscar papa quebec romeo. Sierra tango uniform victor whiskey.";

        let chunks = chunker.chunk_text("a.txt", 0, None, text);

        assert!(chunks.len() >= 2);
        let tail: String = {
            let chars: Vec<char> = chunks[0].content.chars().collect();
            chars[chars.len() - 10..].iter().collect()
        };
        assert!(chunks[1].content.contains(&tail));
    }

    #[test]
    fn test_utf8_text() {
        let chunker = Chunker::new(ChunkConfig {
            chunk_size: 50,
            chunk_overlap: 10,
            min_chunk_size: 10,
        });

        let text = "Hello ─── World! This has unicode: 日本語 and more ─ content here.";

        let chunks = chunker.chunk_text("u.txt", 0, None, text);

        assert!(!chunks.is_empty());
        for chunk in &chunks {
            assert!(!chunk.content.is_empty());
        }
    }

    #[test]
    fn test_force_split_without_boundaries() {
        let chunker = small_chunker();
        let text = "x".repeat(350);

        let chunks = chunker.chunk_text("blob.txt", 0, None, &text);

        assert!(chunks.len() >= 4);
        assert!(chunks.iter().all(|c| c.content.chars().count() <= 100));
    }

    #[test]
    fn test_empty_text() {
        let chunker = Chunker::default_chunker();
        assert!(chunker.chunk_text("e.txt", 0, None, "").is_empty());
        assert!(chunker.chunk_text("e.txt", 0, None, "   ").is_empty());
    }

    #[test]
    fn test_paragraph_based_chunking() {
        let chunker = Chunker::new(ChunkConfig {
            chunk_size: 60,
            chunk_overlap: 0,
            min_chunk_size: 10,
        });

        let text = "First paragraph here.\n\nSecond paragraph with more content.\n\nThird paragraph.";

        let chunks = chunker.chunk_text("p.txt", 0, None, text);

        assert_eq!(chunks.len(), 2);
        assert_eq!(
            chunks[0].content,
            "First paragraph here.\n\nSecond paragraph with more content."
        );
        assert_eq!(chunks[1].content, "Third paragraph.");
    }

    #[test]
    fn test_chunk_units_keeps_origin() {
        let chunker = Chunker::default_chunker();
        let units = vec![
            LoadedUnit::new("report.pdf", "Page one text.")
                .with_location(UnitLocation::Page { number: 1 }),
            LoadedUnit::new("report.pdf", "   "),
            LoadedUnit::new("sheet.xlsx", "Sheet: Q1\na | b").with_location(UnitLocation::Sheet {
                name: "Q1".to_string(),
            }),
        ];

        let chunks = chunker.chunk_units(&units);

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].label(), "report.pdf (page 1)");
        assert_eq!(chunks[0].unit_index, 0);
        assert_eq!(chunks[1].label(), "sheet.xlsx (sheet Q1)");
        assert_eq!(chunks[1].unit_index, 2);
    }

    #[test]
    fn test_split_sentences() {
        let sentences = split_sentences("One. Two! Three? v1.2 stays whole");
        assert_eq!(sentences, vec!["One.", "Two!", "Three?", "v1.2 stays whole"]);
    }

    #[test]
    fn test_from_chunking_config() {
        let config = ChunkConfig::from_chunking_config(&ChunkingConfig::default());
        assert_eq!(config, ChunkConfig::default());
    }
}
