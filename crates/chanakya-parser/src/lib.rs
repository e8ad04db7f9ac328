//! Chanakya Parser - Corpus loading and chunking
//!
//! Loads UTF-8 plain text corpora and cuts them into overlapping,
//! fixed-size character windows ready for embedding.

use std::path::Path;
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur while loading or chunking a corpus
#[derive(Error, Debug)]
pub enum ParserError {
    /// IO error while reading the file
    #[error("IO error reading file: {path}")]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// File is not valid UTF-8
    #[error("Text encoding error: {0}")]
    EncodingError(String),

    /// Chunking parameters cannot produce forward progress
    #[error("Invalid chunk configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, ParserError>;

// ============================================================================
// Parsed Document Types
// ============================================================================

/// A loaded document with its full text
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    /// Original file path
    pub file_path: String,

    /// Extracted text content
    pub content: String,
}

impl ParsedDocument {
    /// Create a new parsed document
    pub fn new(file_path: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            content: String::new(),
        }
    }

    /// Set content
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    /// Get total character count
    pub fn char_count(&self) -> usize {
        self.content.chars().count()
    }
}

/// Trait implemented by document loaders
pub trait DocumentParser: Send + Sync {
    /// Parse a document from a file path
    fn parse(&self, path: &Path) -> Result<ParsedDocument>;
}

/// UTF-8 plain text loader
pub struct PlainTextParser;

impl DocumentParser for PlainTextParser {
    fn parse(&self, path: &Path) -> Result<ParsedDocument> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::InvalidData {
                ParserError::EncodingError(format!("{} is not valid UTF-8", path.display()))
            } else {
                ParserError::IoError {
                    path: path.display().to_string(),
                    source: e,
                }
            }
        })?;

        Ok(ParsedDocument::new(path.display().to_string()).with_content(content))
    }
}

// ============================================================================
// Chunking
// ============================================================================

/// Configuration for document chunking
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkConfig {
    /// Window size in characters
    pub chunk_size: usize,

    /// Characters shared by neighbouring windows
    pub overlap: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            overlap: 200,
        }
    }
}

impl ChunkConfig {
    /// Create a validated configuration
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        let config = Self {
            chunk_size,
            overlap,
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would never advance the window
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(ParserError::InvalidConfig(
                "chunk_size must be greater than zero".to_string(),
            ));
        }
        if self.overlap >= self.chunk_size {
            return Err(ParserError::InvalidConfig(format!(
                "overlap ({}) must be smaller than chunk_size ({})",
                self.overlap, self.chunk_size
            )));
        }
        Ok(())
    }

    /// Distance between the starts of consecutive windows
    pub fn step(&self) -> usize {
        self.chunk_size - self.overlap
    }

    /// Upper bound on the number of chunks for `char_len` characters
    pub fn max_chunks(&self, char_len: usize) -> usize {
        char_len.div_ceil(self.step())
    }
}

/// A chunk of text from a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChunk {
    /// Chunk content, trimmed of surrounding whitespace
    pub content: String,

    /// Chunk index within the document
    pub index: u32,

    /// Starting character offset of the window
    pub start_offset: usize,

    /// Ending character offset of the window (exclusive)
    pub end_offset: usize,
}

/// Chunk a parsed document into overlapping windows
pub fn chunk_document(doc: &ParsedDocument, config: &ChunkConfig) -> Result<Vec<TextChunk>> {
    chunk_text(&doc.content, config)
}

/// Split `text` into windows of `chunk_size` characters overlapping by `overlap`.
///
/// Windows are cut on character boundaries only; sentences and words may be
/// split. Windows that are blank after trimming are skipped.
pub fn chunk_text(text: &str, config: &ChunkConfig) -> Result<Vec<TextChunk>> {
    config.validate()?;

    // Byte offset of every char, plus the end of the string
    let boundaries: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    let char_len = boundaries.len() - 1;

    let mut chunks = Vec::new();
    let mut start = 0;

    while start < char_len {
        let end = (start + config.chunk_size).min(char_len);
        let window = text[boundaries[start]..boundaries[end]].trim();

        if !window.is_empty() {
            chunks.push(TextChunk {
                content: window.to_string(),
                index: chunks.len() as u32,
                start_offset: start,
                end_offset: end,
            });
        }

        if end == char_len {
            break;
        }
        start += config.step();
    }

    Ok(chunks)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::io::Write;

    #[test]
    fn test_chunking() {
        let doc = ParsedDocument::new("test.txt").with_content("This is a test. ".repeat(100));

        let config = ChunkConfig::new(200, 50).unwrap();

        let chunks = chunk_document(&doc, &config).unwrap();
        assert!(!chunks.is_empty());

        for window in chunks.windows(2) {
            assert_eq!(window[1].start_offset, window[0].start_offset + 150);
            assert!(window[0].end_offset > window[1].start_offset);
        }
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.index, i as u32);
            assert!(chunk.content.chars().count() <= 200);
        }
    }

    #[test]
    fn test_short_text_is_single_chunk() {
        let text = "The king shall be ever active. Wealth is the root of dharma. \
                    A single wheel cannot turn.";
        let chunks = chunk_text(text, &ChunkConfig::default()).unwrap();

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, text);
        assert_eq!(chunks[0].start_offset, 0);
    }

    #[test]
    fn test_exact_window_lengths() {
        let text = "a".repeat(2500);
        let chunks = chunk_text(&text, &ChunkConfig::default()).unwrap();

        // Windows start at 0, 800, 1600; the third reaches the end
        let offsets: Vec<_> = chunks.iter().map(|c| (c.start_offset, c.end_offset)).collect();
        assert_eq!(offsets, vec![(0, 1000), (800, 1800), (1600, 2500)]);
    }

    #[test]
    fn test_overlap_content_is_shared() {
        let text: String = ('a'..='z').cycle().take(30).collect();
        let chunks = chunk_text(&text, &ChunkConfig::new(10, 4).unwrap()).unwrap();

        let first = &chunks[0].content;
        let second = &chunks[1].content;
        assert_eq!(&first[6..], &second[..4]);
    }

    #[test]
    fn test_multibyte_characters() {
        let text = "धर्म".repeat(300);
        let chunks = chunk_text(&text, &ChunkConfig::new(100, 20).unwrap()).unwrap();

        assert!(!chunks.is_empty());
        for chunk in &chunks {
            assert!(chunk.content.chars().count() <= 100);
        }
    }

    #[test]
    fn test_empty_and_blank_text() {
        let config = ChunkConfig::default();
        assert!(chunk_text("", &config).unwrap().is_empty());
        assert!(chunk_text(" \n\t\n ", &config).unwrap().is_empty());
    }

    #[test]
    fn test_invalid_config() {
        assert!(ChunkConfig::new(0, 0).is_err());
        assert!(ChunkConfig::new(100, 100).is_err());
        assert!(ChunkConfig::new(100, 150).is_err());

        let bad = ChunkConfig {
            chunk_size: 10,
            overlap: 10,
        };
        assert!(matches!(
            chunk_text("hello", &bad),
            Err(ParserError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_plain_text_parser() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "Book One: Concerning Discipline.").unwrap();

        let doc = PlainTextParser.parse(file.path()).unwrap();
        assert_eq!(doc.content, "Book One: Concerning Discipline.");
        assert_eq!(doc.char_count(), 32);
    }

    #[test]
    fn test_missing_file() {
        let err = PlainTextParser
            .parse(Path::new("/no/such/arthashastra.txt"))
            .unwrap_err();
        assert!(matches!(err, ParserError::IoError { .. }));
    }

    #[test]
    fn test_invalid_utf8() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[0x66, 0x6f, 0xff, 0xfe]).unwrap();

        let err = PlainTextParser.parse(file.path()).unwrap_err();
        assert!(matches!(err, ParserError::EncodingError(_)));
    }

    proptest! {
        #[test]
        fn prop_chunk_count_bounded(
            text in "[a-z .\n]{0,4000}[a-z]",
            chunk_size in 10usize..1500,
            overlap_pct in 0usize..90,
        ) {
            let overlap = chunk_size * overlap_pct / 100;
            let config = ChunkConfig::new(chunk_size, overlap).unwrap();
            let chunks = chunk_text(&text, &config).unwrap();
            let len = text.chars().count();

            prop_assert!(!chunks.is_empty());
            prop_assert!(chunks.len() <= config.max_chunks(len));
        }

        #[test]
        fn prop_chunking_is_deterministic(text in "\\PC{0,3000}") {
            let config = ChunkConfig::default();
            let first = chunk_text(&text, &config).unwrap();
            let second = chunk_text(&text, &config).unwrap();
            prop_assert_eq!(first, second);
        }
    }
}
