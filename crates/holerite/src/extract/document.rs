//! Line-oriented view of acquired text for rule matching.
//!
//! Rules match against an accent-folded uppercase copy of each line and read
//! values back from the original. Folding maps one char to one char, so char
//! offsets are shared between the two.

use std::sync::LazyLock;

use regex::Regex;

use crate::utils::text::fold;

/// Column chunks: runs of text separated by two or more spaces.
static CHUNK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\S+(?: \S+)*").unwrap());

/// One column chunk of a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk<'a> {
    /// Char column where the chunk starts.
    pub column: usize,
    pub text: &'a str,
}

#[derive(Debug, Clone)]
pub struct TextLine {
    original: String,
    folded: String,
}

impl TextLine {
    pub fn new(line: &str) -> Self {
        Self {
            original: line.to_string(),
            folded: fold(line),
        }
    }

    pub fn original(&self) -> &str {
        &self.original
    }

    pub fn folded(&self) -> &str {
        &self.folded
    }

    pub fn is_blank(&self) -> bool {
        self.original.trim().is_empty()
    }

    /// Char column of a byte offset into the folded line.
    pub fn column_of(&self, folded_byte: usize) -> usize {
        self.folded[..folded_byte.min(self.folded.len())]
            .chars()
            .count()
    }

    fn original_byte(&self, column: usize) -> usize {
        self.original
            .char_indices()
            .nth(column)
            .map(|(i, _)| i)
            .unwrap_or(self.original.len())
    }

    /// Original text between two folded byte offsets.
    pub fn span(&self, folded_start: usize, folded_end: usize) -> &str {
        let start = self.original_byte(self.column_of(folded_start));
        let end = self.original_byte(self.column_of(folded_end));
        &self.original[start..end.max(start)]
    }

    /// Original text from a folded byte offset to the end of the line.
    pub fn tail_from(&self, folded_byte: usize) -> &str {
        let start = self.original_byte(self.column_of(folded_byte));
        &self.original[start..]
    }

    /// Original text before a folded byte offset.
    pub fn head_to(&self, folded_byte: usize) -> &str {
        let end = self.original_byte(self.column_of(folded_byte));
        &self.original[..end]
    }

    pub fn chunks(&self) -> Vec<Chunk<'_>> {
        chunks_of(&self.original)
    }
}

/// Split `text` into column chunks.
pub fn chunks_of(text: &str) -> Vec<Chunk<'_>> {
    CHUNK
        .find_iter(text)
        .map(|m| Chunk {
            column: text[..m.start()].chars().count(),
            text: m.as_str(),
        })
        .collect()
}

/// Acquired text prepared for rule matching.
#[derive(Debug, Clone)]
pub struct DocumentText {
    text: String,
    lines: Vec<TextLine>,
}

impl DocumentText {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            lines: text.lines().map(TextLine::new).collect(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn lines(&self) -> &[TextLine] {
        &self.lines
    }
}
