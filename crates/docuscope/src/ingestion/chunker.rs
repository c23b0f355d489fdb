//! Text chunking with sentence-aware cut points

use unicode_segmentation::UnicodeSegmentation;

use crate::config::ChunkingConfig;
use crate::types::{Chunk, ChunkSource};

/// Text chunker with configurable size and overlap.
///
/// Lengths are measured in `char`s (Unicode scalar values), not bytes, so a
/// chunk never holds more than `chunk_size` characters regardless of script.
#[derive(Debug, Clone)]
pub struct TextChunker {
    /// Maximum chunk size in characters
    chunk_size: usize,
    /// Characters repeated at the start of the next chunk
    overlap: usize,
}

impl TextChunker {
    /// Create a new chunker. `chunk_size` is clamped to at least 1 and
    /// `overlap` to below `chunk_size`.
    pub fn new(chunk_size: usize, overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            overlap: overlap.min(chunk_size - 1),
        }
    }

    /// Create a chunker from the chunking section of the config
    pub fn from_config(config: &ChunkingConfig) -> Self {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    /// Maximum chunk size in characters
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Lazily split one segment's text into chunks. Every chunk inherits
    /// `source`, with `part` counting up from 0.
    pub fn chunk<'a>(&self, text: &'a str, source: ChunkSource) -> ChunkIter<'a> {
        ChunkIter {
            text,
            offset: 0,
            chunk_size: self.chunk_size,
            overlap: self.overlap,
            source,
            part: 0,
        }
    }
}

/// Iterator over the chunks of one text segment
#[derive(Debug)]
pub struct ChunkIter<'a> {
    text: &'a str,
    /// Byte offset of the unconsumed text
    offset: usize,
    chunk_size: usize,
    overlap: usize,
    source: ChunkSource,
    part: u32,
}

impl ChunkIter<'_> {
    /// Byte length of the next chunk within `rest`, plus where the
    /// following chunk starts (relative to `rest`)
    fn cut(&self, rest: &str) -> (usize, usize) {
        let window_end = match rest.char_indices().nth(self.chunk_size) {
            Some((idx, _)) => idx,
            None => return (rest.len(), rest.len()),
        };
        let window = &rest[..window_end];

        let half = window
            .char_indices()
            .nth(self.chunk_size / 2)
            .map(|(idx, _)| idx)
            .unwrap_or(0);

        let sentence_cut = window
            .split_sentence_bound_indices()
            .map(|(idx, _)| idx)
            .filter(|&idx| idx > half)
            .last();

        let cut = sentence_cut
            .or_else(|| {
                window
                    .char_indices()
                    .filter(|(idx, c)| *idx > 0 && c.is_whitespace())
                    .map(|(idx, _)| idx)
                    .last()
            })
            .unwrap_or(window_end);

        let next_start = if self.overlap == 0 {
            cut
        } else {
            match rest[..cut].char_indices().rev().nth(self.overlap - 1) {
                Some((idx, _)) if idx > 0 => idx,
                _ => cut,
            }
        };

        (cut, next_start)
    }
}

impl Iterator for ChunkIter<'_> {
    type Item = Chunk;

    fn next(&mut self) -> Option<Chunk> {
        loop {
            let rest = &self.text[self.offset..];
            let trimmed = rest.trim_start();
            if trimmed.is_empty() {
                self.offset = self.text.len();
                return None;
            }
            self.offset += rest.len() - trimmed.len();

            let rest = &self.text[self.offset..];
            let (cut, next_start) = self.cut(rest);
            let text = rest[..cut].trim();
            self.offset += next_start;

            if text.is_empty() {
                continue;
            }

            let source = ChunkSource {
                part: self.part,
                ..self.source.clone()
            };
            self.part += 1;
            return Some(Chunk::new(text.to_string(), source));
        }
    }
}
