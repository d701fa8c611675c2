//! Fixed-size character windows with overlap

use std::iter;

use super::normalize::clean;
use crate::types::Chunk;

/// Text chunker with configurable size and overlap
///
/// Sizes and offsets count characters, not bytes.
#[derive(Debug, Clone, Copy)]
pub struct TextChunker {
    /// Window size in characters
    chunk_size: usize,
    /// Characters shared by consecutive windows
    overlap: usize,
}

impl TextChunker {
    /// Create a new chunker; a zero size is treated as one
    pub fn new(chunk_size: usize, overlap: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            overlap,
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Normalize `text` and split it into overlapping windows
    ///
    /// Each window after the first starts `overlap` characters before the
    /// previous one ended. When that would not move forward (overlap at
    /// least the window size) the next window starts where the previous one
    /// ended, so starts are strictly increasing and the loop always ends.
    pub fn chunk(&self, text: &str) -> Vec<Chunk> {
        let text = clean(text);
        if text.is_empty() {
            return Vec::new();
        }

        // Byte offset of every char boundary, end of text included
        let boundaries: Vec<usize> = text
            .char_indices()
            .map(|(i, _)| i)
            .chain(iter::once(text.len()))
            .collect();
        let total = boundaries.len() - 1;

        let mut chunks = Vec::new();
        let mut start = 0;
        loop {
            let end = (start + self.chunk_size).min(total);
            chunks.push(Chunk {
                index: chunks.len(),
                start,
                content: text[boundaries[start]..boundaries[end]].to_string(),
            });

            if end >= total {
                break;
            }
            start = self.next_start(start, end);
        }

        chunks
    }

    fn next_start(&self, start: usize, end: usize) -> usize {
        match end.checked_sub(self.overlap) {
            Some(next) if next > start => next,
            _ => end,
        }
    }
}

/// Chunk `text` with the given window size and overlap
pub fn chunk_text(text: &str, chunk_size: usize, overlap: usize) -> Vec<Chunk> {
    TextChunker::new(chunk_size, overlap).chunk(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALPHABET_25: &str = "abcdefghijklmnopqrstuvwxy";

    fn starts(chunks: &[Chunk]) -> Vec<usize> {
        chunks.iter().map(|c| c.start).collect()
    }

    #[test]
    fn test_window_starts() {
        let chunks = chunk_text(ALPHABET_25, 10, 3);
        assert_eq!(starts(&chunks), vec![0, 7, 14, 21]);
        assert_eq!(chunks[0].content, "abcdefghij");
        assert_eq!(chunks[1].content, "hijklmnopq");
        assert_eq!(chunks[3].content, "vwxy");
        assert_eq!(chunks.last().unwrap().end(), 25);
        assert!(chunks.iter().all(|c| c.char_len() <= 10));
    }

    #[test]
    fn test_consecutive_overlap_is_exact() {
        let chunks = chunk_text(ALPHABET_25, 10, 3);
        for pair in chunks.windows(2) {
            assert_eq!(pair[0].end() - pair[1].start, 3);
        }
    }

    #[test]
    fn test_spans_cover_every_char() {
        for (size, overlap) in [(10, 3), (7, 0), (4, 3), (1, 0), (30, 5)] {
            let chunks = chunk_text(ALPHABET_25, size, overlap);
            let mut covered = vec![false; 25];
            for chunk in &chunks {
                for pos in chunk.start..chunk.end() {
                    covered[pos] = true;
                }
            }
            assert!(covered.iter().all(|c| *c), "gap for size={} overlap={}", size, overlap);
        }
    }

    #[test]
    fn test_degenerate_overlap_terminates() {
        for overlap in [10, 11, 1000] {
            let chunks = chunk_text(ALPHABET_25, 10, overlap);
            assert_eq!(starts(&chunks), vec![0, 10, 20]);
            assert!(starts(&chunks).windows(2).all(|w| w[0] < w[1]));
        }
    }

    #[test]
    fn test_zero_size_is_clamped() {
        let chunks = chunk_text("abc", 0, 0);
        assert_eq!(starts(&chunks), vec![0, 1, 2]);
    }

    #[test]
    fn test_empty_and_blank_text() {
        assert!(chunk_text("", 10, 3).is_empty());
        assert!(chunk_text(" \n\t\n ", 10, 3).is_empty());
    }

    #[test]
    fn test_input_is_normalized() {
        let chunks = chunk_text("  Net   income\n\n\n\n2024  ", 100, 10);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, "Net income\n\n2024");
    }

    #[test]
    fn test_multibyte_text_splits_on_chars() {
        let chunks = chunk_text("€€€€€", 2, 1);
        assert_eq!(starts(&chunks), vec![0, 1, 2, 3]);
        assert!(chunks.iter().all(|c| c.content.chars().all(|ch| ch == '€')));
        assert_eq!(chunks[3].content, "€€");
    }

    #[test]
    fn test_deterministic() {
        let chunker = TextChunker::new(6, 2);
        assert_eq!(chunker.chunk(ALPHABET_25), chunker.chunk(ALPHABET_25));
    }
}
