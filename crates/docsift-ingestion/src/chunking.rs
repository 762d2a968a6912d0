//! Word Chunking Module
//!
//! Splits text into consecutive, non-overlapping runs of whitespace-delimited
//! words so that every chunk fits the summarization model's input limit.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{IngestionError, Result};

/// A contiguous slice of a document's word sequence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Chunk index within the document
    pub index: usize,
    /// Index of the first word in the document's word sequence
    pub start_word: usize,
    /// Words joined by single spaces
    pub content: String,
    /// Number of words in the chunk
    pub word_count: usize,
}

impl Chunk {
    pub fn is_shorter_than(&self, words: usize) -> bool {
        self.word_count < words
    }
}

/// Fixed-budget word chunker
#[derive(Debug, Clone)]
pub struct WordChunker {
    max_words: usize,
}

impl WordChunker {
    pub fn new(max_words: usize) -> Result<Self> {
        if max_words == 0 {
            return Err(IngestionError::ValidationError(
                "Chunk size must be greater than 0".to_string(),
            ));
        }
        Ok(Self { max_words })
    }

    pub fn max_words(&self) -> usize {
        self.max_words
    }

    /// Partition `text` into chunks of at most `max_words` words, in order.
    pub fn chunk(&self, text: &str) -> Vec<Chunk> {
        let words: Vec<&str> = text.split_whitespace().collect();

        let chunks: Vec<Chunk> = words
            .chunks(self.max_words)
            .enumerate()
            .map(|(index, slice)| Chunk {
                index,
                start_word: index * self.max_words,
                content: slice.join(" "),
                word_count: slice.len(),
            })
            .collect();

        debug!(
            word_count = words.len(),
            chunk_count = chunks.len(),
            max_words = self.max_words,
            "Text chunked"
        );

        chunks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(n: usize) -> String {
        (0..n).map(|i| format!("w{}", i)).collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn test_zero_size_rejected() {
        assert!(WordChunker::new(0).is_err());
    }

    #[test]
    fn test_empty_text() {
        let chunker = WordChunker::new(900).unwrap();
        assert!(chunker.chunk("").is_empty());
        assert!(chunker.chunk("  \n\t ").is_empty());
    }

    #[test]
    fn test_exact_budget_is_one_chunk() {
        let chunker = WordChunker::new(900).unwrap();
        let chunks = chunker.chunk(&words(900));

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].word_count, 900);
    }

    #[test]
    fn test_overflow_splits_without_overlap() {
        let chunker = WordChunker::new(900).unwrap();
        let chunks = chunker.chunk(&words(1801));

        let sizes: Vec<usize> = chunks.iter().map(|c| c.word_count).collect();
        assert_eq!(sizes, vec![900, 900, 1]);
        assert_eq!(chunks[1].start_word, 900);
        assert!(chunks[1].content.starts_with("w900 "));
        assert_eq!(chunks[2].content, "w1800");
    }

    #[test]
    fn test_whitespace_is_normalised() {
        let chunker = WordChunker::new(2).unwrap();
        let chunks = chunker.chunk("a\n\nb\tc   d e");

        let contents: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(contents, vec!["a b", "c d", "e"]);
        assert!(chunks[2].is_shorter_than(2));
    }
}
