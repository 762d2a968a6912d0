//! TF-IDF vectorization with English stop words.

use docsift_core::text::{is_stop_word, tokenize};
use std::collections::{BTreeMap, BTreeSet};

use crate::Result;

/// Turns documents into fixed-width numeric rows
pub trait Vectorizer: Send + Sync {
    fn fit_transform(&self, documents: &[String]) -> Result<Vec<Vec<f64>>>;

    fn name(&self) -> &'static str;
}

/// TF-IDF vectorizer.
///
/// Vocabulary terms are sorted. Term frequencies are raw counts, the idf is
/// smoothed (`ln((1 + n) / (1 + df)) + 1`) and each row is L2 normalised.
#[derive(Debug, Clone)]
pub struct TfidfVectorizer {
    stop_words: bool,
}

impl Default for TfidfVectorizer {
    fn default() -> Self {
        Self { stop_words: true }
    }
}

impl TfidfVectorizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn without_stop_words(mut self) -> Self {
        self.stop_words = false;
        self
    }

    fn analyze(&self, document: &str) -> Vec<String> {
        tokenize(document)
            .into_iter()
            .filter(|t| !self.stop_words || !is_stop_word(t))
            .collect()
    }

    /// Sorted vocabulary for `documents`
    pub fn vocabulary(&self, documents: &[String]) -> Vec<String> {
        documents
            .iter()
            .flat_map(|d| self.analyze(d))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

impl Vectorizer for TfidfVectorizer {
    fn fit_transform(&self, documents: &[String]) -> Result<Vec<Vec<f64>>> {
        let analyzed: Vec<Vec<String>> = documents.iter().map(|d| self.analyze(d)).collect();

        let vocabulary: BTreeMap<&str, usize> = analyzed
            .iter()
            .flatten()
            .map(String::as_str)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .enumerate()
            .map(|(i, term)| (term, i))
            .collect();

        let mut document_frequency = vec![0usize; vocabulary.len()];
        let mut counts: Vec<Vec<f64>> = Vec::with_capacity(analyzed.len());
        for tokens in &analyzed {
            let mut row = vec![0.0; vocabulary.len()];
            for token in tokens {
                row[vocabulary[token.as_str()]] += 1.0;
            }
            for (df, count) in document_frequency.iter_mut().zip(&row) {
                if *count > 0.0 {
                    *df += 1;
                }
            }
            counts.push(row);
        }

        let n = documents.len() as f64;
        let idf: Vec<f64> = document_frequency
            .iter()
            .map(|&df| ((1.0 + n) / (1.0 + df as f64)).ln() + 1.0)
            .collect();

        Ok(counts
            .into_iter()
            .map(|row| {
                let mut weighted: Vec<f64> = row.iter().zip(&idf).map(|(tf, w)| tf * w).collect();
                let norm = weighted.iter().map(|v| v * v).sum::<f64>().sqrt();
                if norm > 0.0 {
                    weighted.iter_mut().for_each(|v| *v /= norm);
                }
                weighted
            })
            .collect())
    }

    fn name(&self) -> &'static str {
        "tfidf"
    }
}
