//! Heuristic policy statement extraction.

use docsift_core::StatementConfig;

/// Split text into sentences at `.`, `!` or `?` followed by whitespace.
///
/// The terminator stays with its sentence; the whitespace run after it is
/// dropped. Sentences are returned as slices of the input, in order.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((_, c)) = chars.next() {
        if !matches!(c, '.' | '!' | '?') {
            continue;
        }
        let Some(&(next_idx, next)) = chars.peek() else {
            break;
        };
        if !next.is_whitespace() {
            continue;
        }

        sentences.push(&text[start..next_idx]);

        start = text.len();
        while let Some(&(j, ws)) = chars.peek() {
            if ws.is_whitespace() {
                chars.next();
            } else {
                start = j;
                break;
            }
        }
    }

    if start < text.len() {
        sentences.push(&text[start..]);
    }

    sentences.retain(|s| !s.is_empty());
    sentences
}

/// Keeps sentences mentioning any configured keyword
#[derive(Debug, Clone)]
pub struct StatementExtractor {
    keywords: Vec<String>,
}

impl StatementExtractor {
    pub fn new(keywords: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            keywords: keywords
                .into_iter()
                .map(|k| k.into().to_lowercase())
                .filter(|k| !k.trim().is_empty())
                .collect(),
        }
    }

    pub fn from_config(config: &StatementConfig) -> Self {
        Self::new(config.keywords.iter().cloned())
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// Sentences whose lowercased form contains a keyword, verbatim and in order.
    pub fn extract(&self, text: &str) -> Vec<String> {
        split_sentences(text)
            .into_iter()
            .filter(|sentence| {
                let lowered = sentence.to_lowercase();
                self.keywords.iter().any(|k| lowered.contains(k.as_str()))
            })
            .map(str::to_string)
            .collect()
    }
}

impl Default for StatementExtractor {
    fn default() -> Self {
        Self::from_config(&StatementConfig::default())
    }
}

/// Extract statements with the default keyword set.
pub fn extract_statements(text: &str) -> Vec<String> {
    StatementExtractor::default().extract(text)
}
