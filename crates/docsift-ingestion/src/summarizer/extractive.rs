use async_trait::async_trait;
use docsift_core::text::content_tokens;
use std::collections::HashMap;

use super::{SummarizationError, SummarizationModel, SummaryRequest};
use crate::statements::split_sentences;

/// Offline frequency-based extractive summarizer.
///
/// Sentences are scored by the normalised frequency of their non stop
/// words. The best sentences are taken until `min_length` words are
/// collected, never exceeding `max_length` words, and emitted in their
/// original order.
#[derive(Debug, Clone, Default)]
pub struct ExtractiveModel;

impl ExtractiveModel {
    pub fn new() -> Self {
        Self
    }

    pub fn summarize_text(&self, text: &str, request: &SummaryRequest) -> String {
        let sentences = split_sentences(text);
        if sentences.is_empty() || request.max_length == 0 {
            return String::new();
        }

        let mut frequencies: HashMap<String, f64> = HashMap::new();
        for token in content_tokens(text) {
            *frequencies.entry(token).or_insert(0.0) += 1.0;
        }
        let max_frequency = frequencies.values().cloned().fold(0.0, f64::max);

        let mut ranked: Vec<(usize, f64)> = sentences
            .iter()
            .enumerate()
            .map(|(idx, sentence)| {
                let score = if max_frequency > 0.0 {
                    content_tokens(sentence)
                        .iter()
                        .map(|t| frequencies.get(t).copied().unwrap_or(0.0) / max_frequency)
                        .sum()
                } else {
                    0.0
                };
                (idx, score)
            })
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));

        let mut selected: Vec<(usize, String)> = Vec::new();
        let mut total = 0;

        for (idx, _) in ranked {
            if total >= request.min_length || total >= request.max_length {
                break;
            }

            let words: Vec<&str> = sentences[idx].split_whitespace().collect();
            let remaining = request.max_length - total;
            if words.len() > remaining {
                selected.push((idx, words[..remaining].join(" ")));
                break;
            }

            total += words.len();
            selected.push((idx, words.join(" ")));
        }

        selected.sort_by_key(|(idx, _)| *idx);
        selected
            .into_iter()
            .map(|(_, sentence)| sentence)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[async_trait]
impl SummarizationModel for ExtractiveModel {
    async fn summarize_chunk(
        &self,
        text: &str,
        request: &SummaryRequest,
    ) -> Result<String, SummarizationError> {
        Ok(self.summarize_text(text, request))
    }

    fn name(&self) -> &'static str {
        "extractive"
    }
}
