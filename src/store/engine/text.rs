use serde_json::Value;

use crate::store::core::{Document, TextIndex};

// ============================================================================
// Text Search - Tokenizing, query parsing and relevance scoring
// ============================================================================
//
// Query syntax follows MongoDB's $text:
// - bare words are OR-ed terms
// - "quoted phrases" must all appear
// - -word excludes documents containing the word
//
// Scoring, per indexed field containing at least one query term:
//
//     weight * matched_occurrences * (0.5 + 0.5 / field_token_count)
//
// so a full match on a short field outranks the same words buried in a
// long one. Documents scoring zero do not match.
//
// ============================================================================

const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "in", "is", "it", "of",
    "on", "or", "that", "the", "to", "vs", "was", "with",
];

/// Lower-cased, stemmed, stop-word free tokens
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_lowercase)
        .filter(|word| !STOP_WORDS.contains(&word.as_str()))
        .map(stem)
        .collect()
}

// Plural folding only; enough for club and city names
fn stem(word: String) -> String {
    if word.chars().count() <= 3 {
        return word;
    }
    if let Some(base) = word.strip_suffix("ies") {
        return format!("{}y", base);
    }
    if word.ends_with('s') && !word.ends_with("ss") {
        let mut word = word;
        word.pop();
        return word;
    }
    word
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextQuery {
    pub terms: Vec<String>,
    pub negated: Vec<String>,
    pub phrases: Vec<String>,
}

impl TextQuery {
    pub fn parse(raw: &str) -> Self {
        let mut query = TextQuery::default();
        let mut loose = String::new();

        // Odd-indexed segments sit between quotes
        for (position, segment) in raw.split('"').enumerate() {
            if position % 2 == 1 {
                let phrase = segment.trim().to_lowercase();
                if !phrase.is_empty() {
                    query.terms.extend(tokenize(&phrase));
                    query.phrases.push(phrase);
                }
            } else {
                loose.push(' ');
                loose.push_str(segment);
            }
        }

        for word in loose.split_whitespace() {
            match word.strip_prefix('-') {
                Some(excluded) => query.negated.extend(tokenize(excluded)),
                None => query.terms.extend(tokenize(word)),
            }
        }

        query.terms.sort();
        query.terms.dedup();
        query
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty() && self.phrases.is_empty()
    }

    /// Relevance of `document` under `index`; zero means no match
    pub fn score(&self, document: &Document, index: &TextIndex) -> f64 {
        if self.is_empty() {
            return 0.0;
        }

        let fields: Vec<(String, Vec<String>, f64)> = index
            .fields
            .iter()
            .filter_map(|(field, weight)| match document.get(field) {
                Some(Value::String(text)) => {
                    Some((text.to_lowercase(), tokenize(text), f64::from(*weight)))
                }
                _ => None,
            })
            .collect();

        let excluded = fields
            .iter()
            .any(|(_, tokens, _)| tokens.iter().any(|token| self.negated.contains(token)));
        if excluded {
            return 0.0;
        }

        let phrases_present = self
            .phrases
            .iter()
            .all(|phrase| fields.iter().any(|(text, _, _)| text.contains(phrase.as_str())));
        if !phrases_present {
            return 0.0;
        }

        let mut score = 0.0;
        for (text, tokens, weight) in &fields {
            let matched = tokens
                .iter()
                .filter(|token| self.terms.contains(token))
                .count();
            if matched > 0 {
                score += weight * matched as f64 * (0.5 + 0.5 / tokens.len() as f64);
            } else if self.terms.is_empty()
                && self.phrases.iter().any(|phrase| text.contains(phrase.as_str()))
            {
                score += weight;
            }
        }
        score
    }
}
