//! Text tokenization and stemming for the in-memory full-text search.

use ahash::AHashMap;
use rust_stemmers::{Algorithm, Stemmer};

/// Common English stop words to filter out from indexing.
/// These high-frequency words add little value to search relevance.
pub(crate) const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "has", "he", "in", "is", "it",
    "its", "of", "on", "that", "the", "to", "was", "will", "with",
];

/// Create the stemmer shared by indexing and querying.
pub(crate) fn english_stemmer() -> Stemmer {
    Stemmer::create(Algorithm::English)
}

/// Splits text into lowercase, stemmed tokens.
///
/// Words are runs of alphanumeric characters, so paths like `golang.org/x/tools`
/// yield `golang`, `org`, `x`, `tool`. A word with a lowercase-to-uppercase
/// transition also yields its parts, so `HttpServer` adds `http` and `server`
/// next to the whole word.
pub(crate) fn tokenize_and_stem(text: &str, stemmer: &Stemmer) -> Vec<String> {
    let mut tokens = vec![];

    for word in text.split(|c: char| !c.is_alphanumeric()) {
        if word.is_empty() {
            continue;
        }
        index_token(word, &mut tokens, stemmer);

        let parts = camel_case_parts(word);
        if parts.len() > 1 {
            for part in parts {
                index_token(part, &mut tokens, stemmer);
            }
        }
    }

    tokens
}

/// Add a token using proper stemming algorithm, filtering out stop words.
fn index_token(token: &str, tokens: &mut Vec<String>, stemmer: &Stemmer) {
    let lowercase = token.to_lowercase();

    if STOP_WORDS.contains(&lowercase.as_str()) {
        return;
    }

    let stemmed = stemmer.stem(&lowercase);
    tokens.push(stemmed.into_owned());
}

fn camel_case_parts(word: &str) -> Vec<&str> {
    let mut parts = vec![];
    let mut start = 0;
    let mut last_lower = false;

    for (i, c) in word.char_indices() {
        if last_lower && c.is_uppercase() {
            parts.push(&word[start..i]);
            start = i;
        }
        last_lower = c.is_lowercase();
    }
    parts.push(&word[start..]);
    parts
}

/// Weighted term frequencies for one searchable document.
#[derive(Debug, Clone, Default)]
pub(crate) struct TermWeights {
    weights: AHashMap<String, f64>,
}

impl TermWeights {
    /// Adds every token of `text` with the given per-occurrence weight.
    pub(crate) fn add_text(&mut self, text: &str, weight: f64, stemmer: &Stemmer) {
        for token in tokenize_and_stem(text, stemmer) {
            *self.weights.entry(token).or_insert(0.0) += weight;
        }
    }

    /// Combined weight of all query tokens, or `None` unless every token is present.
    pub(crate) fn match_all(&self, tokens: &[String]) -> Option<f64> {
        tokens
            .iter()
            .map(|token| self.weights.get(token).copied())
            .sum()
    }
}
