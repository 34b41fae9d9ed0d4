use std::collections::HashSet;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Words dropped by the tokenizer
pub const STOPWORDS: &[&str] = &[
    "a", "about", "after", "all", "also", "am", "an", "and", "any", "are", "as", "at", "be",
    "been", "but", "by", "can", "could", "did", "do", "does", "for", "from", "had", "has",
    "have", "he", "her", "his", "how", "i", "if", "in", "into", "is", "it", "its", "just", "me",
    "my", "no", "not", "of", "on", "or", "our", "out", "she", "so", "some", "than", "that",
    "the", "their", "them", "then", "there", "these", "they", "this", "to", "too", "up", "us",
    "very", "was", "we", "were", "what", "when", "which", "who", "will", "with", "would", "you",
    "your",
];

/// Lowercasing, stopword-filtering tokenizer
///
/// Every character outside `[a-z0-9]` and whitespace is removed before
/// splitting, so `"don't"` becomes `"dont"`. There is no stemming:
/// `"guitars"` and `"guitar"` are different tokens.
///
/// # Examples
/// ```
/// use creative_scoring::Tokenizer;
/// let tokens = Tokenizer::new().tokenize("Mixing a vocal track!");
/// assert_eq!(tokens, vec!["mixing", "vocal", "track"]);
/// ```
#[derive(Debug, Clone)]
pub struct Tokenizer {
    stopwords: HashSet<&'static str>,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Tokenizer {
    pub fn new() -> Self {
        Self {
            stopwords: STOPWORDS.iter().copied().collect(),
        }
    }

    /// Split text into tokens
    ///
    /// # Arguments
    /// * `text` - free text
    ///
    /// # Returns
    /// * `Vec<String>` - tokens in input order, duplicates kept
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let cleaned: String = text
            .to_lowercase()
            .chars()
            .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c.is_whitespace())
            .collect();
        cleaned
            .split_whitespace()
            .filter(|tok| !tok.is_empty() && !self.stopwords.contains(tok))
            .map(str::to_string)
            .collect()
    }

    /// Same as `tokenize`, absent text counts as empty
    pub fn tokenize_opt(&self, text: Option<&str>) -> Vec<String> {
        text.map(|t| self.tokenize(t)).unwrap_or_default()
    }

    pub fn is_stopword(&self, token: &str) -> bool {
        self.stopwords.contains(token)
    }
}

/// Tokenize with the default stopword set
pub fn tokenize(text: &str) -> Vec<String> {
    Tokenizer::new().tokenize(text)
}

/// TermFrequency
/// Counts how often each term occurs in one document.
/// Insertion order of terms is kept so that iteration is deterministic.
///
/// # Examples
/// ```
/// use creative_scoring::TermFrequency;
/// let mut freq = TermFrequency::new();
/// freq.add_terms(&["guitar", "ambient", "guitar"]);
/// assert_eq!(freq.term_count("guitar"), 2);
/// assert_eq!(freq.term_sum(), 3);
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct TermFrequency {
    #[serde(with = "indexmap::map::serde_seq")]
    term_count: IndexMap<String, u64>,
    total_term_count: u64,
}

/// Adding and removing terms
impl TermFrequency {
    pub fn new() -> Self {
        Self {
            term_count: IndexMap::new(),
            total_term_count: 0,
        }
    }

    /// Count the terms of a token sequence
    pub fn from_terms<T: AsRef<str>>(terms: &[T]) -> Self {
        let mut freq = Self::new();
        freq.add_terms(terms);
        freq
    }

    #[inline]
    pub fn add_term(&mut self, term: &str) -> &mut Self {
        let count = self.term_count.entry(term.to_string()).or_insert(0);
        *count += 1;
        self.total_term_count += 1;
        self
    }

    #[inline]
    pub fn add_terms<T>(&mut self, terms: &[T]) -> &mut Self
    where
        T: AsRef<str>,
    {
        for term in terms {
            self.add_term(term.as_ref());
        }
        self
    }
}

/// Read access
impl TermFrequency {
    /// Occurrences of a term, zero if absent
    #[inline]
    pub fn term_count(&self, term: &str) -> u64 {
        self.term_count.get(term).copied().unwrap_or(0)
    }

    /// Total number of terms added
    #[inline]
    pub fn term_sum(&self) -> u64 {
        self.total_term_count
    }

    /// Number of distinct terms
    #[inline]
    pub fn term_num(&self) -> usize {
        self.term_count.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.total_term_count == 0
    }

    #[inline]
    pub fn contains_term(&self, term: &str) -> bool {
        self.term_count.contains_key(term)
    }

    /// Iterate `(term, count)` in first-seen order
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.term_count.iter().map(|(t, &c)| (t.as_str(), c))
    }

    /// Distinct terms in first-seen order
    #[inline]
    pub fn term_set_ref_str(&self) -> Vec<&str> {
        self.term_count.keys().map(String::as_str).collect()
    }

    /// Relative frequency of a term
    /// tf = count / total
    ///
    /// # Returns
    /// * `f64` - 0.0 for an empty table or an absent term
    #[inline]
    pub fn tf(&self, term: &str) -> f64 {
        if self.total_term_count == 0 {
            return 0.0;
        }
        self.term_count(term) as f64 / self.total_term_count as f64
    }

    /// Lexical diversity
    /// 1.0 means every term is distinct
    #[inline]
    pub fn unique_term_ratio(&self) -> f64 {
        if self.total_term_count == 0 {
            return 0.0;
        }
        self.term_count.len() as f64 / self.total_term_count as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenize_strips_punctuation_and_stopwords() {
        let tokens = tokenize("Hello, World! This is the BEST track of 2024.");
        assert_eq!(tokens, vec!["hello", "world", "best", "track", "2024"]);
    }

    #[test]
    fn tokenize_removes_inner_punctuation() {
        assert_eq!(tokenize("don't stop-motion"), vec!["dont", "stopmotion"]);
    }

    #[test]
    fn tokenize_empty_and_absent() {
        let t = Tokenizer::new();
        assert!(t.tokenize("").is_empty());
        assert!(t.tokenize("   \n\t ").is_empty());
        assert!(t.tokenize("!!! ???").is_empty());
        assert!(t.tokenize_opt(None).is_empty());
        assert_eq!(t.tokenize_opt(Some("Guitar")), vec!["guitar"]);
    }

    #[test]
    fn tokenize_does_not_stem() {
        assert_eq!(tokenize("guitars"), vec!["guitars"]);
    }

    #[test]
    fn tokenize_drops_non_ascii_letters() {
        assert_eq!(tokenize("café crème"), vec!["caf", "crme"]);
    }

    #[test]
    fn tokenize_is_idempotent() {
        let inputs = [
            "Mixing a vocal track with guitars",
            "  The QUICK brown fox -- jumps!!! over 3 lazy dogs?? ",
            "http://example.com/a_b?c=d",
            "Ünïcödé and   tabs\tand\nnewlines",
            "",
        ];
        for input in inputs {
            let once = tokenize(input);
            let twice = tokenize(&once.join(" "));
            assert_eq!(once, twice, "not idempotent for {input:?}");
        }
    }

    #[test]
    fn term_frequency_counts() {
        let mut freq = TermFrequency::new();
        freq.add_terms(&["a", "b", "a"]).add_term("c");
        assert_eq!(freq.term_count("a"), 2);
        assert_eq!(freq.term_count("z"), 0);
        assert_eq!(freq.term_sum(), 4);
        assert_eq!(freq.term_num(), 3);
        assert_eq!(freq.tf("a"), 0.5);
        assert_eq!(freq.unique_term_ratio(), 0.75);
        assert_eq!(freq.term_set_ref_str(), vec!["a", "b", "c"]);
    }
}
