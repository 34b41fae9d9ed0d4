use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Document-frequency statistics of a corpus snapshot
///
/// Keeps the number of documents and, for every term, the number of documents
/// containing it at least once. It is the base data for IDF calculation and
/// does not store document text.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Corpus {
    doc_num: u64,
    #[serde(with = "indexmap::map::serde_seq")]
    term_counts: IndexMap<String, u64>,
}

impl Corpus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one document's distinct terms
    pub fn add_set<T>(&mut self, terms: &[T])
    where
        T: AsRef<str>,
    {
        self.doc_num += 1;
        for term in terms {
            *self.term_counts.entry(term.as_ref().to_string()).or_insert(0) += 1;
        }
    }

    /// Number of documents
    #[inline]
    pub fn doc_num(&self) -> u64 {
        self.doc_num
    }

    /// Number of documents containing `term`
    #[inline]
    pub fn term_count(&self, term: &str) -> u64 {
        self.term_counts.get(term).copied().unwrap_or(0)
    }

    #[inline]
    pub fn contains_term(&self, term: &str) -> bool {
        self.term_counts.contains_key(term)
    }

    /// Number of distinct terms
    #[inline]
    pub fn vocab_size(&self) -> usize {
        self.term_counts.len()
    }

    pub fn terms(&self) -> impl Iterator<Item = &str> {
        self.term_counts.keys().map(String::as_str)
    }
}
