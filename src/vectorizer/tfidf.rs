use crate::vectorizer::{corpus::Corpus, token::TermFrequency, TermVector};

/// TF-IDF weighting strategy
///
/// Implement this to plug a different weighting into `SimilarityIndex<E>`.
pub trait TfIdfEngine {
    /// IDF of a term
    ///
    /// # Arguments
    /// * `doc_num` - number of documents in the corpus
    /// * `doc_freq` - number of documents containing the term
    fn idf(doc_num: u64, doc_freq: u64) -> f64;

    /// TF of a term
    ///
    /// # Arguments
    /// * `count` - occurrences of the term in the document
    /// * `total` - number of terms in the document
    fn tf(count: u64, total: u64) -> f64;

    /// Build a document's TF-IDF vector
    /// Terms the corpus has never seen are dropped.
    fn tfidf_vec(freq: &TermFrequency, corpus: &Corpus) -> TermVector {
        let total = freq.term_sum();
        let doc_num = corpus.doc_num();
        freq.iter()
            .filter_map(|(term, count)| {
                let doc_freq = corpus.term_count(term);
                if doc_freq == 0 {
                    return None;
                }
                let weight = Self::tf(count, total) * Self::idf(doc_num, doc_freq);
                (weight > 0.0).then(|| (term.to_string(), weight))
            })
            .collect()
    }
}

/// Default engine
/// tf = count / total
/// idf = ln((N + 1) / (df + 1)) + 1
///
/// The smoothed IDF is always positive, even for a term present in every
/// document of a singleton corpus.
#[derive(Debug, Clone, Copy, Default)]
pub struct SmoothedTfIdfEngine;

impl TfIdfEngine for SmoothedTfIdfEngine {
    #[inline]
    fn idf(doc_num: u64, doc_freq: u64) -> f64 {
        ((doc_num as f64 + 1.0) / (doc_freq as f64 + 1.0)).ln() + 1.0
    }

    #[inline]
    fn tf(count: u64, total: u64) -> f64 {
        if total == 0 {
            return 0.0;
        }
        count as f64 / total as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smoothed_idf_is_positive_and_bounded() {
        for n in 1..20u64 {
            let upper = ((n + 1) as f64).ln() + 1.0;
            for df in 0..=n {
                let idf = SmoothedTfIdfEngine::idf(n, df);
                assert!(idf > 0.0);
                assert!(idf <= upper + 1e-12);
            }
            assert!((SmoothedTfIdfEngine::idf(n, 0) - upper).abs() < 1e-12);
            assert!((SmoothedTfIdfEngine::idf(n, n) - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn tf_of_empty_document_is_zero() {
        assert_eq!(SmoothedTfIdfEngine::tf(0, 0), 0.0);
        assert_eq!(SmoothedTfIdfEngine::tf(1, 4), 0.25);
    }

    #[test]
    fn tfidf_vec_drops_unseen_terms() {
        let mut corpus = Corpus::new();
        corpus.add_set(&["guitar"]);
        let freq = TermFrequency::from_terms(&["guitar", "banjo"]);
        let vec = SmoothedTfIdfEngine::tfidf_vec(&freq, &corpus);
        assert_eq!(vec.len(), 1);
        assert!((vec["guitar"] - 0.5).abs() < 1e-12);
    }
}
