use std::fmt;

use rayon::prelude::*;

use crate::utils::math::sparse_cosine;
use crate::vectorizer::{tfidf::TfIdfEngine, Document, DocumentId, SimilarityIndex, TermVector};

/// One ranked result
#[derive(Debug, Clone, PartialEq)]
pub struct HitEntry {
    pub document: Document,
    pub score: f64,
}

/// Structure to store search results
#[derive(Clone, PartialEq, Default)]
pub struct Hits {
    pub list: Vec<HitEntry>,
}

impl Hits {
    pub fn new(list: Vec<HitEntry>) -> Self {
        Hits { list }
    }

    /// Sort results by descending score
    /// The sort is stable, so equal scores keep corpus order.
    pub fn sort_by_score_desc(&mut self) -> &mut Self {
        self.list.retain(|hit| !hit.score.is_nan());
        self.list.sort_by(|a, b| b.score.total_cmp(&a.score));
        self
    }

    /// Drop every hit whose score is not strictly positive
    pub fn retain_positive(&mut self) -> &mut Self {
        self.list.retain(|hit| hit.score > 0.0);
        self
    }

    pub fn truncate(&mut self, k: usize) -> &mut Self {
        self.list.truncate(k);
        self
    }

    pub fn ids(&self) -> Vec<&DocumentId> {
        self.list.iter().map(|hit| &hit.document.id).collect()
    }

    pub fn top(&self) -> Option<&HitEntry> {
        self.list.first()
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }
}

impl fmt::Debug for Hits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            writeln!(f, "Hits [")?;
            for hit in &self.list {
                writeln!(f, "    {}: {:.6} ({})", hit.document.id, hit.score, hit.document.title)?;
            }
            write!(f, "]")
        } else {
            f.debug_list()
                .entries(self.list.iter().map(|h| (&h.document.id, h.score)))
                .finish()
        }
    }
}

impl fmt::Display for Hits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for hit in &self.list {
            writeln!(f, "{:.6}\t{}\t{}", hit.score, hit.document.id, hit.document.title)?;
        }
        Ok(())
    }
}

impl<E> SimilarityIndex<E>
where
    E: TfIdfEngine + Send + Sync,
{
    /// Rank the corpus against a free-text query
    ///
    /// # Arguments
    /// * `query` - free text, tokenized like the documents
    /// * `k` - maximum number of results
    ///
    /// # Returns
    /// * `Hits` - at most `k` documents with a positive cosine score,
    ///   best first, ties in corpus order
    pub fn similar_to(&self, query: &str, k: usize) -> Hits {
        let query_vec = self.query_vector(query);
        self.rank(&query_vec, k, None)
    }

    /// Rank the corpus against one of its own documents, which is excluded
    pub fn similar_to_document(&self, id: &DocumentId, k: usize) -> Hits {
        match self.get(id) {
            Some(doc) => {
                let query_vec = doc.tfidf_vec.clone();
                self.rank(&query_vec, k, Some(id))
            }
            None => Hits::default(),
        }
    }

    fn rank(&self, query_vec: &TermVector, k: usize, exclude: Option<&DocumentId>) -> Hits {
        if query_vec.is_empty() || self.documents.is_empty() || k == 0 {
            return Hits::default();
        }
        let list = self.scoring_cosine(query_vec)
            .into_iter()
            .filter(|(idx, _)| exclude.map_or(true, |id| &self.documents[*idx].document.id != id))
            .map(|(idx, score)| HitEntry {
                document: self.documents[idx].document.clone(),
                score,
            })
            .collect();
        let mut hits = Hits::new(list);
        hits.retain_positive().sort_by_score_desc().truncate(k);
        hits
    }

    /// Cosine score of every document, in corpus order
    fn scoring_cosine(&self, query_vec: &TermVector) -> Vec<(usize, f64)> {
        self.documents
            .par_iter()
            .enumerate()
            .map(|(idx, doc)| (idx, sparse_cosine(query_vec, &doc.tfidf_vec)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::vectorizer::{build_corpus_vectors, Document, DocumentId};

    fn corpus() -> Vec<Document> {
        vec![
            Document::new(1, "Ambient guitar track", "Dreamy reverb guitars", &["music", "guitar", "ambient"]),
            Document::new(2, "Portrait photo session", "Studio portrait lighting", &["photography", "portrait"]),
        ]
    }

    #[test]
    fn guitar_query_ranks_ambient_track_first() {
        let index = build_corpus_vectors(corpus());
        let hits = index.similar_to("guitar ambient music", 3);
        let top = hits.top().unwrap();
        assert_eq!(top.document.id, DocumentId::Num(1));
        assert!(top.score > 0.0);
        // the portrait document shares no term and is excluded
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn scores_are_within_unit_interval() {
        let index = build_corpus_vectors(corpus());
        for query in ["guitar", "portrait studio guitar", "reverb lighting photo ambient"] {
            for hit in &index.similar_to(query, 10).list {
                assert!(hit.score > 0.0 && hit.score <= 1.0, "{query}: {}", hit.score);
            }
        }
    }

    #[test]
    fn empty_query_and_empty_corpus() {
        let index = build_corpus_vectors(corpus());
        assert!(index.similar_to("", 3).is_empty());
        assert!(index.similar_to("the and of", 3).is_empty());
        assert!(index.similar_to("banjo", 3).is_empty());
        assert!(index.similar_to("guitar", 0).is_empty());
        let empty = build_corpus_vectors(Vec::new());
        assert!(empty.similar_to("guitar", 3).is_empty());
    }

    #[test]
    fn ties_keep_corpus_order() {
        let docs = vec![
            Document::new(10, "synth", "", &[] as &[&str]),
            Document::new(11, "synth", "", &[] as &[&str]),
            Document::new(12, "synth", "", &[] as &[&str]),
        ];
        let index = build_corpus_vectors(docs);
        let hits = index.similar_to("synth", 2);
        assert_eq!(hits.ids(), vec![&DocumentId::Num(10), &DocumentId::Num(11)]);
    }

    #[test]
    fn similar_to_document_excludes_itself() {
        let mut docs = corpus();
        docs.push(Document::new(3, "Guitar loop", "Ambient textures", &["music"]));
        let index = build_corpus_vectors(docs);
        let hits = index.similar_to_document(&DocumentId::Num(3), 5);
        assert_eq!(hits.ids(), vec![&DocumentId::Num(1)]);
        assert!(index.similar_to_document(&DocumentId::Num(99), 5).is_empty());
    }
}
