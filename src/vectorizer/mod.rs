pub mod corpus;
pub mod tfidf;
pub mod token;
pub mod serde;
pub mod evaluate;

use std::fmt;
use std::marker::PhantomData;

use ::serde::{Deserialize, Serialize};
use indexmap::IndexMap;

use crate::vectorizer::{corpus::Corpus, tfidf::{SmoothedTfIdfEngine, TfIdfEngine}, token::{TermFrequency, Tokenizer}};

/// Sparse term -> weight map, weights are never negative
pub type TermVector = IndexMap<String, f64>;

/// Document identifier
/// Accepts both numeric ids and string ids (e.g. database object ids).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DocumentId {
    Num(i64),
    Text(String),
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentId::Num(n) => write!(f, "{n}"),
            DocumentId::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for DocumentId {
    fn from(n: i64) -> Self {
        DocumentId::Num(n)
    }
}

impl From<i32> for DocumentId {
    fn from(n: i32) -> Self {
        DocumentId::Num(n as i64)
    }
}

impl From<&str> for DocumentId {
    fn from(s: &str) -> Self {
        DocumentId::Text(s.to_string())
    }
}

impl From<String> for DocumentId {
    fn from(s: String) -> Self {
        DocumentId::Text(s)
    }
}

/// An item of the similarity corpus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(alias = "_id")]
    pub id: DocumentId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Document {
    pub fn new<I, S>(id: I, title: &str, description: &str, tags: &[S]) -> Self
    where
        I: Into<DocumentId>,
        S: AsRef<str>,
    {
        Self {
            id: id.into(),
            title: title.to_string(),
            description: description.to_string(),
            tags: tags.iter().map(|t| t.as_ref().to_string()).collect(),
        }
    }

    /// Text that gets tokenized: title, description and tags
    pub fn text(&self) -> String {
        let mut text = String::with_capacity(
            self.title.len() + self.description.len() + self.tags.iter().map(|t| t.len() + 1).sum::<usize>() + 2,
        );
        text.push_str(&self.title);
        text.push(' ');
        text.push_str(&self.description);
        for tag in &self.tags {
            text.push(' ');
            text.push_str(tag);
        }
        text
    }
}

/// A document together with its term statistics for the current corpus snapshot
#[derive(Debug, Clone)]
pub struct IndexedDocument {
    pub document: Document,
    /// raw term counts
    pub term_freq: TermFrequency,
    /// TF-IDF weights, recomputed whenever the corpus changes
    pub tfidf_vec: TermVector,
}

/// TF-IDF Similarity Index
/// Turns a small document collection into TF-IDF vectors and ranks documents
/// against a free-text query by cosine similarity.
///
/// `SimilarityIndex<E>` is generic over the weighting engine `E`;
/// `SmoothedTfIdfEngine` is the default.
///
/// The index is built once from a document snapshot; uploading new
/// `knnItems` builds a fresh one.
#[derive(Debug, Clone)]
pub struct SimilarityIndex<E = SmoothedTfIdfEngine>
where
    E: TfIdfEngine,
{
    pub(crate) documents: Vec<IndexedDocument>,
    pub(crate) corpus: Corpus,
    pub(crate) tokenizer: Tokenizer,
    _marker: PhantomData<E>,
}

impl<E: TfIdfEngine> Default for SimilarityIndex<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: TfIdfEngine> SimilarityIndex<E> {
    pub fn new() -> Self {
        Self {
            documents: Vec::new(),
            corpus: Corpus::new(),
            tokenizer: Tokenizer::new(),
            _marker: PhantomData,
        }
    }

    /// Build term vectors for a whole corpus at once
    pub fn build<I>(documents: I) -> Self
    where
        I: IntoIterator<Item = Document>,
    {
        let mut index = Self::new();
        for document in documents {
            index.push_doc(document);
        }
        index.re_calc_vectors();
        index
    }

    pub fn get(&self, id: &DocumentId) -> Option<&IndexedDocument> {
        self.documents.iter().find(|d| &d.document.id == id)
    }

    pub fn documents(&self) -> &[IndexedDocument] {
        &self.documents
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    pub fn doc_num(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// IDF of a term in the current snapshot
    /// Zero for terms no document contains.
    pub fn idf(&self, term: &str) -> f64 {
        match self.corpus.term_count(term) {
            0 => 0.0,
            df => E::idf(self.corpus.doc_num(), df),
        }
    }

    /// TF-IDF vector of a free-text query against the corpus IDF
    pub fn query_vector(&self, query: &str) -> TermVector {
        let tokens = self.tokenizer.tokenize(query);
        let freq = TermFrequency::from_terms(&tokens);
        E::tfidf_vec(&freq, &self.corpus)
    }

    fn make_entry(&mut self, document: Document) -> IndexedDocument {
        let tokens = self.tokenizer.tokenize(&document.text());
        let term_freq = TermFrequency::from_terms(&tokens);
        self.corpus.add_set(&term_freq.term_set_ref_str());
        IndexedDocument {
            document,
            term_freq,
            tfidf_vec: TermVector::new(),
        }
    }

    fn push_doc(&mut self, document: Document) {
        let entry = self.make_entry(document);
        self.documents.push(entry);
    }

    /// Recompute every document vector from the corpus statistics
    fn re_calc_vectors(&mut self) {
        let corpus = &self.corpus;
        for doc in self.documents.iter_mut() {
            doc.tfidf_vec = E::tfidf_vec(&doc.term_freq, corpus);
        }
    }
}

/// Build the TF-IDF vectors of a corpus with the default engine
pub fn build_corpus_vectors<I>(documents: I) -> SimilarityIndex
where
    I: IntoIterator<Item = Document>,
{
    SimilarityIndex::build(documents)
}
