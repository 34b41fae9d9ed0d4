use serde::{ser::SerializeSeq, Deserialize, Serialize};

use crate::vectorizer::{tfidf::TfIdfEngine, Document, SimilarityIndex};

/// Serializable form of a `SimilarityIndex`
/// Only the documents are stored; term vectors are derived data and are
/// rebuilt by `into_similarity_index`. Serialized as a bare array of
/// documents.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(transparent)]
pub struct IndexData {
    pub documents: Vec<Document>,
}

impl IndexData {
    /// Rebuild the term vectors for the stored documents
    pub fn into_similarity_index<E: TfIdfEngine>(self) -> SimilarityIndex<E> {
        SimilarityIndex::build(self.documents)
    }
}

impl<E: TfIdfEngine> From<&SimilarityIndex<E>> for IndexData {
    fn from(index: &SimilarityIndex<E>) -> Self {
        IndexData {
            documents: index.documents.iter().map(|d| d.document.clone()).collect(),
        }
    }
}

impl<E: TfIdfEngine> Serialize for SimilarityIndex<E> {
    /// Serializes only the documents, the derived vectors are left out.
    /// Use `IndexData` to deserialize.
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(self.documents.len()))?;
        for doc in &self.documents {
            seq.serialize_element(&doc.document)?;
        }
        seq.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vectorizer::{build_corpus_vectors, DocumentId};

    #[test]
    fn serialized_index_rebuilds_identical_vectors() {
        let index = build_corpus_vectors(vec![
            Document::new(1, "Ambient guitar track", "Dreamy reverb guitars", &["music"]),
            Document::new("b2", "Portrait photo session", "Studio lighting", &["portrait"]),
        ]);
        let json = serde_json::to_string(&index).unwrap();
        assert!(json.starts_with('['));
        let data: IndexData = serde_json::from_str(&json).unwrap();
        assert_eq!(data, IndexData::from(&index));
        let rebuilt: SimilarityIndex = data.into_similarity_index();
        for (a, b) in index.documents().iter().zip(rebuilt.documents()) {
            assert_eq!(a.tfidf_vec, b.tfidf_vec);
        }
    }

    #[test]
    fn accepts_mongo_style_ids() {
        let json = r#"[{"_id": "abc", "title": "Drone footage", "description": "", "tags": []}]"#;
        let data: IndexData = serde_json::from_str(json).unwrap();
        assert_eq!(data.documents[0].id, DocumentId::from("abc"));
    }
}
