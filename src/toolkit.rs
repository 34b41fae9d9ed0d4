use tracing::{debug, info};

use crate::classifier::{
    decision_tree::{recommend_privacy, PrivacyRecommendation, PrivacySignals, TreeNode},
    engagement::{EngagementFeatures, RatingPredictor},
    naive_bayes::{KeywordClassifier, NaiveBayesModel},
    quality::QualityScorer,
};
use crate::config::ScoringConfig;
use crate::dataset::TrainedModels;
use crate::error::Result;
use crate::evaluation::fixtures::demo_documents;
use crate::store::ModelStore;
use crate::vectorizer::{evaluate::scoring::Hits, SimilarityIndex};

/// Reason attached to recommendations from a learned tree
pub const LEARNED_TREE_REASON: &str = "Learned decision tree";

/// Whether a scorer runs on its fixed rules or on trained weights
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    Fixed,
    Trained,
}

impl std::fmt::Display for Variant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Variant::Fixed => "fixed",
            Variant::Trained => "trained",
        })
    }
}

/// The set of scorers currently in use
///
/// Starts with the fixed-rule variants and the demo corpus. Trained models
/// replace them one by one through `apply`, and `clear_models` goes back to
/// the fixed variants.
#[derive(Debug, Clone)]
pub struct ScoringToolkit {
    config: ScoringConfig,
    keywords: KeywordClassifier,
    naive_bayes: Option<NaiveBayesModel>,
    quality: QualityScorer,
    quality_variant: Variant,
    rating: RatingPredictor,
    rating_variant: Variant,
    tree: Option<TreeNode>,
    index: SimilarityIndex,
}

impl ScoringToolkit {
    pub fn new(config: ScoringConfig) -> Self {
        Self {
            config,
            keywords: KeywordClassifier::new(),
            naive_bayes: None,
            quality: QualityScorer::default(),
            quality_variant: Variant::Fixed,
            rating: RatingPredictor::default(),
            rating_variant: Variant::Fixed,
            tree: None,
            index: SimilarityIndex::build(demo_documents()),
        }
    }

    /// Start from the fixed variants and apply whatever the store holds
    /// Broken entries are skipped with a warning.
    pub fn load(config: ScoringConfig, store: &ModelStore) -> Result<Self> {
        let mut toolkit = Self::new(config);
        let models = TrainedModels::load(store);
        if !models.is_empty() {
            info!(keys = ?models.keys(), "loaded stored models");
        }
        toolkit.apply(models)?;
        Ok(toolkit)
    }

    /// Swap in every model present in `models`
    pub fn apply(&mut self, models: TrainedModels) -> Result<()> {
        if let Some(model) = models.quality {
            self.quality = QualityScorer::with_model(model.0)?;
            self.quality_variant = Variant::Trained;
        }
        if let Some(model) = models.engagement {
            self.rating = RatingPredictor::with_model(model.0)?;
            self.rating_variant = Variant::Trained;
        }
        if let Some(model) = models.naive_bayes {
            self.naive_bayes = Some(model);
        }
        if let Some(tree) = models.tree {
            self.tree = Some(tree);
        }
        if let Some(items) = models.knn_items {
            self.index = items.into_similarity_index();
        }
        debug!(docs = self.index.doc_num(), "applied models");
        Ok(())
    }

    /// Drop all trained models
    pub fn clear_models(&mut self) {
        *self = Self::new(self.config.clone());
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    pub fn index(&self) -> &SimilarityIndex {
        &self.index
    }

    pub fn category_variant(&self) -> Variant {
        match &self.naive_bayes {
            Some(model) if !model.is_empty() => Variant::Trained,
            _ => Variant::Fixed,
        }
    }

    pub fn privacy_variant(&self) -> Variant {
        if self.tree.is_some() { Variant::Trained } else { Variant::Fixed }
    }

    pub fn quality_variant(&self) -> Variant {
        self.quality_variant
    }

    pub fn rating_variant(&self) -> Variant {
        self.rating_variant
    }

    /// Category of a text, from the trained model when there is one
    pub fn category(&self, text: &str) -> String {
        self.naive_bayes
            .as_ref()
            .and_then(|model| model.predict(text))
            .unwrap_or_else(|| self.keywords.classify(text))
    }

    pub fn privacy(&self, signals: &PrivacySignals) -> PrivacyRecommendation {
        match &self.tree {
            Some(tree) => PrivacyRecommendation::new(tree.predict(&signals.features()), LEARNED_TREE_REASON),
            None => recommend_privacy(signals),
        }
    }

    pub fn quality(&self, text: &str) -> f64 {
        self.quality.score(text)
    }

    pub fn rating(&self, features: &EngagementFeatures) -> f64 {
        self.rating.predict(features)
    }

    /// Top `similarity.k` items for a query
    pub fn similar(&self, query: &str) -> Hits {
        self.similar_k(query, self.config.similarity.k)
    }

    pub fn similar_k(&self, query: &str, k: usize) -> Hits {
        self.index.similar_to(query, k)
    }
}

impl Default for ScoringToolkit {
    fn default() -> Self {
        Self::new(ScoringConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::decision_tree::Privacy;
    use crate::classifier::linear::LinearModel;
    use crate::classifier::naive_bayes::LabeledText;
    use crate::store::{EngagementModel, QualityModel};
    use crate::vectorizer::{serde::IndexData, Document, DocumentId};

    #[test]
    fn fixed_variants_by_default() {
        let toolkit = ScoringToolkit::default();
        assert_eq!(toolkit.category("Mixing a vocal track with guitars"), "music");
        assert_eq!(toolkit.category_variant(), Variant::Fixed);
        let rec = toolkit.privacy(&PrivacySignals::default());
        assert_eq!(rec.recommendation, Privacy::Private);
        assert_eq!(rec.reason, "No media & no thumbnail");
        assert_eq!(toolkit.quality(""), 0.0);
        assert!(!toolkit.similar("guitar").is_empty());
    }

    #[test]
    fn applied_models_replace_fixed_ones_until_cleared() {
        let mut toolkit = ScoringToolkit::default();
        toolkit
            .apply(TrainedModels {
                naive_bayes: Some(NaiveBayesModel::train(&[LabeledText::new("guitar", "luthier")])),
                quality: Some(QualityModel(LinearModel::new(vec![0.0; 8], 0.0))),
                engagement: Some(EngagementModel(LinearModel::new(vec![0.0; 3], 2.0))),
                tree: Some(TreeNode::Leaf { label: Privacy::Public }),
                knn_items: Some(IndexData {
                    documents: vec![Document::new(9, "Cello suites", "", &["cello"])],
                }),
            })
            .unwrap();
        assert_eq!(toolkit.category("guitar"), "luthier");
        assert_eq!(toolkit.quality("some words"), 0.5);
        assert!(toolkit.rating(&EngagementFeatures::default()) > 0.8);
        let rec = toolkit.privacy(&PrivacySignals::default());
        assert_eq!((rec.recommendation, rec.reason.as_str()), (Privacy::Public, LEARNED_TREE_REASON));
        assert_eq!(toolkit.similar("cello").ids(), vec![&DocumentId::Num(9)]);

        toolkit.clear_models();
        assert_eq!(toolkit.category_variant(), Variant::Fixed);
        assert_eq!(toolkit.privacy_variant(), Variant::Fixed);
        assert_eq!(toolkit.quality_variant(), Variant::Fixed);
        assert!(toolkit.similar("cello").is_empty());
    }

    #[test]
    fn wrong_dimension_is_rejected_on_apply() {
        let mut toolkit = ScoringToolkit::default();
        let models = TrainedModels {
            quality: Some(QualityModel(LinearModel::new(vec![0.0; 3], 0.0))),
            ..Default::default()
        };
        assert!(toolkit.apply(models).is_err());
        assert_eq!(toolkit.quality_variant(), Variant::Fixed);
    }
}
