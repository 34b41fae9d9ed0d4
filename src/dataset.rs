use std::path::Path;

use indexmap::IndexSet;
use serde::Deserialize;
use tracing::{info, warn};

use crate::classifier::{
    decision_tree::{DecisionTreeTrainer, TreeNode, TreeSample},
    engagement::{engagement_training_set, EngagementSample},
    linear::train_logistic_regression,
    naive_bayes::{LabeledText, NaiveBayesModel},
    quality::{quality_training_set, QualitySample},
};
use crate::config::ScoringConfig;
use crate::error::{Result, ScoringError};
use crate::store::{EngagementModel, Model, ModelStore, QualityModel};
use crate::vectorizer::{serde::IndexData, Document};

/// Training dataset upload
///
/// One JSON object; every key is optional and unknown keys are ignored:
///
/// ```json
/// {
///   "nb_samples": [{"text": "mixing and mastering", "label": "music"}],
///   "svm_quality_samples": [{"text": "Hi! Loved your set, thanks", "label": 1}],
///   "nn_engagement_samples": [{"views": 120, "likes": 9, "comments": 3, "label": 1}],
///   "dt_samples": [{"hasMedia": true, "hasTags": true, "label": "public"}],
///   "knn_items": [{"id": 1, "title": "Ambient guitar", "description": "", "tags": []}]
/// }
/// ```
///
/// `train` finishes before anything is written, so a bad upload leaves the
/// store untouched.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Dataset {
    pub nb_samples: Option<Vec<LabeledText>>,
    pub svm_quality_samples: Option<Vec<QualitySample>>,
    pub nn_engagement_samples: Option<Vec<EngagementSample>>,
    pub dt_samples: Option<Vec<TreeSample>>,
    pub knn_items: Option<Vec<Document>>,
}

/// Models produced from one dataset, `None` where the dataset had no samples
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainedModels {
    pub naive_bayes: Option<NaiveBayesModel>,
    pub quality: Option<QualityModel>,
    pub engagement: Option<EngagementModel>,
    pub tree: Option<TreeNode>,
    pub knn_items: Option<IndexData>,
}

/// `None` for an absent or empty sample list
fn non_empty<'a, T>(key: &str, samples: &'a Option<Vec<T>>) -> Option<&'a [T]> {
    match samples.as_deref() {
        Some([]) => {
            info!(key, "empty sample list, model left unchanged");
            None
        }
        other => other,
    }
}

/// Feature names in order of first appearance
fn feature_names(samples: &[TreeSample]) -> Vec<String> {
    let names: IndexSet<&String> = samples.iter().flat_map(|s| s.features.keys()).collect();
    names.into_iter().cloned().collect()
}

impl Dataset {
    pub fn from_json_str(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn is_empty(&self) -> bool {
        self.nb_samples.is_none()
            && self.svm_quality_samples.is_none()
            && self.nn_engagement_samples.is_none()
            && self.dt_samples.is_none()
            && self.knn_items.is_none()
    }

    /// Train every model the dataset has samples for
    ///
    /// # Arguments
    /// * `config` - epochs and learning rate for the linear models, stopping
    ///   rules for the tree
    ///
    /// # Returns
    /// * `TrainedModels` - nothing is saved yet
    pub fn train(&self, config: &ScoringConfig) -> Result<TrainedModels> {
        let mut trained = TrainedModels::default();
        let epochs = config.training.epochs;
        let lr = config.training.learning_rate;

        if let Some(samples) = non_empty("nb_samples", &self.nb_samples) {
            trained.naive_bayes = Some(NaiveBayesModel::train(samples));
        }

        if let Some(samples) = non_empty("svm_quality_samples", &self.svm_quality_samples) {
            let (x, y) = quality_training_set(samples);
            if x.is_empty() {
                warn!("no quality sample has any tokens, model left unchanged");
            } else {
                let model = QualityModel(train_logistic_regression(&x, &y, epochs, lr)?);
                model.validate()?;
                trained.quality = Some(model);
            }
        }

        if let Some(samples) = non_empty("nn_engagement_samples", &self.nn_engagement_samples) {
            let (x, y) = engagement_training_set(samples);
            let model = EngagementModel(train_logistic_regression(&x, &y, epochs, lr)?);
            model.validate()?;
            trained.engagement = Some(model);
        }

        if let Some(samples) = non_empty("dt_samples", &self.dt_samples) {
            let features = feature_names(samples);
            if features.is_empty() {
                return Err(ScoringError::InvalidDataset(
                    "dt_samples carry no features".to_string(),
                ));
            }
            let trainer = DecisionTreeTrainer::new(
                config.decision_tree.max_depth,
                config.decision_tree.min_samples,
            );
            trained.tree = Some(trainer.train(samples, &features));
        }

        if let Some(items) = non_empty("knn_items", &self.knn_items) {
            trained.knn_items = Some(IndexData { documents: items.to_vec() });
        }

        Ok(trained)
    }
}

impl TrainedModels {
    pub fn is_empty(&self) -> bool {
        self.keys().is_empty()
    }

    /// Store keys of the models present
    pub fn keys(&self) -> Vec<&'static str> {
        let mut keys = Vec::new();
        if self.naive_bayes.is_some() {
            keys.push(NaiveBayesModel::KEY);
        }
        if self.quality.is_some() {
            keys.push(QualityModel::KEY);
        }
        if self.engagement.is_some() {
            keys.push(EngagementModel::KEY);
        }
        if self.tree.is_some() {
            keys.push(TreeNode::KEY);
        }
        if self.knn_items.is_some() {
            keys.push(IndexData::KEY);
        }
        keys
    }

    /// Read whatever the store holds, skipping broken entries
    pub fn load(store: &ModelStore) -> Self {
        Self {
            naive_bayes: store.load_or_warn(),
            quality: store.load_or_warn(),
            engagement: store.load_or_warn(),
            tree: store.load_or_warn(),
            knn_items: store.load_or_warn(),
        }
    }

    /// Persist every present model
    pub fn save(&self, store: &ModelStore) -> Result<()> {
        if let Some(model) = &self.naive_bayes {
            store.save(model)?;
        }
        if let Some(model) = &self.quality {
            store.save(model)?;
        }
        if let Some(model) = &self.engagement {
            store.save(model)?;
        }
        if let Some(model) = &self.tree {
            store.save(model)?;
        }
        if let Some(items) = &self.knn_items {
            store.save(items)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::decision_tree::Privacy;
    use crate::vectorizer::DocumentId;

    #[test]
    fn missing_and_unknown_keys() {
        let dataset = Dataset::from_json_str(r#"{"something_else": 1}"#).unwrap();
        assert!(dataset.is_empty());
        assert!(dataset.train(&ScoringConfig::default()).unwrap().is_empty());
    }

    #[test]
    fn empty_lists_train_nothing() {
        let dataset = Dataset::from_json_str(r#"{"nb_samples": [], "knn_items": []}"#).unwrap();
        assert!(!dataset.is_empty());
        assert!(dataset.train(&ScoringConfig::default()).unwrap().is_empty());
    }

    #[test]
    fn malformed_dataset_is_an_error() {
        assert!(Dataset::from_json_str(r#"{"nb_samples": [{"text": 3}]}"#).is_err());
        assert!(Dataset::from_json_str("[1, 2]").is_err());
    }

    #[test]
    fn trains_every_present_model() {
        let dataset = Dataset::from_json_str(
            r#"{
                "nb_samples": [
                    {"text": "mixing and mastering songs", "label": "music"},
                    {"text": "portrait lighting setup", "label": "photography"}
                ],
                "svm_quality_samples": [
                    {"text": "Hi! Loved your latest set, thanks for sharing it", "label": 1},
                    {"text": "BUY NOW!!! http://spam.example", "label": 0}
                ],
                "nn_engagement_samples": [
                    {"views": 150, "likes": 12, "comments": 6, "label": 1},
                    {"views": 3, "likes": 0, "comments": 0, "label": 0}
                ],
                "dt_samples": [
                    {"hasMedia": true, "hasTags": true, "label": "public"},
                    {"hasMedia": false, "hasTags": false, "label": "private"}
                ],
                "knn_items": [{"_id": "x1", "title": "Tape loops"}]
            }"#,
        )
        .unwrap();
        let trained = dataset.train(&ScoringConfig::default()).unwrap();
        assert_eq!(trained.keys(), vec!["nbModel", "svmModel", "nnModel", "dtModel", "knnItems"]);
        assert_eq!(trained.quality.as_ref().unwrap().0.dim(), 8);
        assert_eq!(trained.engagement.as_ref().unwrap().0.dim(), 3);
        // two samples is below min_samples, so the tree is a single leaf; ties go private
        assert_eq!(trained.tree, Some(TreeNode::Leaf { label: Privacy::Private }));
        assert_eq!(trained.knn_items.unwrap().documents[0].id, DocumentId::from("x1"));
    }

    #[test]
    fn feature_names_keep_first_appearance_order() {
        let samples = vec![
            TreeSample::new([("hasMedia", true)], Privacy::Public),
            TreeSample::new([("hasTags", false), ("hasMedia", true)], Privacy::Private),
        ];
        assert_eq!(feature_names(&samples), vec!["hasMedia", "hasTags"]);
    }
}
