use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::classifier::{
    decision_tree::TreeNode,
    engagement::ENGAGEMENT_FEATURE_DIM,
    linear::LinearModel,
    naive_bayes::NaiveBayesModel,
    quality::QUALITY_FEATURE_DIM,
};
use crate::error::{Result, ScoringError};
use crate::vectorizer::serde::IndexData;

/// Something that can be kept in the model store
///
/// `KEY` names the entry on disk and `validate` runs after every load, so a
/// model that deserializes but has the wrong shape is still rejected.
pub trait Model: Serialize + DeserializeOwned {
    const KEY: &'static str;

    fn validate(&self) -> Result<()> {
        Ok(())
    }
}

/// Every key the store may hold
pub const MODEL_KEYS: [&str; 5] = [
    NaiveBayesModel::KEY,
    QualityModel::KEY,
    EngagementModel::KEY,
    TreeNode::KEY,
    IndexData::KEY,
];

fn check_linear(key: &'static str, model: &LinearModel, dim: usize) -> Result<()> {
    if model.dim() != dim {
        return Err(ScoringError::InvalidModel {
            key,
            reason: format!("expected {dim} weights, found {}", model.dim()),
        });
    }
    if !model.is_finite() {
        return Err(ScoringError::InvalidModel {
            key,
            reason: "weights must be finite".to_string(),
        });
    }
    Ok(())
}

/// Learned weights of the message quality scorer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QualityModel(pub LinearModel);

/// Learned weights of the engagement rating predictor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EngagementModel(pub LinearModel);

impl Model for QualityModel {
    const KEY: &'static str = "svmModel";

    fn validate(&self) -> Result<()> {
        check_linear(Self::KEY, &self.0, QUALITY_FEATURE_DIM)
    }
}

impl Model for EngagementModel {
    const KEY: &'static str = "nnModel";

    fn validate(&self) -> Result<()> {
        check_linear(Self::KEY, &self.0, ENGAGEMENT_FEATURE_DIM)
    }
}

impl Model for NaiveBayesModel {
    const KEY: &'static str = "nbModel";

    fn validate(&self) -> Result<()> {
        NaiveBayesModel::validate(self)
    }
}

impl Model for TreeNode {
    const KEY: &'static str = "dtModel";

    fn validate(&self) -> Result<()> {
        TreeNode::validate(self)
    }
}

impl Model for IndexData {
    const KEY: &'static str = "knnItems";
}
