use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::Result;

/// Tunable parameters for the scorers, trainers and the model store
///
/// Every section and field has a default, so a partial `scoring.toml` is fine:
///
/// ```toml
/// [similarity]
/// k = 5
///
/// [store]
/// dir = "models"
/// format = "cbor"
/// ```
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct ScoringConfig {
    pub similarity: SimilarityConfig,
    pub decision_tree: DecisionTreeConfig,
    pub training: TrainingConfig,
    pub store: StoreConfig,
}

/// Nearest-neighbour search settings.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct SimilarityConfig {
    /// Number of results returned by `similar_to`
    pub k: usize,
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self { k: 3 }
    }
}

/// Stopping rules for the trainable privacy tree.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct DecisionTreeConfig {
    pub max_depth: usize,
    /// Nodes with this many samples or fewer become leaves
    pub min_samples: usize,
}

impl Default for DecisionTreeConfig {
    fn default() -> Self {
        Self { max_depth: 3, min_samples: 5 }
    }
}

/// Gradient descent settings shared by the quality and engagement trainers.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct TrainingConfig {
    pub epochs: usize,
    pub learning_rate: f64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self { epochs: 300, learning_rate: 0.5 }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreFormat {
    #[default]
    Json,
    Cbor,
}

/// Where trained models are cached between runs.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct StoreConfig {
    pub dir: PathBuf,
    pub format: StoreFormat,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(".creative-scoring"),
            format: StoreFormat::Json,
        }
    }
}

impl ScoringConfig {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}
