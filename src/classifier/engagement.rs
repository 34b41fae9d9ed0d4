use serde::{Deserialize, Serialize};

use crate::classifier::linear::LinearModel;
use crate::error::Result;

/// Number of engagement features
pub const ENGAGEMENT_FEATURE_DIM: usize = 3;

const VIEWS_SCALE: f64 = 100.0;
const LIKES_SCALE: f64 = 10.0;
const COMMENTS_SCALE: f64 = 10.0;

/// Engagement counts normalized into [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EngagementFeatures {
    pub views: f64,
    pub likes: f64,
    pub comments: f64,
}

#[inline]
fn normalize(count: f64, scale: f64) -> f64 {
    if count.is_nan() {
        return 0.0;
    }
    (count / scale).clamp(0.0, 1.0)
}

impl EngagementFeatures {
    /// Normalize raw counts by 100 views, 10 likes and 10 comments
    pub fn from_counts(views: f64, likes: f64, comments: f64) -> Self {
        Self {
            views: normalize(views, VIEWS_SCALE),
            likes: normalize(likes, LIKES_SCALE),
            comments: normalize(comments, COMMENTS_SCALE),
        }
    }

    pub fn to_array(&self) -> [f64; ENGAGEMENT_FEATURE_DIM] {
        [self.views, self.likes, self.comments]
    }
}

/// Fixed weights of the rating network
pub fn fixed_engagement_model() -> LinearModel {
    LinearModel::new(vec![0.8, 1.2, 1.0], -1.2)
}

/// Single affine layer followed by a sigmoid
///
/// Trained weights come from the same logistic regression trainer as the
/// quality scorer; only the feature set differs.
#[derive(Debug, Clone, PartialEq)]
pub struct RatingPredictor {
    model: LinearModel,
}

impl Default for RatingPredictor {
    fn default() -> Self {
        Self { model: fixed_engagement_model() }
    }
}

impl RatingPredictor {
    /// Predictor with learned weights, which must be three-dimensional
    pub fn with_model(model: LinearModel) -> Result<Self> {
        model.check_dim(ENGAGEMENT_FEATURE_DIM)?;
        Ok(Self { model })
    }

    pub fn model(&self) -> &LinearModel {
        &self.model
    }

    /// Rating in [0, 1]
    pub fn predict(&self, features: &EngagementFeatures) -> f64 {
        // dimension is checked on construction
        self.model.predict(&features.to_array()).unwrap_or(0.0)
    }
}

/// Rating with the fixed weights
pub fn predict_rating(features: &EngagementFeatures) -> f64 {
    RatingPredictor::default().predict(features)
}

/// Raw engagement counts with a rating label in [0, 1]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngagementSample {
    #[serde(default)]
    pub views: f64,
    #[serde(default)]
    pub likes: f64,
    #[serde(default)]
    pub comments: f64,
    pub label: f64,
}

impl EngagementSample {
    pub fn features(&self) -> EngagementFeatures {
        EngagementFeatures::from_counts(self.views, self.likes, self.comments)
    }
}

/// Turn labeled counts into a training matrix
pub fn engagement_training_set(samples: &[EngagementSample]) -> (Vec<Vec<f64>>, Vec<f64>) {
    samples
        .iter()
        .map(|s| (s.features().to_array().to_vec(), s.label))
        .unzip()
}
