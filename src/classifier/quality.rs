use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::classifier::linear::LinearModel;
use crate::error::Result;
use crate::vectorizer::token::{TermFrequency, Tokenizer};

/// Only this many leading characters are looked at
pub const MAX_SCORED_CHARS: usize = 500;
/// Number of features produced by `QualityFeatures::to_vec`
pub const QUALITY_FEATURE_DIM: usize = 8;
/// Word count with the highest length score
pub const IDEAL_WORD_COUNT: f64 = 25.0;

const MAX_LINKS: usize = 2;
const MAX_BURSTS: usize = 3;

struct Detectors {
    link: Regex,
    burst: Regex,
    greeting: Regex,
    thanks: Regex,
}

fn detectors() -> &'static Detectors {
    static DETECTORS: OnceLock<Detectors> = OnceLock::new();
    DETECTORS.get_or_init(|| Detectors {
        link: Regex::new(r"(?i)https?://").expect("link pattern is valid"),
        burst: Regex::new(r"[!?.]{3,}").expect("burst pattern is valid"),
        greeting: Regex::new(r"(?i)\b(hi|hello|hey|dear|greetings|good (morning|afternoon|evening))\b")
            .expect("greeting pattern is valid"),
        thanks: Regex::new(r"(?i)\b(thanks|thank you|thx|cheers|appreciate[ds]?)\b")
            .expect("thanks pattern is valid"),
    })
}

/// Features of one message
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityFeatures {
    /// `max(0, 1 - |words - 25| / 25)`
    pub length: f64,
    /// unique tokens / tokens
    pub diversity: f64,
    /// uppercase letters / letters
    pub uppercase_ratio: f64,
    /// `http(s)://` occurrences, at most 2
    pub links: f64,
    /// runs of three or more `!?.`, at most 3
    pub bursts: f64,
    pub greeting: f64,
    pub thanks: f64,
    pub question: f64,
}

impl QualityFeatures {
    /// Extract features from the first 500 characters
    ///
    /// # Returns
    /// * `Option<Self>` - `None` when the text has no tokens
    pub fn extract(text: &str) -> Option<Self> {
        let head: String = text.chars().take(MAX_SCORED_CHARS).collect();
        let tokens = Tokenizer::new().tokenize(&head);
        if tokens.is_empty() {
            return None;
        }
        let freq = TermFrequency::from_terms(&tokens);
        let words = head.split_whitespace().count() as f64;
        let (letters, upper) = head
            .chars()
            .filter(|c| c.is_alphabetic())
            .fold((0usize, 0usize), |(l, u), c| (l + 1, u + usize::from(c.is_uppercase())));
        let d = detectors();
        Some(Self {
            length: (1.0 - (words - IDEAL_WORD_COUNT).abs() / IDEAL_WORD_COUNT).max(0.0),
            diversity: freq.unique_term_ratio(),
            uppercase_ratio: if letters == 0 { 0.0 } else { upper as f64 / letters as f64 },
            links: d.link.find_iter(&head).count().min(MAX_LINKS) as f64,
            bursts: d.burst.find_iter(&head).count().min(MAX_BURSTS) as f64,
            greeting: flag(d.greeting.is_match(&head)),
            thanks: flag(d.thanks.is_match(&head)),
            question: flag(head.contains('?')),
        })
    }

    pub fn to_vec(&self) -> Vec<f64> {
        vec![
            self.length,
            self.diversity,
            self.uppercase_ratio,
            self.links,
            self.bursts,
            self.greeting,
            self.thanks,
            self.question,
        ]
    }
}

#[inline]
fn flag(b: bool) -> f64 {
    if b { 1.0 } else { 0.0 }
}

/// Hand-tuned coefficients, in `QualityFeatures::to_vec` order
pub fn fixed_quality_model() -> LinearModel {
    LinearModel::new(vec![2.0, 1.0, -2.0, -0.8, -0.6, 0.5, 0.5, 0.3], -1.5)
}

/// Coarse label of a quality score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityBucket {
    Great,
    Ok,
    Poor,
}

impl QualityBucket {
    pub fn from_score(score: f64) -> Self {
        if score > 0.6 {
            QualityBucket::Great
        } else if score > 0.35 {
            QualityBucket::Ok
        } else {
            QualityBucket::Poor
        }
    }
}

impl fmt::Display for QualityBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            QualityBucket::Great => "great",
            QualityBucket::Ok => "ok",
            QualityBucket::Poor => "poor",
        };
        f.write_str(s)
    }
}

/// Quality scorer with either the fixed or a trained model
#[derive(Debug, Clone, PartialEq)]
pub struct QualityScorer {
    model: LinearModel,
}

impl Default for QualityScorer {
    fn default() -> Self {
        Self { model: fixed_quality_model() }
    }
}

impl QualityScorer {
    /// Scorer with a trained model
    /// Fails if the model was not trained on the eight quality features.
    pub fn with_model(model: LinearModel) -> Result<Self> {
        model.check_dim(QUALITY_FEATURE_DIM)?;
        Ok(Self { model })
    }

    pub fn model(&self) -> &LinearModel {
        &self.model
    }

    /// Score in [0, 1]; exactly 0.0 for text without tokens
    pub fn score(&self, text: &str) -> f64 {
        let Some(features) = QualityFeatures::extract(text) else {
            return 0.0;
        };
        match self.model.predict(&features.to_vec()) {
            Ok(score) => score,
            Err(err) => {
                // unreachable through with_model, kept for hand-built scorers
                warn!(%err, "quality model rejected features, using fixed weights");
                fixed_quality_model().predict(&features.to_vec()).unwrap_or(0.0)
            }
        }
    }
}

/// Score with the fixed coefficients
pub fn score_quality(text: &str) -> f64 {
    QualityScorer::default().score(text)
}

/// A message with a quality label in [0, 1]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualitySample {
    pub text: String,
    pub label: f64,
}

/// Turn labeled messages into a training matrix
/// Messages without tokens are skipped, they always score 0.
pub fn quality_training_set(samples: &[QualitySample]) -> (Vec<Vec<f64>>, Vec<f64>) {
    samples
        .iter()
        .filter_map(|s| QualityFeatures::extract(&s.text).map(|f| (f.to_vec(), s.label)))
        .unzip()
}
