use std::collections::HashSet;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, ScoringError};
use crate::vectorizer::token::Tokenizer;

/// Label returned when the keyword classifier is not confident
pub const FALLBACK_CATEGORY: &str = "other";

/// Pseudo-count added to every keyword match
const KEYWORD_ALPHA: f64 = 1.0;

/// Category keyword lists of the fixed classifier
/// Lists are kept the same length so that no category gets a smoothing advantage.
pub const KEYWORD_CATEGORIES: &[(&str, &[&str])] = &[
    (
        "music",
        &[
            "music", "song", "track", "album", "guitar", "vocal", "mixing", "beat", "melody",
            "band", "concert", "drums",
        ],
    ),
    (
        "photography",
        &[
            "photo", "photography", "portrait", "camera", "lens", "lighting", "shoot",
            "landscape", "exposure", "editing", "studio", "aperture",
        ],
    ),
    (
        "video",
        &[
            "video", "filming", "director", "cinematography", "edit", "footage", "clip",
            "documentary", "animation", "drone", "trailer", "vlog",
        ],
    ),
];

/// A text with its class label, used for training
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledText {
    pub text: String,
    pub label: String,
}

impl LabeledText {
    pub fn new(text: &str, label: &str) -> Self {
        Self { text: text.to_string(), label: label.to_string() }
    }
}

#[derive(Debug, Clone)]
struct KeywordCategory {
    label: String,
    keywords: HashSet<String>,
}

/// Fixed-keyword Naive Bayes classifier
///
/// Every category has a keyword list. For each token,
/// `ln((is_keyword + alpha) / (|keywords| + alpha * |V|))` is summed per
/// category, where `V` is the union of all keyword lists; the prior is uniform.
/// The best category wins unless the input has no tokens or the margin over
/// the runner-up is below `ln(1.2)`, in which case `"other"` is returned.
#[derive(Debug, Clone)]
pub struct KeywordClassifier {
    categories: Vec<KeywordCategory>,
    vocabulary_size: usize,
    min_margin: f64,
    tokenizer: Tokenizer,
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl KeywordClassifier {
    /// Classifier over the built-in music/photography/video categories
    pub fn new() -> Self {
        Self::with_categories(KEYWORD_CATEGORIES)
    }

    pub fn with_categories(categories: &[(&str, &[&str])]) -> Self {
        let categories: Vec<KeywordCategory> = categories
            .iter()
            .map(|(label, keywords)| KeywordCategory {
                label: label.to_string(),
                keywords: keywords.iter().map(|k| k.to_string()).collect(),
            })
            .collect();
        let vocabulary_size = categories
            .iter()
            .flat_map(|c| c.keywords.iter())
            .collect::<HashSet<_>>()
            .len();
        Self {
            categories,
            vocabulary_size,
            min_margin: 1.2_f64.ln(),
            tokenizer: Tokenizer::new(),
        }
    }

    /// Log-likelihood of every category, in declaration order
    pub fn scores(&self, text: &str) -> Vec<(String, f64)> {
        self.token_scores(&self.tokenizer.tokenize(text))
    }

    /// `scores` over already tokenized text
    pub fn token_scores(&self, tokens: &[String]) -> Vec<(String, f64)> {
        self.categories
            .iter()
            .map(|cat| {
                let denom = cat.keywords.len() as f64 + KEYWORD_ALPHA * self.vocabulary_size as f64;
                let score = tokens
                    .iter()
                    .map(|tok| {
                        let hit = if cat.keywords.contains(tok) { 1.0 } else { 0.0 };
                        ((hit + KEYWORD_ALPHA) / denom).ln()
                    })
                    .sum::<f64>();
                (cat.label.clone(), score)
            })
            .collect()
    }

    /// Category label, or `"other"` when the evidence is too weak
    pub fn classify(&self, text: &str) -> String {
        let tokens = self.tokenizer.tokenize(text);
        if tokens.is_empty() {
            return FALLBACK_CATEGORY.to_string();
        }
        let mut scores = self.token_scores(&tokens);
        scores.sort_by(|a, b| b.1.total_cmp(&a.1));
        match scores.as_slice() {
            [] => FALLBACK_CATEGORY.to_string(),
            [(best, _)] => best.clone(),
            [(best, s1), (_, s2), ..] => {
                if s1 - s2 < self.min_margin {
                    FALLBACK_CATEGORY.to_string()
                } else {
                    best.clone()
                }
            }
        }
    }
}

/// Classify with the built-in keyword lists
pub fn naive_bayes_category(text: &str) -> String {
    KeywordClassifier::new().classify(text)
}

/// Trainable multinomial Naive Bayes model
///
/// `P(c) = count(c) / N` and
/// `P(t|c) = (count(t, c) + 1) / (total(c) + V)`, where `V` is the number of
/// distinct terms over all classes, shared by every class.
///
/// Serialized with camelCase keys (`classCounts`, `termCountsByClass`,
/// `vocabularySize`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NaiveBayesModel {
    pub class_counts: IndexMap<String, u64>,
    pub term_counts_by_class: IndexMap<String, IndexMap<String, u64>>,
    pub vocabulary_size: usize,
}

impl NaiveBayesModel {
    /// Fit the model from labeled samples
    /// Classes keep the order in which they first appear.
    pub fn train(samples: &[LabeledText]) -> Self {
        let tokenizer = Tokenizer::new();
        let mut class_counts: IndexMap<String, u64> = IndexMap::new();
        let mut term_counts_by_class: IndexMap<String, IndexMap<String, u64>> = IndexMap::new();
        let mut vocabulary: HashSet<String> = HashSet::new();

        for sample in samples {
            *class_counts.entry(sample.label.clone()).or_insert(0) += 1;
            let terms = term_counts_by_class.entry(sample.label.clone()).or_default();
            for token in tokenizer.tokenize(&sample.text) {
                *terms.entry(token.clone()).or_insert(0) += 1;
                vocabulary.insert(token);
            }
        }
        debug!(
            samples = samples.len(),
            classes = class_counts.len(),
            vocabulary = vocabulary.len(),
            "trained naive bayes model"
        );
        Self {
            class_counts,
            term_counts_by_class,
            vocabulary_size: vocabulary.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.class_counts.is_empty()
    }

    /// Log posterior (up to a constant) of every class, best first
    /// Equal scores keep training order.
    pub fn predict_ranked(&self, text: &str) -> Vec<(String, f64)> {
        let tokens = Tokenizer::new().tokenize(text);
        let total: u64 = self.class_counts.values().sum();
        if total == 0 {
            return Vec::new();
        }
        let vocab = self.vocabulary_size as f64;
        let mut ranked: Vec<(String, f64)> = self
            .class_counts
            .iter()
            .map(|(label, &count)| {
                let prior = (count as f64 / total as f64).ln();
                let terms = self.term_counts_by_class.get(label);
                let class_total = terms.map_or(0, |t| t.values().sum::<u64>()) as f64;
                let denom = (class_total + vocab).max(1.0);
                let likelihood = tokens
                    .iter()
                    .map(|tok| {
                        let c = terms.and_then(|t| t.get(tok)).copied().unwrap_or(0) as f64;
                        ((c + 1.0) / denom).ln()
                    })
                    .sum::<f64>();
                (label.clone(), prior + likelihood)
            })
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked
    }

    /// Most likely class, `None` if the model has no classes
    pub fn predict(&self, text: &str) -> Option<String> {
        self.predict_ranked(text).into_iter().next().map(|(label, _)| label)
    }

    /// Check the counts are internally consistent
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: String| ScoringError::InvalidModel { key: "nbModel", reason };
        let mut vocabulary: HashSet<&str> = HashSet::new();
        for (label, terms) in &self.term_counts_by_class {
            if !self.class_counts.contains_key(label) {
                return Err(invalid(format!("term counts for unknown class `{label}`")));
            }
            vocabulary.extend(terms.keys().map(String::as_str));
        }
        if vocabulary.len() != self.vocabulary_size {
            return Err(invalid(format!(
                "vocabularySize is {}, but {} distinct terms are stored",
                self.vocabulary_size,
                vocabulary.len()
            )));
        }
        Ok(())
    }
}
