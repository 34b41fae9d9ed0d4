use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, ScoringError};
use crate::utils::math::binary_entropy;

/// Visibility of a portfolio item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Privacy {
    Public,
    Private,
}

impl fmt::Display for Privacy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Privacy::Public => f.write_str("public"),
            Privacy::Private => f.write_str("private"),
        }
    }
}

/// What a portfolio item has attached
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PrivacySignals {
    pub has_thumbnail: bool,
    pub has_tags: bool,
    pub has_media: bool,
    pub has_link: bool,
}

impl PrivacySignals {
    /// Feature names used by the trainable tree
    pub const FEATURES: [&'static str; 4] = ["hasThumbnail", "hasTags", "hasMedia", "hasLink"];

    /// Signals as a feature map for the trainable tree
    pub fn features(&self) -> IndexMap<String, FeatureValue> {
        [
            (Self::FEATURES[0], self.has_thumbnail),
            (Self::FEATURES[1], self.has_tags),
            (Self::FEATURES[2], self.has_media),
            (Self::FEATURES[3], self.has_link),
        ]
        .into_iter()
        .map(|(name, value)| (name.to_string(), FeatureValue::Bool(value)))
        .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivacyRecommendation {
    pub recommendation: Privacy,
    pub reason: String,
}

impl PrivacyRecommendation {
    pub fn new(recommendation: Privacy, reason: &str) -> Self {
        Self { recommendation, reason: reason.to_string() }
    }
}

/// Fixed rule tree, first matching rule wins
///
/// 1. no media and no thumbnail: private
/// 2. media and tags: public
/// 3. media and link: public
/// 4. otherwise: private
pub fn recommend_privacy(signals: &PrivacySignals) -> PrivacyRecommendation {
    if !signals.has_media && !signals.has_thumbnail {
        PrivacyRecommendation::new(Privacy::Private, "No media & no thumbnail")
    } else if signals.has_media && signals.has_tags {
        PrivacyRecommendation::new(Privacy::Public, "Has media and tags")
    } else if signals.has_media && signals.has_link {
        PrivacyRecommendation::new(Privacy::Public, "Has media and link")
    } else {
        PrivacyRecommendation::new(Privacy::Private, "Default to private")
    }
}

/// A feature value, boolean or numeric
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Bool(bool),
    Num(f64),
}

impl FeatureValue {
    #[inline]
    pub fn as_f64(&self) -> f64 {
        match *self {
            FeatureValue::Bool(b) => if b { 1.0 } else { 0.0 },
            FeatureValue::Num(n) => n,
        }
    }

    #[inline]
    pub fn as_bool(&self) -> bool {
        match *self {
            FeatureValue::Bool(b) => b,
            FeatureValue::Num(n) => n != 0.0,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, FeatureValue::Num(_))
    }
}

impl From<bool> for FeatureValue {
    fn from(b: bool) -> Self {
        FeatureValue::Bool(b)
    }
}

impl From<f64> for FeatureValue {
    fn from(n: f64) -> Self {
        FeatureValue::Num(n)
    }
}

/// A labeled training example
/// Serialized flat: `{"hasMedia": true, "views": 12, "label": "public"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeSample {
    #[serde(flatten)]
    pub features: IndexMap<String, FeatureValue>,
    pub label: Privacy,
}

impl TreeSample {
    pub fn new<I, S, V>(features: I, label: Privacy) -> Self
    where
        I: IntoIterator<Item = (S, V)>,
        S: Into<String>,
        V: Into<FeatureValue>,
    {
        Self {
            features: features.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
            label,
        }
    }

    pub fn from_signals(signals: &PrivacySignals, label: Privacy) -> Self {
        Self { features: signals.features(), label }
    }
}

/// Decision tree node
/// Serialized as `{"type": "leaf", ...}` or `{"type": "node", ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TreeNode {
    Leaf {
        label: Privacy,
    },
    Node {
        feature: String,
        threshold: FeatureValue,
        #[serde(rename = "isNumeric")]
        is_numeric: bool,
        /// numeric: `value <= threshold`, boolean: `value == threshold`
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

impl TreeNode {
    /// Walk the tree down to a leaf
    /// Missing features read as `false` / `0.0`.
    pub fn predict(&self, features: &IndexMap<String, FeatureValue>) -> Privacy {
        let mut node = self;
        loop {
            match node {
                TreeNode::Leaf { label } => return *label,
                TreeNode::Node { feature, threshold, is_numeric, left, right } => {
                    let value = features.get(feature);
                    node = if goes_left(value, threshold, *is_numeric) { left } else { right };
                }
            }
        }
    }

    /// Depth of the deepest leaf, a single leaf has depth 0
    pub fn depth(&self) -> usize {
        match self {
            TreeNode::Leaf { .. } => 0,
            TreeNode::Node { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }

    pub fn leaf_count(&self) -> usize {
        match self {
            TreeNode::Leaf { .. } => 1,
            TreeNode::Node { left, right, .. } => left.leaf_count() + right.leaf_count(),
        }
    }

    /// Check thresholds agree with the node kind and are finite
    pub fn validate(&self) -> Result<()> {
        match self {
            TreeNode::Leaf { .. } => Ok(()),
            TreeNode::Node { feature, threshold, is_numeric, left, right } => {
                let ok = match threshold {
                    FeatureValue::Num(n) => *is_numeric && n.is_finite(),
                    FeatureValue::Bool(_) => !*is_numeric,
                };
                if !ok {
                    return Err(ScoringError::InvalidModel {
                        key: "dtModel",
                        reason: format!("bad threshold {threshold:?} on `{feature}`"),
                    });
                }
                left.validate()?;
                right.validate()
            }
        }
    }
}

#[inline]
fn goes_left(value: Option<&FeatureValue>, threshold: &FeatureValue, is_numeric: bool) -> bool {
    if is_numeric {
        value.map_or(0.0, FeatureValue::as_f64) <= threshold.as_f64()
    } else {
        value.map_or(false, FeatureValue::as_bool) == threshold.as_bool()
    }
}

/// Greedy information-gain tree learner
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecisionTreeTrainer {
    pub max_depth: usize,
    /// nodes with this many samples or fewer become leaves
    pub min_samples: usize,
}

impl Default for DecisionTreeTrainer {
    fn default() -> Self {
        Self { max_depth: 3, min_samples: 5 }
    }
}

struct Split<'a> {
    threshold: FeatureValue,
    is_numeric: bool,
    feature: &'a str,
    gain: f64,
}

impl DecisionTreeTrainer {
    pub fn new(max_depth: usize, min_samples: usize) -> Self {
        Self { max_depth, min_samples }
    }

    /// Grow a tree over the given features
    ///
    /// # Arguments
    /// * `samples` - labeled examples
    /// * `features` - candidate features, in tie-break priority order
    ///
    /// # Returns
    /// * `TreeNode` - root of the tree
    pub fn train<S: AsRef<str>>(&self, samples: &[TreeSample], features: &[S]) -> TreeNode {
        let refs: Vec<&TreeSample> = samples.iter().collect();
        let features: Vec<&str> = features.iter().map(AsRef::as_ref).collect();
        let tree = self.build(&refs, &features, 0);
        debug!(
            samples = samples.len(),
            depth = tree.depth(),
            leaves = tree.leaf_count(),
            "trained decision tree"
        );
        tree
    }

    fn build(&self, samples: &[&TreeSample], features: &[&str], depth: usize) -> TreeNode {
        let (public, private) = label_counts(samples);
        let leaf = TreeNode::Leaf { label: majority(public, private) };
        if depth >= self.max_depth || samples.len() <= self.min_samples || public == 0 || private == 0 {
            return leaf;
        }
        let Some(split) = best_split(samples, features) else {
            return leaf;
        };
        let (left, right): (Vec<&TreeSample>, Vec<&TreeSample>) = samples.iter().partition(|s| {
            goes_left(s.features.get(split.feature), &split.threshold, split.is_numeric)
        });
        TreeNode::Node {
            feature: split.feature.to_string(),
            threshold: split.threshold,
            is_numeric: split.is_numeric,
            left: Box::new(self.build(&left, features, depth + 1)),
            right: Box::new(self.build(&right, features, depth + 1)),
        }
    }
}

/// Train with `max_depth = 3` and `min_samples = 5`
pub fn train_decision_tree<S: AsRef<str>>(samples: &[TreeSample], features: &[S]) -> TreeNode {
    DecisionTreeTrainer::default().train(samples, features)
}

fn label_counts(samples: &[&TreeSample]) -> (usize, usize) {
    let public = samples.iter().filter(|s| s.label == Privacy::Public).count();
    (public, samples.len() - public)
}

/// Majority label, ties go to private
fn majority(public: usize, private: usize) -> Privacy {
    if public > private { Privacy::Public } else { Privacy::Private }
}

fn entropy_of(samples: &[&TreeSample]) -> f64 {
    let (public, private) = label_counts(samples);
    binary_entropy(public, private)
}

/// Candidate thresholds of one feature over the current samples
/// numeric: sorted distinct values, boolean: `true` then `false`
fn thresholds(samples: &[&TreeSample], feature: &str) -> (bool, Vec<FeatureValue>) {
    let is_numeric = samples
        .iter()
        .any(|s| s.features.get(feature).map_or(false, FeatureValue::is_numeric));
    if !is_numeric {
        return (false, vec![FeatureValue::Bool(true), FeatureValue::Bool(false)]);
    }
    let mut values: Vec<f64> = samples
        .iter()
        .map(|s| s.features.get(feature).map_or(0.0, FeatureValue::as_f64))
        .filter(|v| !v.is_nan())
        .collect();
    values.sort_by(f64::total_cmp);
    values.dedup();
    (true, values.into_iter().map(FeatureValue::Num).collect())
}

/// Split with the highest information gain
/// Only strictly better gains replace the current best, so the first
/// feature/threshold wins ties.
fn best_split<'a>(samples: &[&TreeSample], features: &[&'a str]) -> Option<Split<'a>> {
    let parent = entropy_of(samples);
    let n = samples.len() as f64;
    let mut best: Option<Split<'a>> = None;
    for &feature in features {
        let (is_numeric, candidates) = thresholds(samples, feature);
        for threshold in candidates {
            let (left, right): (Vec<&TreeSample>, Vec<&TreeSample>) = samples
                .iter()
                .partition(|s| goes_left(s.features.get(feature), &threshold, is_numeric));
            if left.is_empty() || right.is_empty() {
                continue;
            }
            let weighted = (left.len() as f64 / n) * entropy_of(&left)
                + (right.len() as f64 / n) * entropy_of(&right);
            let gain = parent - weighted;
            if best.as_ref().map_or(true, |b| gain > b.gain) {
                best = Some(Split { threshold, is_numeric, feature, gain });
            }
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signals(thumbnail: bool, tags: bool, media: bool, link: bool) -> PrivacySignals {
        PrivacySignals { has_thumbnail: thumbnail, has_tags: tags, has_media: media, has_link: link }
    }

    #[test]
    fn fixed_rules_in_order() {
        let r = recommend_privacy(&signals(false, false, false, false));
        assert_eq!(r.recommendation, Privacy::Private);
        assert_eq!(r.reason, "No media & no thumbnail");

        let r = recommend_privacy(&signals(true, true, true, false));
        assert_eq!(r.recommendation, Privacy::Public);
        assert_eq!(r.reason, "Has media and tags");

        let r = recommend_privacy(&signals(false, false, true, true));
        assert_eq!(r.recommendation, Privacy::Public);
        assert_eq!(r.reason, "Has media and link");

        let r = recommend_privacy(&signals(true, false, false, true));
        assert_eq!(r.recommendation, Privacy::Private);
        assert_eq!(r.reason, "Default to private");

        // rule 1 shadows everything else when neither media nor thumbnail exist
        let r = recommend_privacy(&signals(false, true, false, true));
        assert_eq!(r.reason, "No media & no thumbnail");
    }

    /// label = public iff media and tags
    fn media_and_tags_samples() -> Vec<TreeSample> {
        let mut samples = Vec::new();
        for bits in 0..16u8 {
            let s = signals(bits & 1 != 0, bits & 2 != 0, bits & 4 != 0, bits & 8 != 0);
            let label = if s.has_media && s.has_tags { Privacy::Public } else { Privacy::Private };
            samples.push(TreeSample::from_signals(&s, label));
        }
        samples
    }

    #[test]
    fn learns_conjunction() {
        let samples = media_and_tags_samples();
        let tree = DecisionTreeTrainer::new(3, 1).train(&samples, &PrivacySignals::FEATURES);
        for sample in &samples {
            assert_eq!(tree.predict(&sample.features), sample.label);
        }
        assert!(tree.depth() <= 3);
        assert!(tree.validate().is_ok());
    }

    #[test]
    fn first_split_prefers_first_feature_on_ties() {
        let samples = media_and_tags_samples();
        let tree = DecisionTreeTrainer::new(1, 1).train(&samples, &PrivacySignals::FEATURES);
        // hasTags and hasMedia give the same gain, hasTags comes first
        match tree {
            TreeNode::Node { feature, threshold, is_numeric, .. } => {
                assert_eq!(feature, "hasTags");
                assert_eq!(threshold, FeatureValue::Bool(true));
                assert!(!is_numeric);
            }
            leaf => panic!("expected a split, got {leaf:?}"),
        }
    }

    #[test]
    fn max_depth_cuts_impure_nodes_into_majority_leaves() {
        let samples = media_and_tags_samples();
        // hasTags = true leaves 4 public and 4 private below the root
        let tree = DecisionTreeTrainer::new(1, 1).train(&samples, &PrivacySignals::FEATURES);
        assert_eq!(tree.depth(), 1);
        match &tree {
            TreeNode::Node { left, right, .. } => {
                assert_eq!(**left, TreeNode::Leaf { label: Privacy::Private });
                assert_eq!(**right, TreeNode::Leaf { label: Privacy::Private });
            }
            leaf => panic!("expected a split, got {leaf:?}"),
        }

        let root_only = DecisionTreeTrainer::new(0, 1).train(&samples, &PrivacySignals::FEATURES);
        assert_eq!(root_only, TreeNode::Leaf { label: Privacy::Private });
    }

    #[test]
    fn stops_on_small_node() {
        let samples = media_and_tags_samples();
        let tree = train_decision_tree(&samples[..5], &PrivacySignals::FEATURES);
        assert_eq!(tree, TreeNode::Leaf { label: Privacy::Private });
    }

    #[test]
    fn stops_on_pure_node_and_empty_input() {
        let samples: Vec<TreeSample> = (0..10)
            .map(|i| TreeSample::new([("views", i as f64)], Privacy::Public))
            .collect();
        assert_eq!(train_decision_tree(&samples, &["views"]), TreeNode::Leaf { label: Privacy::Public });
        assert_eq!(train_decision_tree(&[], &["views"]), TreeNode::Leaf { label: Privacy::Private });
    }

    #[test]
    fn numeric_threshold_split() {
        let samples: Vec<TreeSample> = (0..10)
            .map(|i| {
                let label = if i >= 6 { Privacy::Public } else { Privacy::Private };
                TreeSample::new([("views", i as f64 * 10.0)], label)
            })
            .collect();
        let tree = train_decision_tree(&samples, &["views"]);
        match &tree {
            TreeNode::Node { feature, threshold, is_numeric, .. } => {
                assert_eq!(feature, "views");
                assert_eq!(*threshold, FeatureValue::Num(50.0));
                assert!(*is_numeric);
            }
            leaf => panic!("expected a split, got {leaf:?}"),
        }
        let mut point = IndexMap::new();
        point.insert("views".to_string(), FeatureValue::Num(75.0));
        assert_eq!(tree.predict(&point), Privacy::Public);
        point.insert("views".to_string(), FeatureValue::Num(5.0));
        assert_eq!(tree.predict(&point), Privacy::Private);
        // a missing numeric feature reads as 0
        assert_eq!(tree.predict(&IndexMap::new()), Privacy::Private);
    }

    #[test]
    fn no_usable_split_gives_majority_leaf() {
        // identical features, mixed labels
        let samples: Vec<TreeSample> = (0..8)
            .map(|i| {
                let label = if i < 5 { Privacy::Public } else { Privacy::Private };
                TreeSample::new([("hasMedia", true)], label)
            })
            .collect();
        assert_eq!(train_decision_tree(&samples, &["hasMedia"]), TreeNode::Leaf { label: Privacy::Public });
    }

    #[test]
    fn tree_json_shape() {
        let tree = TreeNode::Node {
            feature: "hasMedia".into(),
            threshold: FeatureValue::Bool(true),
            is_numeric: false,
            left: Box::new(TreeNode::Leaf { label: Privacy::Public }),
            right: Box::new(TreeNode::Leaf { label: Privacy::Private }),
        };
        let json = serde_json::to_value(&tree).unwrap();
        assert_eq!(json["type"], "node");
        assert_eq!(json["isNumeric"], false);
        assert_eq!(json["left"]["type"], "leaf");
        assert_eq!(json["left"]["label"], "public");
        let back: TreeNode = serde_json::from_value(json).unwrap();
        assert_eq!(back, tree);
    }

    #[test]
    fn validate_rejects_mismatched_threshold() {
        let tree = TreeNode::Node {
            feature: "views".into(),
            threshold: FeatureValue::Bool(true),
            is_numeric: true,
            left: Box::new(TreeNode::Leaf { label: Privacy::Public }),
            right: Box::new(TreeNode::Leaf { label: Privacy::Private }),
        };
        assert!(tree.validate().is_err());
    }

    #[test]
    fn samples_deserialize_flat() {
        let sample: TreeSample =
            serde_json::from_str(r#"{"hasMedia": true, "views": 12, "label": "public"}"#).unwrap();
        assert_eq!(sample.label, Privacy::Public);
        assert_eq!(sample.features["hasMedia"], FeatureValue::Bool(true));
        assert_eq!(sample.features["views"], FeatureValue::Num(12.0));
    }
}
