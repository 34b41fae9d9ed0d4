pub mod fixtures;

use std::fmt;

use serde::Serialize;

use crate::toolkit::{ScoringToolkit, Variant};
use crate::vectorizer::{tfidf::TfIdfEngine, DocumentId, SimilarityIndex};

use self::fixtures::{
    category_fixtures, privacy_fixtures, quality_fixtures, rating_fixtures, relevance_judgments, Fixture,
};

/// Scores at or above this count as a positive prediction
pub const POSITIVE_THRESHOLD: f64 = 0.6;
/// Cut-off used for the similarity metrics
pub const RANKING_K: usize = 3;

#[inline]
fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}

#[inline]
fn harmonic_mean(p: f64, r: f64) -> f64 {
    if p + r == 0.0 { 0.0 } else { 2.0 * p * r / (p + r) }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConfusionMatrix {
    pub true_positive: usize,
    pub false_positive: usize,
    pub true_negative: usize,
    pub false_negative: usize,
}

impl ConfusionMatrix {
    /// Count `(predicted, actual)` pairs
    pub fn from_predictions<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (bool, bool)>,
    {
        pairs.into_iter().fold(Self::default(), |mut m, pair| {
            match pair {
                (true, true) => m.true_positive += 1,
                (true, false) => m.false_positive += 1,
                (false, false) => m.true_negative += 1,
                (false, true) => m.false_negative += 1,
            }
            m
        })
    }

    pub fn total(&self) -> usize {
        self.true_positive + self.false_positive + self.true_negative + self.false_negative
    }

    pub fn accuracy(&self) -> f64 {
        ratio(self.true_positive + self.true_negative, self.total())
    }

    pub fn precision(&self) -> f64 {
        ratio(self.true_positive, self.true_positive + self.false_positive)
    }

    pub fn recall(&self) -> f64 {
        ratio(self.true_positive, self.true_positive + self.false_negative)
    }

    pub fn f1(&self) -> f64 {
        harmonic_mean(self.precision(), self.recall())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BinaryMetrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub matrix: ConfusionMatrix,
}

impl From<ConfusionMatrix> for BinaryMetrics {
    fn from(matrix: ConfusionMatrix) -> Self {
        Self {
            accuracy: matrix.accuracy(),
            precision: matrix.precision(),
            recall: matrix.recall(),
            f1: matrix.f1(),
            matrix,
        }
    }
}

/// Threshold scores and compare them with labels
///
/// # Arguments
/// * `scored` - `(score, actual)` pairs
/// * `threshold` - a score `>= threshold` is a positive prediction
pub fn binary_metrics<I>(scored: I, threshold: f64) -> BinaryMetrics
where
    I: IntoIterator<Item = (f64, bool)>,
{
    ConfusionMatrix::from_predictions(scored.into_iter().map(|(score, actual)| (score >= threshold, actual))).into()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AccuracyMetrics {
    pub correct: usize,
    pub total: usize,
    pub accuracy: f64,
}

/// Share of `true` outcomes
pub fn accuracy<I>(outcomes: I) -> AccuracyMetrics
where
    I: IntoIterator<Item = bool>,
{
    let (correct, total) = outcomes
        .into_iter()
        .fold((0, 0), |(c, t), ok| (c + usize::from(ok), t + 1));
    AccuracyMetrics { correct, total, accuracy: ratio(correct, total) }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RankingMetrics {
    pub k: usize,
    pub queries: usize,
    pub top1_accuracy: f64,
    pub precision_at_k: f64,
    pub recall_at_k: f64,
    pub f1_at_k: f64,
}

/// Retrieval quality of an index over judged queries
///
/// Per query, precision@k is `hits / k` and recall@k is `hits / relevant`.
/// Both are averaged over queries, and F1@k is the harmonic mean of the two
/// averages.
pub fn ranking_metrics<E>(
    index: &SimilarityIndex<E>,
    judgments: &[Fixture<&str, Vec<DocumentId>>],
    k: usize,
) -> RankingMetrics
where
    E: TfIdfEngine + Send + Sync,
{
    let mut top1 = 0usize;
    let mut precision_sum = 0.0;
    let mut recall_sum = 0.0;
    for judgment in judgments {
        let hits = index.similar_to(judgment.input, k);
        let ids = hits.ids();
        if ids.first().is_some_and(|id| judgment.expected.contains(*id)) {
            top1 += 1;
        }
        let relevant_hits = ids.iter().filter(|id| judgment.expected.contains(**id)).count();
        precision_sum += ratio(relevant_hits, k);
        recall_sum += ratio(relevant_hits, judgment.expected.len());
    }
    let queries = judgments.len();
    let precision_at_k = if queries == 0 { 0.0 } else { precision_sum / queries as f64 };
    let recall_at_k = if queries == 0 { 0.0 } else { recall_sum / queries as f64 };
    RankingMetrics {
        k,
        queries,
        top1_accuracy: ratio(top1, queries),
        precision_at_k,
        recall_at_k,
        f1_at_k: harmonic_mean(precision_at_k, recall_at_k),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClassifierReport {
    pub variant: Variant,
    #[serde(flatten)]
    pub metrics: AccuracyMetrics,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScorerReport {
    pub variant: Variant,
    #[serde(flatten)]
    pub metrics: BinaryMetrics,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationReport {
    pub category: ClassifierReport,
    pub privacy: ClassifierReport,
    pub quality: ScorerReport,
    pub rating: ScorerReport,
    pub similarity: RankingMetrics,
}

/// Run every fixture through the toolkit's active models
pub fn evaluate(toolkit: &ScoringToolkit) -> EvaluationReport {
    let category = accuracy(
        category_fixtures()
            .iter()
            .map(|f| toolkit.category(f.input) == f.expected),
    );
    let privacy = accuracy(
        privacy_fixtures()
            .iter()
            .map(|f| toolkit.privacy(&f.input).recommendation == f.expected),
    );
    let quality = binary_metrics(
        quality_fixtures().iter().map(|f| (toolkit.quality(f.input), f.expected)),
        POSITIVE_THRESHOLD,
    );
    let rating = binary_metrics(
        rating_fixtures().iter().map(|f| (toolkit.rating(&f.input), f.expected)),
        POSITIVE_THRESHOLD,
    );
    let similarity = ranking_metrics(toolkit.index(), &relevance_judgments(), RANKING_K);

    EvaluationReport {
        category: ClassifierReport { variant: toolkit.category_variant(), metrics: category },
        privacy: ClassifierReport { variant: toolkit.privacy_variant(), metrics: privacy },
        quality: ScorerReport { variant: toolkit.quality_variant(), metrics: quality },
        rating: ScorerReport { variant: toolkit.rating_variant(), metrics: rating },
        similarity,
    }
}

impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let classifier = |f: &mut fmt::Formatter<'_>, name: &str, r: &ClassifierReport| {
            writeln!(
                f,
                "{name:<10} [{}] accuracy {:.3} ({}/{})",
                r.variant, r.metrics.accuracy, r.metrics.correct, r.metrics.total
            )
        };
        let scorer = |f: &mut fmt::Formatter<'_>, name: &str, r: &ScorerReport| {
            let m = &r.metrics;
            writeln!(
                f,
                "{name:<10} [{}] accuracy {:.3} precision {:.3} recall {:.3} f1 {:.3}",
                r.variant, m.accuracy, m.precision, m.recall, m.f1
            )
        };
        classifier(f, "category", &self.category)?;
        classifier(f, "privacy", &self.privacy)?;
        scorer(f, "quality", &self.quality)?;
        scorer(f, "rating", &self.rating)?;
        let s = &self.similarity;
        write!(
            f,
            "{:<10} top1 {:.3} p@{k} {:.3} r@{k} {:.3} f1@{k} {:.3}",
            "similarity",
            s.top1_accuracy,
            s.precision_at_k,
            s.recall_at_k,
            s.f1_at_k,
            k = s.k
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn empty_denominators_are_zero() {
        let m = ConfusionMatrix::default();
        assert_eq!((m.accuracy(), m.precision(), m.recall(), m.f1()), (0.0, 0.0, 0.0, 0.0));
        assert_eq!(accuracy(std::iter::empty::<bool>()).accuracy, 0.0);
        let r = ranking_metrics(&SimilarityIndex::<crate::vectorizer::tfidf::SmoothedTfIdfEngine>::new(), &[], 3);
        assert_eq!(r.top1_accuracy, 0.0);
        assert_eq!(r.f1_at_k, 0.0);
    }

    #[test]
    fn confusion_matrix_counts() {
        let m = ConfusionMatrix::from_predictions([(true, true), (true, false), (false, true), (false, false), (true, true)]);
        assert_eq!(m.true_positive, 2);
        assert_eq!(m.total(), 5);
        assert!(approx(m.precision(), 2.0 / 3.0));
        assert!(approx(m.recall(), 2.0 / 3.0));
        assert!(approx(m.accuracy(), 0.6));
    }

    #[test]
    fn threshold_is_inclusive() {
        let m = binary_metrics([(0.6, true), (0.59, false)], POSITIVE_THRESHOLD);
        assert_eq!(m.accuracy, 1.0);
    }

    #[test]
    fn fixed_variants_on_fixtures() {
        let report = evaluate(&ScoringToolkit::default());
        assert_eq!(report.category.variant, Variant::Fixed);
        // "Editing a music video" hits one keyword in every category
        assert_eq!((report.category.metrics.correct, report.category.metrics.total), (7, 8));
        assert_eq!(report.privacy.metrics.accuracy, 1.0);

        let q = report.quality.metrics.matrix;
        assert_eq!((q.true_positive, q.false_negative, q.false_positive, q.true_negative), (3, 1, 0, 4));
        let r = report.rating.metrics.matrix;
        assert_eq!((r.true_positive, r.false_negative, r.false_positive, r.true_negative), (3, 1, 1, 3));
        assert!(approx(report.rating.metrics.f1, 0.75));

        let s = report.similarity;
        assert_eq!(s.top1_accuracy, 1.0);
        assert!(approx(s.recall_at_k, 1.0));
        assert!(approx(s.precision_at_k, 0.4));
        assert!(approx(s.f1_at_k, 0.8 / 1.4));
    }

    #[test]
    fn report_renders_every_line() {
        let text = evaluate(&ScoringToolkit::default()).to_string();
        assert_eq!(text.lines().count(), 5);
        assert!(text.starts_with("category   [fixed] accuracy 0.875 (7/8)"));
    }
}
