use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, ScoringError};
use crate::utils::math::{dot, sigmoid};

/// Learning rate multiplier applied after every epoch
pub const LEARNING_RATE_DECAY: f64 = 0.98;

/// Linear model with a sigmoid output
///
/// `weights.len()` is the feature dimension the model was trained on; any
/// other input length is rejected instead of being padded or truncated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    pub weights: Vec<f64>,
    pub bias: f64,
}

impl LinearModel {
    pub fn new(weights: Vec<f64>, bias: f64) -> Self {
        Self { weights, bias }
    }

    /// Feature dimension
    #[inline]
    pub fn dim(&self) -> usize {
        self.weights.len()
    }

    pub fn check_dim(&self, found: usize) -> Result<()> {
        if found != self.weights.len() {
            return Err(ScoringError::DimensionMismatch {
                expected: self.weights.len(),
                found,
            });
        }
        Ok(())
    }

    /// Raw score `w・x + b`
    pub fn decision(&self, x: &[f64]) -> Result<f64> {
        self.check_dim(x.len())?;
        Ok(dot(&self.weights, x) + self.bias)
    }

    /// Probability-like score in [0, 1]
    pub fn predict(&self, x: &[f64]) -> Result<f64> {
        self.decision(x).map(sigmoid)
    }

    /// Weights and bias are finite numbers
    pub fn is_finite(&self) -> bool {
        self.bias.is_finite() && self.weights.iter().all(|w| w.is_finite())
    }
}

/// Full-batch gradient descent on binary cross-entropy
///
/// The gradient `(prediction - label) * x` is averaged over the batch, and
/// the learning rate is multiplied by 0.98 after every epoch. No
/// regularization.
///
/// # Arguments
/// * `x` - feature rows, all of the same length
/// * `y` - labels in [0, 1], one per row
/// * `epochs` - passes over the batch
/// * `learning_rate` - initial step size
///
/// # Returns
/// * `LinearModel` - `{weights: [], bias: 0}` when there are no rows
pub fn train_logistic_regression(
    x: &[Vec<f64>],
    y: &[f64],
    epochs: usize,
    learning_rate: f64,
) -> Result<LinearModel> {
    if x.len() != y.len() {
        return Err(ScoringError::InvalidDataset(format!(
            "{} feature rows but {} labels",
            x.len(),
            y.len()
        )));
    }
    let Some(first) = x.first() else {
        return Ok(LinearModel::default());
    };
    let dim = first.len();
    if let Some(bad) = x.iter().find(|row| row.len() != dim) {
        return Err(ScoringError::DimensionMismatch { expected: dim, found: bad.len() });
    }

    let n = x.len() as f64;
    let mut model = LinearModel::new(vec![0.0; dim], 0.0);
    let mut lr = learning_rate;
    for _ in 0..epochs {
        let mut grad_w = vec![0.0; dim];
        let mut grad_b = 0.0;
        for (row, &label) in x.iter().zip(y) {
            let err = sigmoid(dot(&model.weights, row) + model.bias) - label;
            for (g, &v) in grad_w.iter_mut().zip(row) {
                *g += err * v;
            }
            grad_b += err;
        }
        for (w, g) in model.weights.iter_mut().zip(&grad_w) {
            *w -= lr * g / n;
        }
        model.bias -= lr * grad_b / n;
        lr *= LEARNING_RATE_DECAY;
    }
    debug!(
        rows = x.len(),
        dim,
        epochs,
        loss = log_loss(&model, x, y),
        "trained logistic regression"
    );
    Ok(model)
}

/// Mean binary cross-entropy of a model over a batch
pub fn log_loss(model: &LinearModel, x: &[Vec<f64>], y: &[f64]) -> f64 {
    if x.is_empty() {
        return 0.0;
    }
    const EPS: f64 = 1e-12;
    let total: f64 = x
        .iter()
        .zip(y)
        .map(|(row, &label)| {
            let p = sigmoid(dot(&model.weights, row) + model.bias).clamp(EPS, 1.0 - EPS);
            -(label * p.ln() + (1.0 - label) * (1.0 - p).ln())
        })
        .sum();
    total / x.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_training_set() {
        let model = train_logistic_regression(&[], &[], 100, 0.1).unwrap();
        assert_eq!(model, LinearModel { weights: vec![], bias: 0.0 });
    }

    #[test]
    fn rejects_ragged_rows_and_label_mismatch() {
        let x = vec![vec![1.0, 2.0], vec![1.0]];
        assert!(matches!(
            train_logistic_regression(&x, &[1.0, 0.0], 10, 0.1),
            Err(ScoringError::DimensionMismatch { expected: 2, found: 1 })
        ));
        assert!(matches!(
            train_logistic_regression(&[vec![1.0]], &[], 10, 0.1),
            Err(ScoringError::InvalidDataset(_))
        ));
    }

    #[test]
    fn learns_separable_data() {
        let x = vec![vec![0.0], vec![0.1], vec![0.2], vec![0.8], vec![0.9], vec![1.0]];
        let y = vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0];
        let before = log_loss(&LinearModel::new(vec![0.0], 0.0), &x, &y);
        let model = train_logistic_regression(&x, &y, 500, 1.0).unwrap();
        assert!(log_loss(&model, &x, &y) < before);
        assert!(model.predict(&[0.95]).unwrap() > 0.5);
        assert!(model.predict(&[0.05]).unwrap() < 0.5);
        assert!(model.weights[0] > 0.0);
    }

    #[test]
    fn single_epoch_matches_hand_computation() {
        // all weights start at zero, so every prediction is 0.5
        let x = vec![vec![1.0, 0.0], vec![0.0, 1.0]];
        let y = vec![1.0, 0.0];
        let model = train_logistic_regression(&x, &y, 1, 0.5).unwrap();
        // grad_w = [(-0.5 * 1) / 2, (0.5 * 1) / 2], grad_b = 0
        assert!((model.weights[0] - 0.125).abs() < 1e-12);
        assert!((model.weights[1] + 0.125).abs() < 1e-12);
        assert!(model.bias.abs() < 1e-12);
    }

    #[test]
    fn second_epoch_uses_decayed_rate() {
        let x = vec![vec![1.0, 0.0], vec![0.0, 1.0]];
        let y = vec![1.0, 0.0];
        let model = train_logistic_regression(&x, &y, 2, 0.5).unwrap();
        // after epoch 1: w = [0.125, -0.125], so the rows predict sigmoid(±0.125)
        // epoch 2: grad_w = [-p, p] with p = sigmoid(-0.125), step 0.5 * 0.98
        let p = sigmoid(-0.125);
        let step = 0.5 * 0.98 * p / 2.0;
        assert!((model.weights[0] - (0.125 + step)).abs() < 1e-12);
        assert!((model.weights[1] + (0.125 + step)).abs() < 1e-12);
        assert!(model.bias.abs() < 1e-12);
        // an undecayed second step would land 0.01 * p / 2 further out
        assert!((model.weights[0] - (0.125 + 0.5 * p / 2.0)).abs() > 1e-3);
    }

    #[test]
    fn predict_rejects_wrong_dimension() {
        let model = LinearModel::new(vec![1.0, 2.0, 3.0], 0.0);
        assert!(matches!(
            model.predict(&[1.0, 2.0]),
            Err(ScoringError::DimensionMismatch { expected: 3, found: 2 })
        ));
        assert_eq!(model.predict(&[0.0, 0.0, 0.0]).unwrap(), 0.5);
    }
}
