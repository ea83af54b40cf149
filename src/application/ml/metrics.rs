//! Held-out evaluation metrics.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionMetrics {
    pub samples: usize,
    pub mse: f64,
    pub rmse: f64,
    pub mae: f64,
    pub r2: f64,
}

impl RegressionMetrics {
    pub fn evaluate(predictions: &[f64], actuals: &[f64]) -> Self {
        let n = predictions.len().min(actuals.len());
        if n == 0 {
            return Self {
                samples: 0,
                mse: 0.0,
                rmse: 0.0,
                mae: 0.0,
                r2: 0.0,
            };
        }

        let pairs = || predictions.iter().zip(actuals.iter()).take(n);
        let sq_err: f64 = pairs().map(|(p, t)| (p - t).powi(2)).sum();
        let abs_err: f64 = pairs().map(|(p, t)| (p - t).abs()).sum();
        let mean_y = actuals.iter().take(n).sum::<f64>() / n as f64;
        let ss_tot: f64 = actuals.iter().take(n).map(|t| (t - mean_y).powi(2)).sum();

        // Constant targets: perfect fit scores 1, anything else 0
        let r2 = if ss_tot > 0.0 {
            1.0 - sq_err / ss_tot
        } else if sq_err < 1e-12 {
            1.0
        } else {
            0.0
        };

        let mse = sq_err / n as f64;
        Self {
            samples: n,
            mse,
            rmse: mse.sqrt(),
            mae: abs_err / n as f64,
            r2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub label: u8,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AveragedMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

/// Binary classification report over labels `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationMetrics {
    pub samples: usize,
    pub accuracy: f64,
    pub classes: Vec<ClassMetrics>,
    pub macro_avg: AveragedMetrics,
    pub weighted_avg: AveragedMetrics,
    /// `confusion_matrix[actual][predicted]`
    pub confusion_matrix: [[usize; 2]; 2],
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

impl ClassificationMetrics {
    /// Undefined ratios (no predicted or no actual samples of a class) are reported as 0.
    pub fn evaluate(predicted: &[u8], actual: &[u8]) -> Self {
        let mut confusion = [[0usize; 2]; 2];
        for (p, a) in predicted.iter().zip(actual.iter()) {
            confusion[usize::from(*a >= 1)][usize::from(*p >= 1)] += 1;
        }
        let samples: usize = confusion.iter().flatten().sum();
        let correct = confusion[0][0] + confusion[1][1];

        let classes: Vec<ClassMetrics> = (0..2)
            .map(|label| {
                let true_pos = confusion[label][label];
                let predicted_total = confusion[0][label] + confusion[1][label];
                let support = confusion[label][0] + confusion[label][1];
                let precision = ratio(true_pos, predicted_total);
                let recall = ratio(true_pos, support);
                let f1 = if precision + recall > 0.0 {
                    2.0 * precision * recall / (precision + recall)
                } else {
                    0.0
                };
                ClassMetrics {
                    label: label as u8,
                    precision,
                    recall,
                    f1,
                    support,
                }
            })
            .collect();

        let macro_avg = AveragedMetrics {
            precision: classes.iter().map(|c| c.precision).sum::<f64>() / 2.0,
            recall: classes.iter().map(|c| c.recall).sum::<f64>() / 2.0,
            f1: classes.iter().map(|c| c.f1).sum::<f64>() / 2.0,
        };
        let weight = |value: fn(&ClassMetrics) -> f64| {
            if samples == 0 {
                0.0
            } else {
                classes
                    .iter()
                    .map(|c| value(c) * c.support as f64)
                    .sum::<f64>()
                    / samples as f64
            }
        };
        let weighted_avg = AveragedMetrics {
            precision: weight(|c| c.precision),
            recall: weight(|c| c.recall),
            f1: weight(|c| c.f1),
        };

        Self {
            samples,
            accuracy: ratio(correct, samples),
            classes,
            macro_avg,
            weighted_avg,
            confusion_matrix: confusion,
        }
    }
}

/// Evaluation attached to a trained artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TaskMetrics {
    Regression(RegressionMetrics),
    Classification(ClassificationMetrics),
}

impl TaskMetrics {
    /// Headline score: R² for regression, accuracy for classification.
    pub fn headline(&self) -> f64 {
        match self {
            TaskMetrics::Regression(m) => m.r2,
            TaskMetrics::Classification(m) => m.accuracy,
        }
    }
}
