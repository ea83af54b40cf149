//! Fitted smartcore models behind one serializable type.

use crate::domain::ml::tasks::Algorithm;
use serde::{Deserialize, Serialize};
use smartcore::ensemble::random_forest_regressor::{
    RandomForestRegressor, RandomForestRegressorParameters,
};
use smartcore::linalg::basic::arrays;
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::linear::linear_regression::{
    LinearRegression, LinearRegressionParameters, LinearRegressionSolverName,
};
use smartcore::linear::logistic_regression::{LogisticRegression, LogisticRegressionParameters};
use smartcore::tree::decision_tree_regressor::{
    DecisionTreeRegressor, DecisionTreeRegressorParameters,
};
use std::fmt;

/// Hyperparameters shared by the tree-based models.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TreeParameters {
    pub n_trees: usize,
    pub max_depth: u16,
    pub min_samples_split: usize,
}

impl Default for TreeParameters {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: 10,
            min_samples_split: 5,
        }
    }
}

type Matrix = DenseMatrix<f64>;

#[derive(Serialize, Deserialize)]
pub enum FittedModel {
    Linear(LinearRegression<f64, f64, Matrix, Vec<f64>>),
    RandomForest(RandomForestRegressor<f64, f64, Matrix, Vec<f64>>),
    DecisionTree(DecisionTreeRegressor<f64, f64, Matrix, Vec<f64>>),
    Logistic(LogisticRegression<f64, i32, Matrix, Vec<i32>>),
}

impl fmt::Debug for FittedModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FittedModel({})", self.algorithm())
    }
}

pub fn to_matrix(rows: &[Vec<f64>]) -> Result<Matrix, String> {
    DenseMatrix::from_2d_vec(&rows.to_vec()).map_err(|e| format!("Matrix error: {}", e))
}

fn shape(m: &Matrix) -> (usize, usize) {
    <Matrix as arrays::Array<f64, (usize, usize)>>::shape(m)
}

fn at(m: &Matrix, row: usize, col: usize) -> f64 {
    *<Matrix as arrays::Array<f64, (usize, usize)>>::get(m, (row, col))
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

impl FittedModel {
    /// Fits `algorithm` on the given matrix. Labels for the logistic model are
    /// read as 0/1 by rounding.
    pub fn fit(
        algorithm: Algorithm,
        x: &Matrix,
        y: &[f64],
        params: &TreeParameters,
    ) -> Result<Self, String> {
        let targets = y.to_vec();
        match algorithm {
            Algorithm::Linear => {
                // smartcore's SVD solver indexes out of bounds on wide matrices
                let (rows, cols) = shape(x);
                if rows <= cols {
                    return Err(format!(
                        "Linear regression needs more samples than features: {} samples, {} features",
                        rows, cols
                    ));
                }
                let parameters =
                    LinearRegressionParameters::default().with_solver(LinearRegressionSolverName::SVD);
                LinearRegression::fit(x, &targets, parameters)
                    .map(FittedModel::Linear)
                    .map_err(|e| format!("Training error: {}", e))
            }
            Algorithm::RandomForest => {
                let parameters = RandomForestRegressorParameters::default()
                    .with_n_trees(params.n_trees)
                    .with_max_depth(params.max_depth)
                    .with_min_samples_split(params.min_samples_split);
                RandomForestRegressor::fit(x, &targets, parameters)
                    .map(FittedModel::RandomForest)
                    .map_err(|e| format!("Training error: {}", e))
            }
            Algorithm::DecisionTree => {
                let parameters = DecisionTreeRegressorParameters::default()
                    .with_max_depth(params.max_depth)
                    .with_min_samples_split(params.min_samples_split);
                DecisionTreeRegressor::fit(x, &targets, parameters)
                    .map(FittedModel::DecisionTree)
                    .map_err(|e| format!("Training error: {}", e))
            }
            Algorithm::Logistic => {
                let labels: Vec<i32> = y.iter().map(|v| i32::from(*v >= 0.5)).collect();
                LogisticRegression::fit(x, &labels, LogisticRegressionParameters::default())
                    .map(FittedModel::Logistic)
                    .map_err(|e| format!("Training error: {}", e))
            }
        }
    }

    pub fn algorithm(&self) -> Algorithm {
        match self {
            FittedModel::Linear(_) => Algorithm::Linear,
            FittedModel::RandomForest(_) => Algorithm::RandomForest,
            FittedModel::DecisionTree(_) => Algorithm::DecisionTree,
            FittedModel::Logistic(_) => Algorithm::Logistic,
        }
    }

    /// Point predictions. The logistic model yields the probability of class 1.
    pub fn predict(&self, x: &Matrix) -> Result<Vec<f64>, String> {
        let predictions = match self {
            FittedModel::Linear(model) => model.predict(x),
            FittedModel::RandomForest(model) => model.predict(x),
            FittedModel::DecisionTree(model) => model.predict(x),
            FittedModel::Logistic(model) => return Self::logistic_probabilities(model, x),
        }
        .map_err(|e| format!("Predict error: {}", e))?;

        if predictions.iter().any(|p| !p.is_finite()) {
            return Err("Model produced a non-finite prediction".to_string());
        }
        Ok(predictions)
    }

    fn logistic_probabilities(
        model: &LogisticRegression<f64, i32, Matrix, Vec<i32>>,
        x: &Matrix,
    ) -> Result<Vec<f64>, String> {
        let coefficients = model.coefficients();
        let intercept = model.intercept();
        let (n_rows, n_cols) = shape(x);
        let coef_shape = shape(coefficients);

        // Binary models carry a single coefficient row; anything else falls back
        // to hard class labels.
        if coef_shape != (1, n_cols) {
            let labels = model
                .predict(x)
                .map_err(|e| format!("Predict error: {}", e))?;
            return Ok(labels.into_iter().map(f64::from).collect());
        }

        let bias = at(intercept, 0, 0);
        let probabilities = (0..n_rows)
            .map(|row| {
                let z = (0..n_cols).fold(bias, |acc, col| {
                    acc + at(x, row, col) * at(coefficients, 0, col)
                });
                sigmoid(z)
            })
            .collect();
        Ok(probabilities)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linear_data() -> (Vec<Vec<f64>>, Vec<f64>) {
        let x: Vec<Vec<f64>> = (0..30)
            .map(|i| vec![i as f64, (i % 7) as f64])
            .collect();
        let y: Vec<f64> = x.iter().map(|r| 2.0 * r[0] + 0.5 * r[1] + 1.0).collect();
        (x, y)
    }

    #[test]
    fn test_linear_fit_recovers_relationship() {
        let (x, y) = linear_data();
        let matrix = to_matrix(&x).unwrap();
        let model =
            FittedModel::fit(Algorithm::Linear, &matrix, &y, &TreeParameters::default()).unwrap();
        assert_eq!(model.algorithm(), Algorithm::Linear);
        let query = to_matrix(&[vec![10.0, 3.0]]).unwrap();
        let pred = model.predict(&query).unwrap();
        assert!((pred[0] - 22.5).abs() < 1e-4);
    }

    #[test]
    fn test_tree_models_predict_finite_values() {
        let (x, y) = linear_data();
        let matrix = to_matrix(&x).unwrap();
        let params = TreeParameters {
            n_trees: 10,
            max_depth: 5,
            min_samples_split: 2,
        };
        for algorithm in [Algorithm::RandomForest, Algorithm::DecisionTree] {
            let model = FittedModel::fit(algorithm, &matrix, &y, &params).unwrap();
            let pred = model.predict(&matrix).unwrap();
            assert_eq!(pred.len(), x.len());
            assert!(pred.iter().all(|p| p.is_finite()));
        }
    }

    #[test]
    fn test_logistic_outputs_probabilities() {
        let x: Vec<Vec<f64>> = (0..40).map(|i| vec![i as f64 / 10.0 - 2.0]).collect();
        let y: Vec<f64> = x.iter().map(|r| if r[0] > 0.0 { 1.0 } else { 0.0 }).collect();
        let matrix = to_matrix(&x).unwrap();
        let model =
            FittedModel::fit(Algorithm::Logistic, &matrix, &y, &TreeParameters::default())
                .unwrap();
        let query = to_matrix(&[vec![-1.5], vec![1.5]]).unwrap();
        let probs = model.predict(&query).unwrap();
        assert!(probs.iter().all(|p| (0.0..=1.0).contains(p)));
        assert!(probs[0] < probs[1]);
    }

    #[test]
    fn test_linear_rejects_wide_matrix() {
        let x: Vec<Vec<f64>> = (0..4).map(|i| vec![i as f64, 1.0, 2.0, 3.0]).collect();
        let matrix = to_matrix(&x).unwrap();
        let err = FittedModel::fit(
            Algorithm::Linear,
            &matrix,
            &[1.0, 2.0, 3.0, 4.0],
            &TreeParameters::default(),
        )
        .unwrap_err();
        assert!(err.contains("4 samples, 4 features"));
    }

    #[test]
    fn test_model_survives_json_round_trip() {
        let (x, y) = linear_data();
        let matrix = to_matrix(&x).unwrap();
        let model =
            FittedModel::fit(Algorithm::DecisionTree, &matrix, &y, &TreeParameters::default())
                .unwrap();
        let json = serde_json::to_string(&model).unwrap();
        let restored: FittedModel = serde_json::from_str(&json).unwrap();
        let before = model.predict(&matrix).unwrap();
        let after = restored.predict(&matrix).unwrap();
        for (a, b) in before.iter().zip(after.iter()) {
            assert!((a - b).abs() < 1e-9);
        }
    }
}
