use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The three independent predictive tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionTask {
    /// Regression on `actual_bookings`
    Demand,
    /// Regression on `optimized_price`
    Price,
    /// Classification on `was_cancelled`
    Cancellation,
}

impl PredictionTask {
    pub const ALL: [PredictionTask; 3] = [
        PredictionTask::Demand,
        PredictionTask::Price,
        PredictionTask::Cancellation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PredictionTask::Demand => "demand",
            PredictionTask::Price => "price",
            PredictionTask::Cancellation => "cancellation",
        }
    }

    pub fn is_classification(&self) -> bool {
        matches!(self, PredictionTask::Cancellation)
    }

    /// Algorithms that can be trained for this task.
    pub fn supported_algorithms(&self) -> &'static [Algorithm] {
        match self {
            PredictionTask::Demand | PredictionTask::Price => &[
                Algorithm::Linear,
                Algorithm::RandomForest,
                Algorithm::DecisionTree,
            ],
            PredictionTask::Cancellation => &[Algorithm::RandomForest, Algorithm::Logistic],
        }
    }

    pub fn supports(&self, algorithm: Algorithm) -> bool {
        self.supported_algorithms().contains(&algorithm)
    }
}

impl fmt::Display for PredictionTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PredictionTask {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "demand" => Ok(PredictionTask::Demand),
            "price" => Ok(PredictionTask::Price),
            "cancellation" => Ok(PredictionTask::Cancellation),
            _ => anyhow::bail!(
                "Invalid task: {}. Must be 'demand', 'price' or 'cancellation'",
                s
            ),
        }
    }
}

/// Model families in the algorithm registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    Linear,
    RandomForest,
    DecisionTree,
    Logistic,
}

impl Algorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            Algorithm::Linear => "linear",
            Algorithm::RandomForest => "random_forest",
            Algorithm::DecisionTree => "decision_tree",
            Algorithm::Logistic => "logistic",
        }
    }

    /// Looks up a registry name. Unknown names yield `None`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "linear" => Some(Algorithm::Linear),
            "random_forest" => Some(Algorithm::RandomForest),
            "decision_tree" => Some(Algorithm::DecisionTree),
            "logistic" => Some(Algorithm::Logistic),
            _ => None,
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
