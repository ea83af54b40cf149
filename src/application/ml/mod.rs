pub mod artifacts;
pub mod encoder;
pub mod features;
pub mod metrics;
pub mod models;
pub mod predictor;
pub mod scaler;
pub mod trainer;

pub use artifacts::{ArtifactBundle, ArtifactStore, TrainedModelArtifact};
pub use predictor::PredictionService;
pub use trainer::{ModelSettings, ModelTrainer, TaskOutcome, TrainingPlan};
