// Historical booking normalization
pub mod etl;

// Feature building, training and inference
pub mod ml;

// Forecast-driven demand per spot
pub mod outlook;

// Batch orchestration
pub mod pipeline;

pub mod synthetic;
