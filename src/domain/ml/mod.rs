pub mod feature_registry;
pub mod predictions;
pub mod tasks;
