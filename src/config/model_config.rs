//! Model training configuration parsing from environment variables.

use crate::application::ml::ModelSettings;
use crate::application::ml::models::TreeParameters;
use anyhow::{Context, Result, bail};
use std::env;
use std::str::FromStr;

/// Model training environment configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ModelEnvConfig {
    pub n_trees: usize,
    pub max_depth: u16,
    pub min_samples_split: usize,
    pub split_seed: u64,
    /// Share of records held out for evaluation, strictly between 0 and 1
    pub test_fraction: f64,
}

impl Default for ModelEnvConfig {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: 10,
            min_samples_split: 5,
            split_seed: 42,
            test_fraction: 0.2,
        }
    }
}

impl ModelEnvConfig {
    pub fn from_env() -> Result<Self> {
        let config = Self {
            n_trees: Self::parse("MODEL_N_TREES", "100")?,
            max_depth: Self::parse("MODEL_MAX_DEPTH", "10")?,
            min_samples_split: Self::parse("MODEL_MIN_SAMPLES_SPLIT", "5")?,
            split_seed: Self::parse("MODEL_SPLIT_SEED", "42")?,
            test_fraction: Self::parse("MODEL_TEST_FRACTION", "0.2")?,
        };
        config.validate()?;
        Ok(config)
    }

    fn parse<T: FromStr>(key: &str, default: &str) -> Result<T>
    where
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        env::var(key)
            .unwrap_or_else(|_| default.to_string())
            .parse::<T>()
            .context(format!("Failed to parse {}", key))
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            bail!(
                "MODEL_TEST_FRACTION must be between 0 and 1 (exclusive), got {}",
                self.test_fraction
            );
        }
        if self.n_trees == 0 {
            bail!("MODEL_N_TREES must be at least 1");
        }
        Ok(())
    }

    pub fn settings(&self) -> ModelSettings {
        ModelSettings {
            trees: TreeParameters {
                n_trees: self.n_trees,
                max_depth: self.max_depth,
                min_samples_split: self.min_samples_split,
            },
            split_seed: self.split_seed,
            test_fraction: self.test_fraction,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_config_defaults() {
        let config = ModelEnvConfig::from_env().unwrap();
        assert_eq!(config, ModelEnvConfig::default());
        assert_eq!(config.settings(), ModelSettings::default());
    }

    #[test]
    fn test_test_fraction_bounds() {
        for bad in [0.0, 1.0, -0.1, f64::NAN] {
            let config = ModelEnvConfig {
                test_fraction: bad,
                ..ModelEnvConfig::default()
            };
            assert!(config.validate().is_err(), "{} accepted", bad);
        }
        let config = ModelEnvConfig {
            test_fraction: 0.3,
            ..ModelEnvConfig::default()
        };
        assert!(config.validate().is_ok());
    }
}
