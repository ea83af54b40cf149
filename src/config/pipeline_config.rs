//! Pipeline run configuration parsing from environment variables.

use std::env;
use std::time::Duration;

/// Pipeline environment configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineEnvConfig {
    /// Days of history read by a full pipeline run
    pub lookback_days: u32,
    pub weather_timeout_ms: u64,
}

impl Default for PipelineEnvConfig {
    fn default() -> Self {
        Self {
            lookback_days: 730,
            weather_timeout_ms: 30_000,
        }
    }
}

impl PipelineEnvConfig {
    pub fn from_env() -> Self {
        Self {
            lookback_days: env::var("PIPELINE_LOOKBACK_DAYS")
                .unwrap_or_else(|_| "730".to_string())
                .parse::<u32>()
                .unwrap_or(730),
            weather_timeout_ms: env::var("WEATHER_TIMEOUT_MS")
                .unwrap_or_else(|_| "30000".to_string())
                .parse::<u64>()
                .unwrap_or(30_000),
        }
    }

    pub fn weather_timeout(&self) -> Duration {
        Duration::from_millis(self.weather_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_config_defaults() {
        let config = PipelineEnvConfig::from_env();
        assert_eq!(config.lookback_days, 730);
        assert_eq!(config.weather_timeout(), Duration::from_secs(30));
    }
}
