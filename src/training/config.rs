//! Training configuration

use super::xgboost::XGBoostConfig;
use crate::error::{Result, SalesError};
use serde::{Deserialize, Serialize};

/// Configuration for model training
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Fraction of records held out for evaluation
    pub test_size: f64,

    /// Seed of the train/test shuffle
    pub split_seed: u64,

    /// Gradient boosting hyperparameters
    pub booster: XGBoostConfig,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            test_size: 0.2,
            split_seed: 42,
            booster: XGBoostConfig::default(),
        }
    }
}

impl TrainingConfig {
    /// Builder method to set the hold-out fraction
    pub fn with_test_size(mut self, test_size: f64) -> Self {
        self.test_size = test_size;
        self
    }

    /// Builder method to set the split seed
    pub fn with_split_seed(mut self, seed: u64) -> Self {
        self.split_seed = seed;
        self
    }

    /// Builder method to set the booster parameters
    pub fn with_booster(mut self, booster: XGBoostConfig) -> Self {
        self.booster = booster;
        self
    }

    /// Builder method to set the number of trees
    pub fn with_n_estimators(mut self, n: usize) -> Self {
        self.booster.n_estimators = n;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            return Err(SalesError::Config(format!(
                "test_size must be in (0, 1), got {}",
                self.test_size
            )));
        }
        self.booster.validate()
    }
}
