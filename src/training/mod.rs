//! Model training module
//!
//! Provides the training side of the forecaster:
//! - Seeded train/test partitioning
//! - XGBoost-style gradient boosted regression trees
//! - Held-out regression metrics (MAE, MSE, RMSE, R²)
//! - [`TrainEngine`] orchestrating derivation, encoding, fitting and evaluation

mod config;
mod engine;
pub mod metrics;
pub mod split;
pub mod xgboost;

pub use config::TrainingConfig;
pub use engine::{TrainEngine, TrainingOutcome, TrainingSummary};
pub use metrics::{r2_score, RegressionMetrics};
pub use split::{train_test_split, TrainTestSplit};
pub use xgboost::{XGBoostConfig, XGBoostRegressor};
