//! Sales Forecast - Sales forecasting pipeline
//!
//! This crate trains a gradient boosted regression model on historical sales
//! transactions and serves per-transaction predictions:
//! - Calendar feature derivation shared by training and inference
//! - One-hot encoding of nominal fields with all-zero handling of unseen values
//! - XGBoost-style second-order boosted trees
//! - Versioned, atomically written pipeline artifacts
//! - Aggregations of predictions by city, category, month and product
//!
//! # Modules
//!
//! ## Core
//! - [`features`] - Calendar and feature row derivation
//! - [`preprocessing`] - One-hot encoding and the model input matrix
//! - [`training`] - Split, boosted trees, metrics and the training engine
//! - [`pipeline`] - Fitted preprocessor + model
//! - [`inference`] - Artifact-backed prediction engine
//! - [`reporting`] - Filters, group totals, KPIs and city tiers
//!
//! ## Infrastructure
//! - [`error`] - Error taxonomy
//! - [`config`] - Column names, paths and training parameters
//! - [`records`] - Transaction records and datasets
//! - [`export`] - Artifact persistence
//! - [`utils`] - CSV loading
//! - [`cli`] - Command-line interface

// Core error handling
pub mod error;

// Configuration and data model
pub mod config;
pub mod records;

// Core ML modules
pub mod features;
pub mod preprocessing;
pub mod training;
pub mod pipeline;
pub mod inference;
pub mod reporting;

// Utilities
pub mod export;
pub mod utils;

// Services
pub mod cli;

pub use error::{Result, SalesError};

/// Re-export commonly used types
pub mod prelude {
    // Error handling
    pub use crate::error::{Result, SalesError};

    // Configuration and records
    pub use crate::config::{ColumnConfig, ForecastConfig};
    pub use crate::records::{Dataset, TransactionRecord};

    // Features
    pub use crate::features::{derive_features, CalendarFeatures, FeatureRow, NominalField};

    // Preprocessing
    pub use crate::preprocessing::{OneHotEncoder, Preprocessor};

    // Training
    pub use crate::training::{
        RegressionMetrics, TrainEngine, TrainingConfig, TrainingOutcome, XGBoostConfig,
        XGBoostRegressor,
    };

    // Pipeline and inference
    pub use crate::inference::InferenceEngine;
    pub use crate::pipeline::SalesPipeline;

    // Reporting
    pub use crate::reporting::{GroupBy, PredictionTable, RecordFilter};

    // Export
    pub use crate::export::{load_pipeline, save_outcome, save_pipeline, ArtifactMetadata};

    // Data loading
    pub use crate::utils::DataLoader;
}
