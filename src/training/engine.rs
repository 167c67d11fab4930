//! Training engine implementation

use super::metrics::RegressionMetrics;
use super::split::train_test_split;
use super::xgboost::XGBoostRegressor;
use super::TrainingConfig;
use crate::config::ColumnConfig;
use crate::error::{Result, SalesError};
use crate::features::{derive_all, FeatureRow};
use crate::pipeline::SalesPipeline;
use crate::preprocessing::Preprocessor;
use crate::records::Dataset;
use crate::utils::{CovariateSelection, DataLoader, TargetRequirement};
use ndarray::Array1;
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info};

/// Everything produced by one training run
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub pipeline: SalesPipeline,
    /// Held-out evaluation
    pub metrics: RegressionMetrics,
    pub summary: TrainingSummary,
}

/// Sizes and timing of a training run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSummary {
    pub n_records: usize,
    /// Records dropped for lacking a target
    pub n_dropped: usize,
    pub n_train: usize,
    pub n_test: usize,
    pub n_features: usize,
    pub training_time_secs: f64,
}

/// Main training engine
#[derive(Debug, Clone, Default)]
pub struct TrainEngine {
    config: TrainingConfig,
}

impl TrainEngine {
    /// Create a new training engine
    pub fn new(config: TrainingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Train from a raw table, checking its schema first
    pub fn fit_frame(&self, df: &DataFrame, columns: &ColumnConfig) -> Result<TrainingOutcome> {
        let dataset = DataLoader::new(columns.clone()).dataset_from_frame(
            df,
            TargetRequirement::Required,
            &CovariateSelection::Discover,
        )?;
        self.fit(&dataset)
    }

    /// Fit the pipeline and evaluate it on the held-out subset.
    ///
    /// Nothing is persisted here; callers save the returned pipeline only
    /// after this succeeds.
    pub fn fit(&self, dataset: &Dataset) -> Result<TrainingOutcome> {
        self.config.validate()?;
        let start = Instant::now();

        let cleaned = dataset.with_targets_only();
        let n_dropped = dataset.len() - cleaned.len();
        if n_dropped > 0 {
            info!(dropped = n_dropped, "Dropped records without a target");
        }
        if cleaned.is_empty() {
            return Err(SalesError::EmptyDataset);
        }

        let n_covariates = cleaned.covariate_names.len();
        if let Some(r) = cleaned.records.iter().find(|r| r.covariates.len() != n_covariates) {
            return Err(SalesError::MalformedInput(format!(
                "expected {} covariates, got {}",
                n_covariates,
                r.covariates.len()
            )));
        }

        let rows = derive_all(&cleaned.records)?;
        let targets: Vec<f64> = cleaned.records.iter().filter_map(|r| r.target()).collect();

        let split = train_test_split(rows.len(), self.config.test_size, self.config.split_seed)?;
        debug!(train = split.train.len(), test = split.test.len(), "Split records");

        let train_rows: Vec<&FeatureRow> = split.train.iter().map(|&i| &rows[i]).collect();
        let test_rows: Vec<&FeatureRow> = split.test.iter().map(|&i| &rows[i]).collect();
        let y_train: Array1<f64> = split.train.iter().map(|&i| targets[i]).collect();
        let y_test: Array1<f64> = split.test.iter().map(|&i| targets[i]).collect();

        let mut preprocessor = Preprocessor::new(&cleaned.covariate_names);
        preprocessor.fit(&train_rows)?;
        let x_train = preprocessor.transform(&train_rows)?;

        info!(
            rows = x_train.nrows(),
            features = x_train.ncols(),
            trees = self.config.booster.n_estimators,
            "Fitting gradient boosted trees"
        );
        let mut model = XGBoostRegressor::new(self.config.booster.clone());
        model.fit(&x_train, &y_train)?;

        let pipeline = SalesPipeline::new(cleaned.covariate_names.clone(), preprocessor, model)?;

        let y_pred = pipeline.predict_rows(&test_rows)?;
        let metrics = RegressionMetrics::compute(&y_test, &y_pred);
        info!(mae = metrics.mae, r2 = metrics.r2, "Held-out evaluation");

        let summary = TrainingSummary {
            n_records: dataset.len(),
            n_dropped,
            n_train: split.train.len(),
            n_test: split.test.len(),
            n_features: pipeline.preprocessor().n_outputs(),
            training_time_secs: start.elapsed().as_secs_f64(),
        };

        Ok(TrainingOutcome {
            pipeline,
            metrics,
            summary,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::TransactionRecord;

    fn small_dataset(n: usize) -> Dataset {
        let cities = ["Cordoba", "Alta Gracia"];
        let categories = ["A", "B", "C"];
        let records = (0..n)
            .map(|i| {
                let category = categories[i % 3];
                let amount = match category {
                    "A" => 50.0,
                    "B" => 200.0,
                    _ => 400.0,
                } + (i % 7) as f64;
                TransactionRecord::new(
                    format!("2024-{:02}-{:02}", i % 12 + 1, i % 28 + 1),
                    cities[i % 2],
                    category,
                    if i % 4 == 0 { "cash" } else { "card" },
                    (i % 10) as i64,
                )
                .with_covariates(vec![(i % 5) as f64])
                .with_amount(amount)
            })
            .collect();
        Dataset::new(vec!["qty".to_string()], records)
    }

    fn fast_config() -> TrainingConfig {
        TrainingConfig::default().with_n_estimators(30)
    }

    #[test]
    fn test_fit_reports_metrics() {
        let outcome = TrainEngine::new(fast_config()).fit(&small_dataset(120)).unwrap();
        assert_eq!(outcome.summary.n_test, 24);
        assert_eq!(outcome.summary.n_train, 96);
        assert_eq!(outcome.metrics.n_samples, 24);
        assert!(outcome.metrics.r2 > 0.5, "r2 = {}", outcome.metrics.r2);
        assert_eq!(
            outcome.summary.n_features,
            outcome.pipeline.feature_names().len()
        );
    }

    #[test]
    fn test_fit_is_deterministic() {
        let engine = TrainEngine::new(fast_config());
        let a = engine.fit(&small_dataset(80)).unwrap();
        let b = engine.fit(&small_dataset(80)).unwrap();
        assert_eq!(a.metrics.mae, b.metrics.mae);
        assert_eq!(a.metrics.r2, b.metrics.r2);
        assert_eq!(a.pipeline, b.pipeline);
    }

    #[test]
    fn test_rows_without_target_are_dropped() {
        let mut dataset = small_dataset(50);
        dataset.records[0].amount = None;
        dataset.records[1].amount = None;
        let outcome = TrainEngine::new(fast_config()).fit(&dataset).unwrap();
        assert_eq!(outcome.summary.n_dropped, 2);
        assert_eq!(outcome.summary.n_train + outcome.summary.n_test, 48);
    }

    #[test]
    fn test_empty_after_cleaning() {
        let mut dataset = small_dataset(10);
        for r in dataset.records.iter_mut() {
            r.amount = None;
        }
        let err = TrainEngine::new(fast_config()).fit(&dataset).unwrap_err();
        assert!(matches!(err, SalesError::EmptyDataset));
    }

    #[test]
    fn test_malformed_timestamp_fails_before_fit() {
        let mut dataset = small_dataset(20);
        dataset.records[5].timestamp = Some("31-31-2024".to_string());
        let err = TrainEngine::new(fast_config()).fit(&dataset).unwrap_err();
        assert!(matches!(err, SalesError::MalformedInput(_)));
    }
}
