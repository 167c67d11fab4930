//! The fitted forecasting pipeline: preprocessing stage + regression model

use crate::error::{Result, SalesError};
use crate::features::{derive_all, FeatureRow, FEATURE_RECIPE_VERSION};
use crate::preprocessing::Preprocessor;
use crate::records::TransactionRecord;
use crate::training::XGBoostRegressor;
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;

/// A fitted preprocessor and the model trained on its output.
///
/// Both stages stay separately accessible; the only coupling is that the
/// model's input width equals [`Preprocessor::n_outputs`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesPipeline {
    recipe_version: u32,
    covariate_names: Vec<String>,
    preprocessor: Preprocessor,
    model: XGBoostRegressor,
}

impl SalesPipeline {
    pub fn new(
        covariate_names: Vec<String>,
        preprocessor: Preprocessor,
        model: XGBoostRegressor,
    ) -> Result<Self> {
        if !preprocessor.is_fitted() || !model.is_fitted() {
            return Err(SalesError::Training(
                "pipeline stages must be fitted before composing".to_string(),
            ));
        }
        if preprocessor.n_outputs() != model.n_features() {
            return Err(SalesError::ShapeError {
                expected: format!("model over {} features", preprocessor.n_outputs()),
                actual: format!("{}", model.n_features()),
            });
        }
        Ok(Self {
            recipe_version: FEATURE_RECIPE_VERSION,
            covariate_names,
            preprocessor,
            model,
        })
    }

    /// Feature recipe the pipeline was trained with
    pub fn recipe_version(&self) -> u32 {
        self.recipe_version
    }

    /// Covariate columns the pipeline expects, in order
    pub fn covariate_names(&self) -> &[String] {
        &self.covariate_names
    }

    pub fn preprocessor(&self) -> &Preprocessor {
        &self.preprocessor
    }

    pub fn model(&self) -> &XGBoostRegressor {
        &self.model
    }

    /// Names of the model input columns
    pub fn feature_names(&self) -> Vec<String> {
        self.preprocessor.output_names()
    }

    /// Predict one value per record, in input order
    pub fn predict(&self, records: &[TransactionRecord]) -> Result<Array1<f64>> {
        let rows = self.derive(records)?;
        self.predict_rows(&rows)
    }

    /// Feature rows for records whose covariates follow this pipeline's layout
    pub fn derive(&self, records: &[TransactionRecord]) -> Result<Vec<FeatureRow>> {
        let expected = self.covariate_names.len();
        if let Some((i, r)) = records
            .iter()
            .enumerate()
            .find(|(_, r)| r.covariates.len() != expected)
        {
            return Err(SalesError::MalformedInput(format!(
                "record {}: expected {} covariates, got {}",
                i + 1,
                expected,
                r.covariates.len()
            )));
        }

        derive_all(records)
    }

    /// Predict from already derived feature rows
    pub fn predict_rows<R: Borrow<FeatureRow>>(&self, rows: &[R]) -> Result<Array1<f64>> {
        let x = self.preprocessor.transform(rows)?;
        self.model.predict(&x)
    }

    /// Model feature importances paired with their names, highest first
    pub fn feature_importances(&self) -> Vec<(String, f64)> {
        let Some(importances) = self.model.feature_importances() else {
            return Vec::new();
        };
        let mut ranked: Vec<(String, f64)> = self
            .feature_names()
            .into_iter()
            .zip(importances.iter().copied())
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::training::XGBoostConfig;

    fn records() -> Vec<TransactionRecord> {
        (0..40)
            .map(|i| {
                TransactionRecord::new(
                    format!("2024-02-{:02}", i % 28 + 1),
                    if i % 2 == 0 { "Cordoba" } else { "Rio Cuarto" },
                    "A",
                    "cash",
                    i % 3,
                )
                .with_amount(if i % 2 == 0 { 100.0 } else { 300.0 })
            })
            .collect()
    }

    fn fitted() -> SalesPipeline {
        let rows = derive_all(&records()).unwrap();
        let y: Array1<f64> = records().iter().filter_map(|r| r.target()).collect();
        let mut preprocessor = Preprocessor::new(&[]);
        preprocessor.fit(&rows).unwrap();
        let x = preprocessor.transform(&rows).unwrap();
        let mut model = XGBoostRegressor::new(XGBoostConfig {
            n_estimators: 20,
            ..Default::default()
        });
        model.fit(&x, &y).unwrap();
        SalesPipeline::new(Vec::new(), preprocessor, model).unwrap()
    }

    #[test]
    fn test_unfitted_stages_rejected() {
        let model = XGBoostRegressor::new(XGBoostConfig::default());
        let err = SalesPipeline::new(Vec::new(), Preprocessor::new(&[]), model).unwrap_err();
        assert!(matches!(err, SalesError::Training(_)));
    }

    #[test]
    fn test_predict_matches_rows_path() {
        let pipeline = fitted();
        let recs = records();
        let rows = derive_all(&recs).unwrap();
        assert_eq!(pipeline.predict(&recs).unwrap(), pipeline.predict_rows(&rows).unwrap());
        assert_eq!(pipeline.recipe_version(), FEATURE_RECIPE_VERSION);
    }

    #[test]
    fn test_covariate_count_checked() {
        let pipeline = fitted();
        let recs = vec![records()[0].clone().with_covariates(vec![1.0])];
        assert!(matches!(pipeline.predict(&recs), Err(SalesError::MalformedInput(_))));
    }

    #[test]
    fn test_city_drives_importance() {
        let ranked = fitted().feature_importances();
        assert_eq!(ranked.len(), fitted().feature_names().len());
        assert!(ranked.windows(2).all(|w| w[0].1 >= w[1].1));
        assert!(ranked.iter().any(|(name, imp)| name.starts_with("city_") && *imp > 0.0));
    }
}
