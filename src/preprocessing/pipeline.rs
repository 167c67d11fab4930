//! Preprocessing stage: one-hot indicators followed by numeric passthrough.
//!
//! The output of [`Preprocessor::transform`] is the contract between this
//! stage and the regression model: a row-major `f64` matrix whose columns are
//! named by [`Preprocessor::output_names`].

use super::encoder::OneHotEncoder;
use crate::error::{Result, SalesError};
use crate::features::{numeric_feature_names, FeatureRow};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preprocessor {
    encoder: OneHotEncoder,
    numeric_features: Vec<String>,
}

impl Preprocessor {
    /// Create an unfitted preprocessor for the given covariate columns
    pub fn new(covariate_names: &[String]) -> Self {
        Self {
            encoder: OneHotEncoder::new(),
            numeric_features: numeric_feature_names(covariate_names),
        }
    }

    pub fn fit<R: Borrow<FeatureRow>>(&mut self, rows: &[R]) -> Result<&mut Self> {
        self.encoder.fit(rows)?;
        debug!(
            indicators = self.encoder.width(),
            numeric = self.numeric_features.len(),
            "Preprocessor fitted"
        );
        Ok(self)
    }

    pub fn is_fitted(&self) -> bool {
        self.encoder.is_fitted()
    }

    pub fn encoder(&self) -> &OneHotEncoder {
        &self.encoder
    }

    pub fn numeric_features(&self) -> &[String] {
        &self.numeric_features
    }

    /// Number of output columns
    pub fn n_outputs(&self) -> usize {
        self.encoder.width() + self.numeric_features.len()
    }

    /// Output column names in matrix order
    pub fn output_names(&self) -> Vec<String> {
        let mut names = self.encoder.feature_names();
        names.extend(self.numeric_features.iter().cloned());
        names
    }

    /// Build the model input matrix, one row per feature row
    pub fn transform<R: Borrow<FeatureRow>>(&self, rows: &[R]) -> Result<Array2<f64>> {
        let n_indicators = self.encoder.width();
        let n_cols = self.n_outputs();
        let mut data = vec![0.0; rows.len() * n_cols];

        for (i, row) in rows.iter().enumerate() {
            let row: &FeatureRow = row.borrow();
            if row.numeric.len() != self.numeric_features.len() {
                return Err(SalesError::ShapeError {
                    expected: format!("{} numeric features", self.numeric_features.len()),
                    actual: format!("{} in row {}", row.numeric.len(), i + 1),
                });
            }
            let out = &mut data[i * n_cols..(i + 1) * n_cols];
            self.encoder.encode_into(row, &mut out[..n_indicators])?;
            out[n_indicators..].copy_from_slice(&row.numeric);
        }

        Ok(Array2::from_shape_vec((rows.len(), n_cols), data)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::derive_features;
    use crate::records::TransactionRecord;

    fn rows() -> Vec<FeatureRow> {
        vec![
            TransactionRecord::new("2024-03-15", "Cordoba", "A", "cash", 5)
                .with_covariates(vec![2.0]),
            TransactionRecord::new("2024-03-18", "Rio Cuarto", "B", "card", 6)
                .with_covariates(vec![1.0]),
        ]
        .iter()
        .map(|r| derive_features(r).unwrap())
        .collect()
    }

    #[test]
    fn test_transform_layout() {
        let rows = rows();
        let mut pre = Preprocessor::new(&["qty".to_string()]);
        pre.fit(&rows).unwrap();

        let x = pre.transform(&rows).unwrap();
        assert_eq!(x.dim(), (2, 6 + 6));
        assert_eq!(pre.output_names().len(), 12);
        assert_eq!(pre.output_names()[6], "product_id");
        // city_Cordoba, city_Rio Cuarto, category_A, category_B, card, cash, numeric...
        assert_eq!(
            x.row(0).to_vec(),
            vec![1.0, 0.0, 1.0, 0.0, 0.0, 1.0, 5.0, 2.0, 2024.0, 3.0, 15.0, 4.0]
        );
    }

    #[test]
    fn test_covariate_mismatch() {
        let rows = rows();
        let mut pre = Preprocessor::new(&[]);
        pre.fit(&rows).unwrap();
        assert!(matches!(pre.transform(&rows), Err(SalesError::ShapeError { .. })));
    }
}
