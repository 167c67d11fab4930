//! One-hot encoding of the nominal fields

use crate::error::{Result, SalesError};
use crate::features::{FeatureRow, NominalField};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::BTreeSet;

/// Fixed vocabulary for one nominal field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct FieldVocabulary {
    field: NominalField,
    /// Sorted categories seen during fitting
    categories: Vec<String>,
}

impl FieldVocabulary {
    fn position(&self, value: &str) -> Option<usize> {
        self.categories
            .binary_search_by(|c| c.as_str().cmp(value))
            .ok()
    }
}

/// One-hot encoder over city, category and payment method.
///
/// Each field contributes one indicator per category observed at fit time.
/// Values never seen during fitting, and missing values, encode as an
/// all-zero block instead of failing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OneHotEncoder {
    vocabularies: Vec<FieldVocabulary>,
    is_fitted: bool,
}

impl OneHotEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Learn the vocabulary of every nominal field
    pub fn fit<R: Borrow<FeatureRow>>(&mut self, rows: &[R]) -> Result<&mut Self> {
        if rows.is_empty() {
            return Err(SalesError::EmptyDataset);
        }

        self.vocabularies = NominalField::ALL
            .iter()
            .map(|&field| {
                let categories: BTreeSet<&str> = rows
                    .iter()
                    .filter_map(|row| Borrow::<FeatureRow>::borrow(row).nominal(field))
                    .collect();
                FieldVocabulary {
                    field,
                    categories: categories.into_iter().map(str::to_string).collect(),
                }
            })
            .collect();

        self.is_fitted = true;
        Ok(self)
    }

    pub fn is_fitted(&self) -> bool {
        self.is_fitted
    }

    /// Total number of indicator columns
    pub fn width(&self) -> usize {
        self.vocabularies.iter().map(|v| v.categories.len()).sum()
    }

    /// Categories learned for a field, in output order
    pub fn categories(&self, field: NominalField) -> &[String] {
        self.vocabularies
            .iter()
            .find(|v| v.field == field)
            .map(|v| v.categories.as_slice())
            .unwrap_or(&[])
    }

    /// Output column names, `<field>_<category>`
    pub fn feature_names(&self) -> Vec<String> {
        self.vocabularies
            .iter()
            .flat_map(|v| {
                v.categories
                    .iter()
                    .map(move |c| format!("{}_{}", v.field.name(), c))
            })
            .collect()
    }

    /// Write the indicators for one row into `out`, which must hold
    /// [`width`](Self::width) zeroed slots.
    pub fn encode_into(&self, row: &FeatureRow, out: &mut [f64]) -> Result<()> {
        if !self.is_fitted {
            return Err(SalesError::Training("encoder is not fitted".to_string()));
        }
        if out.len() != self.width() {
            return Err(SalesError::ShapeError {
                expected: format!("{} indicator slots", self.width()),
                actual: format!("{}", out.len()),
            });
        }

        let mut offset = 0;
        for vocab in &self.vocabularies {
            if let Some(pos) = row.nominal(vocab.field).and_then(|v| vocab.position(v)) {
                out[offset + pos] = 1.0;
            }
            offset += vocab.categories.len();
        }
        Ok(())
    }

    pub fn encode(&self, row: &FeatureRow) -> Result<Vec<f64>> {
        let mut out = vec![0.0; self.width()];
        self.encode_into(row, &mut out)?;
        Ok(out)
    }
}
