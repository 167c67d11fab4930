//! Transaction records and the in-memory dataset

use serde::{Deserialize, Serialize};

/// One historical sale as read from the input table.
///
/// The timestamp is kept as raw text; parsing it is the job of the feature
/// deriver so that training and inference share a single code path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub timestamp: Option<String>,
    pub created_at: Option<String>,
    pub city: Option<String>,
    pub category: Option<String>,
    pub payment_method: Option<String>,
    pub product_id: i64,
    /// Target value; absent rows are dropped before training
    pub amount: Option<f64>,
    /// Extra numeric columns, aligned with [`Dataset::covariate_names`]
    pub covariates: Vec<f64>,
}

impl TransactionRecord {
    /// Minimal record with no covariates
    pub fn new(
        timestamp: impl Into<String>,
        city: impl Into<String>,
        category: impl Into<String>,
        payment_method: impl Into<String>,
        product_id: i64,
    ) -> Self {
        Self {
            timestamp: Some(timestamp.into()),
            created_at: None,
            city: Some(city.into()),
            category: Some(category.into()),
            payment_method: Some(payment_method.into()),
            product_id,
            amount: None,
            covariates: Vec::new(),
        }
    }

    pub fn with_amount(mut self, amount: f64) -> Self {
        self.amount = Some(amount);
        self
    }

    pub fn with_created_at(mut self, created_at: impl Into<String>) -> Self {
        self.created_at = Some(created_at.into());
        self
    }

    pub fn with_covariates(mut self, covariates: Vec<f64>) -> Self {
        self.covariates = covariates;
        self
    }

    /// Target value, if present and finite
    pub fn target(&self) -> Option<f64> {
        self.amount.filter(|v| v.is_finite())
    }
}

/// Records plus the ordered names of their numeric covariates
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub covariate_names: Vec<String>,
    pub records: Vec<TransactionRecord>,
}

impl Dataset {
    pub fn new(covariate_names: Vec<String>, records: Vec<TransactionRecord>) -> Self {
        Self {
            covariate_names,
            records,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Copy of the dataset without rows that lack a usable target
    pub fn with_targets_only(&self) -> Dataset {
        Dataset {
            covariate_names: self.covariate_names.clone(),
            records: self
                .records
                .iter()
                .filter(|r| r.target().is_some())
                .cloned()
                .collect(),
        }
    }
}
