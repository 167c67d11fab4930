//! Application configuration

use crate::error::{Result, SalesError};
use crate::training::TrainingConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Names of the columns the pipeline reads from the input table.
///
/// Defaults match the header of the historical sales export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnConfig {
    /// Transaction date, source of the calendar features
    pub timestamp: String,
    /// Record creation date, carried along but never used as a feature
    pub created_at: String,
    pub city: String,
    pub category: String,
    pub payment_method: String,
    pub product_id: String,
    /// Monetary amount, the regression target
    pub amount: String,
}

impl Default for ColumnConfig {
    fn default() -> Self {
        Self {
            timestamp: "fecha".to_string(),
            created_at: "fecha_alta".to_string(),
            city: "ciudad".to_string(),
            category: "categoria".to_string(),
            payment_method: "medio_pago".to_string(),
            product_id: "id_producto".to_string(),
            amount: "importe".to_string(),
        }
    }
}

impl ColumnConfig {
    /// Every column with a fixed role, in declaration order
    pub fn reserved(&self) -> [&str; 7] {
        [
            self.timestamp.as_str(),
            self.created_at.as_str(),
            self.city.as_str(),
            self.category.as_str(),
            self.payment_method.as_str(),
            self.product_id.as_str(),
            self.amount.as_str(),
        ]
    }

    /// Columns that must be present in every input table.
    /// The amount is only required when training.
    pub fn required(&self, with_amount: bool) -> Vec<&str> {
        let mut cols = vec![
            self.timestamp.as_str(),
            self.created_at.as_str(),
            self.city.as_str(),
            self.category.as_str(),
            self.payment_method.as_str(),
            self.product_id.as_str(),
        ];
        if with_amount {
            cols.push(self.amount.as_str());
        }
        cols
    }
}

/// Top-level configuration shared by the train and predict entry points
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    /// Historical transactions (CSV)
    pub data_path: PathBuf,
    /// Location of the trained pipeline artifact
    pub artifact_path: PathBuf,
    pub columns: ColumnConfig,
    pub training: TrainingConfig,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("data/df_ml.csv"),
            artifact_path: PathBuf::from("models/sales_pipeline.bin"),
            columns: ColumnConfig::default(),
            training: TrainingConfig::default(),
        }
    }
}

impl ForecastConfig {
    /// Load a JSON configuration file. Missing keys fall back to defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            SalesError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config: Self = serde_json::from_str(&json)
            .map_err(|e| SalesError::Config(format!("invalid {}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Builder method to set the dataset path
    pub fn with_data_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_path = path.into();
        self
    }

    /// Builder method to set the artifact path
    pub fn with_artifact_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.artifact_path = path.into();
        self
    }

    /// Builder method to set the column names
    pub fn with_columns(mut self, columns: ColumnConfig) -> Self {
        self.columns = columns;
        self
    }

    /// Builder method to set the training parameters
    pub fn with_training(mut self, training: TrainingConfig) -> Self {
        self.training = training;
        self
    }

    pub fn validate(&self) -> Result<()> {
        let reserved = self.columns.reserved();
        for (i, name) in reserved.iter().enumerate() {
            if name.is_empty() {
                return Err(SalesError::Config("column names must not be empty".to_string()));
            }
            if reserved[..i].contains(name) {
                return Err(SalesError::Config(format!(
                    "column '{}' is assigned to more than one role",
                    name
                )));
            }
        }
        self.training.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = ForecastConfig::default();
        assert_eq!(config.columns.amount, "importe");
        assert_eq!(config.training.test_size, 0.2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_required_columns() {
        let columns = ColumnConfig::default();
        assert_eq!(columns.required(false).len(), 6);
        assert!(columns.required(true).contains(&"importe"));
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "artifact_path": "out/model.bin", "columns": {{ "amount": "total" }} }}"#
        )
        .unwrap();

        let config = ForecastConfig::from_file(file.path()).unwrap();
        assert_eq!(config.artifact_path, PathBuf::from("out/model.bin"));
        assert_eq!(config.columns.amount, "total");
        assert_eq!(config.columns.city, "ciudad");
        assert_eq!(config.training.booster.n_estimators, 300);
    }

    #[test]
    fn test_duplicate_roles_rejected() {
        let columns = ColumnConfig {
            city: "importe".to_string(),
            ..Default::default()
        };
        let config = ForecastConfig::default().with_columns(columns);
        assert!(matches!(config.validate(), Err(SalesError::Config(_))));
    }
}
