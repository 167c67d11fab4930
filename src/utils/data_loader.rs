//! Data loading utilities

use crate::config::ColumnConfig;
use crate::error::{Result, SalesError};
use crate::records::{Dataset, TransactionRecord};
use polars::prelude::*;
use std::path::Path;
use tracing::{debug, info, warn};

/// How the loader picks the numeric covariate columns
#[derive(Debug, Clone, PartialEq)]
pub enum CovariateSelection {
    /// Every numeric column without a fixed role, in table order
    Discover,
    /// Exactly these columns, in this order (as recorded by a trained pipeline)
    Exactly(Vec<String>),
}

/// Whether the target column must be present
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetRequirement {
    Required,
    Optional,
}

/// Loads transaction tables into typed records
#[derive(Debug, Clone)]
pub struct DataLoader {
    columns: ColumnConfig,
    infer_schema_length: Option<usize>,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new(ColumnConfig::default())
    }
}

impl DataLoader {
    pub fn new(columns: ColumnConfig) -> Self {
        Self {
            columns,
            infer_schema_length: Some(1000),
        }
    }

    /// Set how many rows polars scans to infer column types
    pub fn with_infer_schema_length(mut self, n: Option<usize>) -> Self {
        self.infer_schema_length = n;
        self
    }

    pub fn columns(&self) -> &ColumnConfig {
        &self.columns
    }

    /// Load a CSV file as a raw DataFrame
    pub fn load_frame(&self, path: impl AsRef<Path>) -> Result<DataFrame> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SalesError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("dataset not found: {}", path.display()),
            )));
        }

        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(self.infer_schema_length)
            .try_into_reader_with_file_path(Some(path.to_path_buf()))?
            .finish()?;

        debug!(path = %path.display(), rows = df.height(), cols = df.width(), "Loaded CSV");
        Ok(df)
    }

    /// Load historical records for training: the amount column is required
    /// and covariates are discovered from the table.
    pub fn load_training(&self, path: impl AsRef<Path>) -> Result<Dataset> {
        let df = self.load_frame(path)?;
        self.dataset_from_frame(&df, TargetRequirement::Required, &CovariateSelection::Discover)
    }

    /// Load records for inference with the covariates a trained pipeline expects
    pub fn load_for_inference(
        &self,
        path: impl AsRef<Path>,
        covariate_names: &[String],
    ) -> Result<Dataset> {
        let df = self.load_frame(path)?;
        self.dataset_from_frame(
            &df,
            TargetRequirement::Optional,
            &CovariateSelection::Exactly(covariate_names.to_vec()),
        )
    }

    /// Convert a DataFrame into typed records after checking the schema.
    pub fn dataset_from_frame(
        &self,
        df: &DataFrame,
        target: TargetRequirement,
        selection: &CovariateSelection,
    ) -> Result<Dataset> {
        let present: Vec<String> = df
            .get_column_names()
            .into_iter()
            .map(|name| name.to_string())
            .collect();

        let mut missing = self.missing_columns(df, target);

        let covariate_names = match selection {
            CovariateSelection::Discover => self.discover_covariates(df),
            CovariateSelection::Exactly(names) => {
                missing.extend(
                    names
                        .iter()
                        .filter(|name| !present.contains(*name))
                        .cloned(),
                );
                names.clone()
            }
        };

        if !missing.is_empty() {
            return Err(SalesError::DataSchema { columns: missing });
        }

        let cols = &self.columns;
        let timestamps = string_column(df, &cols.timestamp)?;
        let created = string_column(df, &cols.created_at)?;
        let cities = string_column(df, &cols.city)?;
        let categories = string_column(df, &cols.category)?;
        let payments = string_column(df, &cols.payment_method)?;
        let products = integer_column(df, &cols.product_id)?;
        let amounts = if present.iter().any(|p| p == &cols.amount) {
            Some(float_column(df, &cols.amount)?)
        } else {
            None
        };
        let covariates: Vec<Vec<Option<f64>>> = covariate_names
            .iter()
            .map(|name| float_column(df, name))
            .collect::<Result<_>>()?;

        let mut records = Vec::with_capacity(df.height());
        for row in 0..df.height() {
            let product_id = products[row].ok_or_else(|| {
                SalesError::MalformedInput(format!(
                    "row {}: missing value in '{}'",
                    row + 1,
                    cols.product_id
                ))
            })?;

            records.push(TransactionRecord {
                timestamp: timestamps[row].clone(),
                created_at: created[row].clone(),
                city: cities[row].clone(),
                category: categories[row].clone(),
                payment_method: payments[row].clone(),
                product_id,
                amount: amounts.as_ref().and_then(|a| a[row]),
                covariates: covariates
                    .iter()
                    .map(|values| values[row].unwrap_or(0.0))
                    .collect(),
            });
        }

        info!(
            records = records.len(),
            covariates = covariate_names.len(),
            "Dataset loaded"
        );
        Ok(Dataset::new(covariate_names, records))
    }

    /// Fixed-role columns absent from `df`, in declaration order
    pub fn missing_columns(&self, df: &DataFrame, target: TargetRequirement) -> Vec<String> {
        self.columns
            .required(target == TargetRequirement::Required)
            .into_iter()
            .filter(|name| df.column(name).is_err())
            .map(str::to_string)
            .collect()
    }

    /// Numeric columns without a fixed role, in table order
    pub fn discover_covariates(&self, df: &DataFrame) -> Vec<String> {
        let reserved = self.columns.reserved();
        df.get_columns()
            .iter()
            .filter(|column| !reserved.contains(&column.name().as_str()))
            .filter_map(|column| {
                let name = column.name().to_string();
                if is_numeric(column.dtype()) {
                    Some(name)
                } else {
                    warn!(column = %name, dtype = %column.dtype(), "Skipping non-numeric column");
                    None
                }
            })
            .collect()
    }
}

fn is_numeric(dtype: &DataType) -> bool {
    dtype.is_integer() || dtype.is_float()
}

fn string_column(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let column = df
        .column(name)
        .map_err(|_| SalesError::missing_column(name))?;
    let series = column.as_materialized_series().cast(&DataType::String)?;
    let ca = series.str()?;

    Ok(ca
        .into_iter()
        .map(|v| v.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string))
        .collect())
}

fn float_column(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let column = df
        .column(name)
        .map_err(|_| SalesError::missing_column(name))?;
    if !is_numeric(column.dtype()) {
        return Err(SalesError::missing_column(name));
    }
    let series = column.as_materialized_series().cast(&DataType::Float64)?;
    Ok(series.f64()?.into_iter().collect())
}

fn integer_column(df: &DataFrame, name: &str) -> Result<Vec<Option<i64>>> {
    let column = df
        .column(name)
        .map_err(|_| SalesError::missing_column(name))?;
    if !is_numeric(column.dtype()) {
        return Err(SalesError::missing_column(name));
    }
    let series = column.as_materialized_series().cast(&DataType::Int64)?;
    Ok(series.i64()?.into_iter().collect())
}
