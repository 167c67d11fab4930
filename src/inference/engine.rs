//! Inference engine implementation
//!
//! Serves a loaded pipeline:
//! - The pipeline is held in an `Arc` and shared read-only across threads
//! - Covariates are realigned to the order the pipeline was trained with
//! - Per-row prediction is parallelised inside the model via rayon

use crate::error::{Result, SalesError};
use crate::export::{load_artifact, ArtifactMetadata};
use crate::pipeline::SalesPipeline;
use crate::records::{Dataset, TransactionRecord};
use crate::reporting::PredictionTable;
use crate::utils::DataLoader;
use ndarray::Array1;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Prediction front-end over a fitted pipeline
#[derive(Debug, Clone)]
pub struct InferenceEngine {
    pipeline: Arc<SalesPipeline>,
    metadata: Option<ArtifactMetadata>,
}

impl InferenceEngine {
    /// Serve an in-memory pipeline
    pub fn new(pipeline: SalesPipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            metadata: None,
        }
    }

    /// Load the pipeline from an artifact file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let artifact = load_artifact(path)?;
        info!(
            trained_at = %artifact.metadata.trained_at,
            features = artifact.metadata.feature_names.len(),
            "Pipeline loaded"
        );
        Ok(Self {
            pipeline: Arc::new(artifact.pipeline),
            metadata: Some(artifact.metadata),
        })
    }

    pub fn pipeline(&self) -> &SalesPipeline {
        &self.pipeline
    }

    /// Metadata of the artifact the engine was loaded from
    pub fn metadata(&self) -> Option<&ArtifactMetadata> {
        self.metadata.as_ref()
    }

    /// Covariate columns new data must provide
    pub fn covariate_names(&self) -> &[String] {
        self.pipeline.covariate_names()
    }

    /// One prediction per record, in input order.
    ///
    /// Records must carry covariates in the pipeline's order.
    pub fn predict_records(&self, records: &[TransactionRecord]) -> Result<Array1<f64>> {
        let start = Instant::now();
        let predictions = self.pipeline.predict(records)?;
        info!(
            rows = records.len(),
            elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Predicted batch"
        );
        Ok(predictions)
    }

    /// Predict a dataset and join the values back to their records
    pub fn predict(&self, dataset: &Dataset) -> Result<PredictionTable> {
        let aligned = self.align(dataset)?;
        let start = Instant::now();
        let rows = self.pipeline.derive(&aligned)?;
        let predictions = self.pipeline.predict_rows(&rows)?;
        info!(
            rows = rows.len(),
            elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Predicted dataset"
        );
        PredictionTable::new(aligned, &rows, predictions.to_vec())
    }

    /// Read a CSV file and predict every row
    pub fn predict_file(
        &self,
        path: impl AsRef<Path>,
        loader: &DataLoader,
    ) -> Result<PredictionTable> {
        let dataset = loader.load_for_inference(path, self.covariate_names())?;
        self.predict(&dataset)
    }

    /// Records with covariates reordered to the pipeline's layout
    fn align(&self, dataset: &Dataset) -> Result<Vec<TransactionRecord>> {
        let expected = self.covariate_names();
        if dataset.covariate_names.as_slice() == expected {
            return Ok(dataset.records.clone());
        }

        let mut positions = Vec::with_capacity(expected.len());
        let mut missing = Vec::new();
        for name in expected {
            match dataset.covariate_names.iter().position(|c| c == name) {
                Some(pos) => positions.push(pos),
                None => missing.push(name.clone()),
            }
        }
        if !missing.is_empty() {
            return Err(SalesError::DataSchema { columns: missing });
        }

        dataset
            .records
            .iter()
            .enumerate()
            .map(|(i, record)| {
                let covariates = positions
                    .iter()
                    .map(|&pos| {
                        record.covariates.get(pos).copied().ok_or_else(|| {
                            SalesError::MalformedInput(format!(
                                "record {}: expected {} covariates, got {}",
                                i + 1,
                                dataset.covariate_names.len(),
                                record.covariates.len()
                            ))
                        })
                    })
                    .collect::<Result<Vec<f64>>>()?;
                Ok(TransactionRecord {
                    covariates,
                    ..record.clone()
                })
            })
            .collect()
    }
}
