//! Pipeline artifact persistence
//!
//! An artifact is a single bincode file holding the fitted pipeline together
//! with descriptive metadata. Files are written to a temporary sibling and
//! renamed into place, so readers never observe a partial artifact.

use crate::error::{Result, SalesError};
use crate::features::FEATURE_RECIPE_VERSION;
use crate::pipeline::SalesPipeline;
use crate::training::{RegressionMetrics, TrainingOutcome, TrainingSummary, XGBoostConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{debug, info};

/// Descriptive metadata stored next to the pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    /// Training timestamp (RFC 3339)
    pub trained_at: String,
    /// Version of the crate that wrote the artifact
    pub crate_version: String,
    pub recipe_version: u32,
    pub covariate_names: Vec<String>,
    pub feature_names: Vec<String>,
    pub hyperparameters: XGBoostConfig,
    pub metrics: Option<RegressionMetrics>,
    pub summary: Option<TrainingSummary>,
}

impl ArtifactMetadata {
    /// Metadata describing a pipeline, stamped with the current time
    pub fn for_pipeline(pipeline: &SalesPipeline) -> Self {
        Self {
            trained_at: chrono::Utc::now().to_rfc3339(),
            crate_version: env!("CARGO_PKG_VERSION").to_string(),
            recipe_version: pipeline.recipe_version(),
            covariate_names: pipeline.covariate_names().to_vec(),
            feature_names: pipeline.feature_names(),
            hyperparameters: pipeline.model().config().clone(),
            metrics: None,
            summary: None,
        }
    }

    /// Attach the evaluation of a training run
    pub fn with_outcome(mut self, metrics: RegressionMetrics, summary: TrainingSummary) -> Self {
        self.metrics = Some(metrics);
        self.summary = Some(summary);
        self
    }
}

/// On-disk layout of an artifact
#[derive(Debug, Serialize, Deserialize)]
struct ArtifactEnvelope {
    magic: [u8; 4],
    format_version: u32,
    metadata: ArtifactMetadata,
    pipeline_data: Vec<u8>,
    checksum: u64,
}

impl ArtifactEnvelope {
    const MAGIC: [u8; 4] = [b'S', b'F', b'P', b'L'];
    const VERSION: u32 = 1;

    fn new(metadata: ArtifactMetadata, pipeline_data: Vec<u8>) -> Self {
        let checksum = Self::compute_checksum(&pipeline_data);
        Self {
            magic: Self::MAGIC,
            format_version: Self::VERSION,
            metadata,
            pipeline_data,
            checksum,
        }
    }

    /// FNV-1a over the pipeline bytes
    fn compute_checksum(data: &[u8]) -> u64 {
        const FNV_OFFSET: u64 = 14695981039346656037;
        const FNV_PRIME: u64 = 1099511628211;

        data.iter().fold(FNV_OFFSET, |hash, byte| {
            (hash ^ *byte as u64).wrapping_mul(FNV_PRIME)
        })
    }

    fn verify_checksum(&self) -> bool {
        Self::compute_checksum(&self.pipeline_data) == self.checksum
    }
}

/// A pipeline read back from disk together with its metadata
#[derive(Debug, Clone)]
pub struct LoadedArtifact {
    pub metadata: ArtifactMetadata,
    pub pipeline: SalesPipeline,
}

/// Persist a pipeline, replacing any previous artifact at `path` atomically
pub fn save_pipeline(
    path: impl AsRef<Path>,
    pipeline: &SalesPipeline,
    metadata: ArtifactMetadata,
) -> Result<()> {
    let path = path.as_ref();
    let pipeline_data = bincode::serialize(pipeline)
        .map_err(|e| SalesError::Serialization(format!("Failed to serialize pipeline: {}", e)))?;
    let envelope = ArtifactEnvelope::new(metadata, pipeline_data);
    let bytes = bincode::serialize(&envelope)
        .map_err(|e| SalesError::Serialization(format!("Failed to serialize artifact: {}", e)))?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let tmp = tempfile::NamedTempFile::new_in(dir)?;
    {
        let mut writer = BufWriter::new(tmp.as_file());
        writer.write_all(&bytes)?;
        writer.flush()?;
    }
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| SalesError::Io(e.error))?;

    info!(path = %path.display(), bytes = bytes.len(), "Saved pipeline artifact");
    Ok(())
}

/// Persist the result of a training run with its metrics
pub fn save_outcome(path: impl AsRef<Path>, outcome: &TrainingOutcome) -> Result<()> {
    let metadata = ArtifactMetadata::for_pipeline(&outcome.pipeline)
        .with_outcome(outcome.metrics.clone(), outcome.summary.clone());
    save_pipeline(path, &outcome.pipeline, metadata)
}

/// Read an artifact, rejecting anything this build cannot serve
pub fn load_artifact(path: impl AsRef<Path>) -> Result<LoadedArtifact> {
    let path = path.as_ref();
    let bytes = fs::read(path)
        .map_err(|e| SalesError::ArtifactLoad(format!("{}: {}", path.display(), e)))?;

    if bytes.len() < ArtifactEnvelope::MAGIC.len()
        || bytes[..ArtifactEnvelope::MAGIC.len()] != ArtifactEnvelope::MAGIC
    {
        return Err(SalesError::ArtifactLoad(format!(
            "{}: not a pipeline artifact",
            path.display()
        )));
    }

    let envelope: ArtifactEnvelope = bincode::deserialize(&bytes)
        .map_err(|e| SalesError::ArtifactLoad(format!("{}: {}", path.display(), e)))?;

    if envelope.format_version != ArtifactEnvelope::VERSION {
        return Err(SalesError::ArtifactLoad(format!(
            "unsupported artifact format {} (expected {})",
            envelope.format_version,
            ArtifactEnvelope::VERSION
        )));
    }
    if !envelope.verify_checksum() {
        return Err(SalesError::ArtifactLoad(
            "checksum mismatch, artifact is corrupted".to_string(),
        ));
    }

    let pipeline: SalesPipeline = bincode::deserialize(&envelope.pipeline_data)
        .map_err(|e| SalesError::ArtifactLoad(format!("invalid pipeline data: {}", e)))?;

    if pipeline.recipe_version() != FEATURE_RECIPE_VERSION {
        return Err(SalesError::ArtifactLoad(format!(
            "artifact uses feature recipe {}, this build derives recipe {}",
            pipeline.recipe_version(),
            FEATURE_RECIPE_VERSION
        )));
    }

    debug!(path = %path.display(), trained_at = %envelope.metadata.trained_at, "Loaded artifact");
    Ok(LoadedArtifact {
        metadata: envelope.metadata,
        pipeline,
    })
}

/// Read only the fitted pipeline
pub fn load_pipeline(path: impl AsRef<Path>) -> Result<SalesPipeline> {
    load_artifact(path).map(|a| a.pipeline)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{Dataset, TransactionRecord};
    use crate::training::{TrainEngine, TrainingConfig};

    fn fitted_pipeline() -> SalesPipeline {
        let records = (0..40)
            .map(|i| {
                TransactionRecord::new(
                    format!("2024-02-{:02}", i % 28 + 1),
                    if i % 2 == 0 { "Cordoba" } else { "Rio Cuarto" },
                    "Bebidas",
                    "efectivo",
                    (i % 5) as i64,
                )
                .with_amount(20.0 + 10.0 * (i % 4) as f64)
            })
            .collect();
        TrainEngine::new(TrainingConfig::default().with_n_estimators(5))
            .fit(&Dataset::new(Vec::new(), records))
            .unwrap()
            .pipeline
    }

    fn write_envelope(path: &Path, envelope: &ArtifactEnvelope) {
        fs::write(path, bincode::serialize(envelope).unwrap()).unwrap();
    }

    #[test]
    fn test_hand_written_envelope_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.bin");
        let pipeline = fitted_pipeline();
        let envelope = ArtifactEnvelope::new(
            ArtifactMetadata::for_pipeline(&pipeline),
            bincode::serialize(&pipeline).unwrap(),
        );
        write_envelope(&path, &envelope);
        assert_eq!(load_pipeline(&path).unwrap(), pipeline);
    }

    #[test]
    fn test_unknown_format_version_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.bin");
        let pipeline = fitted_pipeline();
        let mut envelope = ArtifactEnvelope::new(
            ArtifactMetadata::for_pipeline(&pipeline),
            bincode::serialize(&pipeline).unwrap(),
        );
        envelope.format_version = ArtifactEnvelope::VERSION + 1;
        write_envelope(&path, &envelope);

        match load_pipeline(&path) {
            Err(SalesError::ArtifactLoad(msg)) => assert!(msg.contains("format 2")),
            other => panic!("expected artifact load error, got {other:?}"),
        }
    }

    #[test]
    fn test_other_feature_recipe_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.bin");
        let pipeline = fitted_pipeline();

        // The recipe version is the pipeline's first field: a little-endian u32
        let mut pipeline_data = bincode::serialize(&pipeline).unwrap();
        pipeline_data[..4].copy_from_slice(&(FEATURE_RECIPE_VERSION + 1).to_le_bytes());
        let envelope =
            ArtifactEnvelope::new(ArtifactMetadata::for_pipeline(&pipeline), pipeline_data);
        write_envelope(&path, &envelope);

        match load_pipeline(&path) {
            Err(SalesError::ArtifactLoad(msg)) => assert!(msg.contains("feature recipe")),
            other => panic!("expected artifact load error, got {other:?}"),
        }
    }

    #[test]
    fn test_checksum_detects_change() {
        let a = ArtifactEnvelope::compute_checksum(b"pipeline");
        let b = ArtifactEnvelope::compute_checksum(b"pipelinf");
        assert_ne!(a, b);
        assert_eq!(a, ArtifactEnvelope::compute_checksum(b"pipeline"));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_pipeline(dir.path().join("absent.bin")).unwrap_err();
        assert!(matches!(err, SalesError::ArtifactLoad(_)));
    }

    #[test]
    fn test_foreign_file_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.bin");
        fs::write(&path, b"definitely not a model").unwrap();
        let err = load_pipeline(&path).unwrap_err();
        assert!(matches!(err, SalesError::ArtifactLoad(_)));
    }

    #[test]
    fn test_truncated_file_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.bin");
        let mut bytes = ArtifactEnvelope::MAGIC.to_vec();
        bytes.extend_from_slice(&[1, 0, 0]);
        fs::write(&path, bytes).unwrap();
        assert!(matches!(load_pipeline(&path), Err(SalesError::ArtifactLoad(_))));
    }
}
