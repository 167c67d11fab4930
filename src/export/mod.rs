//! Model export and serialization module
//!
//! Saves the fitted pipeline as a versioned binary artifact and reads it
//! back for inference.

mod artifact;

pub use artifact::{
    load_artifact, load_pipeline, save_outcome, save_pipeline, ArtifactMetadata, LoadedArtifact,
};
