//! Inference engine module
//!
//! Loads a trained pipeline artifact and produces one prediction per input
//! record, in input order, joined back to the records for reporting.

mod engine;

pub use engine::InferenceEngine;
