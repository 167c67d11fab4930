//! Data preprocessing
//!
//! - [`OneHotEncoder`] over the nominal fields
//! - [`Preprocessor`] combining indicators with the numeric passthrough

mod encoder;
mod pipeline;

pub use encoder::OneHotEncoder;
pub use pipeline::Preprocessor;
