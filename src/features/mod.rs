//! Feature derivation shared by training and inference

pub mod calendar;
pub mod deriver;

pub use calendar::{parse_date, CalendarFeatures};
pub use deriver::{
    derive_all, derive_features, numeric_feature_names, FeatureRow, NominalField,
    CALENDAR_FEATURES, FEATURE_RECIPE_VERSION, PRODUCT_FEATURE,
};
