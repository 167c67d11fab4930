//! The shared feature recipe.
//!
//! Training and inference both go through [`derive_features`]; any change to
//! the columns it emits or their order must bump [`FEATURE_RECIPE_VERSION`],
//! which is stored in every saved pipeline and checked on load.

use super::calendar::CalendarFeatures;
use crate::error::{Result, SalesError};
use crate::records::TransactionRecord;
use serde::{Deserialize, Serialize};

/// Version of the derivation recipe
pub const FEATURE_RECIPE_VERSION: u32 = 1;

pub const PRODUCT_FEATURE: &str = "product_id";
pub const CALENDAR_FEATURES: [&str; 4] = ["year", "month", "day", "day_of_week"];

/// The nominal fields that get one-hot encoded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NominalField {
    City,
    Category,
    PaymentMethod,
}

impl NominalField {
    pub const ALL: [NominalField; 3] = [
        NominalField::City,
        NominalField::Category,
        NominalField::PaymentMethod,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            NominalField::City => "city",
            NominalField::Category => "category",
            NominalField::PaymentMethod => "payment_method",
        }
    }

    fn index(&self) -> usize {
        match self {
            NominalField::City => 0,
            NominalField::Category => 1,
            NominalField::PaymentMethod => 2,
        }
    }
}

/// Model-facing view of one record.
///
/// `numeric` holds the passthrough features in the order given by
/// [`numeric_feature_names`]: product id, covariates, then calendar parts.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    nominal: [Option<String>; 3],
    pub numeric: Vec<f64>,
    pub calendar: CalendarFeatures,
}

impl FeatureRow {
    pub fn nominal(&self, field: NominalField) -> Option<&str> {
        self.nominal[field.index()].as_deref()
    }
}

/// Derive the feature row for one record. The record itself is not modified.
pub fn derive_features(record: &TransactionRecord) -> Result<FeatureRow> {
    let raw = record
        .timestamp
        .as_deref()
        .ok_or_else(|| SalesError::MalformedInput("timestamp is missing".to_string()))?;
    let calendar = CalendarFeatures::parse(raw)?;

    let mut numeric = Vec::with_capacity(1 + record.covariates.len() + CALENDAR_FEATURES.len());
    numeric.push(record.product_id as f64);
    numeric.extend_from_slice(&record.covariates);
    numeric.extend_from_slice(&calendar.as_array());

    Ok(FeatureRow {
        nominal: [
            record.city.clone(),
            record.category.clone(),
            record.payment_method.clone(),
        ],
        numeric,
        calendar,
    })
}

/// Derive every record, failing on the first malformed one
pub fn derive_all(records: &[TransactionRecord]) -> Result<Vec<FeatureRow>> {
    records
        .iter()
        .enumerate()
        .map(|(i, record)| {
            derive_features(record).map_err(|e| match e {
                SalesError::MalformedInput(msg) => {
                    SalesError::MalformedInput(format!("record {}: {}", i + 1, msg))
                }
                other => other,
            })
        })
        .collect()
}

/// Names of the numeric passthrough features for a given covariate list
pub fn numeric_feature_names(covariate_names: &[String]) -> Vec<String> {
    std::iter::once(PRODUCT_FEATURE.to_string())
        .chain(covariate_names.iter().cloned())
        .chain(CALENDAR_FEATURES.iter().map(|s| s.to_string()))
        .collect()
}
