//! Reporting over predictions
//!
//! Joins predictions back to their records and provides the aggregations the
//! sales dashboard is built on: equality filters, group totals, KPIs and
//! city tiers.

mod aggregate;
mod filter;
mod table;

pub use aggregate::{quantile, CityStanding, CityTier, GroupBy, GroupKey, GroupTotal, Kpis};
pub use filter::RecordFilter;
pub use table::{PredictedRecord, PredictionTable};
