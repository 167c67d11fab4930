//! Equality filters over the prediction table

use super::table::PredictedRecord;
use serde::{Deserialize, Serialize};

/// Per-dimension equality criteria. `None` selects every value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordFilter {
    pub city: Option<String>,
    pub category: Option<String>,
    pub month: Option<u32>,
    pub payment_method: Option<String>,
}

impl RecordFilter {
    /// Filter accepting every row
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_month(mut self, month: u32) -> Self {
        self.month = Some(month);
        self
    }

    pub fn with_payment_method(mut self, payment_method: impl Into<String>) -> Self {
        self.payment_method = Some(payment_method.into());
        self
    }

    pub fn is_all(&self) -> bool {
        self == &Self::default()
    }

    pub fn matches(&self, row: &PredictedRecord) -> bool {
        fn field_matches(wanted: &Option<String>, actual: &Option<String>) -> bool {
            match wanted {
                None => true,
                Some(w) => actual.as_deref() == Some(w.as_str()),
            }
        }

        field_matches(&self.city, &row.record.city)
            && field_matches(&self.category, &row.record.category)
            && field_matches(&self.payment_method, &row.record.payment_method)
            && self.month.map_or(true, |m| row.calendar.month == m)
    }
}
