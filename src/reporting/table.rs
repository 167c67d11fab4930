//! Predictions joined back to the records they were made for

use super::filter::RecordFilter;
use crate::error::{Result, SalesError};
use crate::features::{CalendarFeatures, FeatureRow};
use crate::records::TransactionRecord;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// A record, its calendar attributes and the model's prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictedRecord {
    pub record: TransactionRecord,
    pub calendar: CalendarFeatures,
    pub prediction: f64,
}

/// Prediction output in input order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictionTable {
    rows: Vec<PredictedRecord>,
}

impl PredictionTable {
    /// Join records with their derived feature rows and predictions.
    ///
    /// The three inputs are parallel; the calendar columns come from `rows`.
    pub fn new(
        records: Vec<TransactionRecord>,
        rows: &[FeatureRow],
        predictions: Vec<f64>,
    ) -> Result<Self> {
        if rows.len() != records.len() || predictions.len() != records.len() {
            return Err(SalesError::ShapeError {
                expected: format!("{} feature rows and predictions", records.len()),
                actual: format!("{} rows, {} predictions", rows.len(), predictions.len()),
            });
        }

        let rows = records
            .into_iter()
            .zip(rows)
            .zip(predictions)
            .map(|((record, row), prediction)| PredictedRecord {
                record,
                calendar: row.calendar,
                prediction,
            })
            .collect();

        Ok(Self { rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[PredictedRecord] {
        &self.rows
    }

    pub fn iter(&self) -> impl Iterator<Item = &PredictedRecord> {
        self.rows.iter()
    }

    /// Prediction column in row order
    pub fn predictions(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.prediction).collect()
    }

    /// Rows matching every set criterion, order preserved
    pub fn filter(&self, filter: &RecordFilter) -> PredictionTable {
        PredictionTable {
            rows: self
                .rows
                .iter()
                .filter(|row| filter.matches(row))
                .cloned()
                .collect(),
        }
    }

    /// Tabular view with the derived calendar columns and the prediction
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let city: Vec<Option<String>> = self.rows.iter().map(|r| r.record.city.clone()).collect();
        let category: Vec<Option<String>> =
            self.rows.iter().map(|r| r.record.category.clone()).collect();
        let payment: Vec<Option<String>> = self
            .rows
            .iter()
            .map(|r| r.record.payment_method.clone())
            .collect();
        let product: Vec<i64> = self.rows.iter().map(|r| r.record.product_id).collect();
        let amount: Vec<Option<f64>> = self.rows.iter().map(|r| r.record.amount).collect();
        let year: Vec<i32> = self.rows.iter().map(|r| r.calendar.year).collect();
        let month: Vec<u32> = self.rows.iter().map(|r| r.calendar.month).collect();
        let day: Vec<u32> = self.rows.iter().map(|r| r.calendar.day).collect();
        let dow: Vec<u32> = self.rows.iter().map(|r| r.calendar.day_of_week).collect();
        let prediction = self.predictions();

        let df = df!(
            "city" => city,
            "category" => category,
            "payment_method" => payment,
            "product_id" => product,
            "amount" => amount,
            "year" => year,
            "month" => month,
            "day" => day,
            "day_of_week" => dow,
            "prediction" => prediction
        )?;
        Ok(df)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::derive_all;

    fn table() -> PredictionTable {
        let records = vec![
            TransactionRecord::new("2024-03-15", "Cordoba", "A", "cash", 1).with_amount(10.0),
            TransactionRecord::new("2024-04-01", "Rio Cuarto", "B", "card", 2),
        ];
        let rows = derive_all(&records).unwrap();
        PredictionTable::new(records, &rows, vec![12.0, 30.0]).unwrap()
    }

    #[test]
    fn test_join_keeps_order_and_calendar() {
        let t = table();
        assert_eq!(t.len(), 2);
        assert_eq!(t.rows()[0].calendar.day_of_week, 4);
        assert_eq!(t.rows()[1].calendar.month, 4);
        assert_eq!(t.predictions(), vec![12.0, 30.0]);
    }

    #[test]
    fn test_length_mismatch() {
        let records = vec![TransactionRecord::new("2024-03-15", "Cordoba", "A", "cash", 1)];
        let rows = derive_all(&records).unwrap();
        let err = PredictionTable::new(records.clone(), &rows, vec![]).unwrap_err();
        assert!(matches!(err, SalesError::ShapeError { .. }));
        let err = PredictionTable::new(records, &[], vec![1.0]).unwrap_err();
        assert!(matches!(err, SalesError::ShapeError { .. }));
    }

    #[test]
    fn test_to_dataframe() {
        let df = table().to_dataframe().unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(df.width(), 10);
        let pred = df.column("prediction").unwrap().as_materialized_series().f64().unwrap();
        assert_eq!(pred.get(1), Some(30.0));
        assert_eq!(df.column("amount").unwrap().null_count(), 1);
    }
}
