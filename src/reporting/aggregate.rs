//! Group totals, KPIs and city sales tiers

use super::table::{PredictedRecord, PredictionTable};
use crate::error::{Result, SalesError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Dimension to aggregate predictions over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupBy {
    City,
    Category,
    Month,
    PaymentMethod,
    Product,
}

impl GroupBy {
    pub fn name(&self) -> &'static str {
        match self {
            GroupBy::City => "city",
            GroupBy::Category => "category",
            GroupBy::Month => "month",
            GroupBy::PaymentMethod => "payment_method",
            GroupBy::Product => "product",
        }
    }

    fn key(&self, row: &PredictedRecord) -> Option<GroupKey> {
        match self {
            GroupBy::City => row.record.city.clone().map(GroupKey::Text),
            GroupBy::Category => row.record.category.clone().map(GroupKey::Text),
            GroupBy::PaymentMethod => row.record.payment_method.clone().map(GroupKey::Text),
            GroupBy::Month => Some(GroupKey::Number(row.calendar.month as i64)),
            GroupBy::Product => Some(GroupKey::Number(row.record.product_id)),
        }
    }
}

impl FromStr for GroupBy {
    type Err = SalesError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "city" => Ok(GroupBy::City),
            "category" => Ok(GroupBy::Category),
            "month" => Ok(GroupBy::Month),
            "payment_method" | "payment" => Ok(GroupBy::PaymentMethod),
            "product" | "product_id" => Ok(GroupBy::Product),
            other => Err(SalesError::Config(format!("unknown grouping '{}'", other))),
        }
    }
}

/// Value of a grouping dimension
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum GroupKey {
    Text(String),
    Number(i64),
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupKey::Text(s) => write!(f, "{}", s),
            GroupKey::Number(n) => write!(f, "{}", n),
        }
    }
}

/// Actual and predicted sums for one group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupTotal {
    pub key: GroupKey,
    /// Sum of the recorded amounts; rows without one contribute nothing
    pub actual: f64,
    pub predicted: f64,
    pub count: usize,
}

/// Headline figures over a table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Kpis {
    pub total_actual: f64,
    pub total_predicted: f64,
    /// Mean recorded amount, `None` when no row carries one
    pub avg_ticket: Option<f64>,
    pub n_rows: usize,
}

/// Sales tier of a city relative to the others
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CityTier {
    High,
    Medium,
    Low,
}

impl fmt::Display for CityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CityTier::High => "high",
            CityTier::Medium => "medium",
            CityTier::Low => "low",
        };
        f.write_str(label)
    }
}

/// A city's actual total and its tier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityStanding {
    pub city: String,
    pub actual: f64,
    pub tier: CityTier,
}

/// Quantile with linear interpolation between closest ranks
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

impl PredictionTable {
    /// Totals per group. Rows lacking the dimension are left out.
    ///
    /// Groups come back in ascending key order, except products which are
    /// ranked by predicted total, highest first.
    pub fn group_totals(&self, by: GroupBy) -> Vec<GroupTotal> {
        let mut groups: BTreeMap<GroupKey, GroupTotal> = BTreeMap::new();
        for row in self.iter() {
            let Some(key) = by.key(row) else {
                continue;
            };
            let entry = groups.entry(key.clone()).or_insert(GroupTotal {
                key,
                actual: 0.0,
                predicted: 0.0,
                count: 0,
            });
            entry.actual += row.record.amount.unwrap_or(0.0);
            entry.predicted += row.prediction;
            entry.count += 1;
        }

        let mut totals: Vec<GroupTotal> = groups.into_values().collect();
        if by == GroupBy::Product {
            // Stable sort keeps ascending product id among equal totals
            totals.sort_by(|a, b| b.predicted.total_cmp(&a.predicted));
        }
        totals
    }

    pub fn kpis(&self) -> Kpis {
        let amounts: Vec<f64> = self.iter().filter_map(|r| r.record.amount).collect();
        let total_actual: f64 = amounts.iter().sum();
        Kpis {
            total_actual,
            total_predicted: self.iter().map(|r| r.prediction).sum(),
            avg_ticket: if amounts.is_empty() {
                None
            } else {
                Some(total_actual / amounts.len() as f64)
            },
            n_rows: self.len(),
        }
    }

    /// Cities by actual sales: at or above the 80th percentile of city
    /// totals is High, at or above the 40th is Medium, the rest Low.
    pub fn city_tiers(&self) -> Vec<CityStanding> {
        let totals = self.group_totals(GroupBy::City);
        let actuals: Vec<f64> = totals.iter().map(|t| t.actual).collect();
        let (Some(p80), Some(p40)) = (quantile(&actuals, 0.8), quantile(&actuals, 0.4)) else {
            return Vec::new();
        };

        totals
            .into_iter()
            .map(|t| {
                let tier = if t.actual >= p80 {
                    CityTier::High
                } else if t.actual >= p40 {
                    CityTier::Medium
                } else {
                    CityTier::Low
                };
                CityStanding {
                    city: t.key.to_string(),
                    actual: t.actual,
                    tier,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::derive_all;
    use crate::records::TransactionRecord;

    fn table() -> PredictionTable {
        let rows = [
            ("2024-01-10", "Cordoba", "A", 1, Some(100.0), 90.0),
            ("2024-01-11", "Cordoba", "B", 2, Some(50.0), 60.0),
            ("2024-02-01", "Rio Cuarto", "A", 2, None, 40.0),
            ("2024-02-02", "Villa Maria", "B", 3, Some(10.0), 20.0),
            ("2024-03-03", "Alta Gracia", "A", 1, Some(30.0), 25.0),
        ];
        let mut records = Vec::new();
        let mut predictions = Vec::new();
        for (ts, city, cat, pid, amount, pred) in rows {
            let mut r = TransactionRecord::new(ts, city, cat, "cash", pid);
            r.amount = amount;
            records.push(r);
            predictions.push(pred);
        }
        let derived = derive_all(&records).unwrap();
        PredictionTable::new(records, &derived, predictions).unwrap()
    }

    #[test]
    fn test_group_by_city_sorted() {
        let totals = table().group_totals(GroupBy::City);
        let keys: Vec<String> = totals.iter().map(|t| t.key.to_string()).collect();
        assert_eq!(keys, vec!["Alta Gracia", "Cordoba", "Rio Cuarto", "Villa Maria"]);
        assert_eq!(totals[1].predicted, 150.0);
        assert_eq!(totals[1].actual, 150.0);
        assert_eq!(totals[1].count, 2);
        assert_eq!(totals[2].actual, 0.0);
    }

    #[test]
    fn test_group_by_month_numeric_order() {
        let totals = table().group_totals(GroupBy::Month);
        let keys: Vec<GroupKey> = totals.iter().map(|t| t.key.clone()).collect();
        assert_eq!(
            keys,
            vec![GroupKey::Number(1), GroupKey::Number(2), GroupKey::Number(3)]
        );
    }

    #[test]
    fn test_product_ranking() {
        let totals = table().group_totals(GroupBy::Product);
        let keys: Vec<GroupKey> = totals.iter().map(|t| t.key.clone()).collect();
        // product 1: 115, product 2: 100, product 3: 20
        assert_eq!(
            keys,
            vec![GroupKey::Number(1), GroupKey::Number(2), GroupKey::Number(3)]
        );
        assert_eq!(totals[0].predicted, 115.0);
    }

    #[test]
    fn test_kpis() {
        let kpis = table().kpis();
        assert_eq!(kpis.total_actual, 190.0);
        assert_eq!(kpis.total_predicted, 235.0);
        assert_eq!(kpis.avg_ticket, Some(47.5));
        assert_eq!(kpis.n_rows, 5);
        assert_eq!(PredictionTable::default().kpis().avg_ticket, None);
    }

    #[test]
    fn test_quantile_interpolates() {
        assert_eq!(quantile(&[], 0.5), None);
        assert_eq!(quantile(&[3.0, 1.0, 2.0], 0.5), Some(2.0));
        let q = quantile(&[0.0, 10.0, 30.0, 150.0], 0.8).unwrap();
        assert!((q - 78.0).abs() < 1e-9);
    }

    #[test]
    fn test_city_tiers() {
        // Actual totals: Alta Gracia 30, Cordoba 150, Rio Cuarto 0, Villa Maria 10
        // p80 = 78, p40 = 14
        let tiers = table().city_tiers();
        let by_city: BTreeMap<String, CityTier> =
            tiers.into_iter().map(|s| (s.city, s.tier)).collect();
        assert_eq!(by_city["Cordoba"], CityTier::High);
        assert_eq!(by_city["Alta Gracia"], CityTier::Medium);
        assert_eq!(by_city["Villa Maria"], CityTier::Low);
        assert_eq!(by_city["Rio Cuarto"], CityTier::Low);
    }

    #[test]
    fn test_parse_group_by() {
        assert_eq!("City".parse::<GroupBy>().unwrap(), GroupBy::City);
        assert_eq!("product_id".parse::<GroupBy>().unwrap(), GroupBy::Product);
        assert!("region".parse::<GroupBy>().is_err());
    }
}
