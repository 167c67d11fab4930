//! Shared synthetic sales data for the integration tests

#![allow(dead_code)]

use chrono::{Duration, NaiveDate};
use polars::prelude::*;
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use sales_forecast::records::{Dataset, TransactionRecord};
use std::path::Path;

pub const CITIES: [&str; 3] = ["Cordoba", "Rio Cuarto", "Villa Maria"];
pub const CATEGORIES: [&str; 4] = ["Almacen", "Bebidas", "Limpieza", "Perfumeria"];
pub const PAYMENTS: [&str; 2] = ["efectivo", "tarjeta"];

/// Transactions whose amount depends on category, city and quantity plus
/// uniform noise, clamped to [10, 500].
pub fn synthetic_records(n: usize, seed: u64) -> Vec<TransactionRecord> {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();

    (0..n)
        .map(|_| {
            let city = rng.gen_range(0..CITIES.len());
            let category = rng.gen_range(0..CATEGORIES.len());
            let payment = rng.gen_range(0..PAYMENTS.len());
            let product = rng.gen_range(1..=20_i64);
            let quantity = rng.gen_range(1..=5) as f64;
            let date = start + Duration::days(rng.gen_range(0..366));
            let created = date - Duration::days(rng.gen_range(0..30));

            let base = 60.0 + 70.0 * category as f64 + 25.0 * city as f64;
            let noise = rng.gen_range(-20.0..20.0);
            let amount = (base + 12.0 * quantity + noise).clamp(10.0, 500.0);

            TransactionRecord::new(
                format!("{} {:02}:{:02}:00", date, rng.gen_range(8..21), rng.gen_range(0..60)),
                CITIES[city],
                CATEGORIES[category],
                PAYMENTS[payment],
                product,
            )
            .with_created_at(created.to_string())
            .with_covariates(vec![quantity])
            .with_amount(amount)
        })
        .collect()
}

pub fn synthetic_dataset(n: usize, seed: u64) -> Dataset {
    Dataset::new(vec!["cantidad".to_string()], synthetic_records(n, seed))
}

/// Records as a table with the default column names
pub fn records_frame(records: &[TransactionRecord], with_amount: bool) -> DataFrame {
    let text = |f: fn(&TransactionRecord) -> Option<String>| -> Vec<Option<String>> {
        records.iter().map(f).collect()
    };
    let mut df = df!(
        "fecha" => text(|r| r.timestamp.clone()),
        "fecha_alta" => text(|r| r.created_at.clone()),
        "ciudad" => text(|r| r.city.clone()),
        "categoria" => text(|r| r.category.clone()),
        "medio_pago" => text(|r| r.payment_method.clone()),
        "id_producto" => records.iter().map(|r| r.product_id).collect::<Vec<i64>>(),
        "cantidad" => records.iter().map(|r| r.covariates.first().copied().unwrap_or(0.0)).collect::<Vec<f64>>()
    )
    .unwrap();

    if with_amount {
        let amounts: Vec<Option<f64>> = records.iter().map(|r| r.amount).collect();
        df.with_column(Series::new("importe".into(), amounts)).unwrap();
    }
    df
}

pub fn write_csv(path: &Path, df: &mut DataFrame) {
    let mut file = std::fs::File::create(path).unwrap();
    CsvWriter::new(&mut file).finish(df).unwrap();
}

/// Write synthetic transactions to `path` and return them
pub fn write_synthetic_csv(path: &Path, n: usize, seed: u64) -> Vec<TransactionRecord> {
    let records = synthetic_records(n, seed);
    let mut df = records_frame(&records, true);
    write_csv(path, &mut df);
    records
}
