// src/io/demand.rs

use crate::error::{Result, SimError};
use crate::model::store::StoreId;
use chrono::{Duration, NaiveDate};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use std::io;
use std::path::Path;

/// One row of a daily sales history table (`Store,Date,Sales`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesRecord {
    #[serde(rename = "Store")]
    pub store: StoreId,
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "Sales")]
    pub sales: u32,
}

/// Generates a daily sales history based on a Normal (Bell Curve) distribution.
///
/// # Arguments
/// * `stores` - Stores to generate rows for.
/// * `start` - First day of the history.
/// * `days` - Number of days per store.
/// * `mean` - The average daily sales (e.g., 100.0).
/// * `std_dev` - The standard deviation (volatility) (e.g., 20.0).
/// * `seed` - Seed for the generator; same seed, same table.
pub fn generate_sales_history(
    stores: &[StoreId],
    start: NaiveDate,
    days: u32,
    mean: f64,
    std_dev: f64,
    seed: u64,
) -> Result<Vec<SalesRecord>> {
    // Normal::new accepts a negative std_dev and mirrors the distribution.
    if std_dev.is_nan() || std_dev < 0.0 {
        return Err(SimError::Config(format!(
            "sales std_dev must be a non-negative number, got {std_dev}"
        )));
    }
    let normal = Normal::new(mean, std_dev)
        .map_err(|e| SimError::Config(format!("invalid sales distribution: {e}")))?;
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let mut history = Vec::with_capacity(stores.len() * days as usize);
    for &store in stores {
        for offset in 0..days {
            let val: f64 = normal.sample(&mut rng);
            // Round to nearest integer and clamp negative draws to 0.
            let sales = val.round().max(0.0) as u32;
            history.push(SalesRecord {
                store,
                date: start + Duration::days(i64::from(offset)),
                sales,
            });
        }
    }
    Ok(history)
}

pub fn read_sales_history<R: io::Read>(reader: R) -> Result<Vec<SalesRecord>> {
    let mut rdr = csv::Reader::from_reader(reader);
    let mut history = Vec::new();
    for row in rdr.deserialize() {
        history.push(row?);
    }
    Ok(history)
}

pub fn load_sales_history<P: AsRef<Path>>(path: P) -> Result<Vec<SalesRecord>> {
    let file = std::fs::File::open(path)?;
    read_sales_history(io::BufReader::new(file))
}

pub fn write_sales_history<W: io::Write>(writer: W, history: &[SalesRecord]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for record in history {
        wtr.serialize(record)?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_history_is_seeded_and_non_negative() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let stores = [StoreId(1), StoreId(2)];
        let a = generate_sales_history(&stores, start, 30, 5.0, 10.0, 7).unwrap();
        let b = generate_sales_history(&stores, start, 30, 5.0, 10.0, 7).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 60);
        assert_eq!(a[29].date, start + Duration::days(29));
        assert_eq!(a[30].store, StoreId(2));
    }

    #[test]
    fn negative_std_dev_is_a_config_error() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let result = generate_sales_history(&[StoreId(1)], start, 3, 5.0, -1.0, 1);
        assert!(matches!(result, Err(SimError::Config(_))));
        let result = generate_sales_history(&[StoreId(1)], start, 3, 5.0, f64::NAN, 1);
        assert!(matches!(result, Err(SimError::Config(_))));
        // Zero volatility is a flat history.
        let flat = generate_sales_history(&[StoreId(1)], start, 3, 5.0, 0.0, 1).unwrap();
        assert!(flat.iter().all(|r| r.sales == 5));
    }

    #[test]
    fn history_csv_roundtrip_keeps_header_names() {
        let rows = vec![SalesRecord {
            store: StoreId(3),
            date: NaiveDate::from_ymd_opt(2024, 2, 29).unwrap(),
            sales: 42,
        }];
        let mut buf = Vec::new();
        write_sales_history(&mut buf, &rows).unwrap();
        let text = String::from_utf8(buf.clone()).unwrap();
        assert!(text.starts_with("Store,Date,Sales\n3,2024-02-29,42"));
        assert_eq!(read_sales_history(buf.as_slice()).unwrap(), rows);
    }
}
