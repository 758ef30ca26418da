// src/io/stock.rs

use crate::error::{Result, SimError};
use crate::model::store::{StockLedger, StoreId};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io;
use std::path::Path;

/// One row of the initial stock table (`Store,InitialStock`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockRow {
    #[serde(rename = "Store")]
    pub store: StoreId,
    #[serde(rename = "InitialStock")]
    pub initial_stock: u32,
}

/// Builds the starting ledger. Each store may appear once.
pub fn ledger_from_rows(rows: &[StockRow]) -> Result<StockLedger> {
    let mut levels = BTreeMap::new();
    for row in rows {
        if levels.insert(row.store, row.initial_stock).is_some() {
            return Err(SimError::DuplicateStore(row.store));
        }
    }
    Ok(StockLedger::from_levels(levels))
}

/// Reads the initial stock table. Negative or non-numeric stock fails to parse.
pub fn read_initial_stock<R: io::Read>(reader: R) -> Result<StockLedger> {
    let mut rdr = csv::Reader::from_reader(reader);
    let mut rows = Vec::new();
    for row in rdr.deserialize() {
        rows.push(row?);
    }
    ledger_from_rows(&rows)
}

pub fn load_initial_stock<P: AsRef<Path>>(path: P) -> Result<StockLedger> {
    let file = std::fs::File::open(path)?;
    read_initial_stock(io::BufReader::new(file))
}

/// Draws a uniform starting stock in `[low, high]` for every store.
pub fn generate_initial_stock(stores: &[StoreId], low: u32, high: u32, seed: u64) -> Result<Vec<StockRow>> {
    if low > high {
        return Err(SimError::Config(format!(
            "initial stock range is empty: {low} > {high}"
        )));
    }
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    Ok(stores
        .iter()
        .map(|&store| StockRow {
            store,
            initial_stock: rng.gen_range(low..=high),
        })
        .collect())
}

pub fn write_initial_stock<W: io::Write>(writer: W, rows: &[StockRow]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}
