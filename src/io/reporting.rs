// src/io/reporting.rs

use crate::error::Result;
use crate::simulation::engine::SimulationRecord;
use std::io;
use std::path::Path;
use tracing::info;

/// Serializes the weekly records as CSV (`week_start,total_cost,fill_rate`).
pub fn write_simulation_results<W: io::Write>(writer: W, data: &[SimulationRecord]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for record in data {
        wtr.serialize(record)?;
    }
    // Flush the buffer to ensure all data is written
    wtr.flush()?;
    Ok(())
}

/// Writes the simulation history to a CSV file, replacing any previous run.
///
/// # Arguments
/// * `file_path` - The path to save the file (e.g., "results/run_1.csv").
/// * `data` - The weekly records from the simulation engine.
pub fn write_simulation_log<P: AsRef<Path>>(file_path: P, data: &[SimulationRecord]) -> Result<()> {
    let path = file_path.as_ref();
    let file = std::fs::File::create(path)?;
    write_simulation_results(io::BufWriter::new(file), data)?;

    info!(rows = data.len(), path = %path.display(), "simulation results written");
    Ok(())
}

pub fn read_simulation_results<R: io::Read>(reader: R) -> Result<Vec<SimulationRecord>> {
    let mut rdr = csv::Reader::from_reader(reader);
    let mut records = Vec::new();
    for row in rdr.deserialize() {
        records.push(row?);
    }
    Ok(records)
}
