//! CSV export for solved schedules.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use thiserror::Error;

use crate::problem::ProblemParams;
use crate::schedule::Schedule;
use crate::signal::SignalSchedule;

/// Column header for schedule export.
const HEADER: &str = "hour,price,load_kwh,output_kwh,soc_end_kwh,cost,command_code,command";

/// Failure while writing a schedule export.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write export: {0}")]
    Io(#[from] io::Error),
    #[error("failed to encode CSV: {0}")]
    Csv(#[from] csv::Error),
}

/// Exports a schedule to a CSV file at the given path.
///
/// Writes a header row followed by one row per hour. Produces deterministic
/// output for identical inputs.
///
/// # Errors
///
/// Returns [`ExportError`] if file creation or writing fails.
pub fn export_csv(
    schedule: &Schedule,
    signals: &SignalSchedule,
    params: &ProblemParams,
    start_hour: usize,
    path: &Path,
) -> Result<(), ExportError> {
    let file = File::create(path)?;
    write_csv(schedule, signals, params, start_hour, io::BufWriter::new(file))
}

/// Writes a schedule as CSV to any writer.
///
/// `start_hour` offsets the `hour` column only.
///
/// # Errors
///
/// Returns [`ExportError`] if writing fails.
pub fn write_csv(
    schedule: &Schedule,
    signals: &SignalSchedule,
    params: &ProblemParams,
    start_hour: usize,
    writer: impl Write,
) -> Result<(), ExportError> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(HEADER.split(','))?;

    let soc = schedule.soc_trace(params);
    for h in 0..schedule.horizon() {
        let (code, name) = signals
            .commands
            .get(h)
            .map(|c| (c.code().to_string(), c.name()))
            .unwrap_or_default();
        wtr.write_record(&[
            (start_hour + h).to_string(),
            format!("{:.4}", params.price()[h]),
            format!("{:.4}", params.load()[h]),
            format!("{:.4}", schedule.output[h]),
            format!("{:.4}", soc[h + 1]),
            format!("{:.6}", schedule.cost[h]),
            code,
            name.to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
