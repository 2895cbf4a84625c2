//! CSV export for window averages.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::forecast::WindowAverage;

/// Column header for window CSV export.
const HEADER: &str = "offset,start,end,avg_g_per_kwh,start_g_per_kwh,end_g_per_kwh";

/// Exports windows to a CSV file at the given path.
///
/// Writes a header row followed by one row per window, in offset order.
/// Produces deterministic output for identical inputs.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_windows_csv<I>(windows: I, path: &Path) -> io::Result<()>
where
    I: IntoIterator<Item = WindowAverage>,
{
    let file = File::create(path)?;
    let buf = io::BufWriter::new(file);
    write_windows_csv(windows, buf)
}

/// Writes windows as CSV to any writer.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_windows_csv<I>(windows: I, writer: impl Write) -> io::Result<()>
where
    I: IntoIterator<Item = WindowAverage>,
{
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    wtr.write_record(HEADER.split(','))?;

    for (offset, w) in windows.into_iter().enumerate() {
        wtr.write_record(&[
            offset.to_string(),
            w.start.to_rfc3339(),
            w.end.to_rfc3339(),
            format!("{:.4}", w.value),
            format!("{:.4}", w.start_value),
            format!("{:.4}", w.end_value),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
