//! Loading intensity forecasts from `timestamp,intensity` CSV files.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;

use crate::forecast::IntensitySample;

/// Failures while reading a forecast file.
#[derive(Debug, Error)]
pub enum ForecastLoadError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("row {row}: invalid RFC 3339 timestamp \"{value}\"")]
    Timestamp { row: usize, value: String },
    #[error("row {row}: intensity must be finite and >= 0, got {value}")]
    Intensity { row: usize, value: f64 },
    #[error("row {row}: timestamps must be strictly increasing")]
    Unordered { row: usize },
}

#[derive(Debug, Deserialize)]
struct Row {
    timestamp: String,
    intensity: f64,
}

/// Reads a forecast CSV from disk.
///
/// # Errors
///
/// Returns a `ForecastLoadError` on I/O failure or any invalid row.
pub fn read_forecast_csv(path: &Path) -> Result<Vec<IntensitySample>, ForecastLoadError> {
    let file = File::open(path)?;
    parse_forecast_csv(io::BufReader::new(file))
}

/// Parses a forecast CSV with a `timestamp,intensity` header.
///
/// Rows are 1-indexed in error messages, counting data rows only.
///
/// # Errors
///
/// Returns a `ForecastLoadError` for malformed CSV, bad timestamps,
/// negative or non-finite intensities, or out-of-order rows.
pub fn parse_forecast_csv(reader: impl Read) -> Result<Vec<IntensitySample>, ForecastLoadError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut samples: Vec<IntensitySample> = Vec::new();

    for (i, record) in rdr.deserialize::<Row>().enumerate() {
        let row = i + 1;
        let rec = record?;
        let timestamp = DateTime::parse_from_rfc3339(&rec.timestamp)
            .map_err(|_| ForecastLoadError::Timestamp {
                row,
                value: rec.timestamp.clone(),
            })?
            .with_timezone(&Utc);
        if !(rec.intensity.is_finite() && rec.intensity >= 0.0) {
            return Err(ForecastLoadError::Intensity {
                row,
                value: rec.intensity,
            });
        }
        if samples.last().is_some_and(|prev| prev.timestamp >= timestamp) {
            return Err(ForecastLoadError::Unordered { row });
        }
        samples.push(IntensitySample::new(timestamp, rec.intensity));
    }

    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    #[test]
    fn parses_valid_file() {
        let csv = "timestamp,intensity\n\
                   2026-04-01T00:00:00Z,180\n\
                   2026-04-01T00:30:00Z,175.5\n\
                   2026-04-01T02:00:00+01:00,160\n";
        let samples = parse_forecast_csv(csv.as_bytes()).expect("valid csv should parse");
        assert_eq!(samples.len(), 3);
        assert_eq!(samples[1].value, 175.5);
        // Offsets are normalised to UTC.
        assert_eq!(
            samples[2].timestamp - samples[0].timestamp,
            TimeDelta::hours(1)
        );
    }

    #[test]
    fn rejects_out_of_order_rows() {
        let csv = "timestamp,intensity\n\
                   2026-04-01T01:00:00Z,180\n\
                   2026-04-01T00:30:00Z,175\n";
        let err = parse_forecast_csv(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, ForecastLoadError::Unordered { row: 2 }));
    }

    #[test]
    fn rejects_negative_intensity() {
        let csv = "timestamp,intensity\n2026-04-01T00:00:00Z,-3\n";
        let err = parse_forecast_csv(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, ForecastLoadError::Intensity { row: 1, .. }));
    }

    #[test]
    fn rejects_bad_timestamp() {
        let csv = "timestamp,intensity\nyesterday,100\n";
        let err = parse_forecast_csv(csv.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("yesterday"));
    }

    #[test]
    fn rejects_non_numeric_intensity() {
        let csv = "timestamp,intensity\n2026-04-01T00:00:00Z,lots\n";
        assert!(matches!(
            parse_forecast_csv(csv.as_bytes()),
            Err(ForecastLoadError::Csv(_))
        ));
    }
}
