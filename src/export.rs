// ============================================================================
// CSV export of the fetched ticker table
// ============================================================================
// The dashboard offers the current ticker data as a downloadable artifact:
// UTF-8 CSV bytes, fixed filename, text/csv. With several tickers fetched
// the rows are stacked under an extra leading symbol column.
// ============================================================================

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use crate::models::PriceSeries;

pub const EXPORT_FILENAME: &str = "ticker_data.csv";
pub const EXPORT_MIME: &str = "text/csv";

const COLUMNS: [&str; 6] = ["date", "open", "high", "low", "close", "volume"];

/// Serializes one series to CSV bytes: header row plus one row per bar.
pub fn to_csv_bytes(series: &PriceSeries) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(COLUMNS)
        .context("Failed to write CSV header")?;
    for bar in series.bars() {
        writer
            .write_record(&[
                bar.date.to_string(),
                bar.open.to_string(),
                bar.high.to_string(),
                bar.low.to_string(),
                bar.close.to_string(),
                bar.volume.to_string(),
            ])
            .context("Failed to write CSV row")?;
    }
    let bytes = writer.into_inner().context("Failed to flush CSV writer")?;
    Ok(bytes)
}

/// Multi-ticker variant: same columns preceded by the symbol.
pub fn to_csv_bytes_multi(series: &[&PriceSeries]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    let mut header = vec!["symbol"];
    header.extend(COLUMNS);
    writer
        .write_record(&header)
        .context("Failed to write CSV header")?;
    for s in series {
        for bar in s.bars() {
            writer
                .write_record(&[
                    s.symbol.clone(),
                    bar.date.to_string(),
                    bar.open.to_string(),
                    bar.high.to_string(),
                    bar.low.to_string(),
                    bar.close.to_string(),
                    bar.volume.to_string(),
                ])
                .context("Failed to write CSV row")?;
        }
    }
    let bytes = writer.into_inner().context("Failed to flush CSV writer")?;
    Ok(bytes)
}

/// Writes the export to `ticker_data.csv` in `dir` and returns the path.
pub fn write_export(series: &[&PriceSeries], dir: &Path) -> Result<PathBuf> {
    let bytes = match series {
        [single] => to_csv_bytes(single)?,
        many => to_csv_bytes_multi(many)?,
    };
    let path = dir.join(EXPORT_FILENAME);
    std::fs::write(&path, &bytes)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    info!(path = %path.display(), bytes = bytes.len(), "Exported ticker data");
    Ok(path)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Bar;
    use chrono::NaiveDate;

    fn sample_series(symbol: &str, days: u32) -> PriceSeries {
        let bars = (1..=days)
            .map(|d| {
                Bar::new(
                    NaiveDate::from_ymd_opt(2024, 1, d).unwrap(),
                    100.0 + d as f64,
                    105.0 + d as f64,
                    95.0 + d as f64,
                    102.0 + d as f64,
                    1_000 * d as u64,
                )
            })
            .collect();
        PriceSeries::from_bars(symbol.to_string(), bars)
    }

    #[test]
    fn test_round_trip_preserves_rows_and_labels() {
        let series = sample_series("AAPL", 7);
        let bytes = to_csv_bytes(&series).unwrap();

        // Exported bytes must decode as UTF-8 CSV
        let text = String::from_utf8(bytes).unwrap();
        let mut reader = csv::Reader::from_reader(text.as_bytes());

        let headers = reader.headers().unwrap().clone();
        let labels: Vec<&str> = headers.iter().collect();
        assert_eq!(labels, ["date", "open", "high", "low", "close", "volume"]);

        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), series.len());
        assert_eq!(&rows[0][0], "2024-01-01");
        assert_eq!(&rows[6][5], "7000");
    }

    #[test]
    fn test_multi_ticker_export_has_symbol_column() {
        let a = sample_series("AAPL", 2);
        let b = sample_series("MSFT", 3);
        let bytes = to_csv_bytes_multi(&[&a, &b]).unwrap();

        let mut reader = csv::Reader::from_reader(bytes.as_slice());
        assert_eq!(reader.headers().unwrap().iter().next(), Some("symbol"));

        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 5);
        assert_eq!(&rows[0][0], "AAPL");
        assert_eq!(&rows[4][0], "MSFT");
    }

    #[test]
    fn test_empty_series_exports_header_only() {
        let series = PriceSeries::new("NOPE".to_string());
        let bytes = to_csv_bytes(&series).unwrap();

        let mut reader = csv::Reader::from_reader(bytes.as_slice());
        assert_eq!(reader.headers().unwrap().len(), 6);
        assert_eq!(reader.records().count(), 0);
    }

    #[test]
    fn test_write_export_uses_fixed_filename() {
        let dir = std::env::temp_dir().join("marketdash-export-test");
        std::fs::create_dir_all(&dir).unwrap();

        let series = sample_series("AAPL", 2);
        let path = write_export(&[&series], &dir).unwrap();
        assert!(path.ends_with(EXPORT_FILENAME));
        assert!(path.exists());

        std::fs::remove_file(path).ok();
    }
}
