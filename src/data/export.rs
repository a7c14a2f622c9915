use std::path::Path;

use anyhow::{Context, Result};
use chrono::Timelike;

use super::filter::FilteredView;
use super::model::{CLOSE_COLUMN, DATETIME_COLUMN, Record, SYMBOL_COLUMN};

/// Download file name for a symbol's view.
pub fn export_file_name(symbol: &str) -> String {
    format!("{symbol}_data.csv")
}

/// Serialize the whole view as CSV: header row, dataset column order, no
/// index column.
///
/// Datetimes are written date-only when every row sits on midnight.
pub fn to_csv_bytes(view: &FilteredView) -> Result<Vec<u8>> {
    let date_only = view.records.iter().all(|r| {
        r.datetime.time().num_seconds_from_midnight() == 0 && r.datetime.nanosecond() == 0
    });

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(&view.columns)
        .context("writing CSV header")?;

    for record in &view.records {
        let row = view.columns.iter().map(|col| field(record, col, date_only));
        writer.write_record(row).context("writing CSV row")?;
    }

    writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("flushing CSV writer: {}", e.error()))
}

/// Write the view to `path`.
pub fn save_csv(view: &FilteredView, path: &Path) -> Result<()> {
    let bytes = to_csv_bytes(view)?;
    std::fs::write(path, bytes).with_context(|| format!("writing {}", path.display()))?;
    log::info!(
        "Exported {} {} rows to {}",
        view.len(),
        view.symbol,
        path.display()
    );
    Ok(())
}

fn field(record: &Record, column: &str, date_only: bool) -> String {
    match column {
        SYMBOL_COLUMN => record.symbol.clone(),
        DATETIME_COLUMN if date_only => record.datetime.format("%Y-%m-%d").to_string(),
        DATETIME_COLUMN => record.datetime.format("%Y-%m-%d %H:%M:%S%.f").to_string(),
        CLOSE_COLUMN if record.close.is_nan() => String::new(),
        CLOSE_COLUMN => format!("{:?}", record.close),
        other => record
            .extra
            .get(other)
            .map(|v| v.to_csv_field())
            .unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::{UploadedFile, load_uploads, parse_csv};
    use crate::data::model::Dataset;
    use tempfile::TempDir;

    fn view_of(files: &[(&str, &str)], symbol: &str) -> FilteredView {
        let uploads: Vec<UploadedFile> = files
            .iter()
            .map(|(name, csv)| UploadedFile::new(*name, csv.as_bytes().to_vec()))
            .collect();
        let loaded = load_uploads(&uploads).result.unwrap();
        FilteredView::new(&loaded.dataset, symbol)
    }

    fn reparse(bytes: &[u8], symbol: &str) -> FilteredView {
        let table = parse_csv(bytes).unwrap();
        let mut ds = Dataset::default();
        ds.append(&table.columns, table.records);
        FilteredView::new(&ds, symbol)
    }

    #[test]
    fn file_name_follows_symbol() {
        assert_eq!(export_file_name("AAPL"), "AAPL_data.csv");
    }

    #[test]
    fn export_writes_header_without_index() {
        let view = view_of(
            &[("A.csv", "symbol,datetime,close\nAAPL,2024-01-02,185.5\n")],
            "AAPL",
        );
        let text = String::from_utf8(to_csv_bytes(&view).unwrap()).unwrap();
        assert_eq!(text, "symbol,datetime,close\nAAPL,2024-01-02,185.5\n");
    }

    #[test]
    fn export_round_trips_mixed_columns() {
        let view = view_of(
            &[
                (
                    "A.csv",
                    "datetime,symbol,close,exchange,volume\n\
                     2024-01-03 16:00:00,AAPL,184.0,NASDAQ,100\n\
                     2024-01-02 16:00:00.250,AAPL,185.64,\"NAS, DAQ\",\n",
                ),
                (
                    "B.csv",
                    "symbol,datetime,close,adj_close\n\
                     AAPL,2024-01-04 16:00:00,181.91,181.5\n\
                     MSFT,2024-01-04 16:00:00,370.0,369.0\n",
                ),
            ],
            "AAPL",
        );
        assert_eq!(view.len(), 3);

        let bytes = to_csv_bytes(&view).unwrap();
        let again = reparse(&bytes, "AAPL");
        assert_eq!(again, view);
    }

    #[test]
    fn export_round_trips_date_only_rows() {
        let view = view_of(
            &[(
                "A.csv",
                "symbol,datetime,close,split\nAAPL,2024-01-03,184,1.0\nAAPL,2024-01-02,185.64,true\n",
            )],
            "AAPL",
        );
        let bytes = to_csv_bytes(&view).unwrap();
        assert!(String::from_utf8_lossy(&bytes).contains("AAPL,2024-01-02,185.64,true"));
        assert_eq!(reparse(&bytes, "AAPL"), view);
    }

    #[test]
    fn missing_close_is_written_blank() {
        let view = view_of(
            &[("A.csv", "symbol,datetime,close\nAAPL,2024-01-02,\nAAPL,2024-01-03,184.25\n")],
            "AAPL",
        );
        let bytes = to_csv_bytes(&view).unwrap();
        assert!(String::from_utf8_lossy(&bytes).contains("AAPL,2024-01-02,\n"));

        let again = reparse(&bytes, "AAPL");
        assert!(again.records[0].close.is_nan());
        assert_eq!(again.records[1].close, 184.25);
    }

    #[test]
    fn save_csv_writes_full_view() {
        let mut csv = String::from("symbol,datetime,close\n");
        for day in 1..=12 {
            csv.push_str(&format!("AAPL,2024-01-{day:02},{day}.5\n"));
        }
        let view = view_of(&[("A.csv", csv.as_str())], "AAPL");

        let dir = TempDir::new().unwrap();
        let path = dir.path().join(export_file_name("AAPL"));
        save_csv(&view, &path).unwrap();

        let written = std::fs::read(&path).unwrap();
        assert_eq!(reparse(&written, "AAPL").len(), 12);
    }
}
