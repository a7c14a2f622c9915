use std::collections::BTreeMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use chrono::{DateTime, NaiveDate, NaiveDateTime};

use super::model::{CLOSE_COLUMN, CellValue, DATETIME_COLUMN, Dataset, Record, SYMBOL_COLUMN};

// ---------------------------------------------------------------------------
// Errors and load outcomes
// ---------------------------------------------------------------------------

/// Why a load produced no usable dataset. `Clone` so memoized outcomes can be
/// replayed on every render.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LoadError {
    #[error("Folder does not exist: {}", .0.display())]
    FolderNotFound(PathBuf),

    #[error("Not a folder: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("Could not read folder {}: {reason}", .path.display())]
    ReadFolder { path: PathBuf, reason: String },

    #[error("No CSV files found in: {}", .0.display())]
    NoCsvFiles(PathBuf),

    #[error("None of the {attempted} file(s) could be loaded")]
    NoFilesLoaded { attempted: usize },

    #[error("None of the {attempted} CSV file(s) in {} could be loaded", .path.display())]
    NoFolderFilesLoaded { path: PathBuf, attempted: usize },

    #[error("No data found in the loaded files")]
    EmptyDataset,
}

/// A single input file that was skipped.
#[derive(Debug, Clone, PartialEq)]
pub struct FileFailure {
    pub file: String,
    pub reason: String,
}

/// A successful load.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedData {
    pub dataset: Dataset,
    pub files_loaded: usize,
    /// Rows dropped for a blank `symbol` or `datetime`.
    pub skipped_rows: usize,
}

/// The outcome of a batch load.
///
/// Per-file failures are reported even when the batch as a whole fails, so
/// the UI can name every file that was dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadReport {
    pub result: std::result::Result<Arc<LoadedData>, LoadError>,
    pub failures: Vec<FileFailure>,
}

// ---------------------------------------------------------------------------
// Upload mode
// ---------------------------------------------------------------------------

/// An uploaded CSV held in memory.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedFile {
    pub name: String,
    pub bytes: Arc<[u8]>,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a file from disk into memory, named after its file name.
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::new(name, bytes))
    }
}

/// Parse every uploaded blob and concatenate the ones that succeed.
pub fn load_uploads(files: &[UploadedFile]) -> LoadReport {
    let parsed = files
        .iter()
        .map(|f| (f.name.clone(), parse_csv(f.bytes.as_ref())));
    assemble(parsed)
}

// ---------------------------------------------------------------------------
// Folder mode
// ---------------------------------------------------------------------------

/// Fail early when the folder path is unusable. No directory scan happens
/// for a path that does not exist.
pub fn ensure_folder(path: &Path) -> std::result::Result<(), LoadError> {
    if !path.exists() {
        return Err(LoadError::FolderNotFound(path.to_path_buf()));
    }
    if !path.is_dir() {
        return Err(LoadError::NotADirectory(path.to_path_buf()));
    }
    Ok(())
}

/// List the `*.csv` files directly inside `path`, sorted by name.
/// Hidden files are skipped, matching shell glob semantics.
pub fn scan_csv_files(path: &Path) -> std::result::Result<Vec<PathBuf>, LoadError> {
    let read_err = |e: std::io::Error| LoadError::ReadFolder {
        path: path.to_path_buf(),
        reason: e.to_string(),
    };

    let mut files = Vec::new();
    for entry in std::fs::read_dir(path).map_err(read_err)? {
        let entry = entry.map_err(read_err)?;
        let file_path = entry.path();
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with('.') || !name.ends_with(".csv") || !file_path.is_file() {
            continue;
        }
        files.push(file_path);
    }
    files.sort();
    Ok(files)
}

/// Load every CSV in a folder. Unreadable files are reported and skipped.
pub fn load_folder(path: &Path) -> LoadReport {
    let files = match ensure_folder(path).and_then(|()| scan_csv_files(path)) {
        Ok(files) => files,
        Err(e) => return LoadReport::failed(e),
    };
    if files.is_empty() {
        return LoadReport::failed(LoadError::NoCsvFiles(path.to_path_buf()));
    }

    log::info!("Loading {} CSV file(s) from {}", files.len(), path.display());

    let parsed = files.iter().map(|file| {
        let result = std::fs::File::open(file)
            .context("opening file")
            .and_then(parse_csv);
        (file.display().to_string(), result)
    });
    let mut report = assemble(parsed);
    if let Err(LoadError::NoFilesLoaded { attempted }) = report.result {
        report.result = Err(LoadError::NoFolderFilesLoaded {
            path: path.to_path_buf(),
            attempted,
        });
    }
    report
}

// ---------------------------------------------------------------------------
// Batch assembly
// ---------------------------------------------------------------------------

impl LoadReport {
    pub fn failed(error: LoadError) -> Self {
        Self {
            result: Err(error),
            failures: Vec::new(),
        }
    }
}

fn assemble<I>(parsed: I) -> LoadReport
where
    I: IntoIterator<Item = (String, Result<ParsedTable>)>,
{
    let mut dataset = Dataset::default();
    let mut failures = Vec::new();
    let mut files_loaded = 0;
    let mut skipped_rows = 0;

    for (file, result) in parsed {
        match result {
            Ok(table) => {
                log::info!("Parsed {} rows from {file}", table.records.len());
                if table.skipped_rows > 0 {
                    log::warn!("Skipped {} blank row(s) in {file}", table.skipped_rows);
                }
                skipped_rows += table.skipped_rows;
                dataset.append(&table.columns, table.records);
                files_loaded += 1;
            }
            Err(e) => {
                log::warn!("Could not load {file}: {e:#}");
                failures.push(FileFailure {
                    file,
                    reason: format!("{e:#}"),
                });
            }
        }
    }

    let result = if files_loaded == 0 {
        Err(LoadError::NoFilesLoaded {
            attempted: failures.len(),
        })
    } else if dataset.is_empty() {
        Err(LoadError::EmptyDataset)
    } else {
        Ok(Arc::new(LoadedData {
            dataset,
            files_loaded,
            skipped_rows,
        }))
    };

    LoadReport { result, failures }
}

// ---------------------------------------------------------------------------
// CSV parsing
// ---------------------------------------------------------------------------

/// Columns and rows of one parsed input.
#[derive(Debug, Clone)]
pub struct ParsedTable {
    pub columns: Vec<String>,
    pub records: Vec<Record>,
    pub skipped_rows: usize,
}

/// CSV layout: header row with column names, which must include `symbol`,
/// `datetime` and `close`. Every other column is passed through as-is.
///
/// Blank header cells are named `Unnamed: {index}`. A row with a blank
/// `symbol` or `datetime` is skipped and counted; a blank `close` is NaN.
pub fn parse_csv<R: Read>(input: R) -> Result<ParsedTable> {
    let mut reader = csv::Reader::from_reader(input);
    let columns: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .enumerate()
        .map(|(i, h)| {
            if h.trim().is_empty() {
                format!("Unnamed: {i}")
            } else {
                h.to_string()
            }
        })
        .collect();

    if columns.is_empty() || columns.iter().all(|c| c.starts_with("Unnamed: ")) {
        bail!("no columns to parse");
    }
    for (i, col) in columns.iter().enumerate() {
        if columns[..i].contains(col) {
            bail!("duplicate column '{col}'");
        }
    }

    let position = |name: &str| {
        columns
            .iter()
            .position(|h| h == name)
            .with_context(|| format!("missing '{name}' column"))
    };
    let symbol_idx = position(SYMBOL_COLUMN)?;
    let datetime_idx = position(DATETIME_COLUMN)?;
    let close_idx = position(CLOSE_COLUMN)?;

    let mut records = Vec::new();
    let mut skipped_rows = 0;

    for (row_no, result) in reader.records().enumerate() {
        // Header is line 1; data starts on line 2.
        let line = row_no + 2;
        let record = result.with_context(|| format!("row {line}"))?;

        let symbol = record.get(symbol_idx).unwrap_or("");
        let raw_datetime = record.get(datetime_idx).unwrap_or("");
        if symbol.trim().is_empty() || raw_datetime.trim().is_empty() {
            skipped_rows += 1;
            continue;
        }

        let datetime = parse_datetime(raw_datetime)
            .with_context(|| format!("row {line}: invalid datetime '{raw_datetime}'"))?;

        let raw_close = record.get(close_idx).unwrap_or("").trim();
        let close = if raw_close.is_empty() {
            f64::NAN
        } else {
            raw_close
                .parse::<f64>()
                .with_context(|| format!("row {line}: invalid close '{raw_close}'"))?
        };

        let mut extra = BTreeMap::new();
        for (col_idx, value) in record.iter().enumerate() {
            if col_idx == symbol_idx || col_idx == datetime_idx || col_idx == close_idx {
                continue;
            }
            extra.insert(columns[col_idx].clone(), CellValue::infer(value));
        }

        records.push(Record {
            symbol: symbol.to_string(),
            datetime,
            close,
            extra,
        });
    }

    Ok(ParsedTable {
        columns,
        records,
        skipped_rows,
    })
}

// ---------------------------------------------------------------------------
// Datetime coercion
// ---------------------------------------------------------------------------

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const OFFSET_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f%z"];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%Y%m%d"];

/// Parse the timestamp layouts commonly found in price exports.
/// Values carrying a UTC offset are normalized to UTC.
pub fn parse_datetime(raw: &str) -> Result<NaiveDateTime> {
    let s = raw.trim();
    if s.is_empty() {
        bail!("empty value");
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.naive_utc());
    }
    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Ok(dt.naive_utc());
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            if let Some(dt) = d.and_hms_opt(0, 0, 0) {
                return Ok(dt);
            }
        }
    }
    bail!("unrecognized datetime format")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const AAPL_CSV: &str = "symbol,datetime,close,volume\n\
        AAPL,2024-01-03,184.25,58414500\n\
        AAPL,2024-01-02,185.64,82488700\n\
        AAPL,2024-01-04,181.91,71983600\n";

    const MSFT_CSV: &str = "symbol,datetime,close\n\
        MSFT,2024-01-02 09:30:00,370.87\n\
        MSFT,2024-01-03 09:30:00,370.60\n";

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn setup_folder(files: &[(&str, &str)]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for (name, content) in files {
            fs::write(dir.path().join(name), content).unwrap();
        }
        dir
    }

    #[test]
    fn parse_csv_reads_required_and_extra_columns() {
        let table = parse_csv(AAPL_CSV.as_bytes()).unwrap();
        assert_eq!(table.columns, vec!["symbol", "datetime", "close", "volume"]);
        assert_eq!(table.records.len(), 3);
        let first = &table.records[0];
        assert_eq!(first.symbol, "AAPL");
        assert_eq!(first.datetime, ymd(2024, 1, 3));
        assert_eq!(first.close, 184.25);
        assert_eq!(first.extra["volume"], CellValue::Integer(58414500));
    }

    #[test]
    fn parse_csv_rejects_missing_required_column() {
        let err = parse_csv("symbol,close\nAAPL,1.0\n".as_bytes()).unwrap_err();
        assert!(format!("{err:#}").contains("missing 'datetime' column"));
    }

    #[test]
    fn parse_csv_reports_malformed_datetime_with_row() {
        let input = "symbol,datetime,close\nAAPL,2024-01-02,1.0\nAAPL,yesterday,2.0\n";
        let err = format!("{:#}", parse_csv(input.as_bytes()).unwrap_err());
        assert!(err.contains("row 3"), "{err}");
        assert!(err.contains("yesterday"), "{err}");
    }

    #[test]
    fn parse_csv_rejects_bad_close() {
        assert!(parse_csv("symbol,datetime,close\nAAPL,2024-01-02,abc\n".as_bytes()).is_err());
    }

    #[test]
    fn blank_close_is_kept_as_nan() {
        let input = "symbol,datetime,close\n\
            AAPL,2024-01-02,185.64\n\
            AAPL,2024-01-03,184.25\n\
            AAPL,2024-01-04,\n";
        let table = parse_csv(input.as_bytes()).unwrap();
        assert_eq!(table.records.len(), 3);
        assert!(table.records[2].close.is_nan());
        assert_eq!(table.skipped_rows, 0);
    }

    #[test]
    fn blank_symbol_or_datetime_skips_the_row() {
        let input = "symbol,datetime,close\n\
            AAPL,2024-01-02,185.64\n\
            AAPL,,184.25\n\
            ,2024-01-04,181.91\n";
        let table = parse_csv(input.as_bytes()).unwrap();
        assert_eq!(table.records.len(), 1);
        assert_eq!(table.skipped_rows, 2);

        let report = load_uploads(&[UploadedFile::new("A.csv", input.as_bytes().to_vec())]);
        let loaded = report.result.unwrap();
        assert_eq!(loaded.dataset.len(), 1);
        assert_eq!(loaded.skipped_rows, 2);
        assert!(report.failures.is_empty());
    }

    #[test]
    fn blank_header_cells_get_positional_names() {
        let input = "symbol,datetime,close,,\nAAPL,2024-01-02,185.64,,\n";
        let table = parse_csv(input.as_bytes()).unwrap();
        assert_eq!(
            table.columns,
            vec!["symbol", "datetime", "close", "Unnamed: 3", "Unnamed: 4"]
        );
        assert_eq!(table.records[0].extra["Unnamed: 3"], CellValue::Null);
    }

    #[test]
    fn parse_csv_rejects_empty_input_and_duplicates() {
        assert!(parse_csv("".as_bytes()).is_err());
        assert!(parse_csv("symbol,datetime,close,close\n".as_bytes()).is_err());
    }

    #[test]
    fn header_only_file_parses_to_no_rows() {
        let table = parse_csv("symbol,datetime,close\n".as_bytes()).unwrap();
        assert!(table.records.is_empty());
    }

    #[test]
    fn parse_datetime_accepts_common_layouts() {
        let noon = NaiveDate::from_ymd_opt(2024, 3, 5)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        assert_eq!(parse_datetime("2024-03-05 12:00:00").unwrap(), noon);
        assert_eq!(parse_datetime("2024-03-05T12:00:00").unwrap(), noon);
        assert_eq!(parse_datetime("2024-03-05 12:00").unwrap(), noon);
        assert_eq!(parse_datetime("2024-03-05T12:00:00Z").unwrap(), noon);
        assert_eq!(parse_datetime("2024-03-05T14:00:00+02:00").unwrap(), noon);
        assert_eq!(parse_datetime("2024-03-05").unwrap(), ymd(2024, 3, 5));
        assert_eq!(parse_datetime("03/05/2024").unwrap(), ymd(2024, 3, 5));
        assert_eq!(parse_datetime("20240305").unwrap(), ymd(2024, 3, 5));
        assert!(parse_datetime("not a date").is_err());
        assert!(parse_datetime("").is_err());
    }

    #[test]
    fn load_uploads_concatenates_all_rows() {
        let files = vec![
            UploadedFile::new("A.csv", AAPL_CSV.as_bytes().to_vec()),
            UploadedFile::new("B.csv", MSFT_CSV.as_bytes().to_vec()),
        ];
        let report = load_uploads(&files);
        let loaded = report.result.unwrap();
        assert_eq!(loaded.dataset.len(), 5);
        assert_eq!(loaded.files_loaded, 2);
        assert!(report.failures.is_empty());
        assert_eq!(loaded.dataset.symbols(), vec!["AAPL", "MSFT"]);
    }

    #[test]
    fn load_uploads_skips_broken_files() {
        let files = vec![
            UploadedFile::new("good.csv", AAPL_CSV.as_bytes().to_vec()),
            UploadedFile::new("bad.csv", b"symbol,close\nX,1\n".to_vec()),
        ];
        let report = load_uploads(&files);
        assert_eq!(report.result.unwrap().dataset.len(), 3);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].file, "bad.csv");
    }

    #[test]
    fn load_uploads_fails_when_nothing_parses() {
        let files = vec![
            UploadedFile::new("a.csv", b"nope".to_vec()),
            UploadedFile::new("b.csv", Vec::new()),
        ];
        let report = load_uploads(&files);
        assert_eq!(
            report.result.unwrap_err(),
            LoadError::NoFilesLoaded { attempted: 2 }
        );
        assert_eq!(report.failures.len(), 2);
    }

    #[test]
    fn header_only_uploads_yield_empty_dataset_error() {
        let files = vec![UploadedFile::new("a.csv", b"symbol,datetime,close\n".to_vec())];
        assert_eq!(load_uploads(&files).result.unwrap_err(), LoadError::EmptyDataset);
    }

    #[test]
    fn load_folder_reports_missing_folder_without_scanning() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("does-not-exist");
        let report = load_folder(&missing);
        assert_eq!(report.result.unwrap_err(), LoadError::FolderNotFound(missing));
        assert!(report.failures.is_empty());
    }

    #[test]
    fn load_folder_rejects_plain_file() {
        let dir = setup_folder(&[("A.csv", AAPL_CSV)]);
        let file = dir.path().join("A.csv");
        assert_eq!(
            load_folder(&file).result.unwrap_err(),
            LoadError::NotADirectory(file)
        );
    }

    #[test]
    fn load_folder_without_csv_files() {
        let dir = setup_folder(&[("notes.txt", "hello"), ("upper.CSV", AAPL_CSV)]);
        assert_eq!(
            load_folder(dir.path()).result.unwrap_err(),
            LoadError::NoCsvFiles(dir.path().to_path_buf())
        );
    }

    #[test]
    fn load_folder_skips_hidden_and_nested_files() {
        let dir = setup_folder(&[("A.csv", AAPL_CSV), (".hidden.csv", MSFT_CSV)]);
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested").join("B.csv"), MSFT_CSV).unwrap();

        let files = scan_csv_files(dir.path()).unwrap();
        assert_eq!(files, vec![dir.path().join("A.csv")]);
    }

    #[test]
    fn load_folder_continues_past_malformed_file() {
        let dir = setup_folder(&[
            ("A.csv", AAPL_CSV),
            ("B.csv", MSFT_CSV),
            ("C.csv", "symbol,datetime,close\nGOOG,31/31/2024,1.0\n"),
        ]);
        let report = load_folder(dir.path());
        let loaded = report.result.unwrap();
        assert_eq!(loaded.dataset.len(), 5);
        assert_eq!(loaded.files_loaded, 2);
        assert_eq!(report.failures.len(), 1);
        assert!(report.failures[0].file.ends_with("C.csv"));
        assert!(report.failures[0].reason.contains("invalid datetime"));
    }

    #[test]
    fn load_folder_all_files_broken() {
        let dir = setup_folder(&[("A.csv", "garbage,only\n1,2\n")]);
        let report = load_folder(dir.path());
        let err = report.result.unwrap_err();
        assert_eq!(
            err,
            LoadError::NoFolderFilesLoaded {
                path: dir.path().to_path_buf(),
                attempted: 1
            }
        );
        assert!(err.to_string().contains(&dir.path().display().to_string()));
        assert_eq!(report.failures.len(), 1);
    }

    #[test]
    fn uploaded_file_from_path_uses_file_name() {
        let dir = setup_folder(&[("A.csv", AAPL_CSV)]);
        let upload = UploadedFile::from_path(&dir.path().join("A.csv")).unwrap();
        assert_eq!(upload.name, "A.csv");
        assert_eq!(upload.bytes.as_ref(), AAPL_CSV.as_bytes());
    }
}
