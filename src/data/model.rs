use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::NaiveDateTime;

/// Names of the columns every input file must carry.
pub const SYMBOL_COLUMN: &str = "symbol";
pub const DATETIME_COLUMN: &str = "datetime";
pub const CLOSE_COLUMN: &str = "close";

// ---------------------------------------------------------------------------
// CellValue – a single cell in a pass-through column
// ---------------------------------------------------------------------------

/// A dynamically-typed cell for columns other than symbol/datetime/close.
/// Typed the way a dataframe reader infers CSV cells.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Integer(i64),
    Float(f64),
    Bool(bool),
    Text(String),
    Null,
}

impl CellValue {
    /// Infer the cell type from raw CSV text.
    pub fn infer(s: &str) -> Self {
        if s.is_empty() {
            return CellValue::Null;
        }
        if let Ok(i) = s.parse::<i64>() {
            return CellValue::Integer(i);
        }
        if let Ok(f) = s.parse::<f64>() {
            return CellValue::Float(f);
        }
        match s {
            "true" | "True" | "TRUE" => CellValue::Bool(true),
            "false" | "False" | "FALSE" => CellValue::Bool(false),
            _ => CellValue::Text(s.to_string()),
        }
    }

    /// Text written back to CSV. Re-inferring it yields the same value.
    pub fn to_csv_field(&self) -> String {
        match self {
            CellValue::Integer(i) => i.to_string(),
            // Debug keeps a trailing ".0" so whole floats stay floats.
            CellValue::Float(v) => format!("{v:?}"),
            CellValue::Bool(b) => b.to_string(),
            CellValue::Text(s) => s.clone(),
            CellValue::Null => String::new(),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Text(s) => write!(f, "{s}"),
            CellValue::Null => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// Record – one row of a price file
// ---------------------------------------------------------------------------

/// One price row. Columns beyond the required three live in `extra`.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub symbol: String,
    pub datetime: NaiveDateTime,
    pub close: f64,
    pub extra: BTreeMap<String, CellValue>,
}

impl Record {
    /// Display text of a column for this row; missing columns render empty.
    pub fn display_field(&self, column: &str) -> String {
        match column {
            SYMBOL_COLUMN => self.symbol.clone(),
            DATETIME_COLUMN => self.datetime.format("%Y-%m-%d %H:%M:%S").to_string(),
            CLOSE_COLUMN => format!("{:.2}", self.close),
            other => self
                .extra
                .get(other)
                .map(|v| v.to_string())
                .unwrap_or_default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Dataset – every successfully loaded record
// ---------------------------------------------------------------------------

/// The concatenation of all parsed input files.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    /// Union of input headers in first-seen order.
    pub columns: Vec<String>,
    /// Rows in load order.
    pub records: Vec<Record>,
}

impl Dataset {
    /// Append a parsed table, widening the column list as needed.
    ///
    /// Rows missing a pass-through column hold `Null` for it, on both sides.
    pub fn append(&mut self, columns: &[String], mut records: Vec<Record>) {
        let added: Vec<String> = columns
            .iter()
            .filter(|c| !self.columns.contains(c))
            .cloned()
            .collect();
        self.columns.extend(added.iter().cloned());

        for record in &mut self.records {
            for col in added.iter().filter(|c| is_extra_column(c)) {
                record.extra.insert(col.clone(), CellValue::Null);
            }
        }
        for record in &mut records {
            for col in self.columns.iter().filter(|c| is_extra_column(c)) {
                record.extra.entry(col.clone()).or_insert(CellValue::Null);
            }
        }
        self.records.extend(records);
    }

    /// Distinct symbols, sorted ascending.
    pub fn symbols(&self) -> Vec<String> {
        self.records
            .iter()
            .map(|r| r.symbol.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn is_extra_column(name: &str) -> bool {
    !matches!(name, SYMBOL_COLUMN | DATETIME_COLUMN | CLOSE_COLUMN)
}
