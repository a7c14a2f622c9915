use chrono::NaiveDateTime;

use super::model::{Dataset, Record};

/// Number of rows shown in the recent-data preview.
pub const RECENT_ROWS: usize = 10;

// ---------------------------------------------------------------------------
// FilteredView – one symbol's rows, oldest first
// ---------------------------------------------------------------------------

/// The rows of a single symbol, sorted ascending by datetime.
#[derive(Debug, Clone, PartialEq)]
pub struct FilteredView {
    pub symbol: String,
    /// Column order of the source dataset.
    pub columns: Vec<String>,
    pub records: Vec<Record>,
}

impl FilteredView {
    /// Select the rows whose symbol equals `symbol`.
    ///
    /// The sort is stable: rows sharing a timestamp keep their load order.
    pub fn new(dataset: &Dataset, symbol: &str) -> Self {
        let mut records: Vec<Record> = dataset
            .records
            .iter()
            .filter(|r| r.symbol == symbol)
            .cloned()
            .collect();
        records.sort_by_key(|r| r.datetime);

        FilteredView {
            symbol: symbol.to_string(),
            columns: dataset.columns.clone(),
            records,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The last `n` rows (fewer if the view is shorter), oldest first.
    pub fn tail(&self, n: usize) -> &[Record] {
        let start = self.records.len().saturating_sub(n);
        &self.records[start..]
    }

    /// Headline metrics, or `None` for an empty view.
    pub fn summary(&self) -> Option<Summary> {
        let first = self.records.first()?;
        let last = self.records.last()?;
        Some(Summary {
            records: self.records.len(),
            first: first.datetime,
            last: last.datetime,
            latest_close: last.close,
        })
    }

    /// `(datetime, close)` pairs for charting. Rows without a close are left out.
    pub fn close_series(&self) -> impl Iterator<Item = (NaiveDateTime, f64)> + '_ {
        self.records
            .iter()
            .filter(|r| r.close.is_finite())
            .map(|r| (r.datetime, r.close))
    }
}

// ---------------------------------------------------------------------------
// Summary – the three headline metrics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub records: usize,
    pub first: NaiveDateTime,
    pub last: NaiveDateTime,
    pub latest_close: f64,
}

impl Summary {
    pub fn date_range_label(&self) -> String {
        format!("{} to {}", self.first.date(), self.last.date())
    }

    pub fn latest_close_label(&self) -> String {
        format!("${:.2}", self.latest_close)
    }
}
