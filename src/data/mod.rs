/// Data layer: core types, loading, filtering and export.
///
/// Architecture:
/// ```text
///  uploaded blobs        folder/*.csv
///        │                    │
///        │              ┌──────────┐
///        │              │  cache    │  memoized per folder path
///        │              └──────────┘
///        ▼                    ▼
///   ┌──────────────────────────┐
///   │  loader                   │  parse CSVs → Dataset
///   └──────────────────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  symbol → FilteredView, Summary
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  export   │  FilteredView → {symbol}_data.csv
///   └──────────┘
/// ```

pub mod cache;
pub mod export;
pub mod filter;
pub mod loader;
pub mod model;
