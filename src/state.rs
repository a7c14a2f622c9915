use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::color::ColorMap;
use crate::data::cache::FolderCache;
use crate::data::export::save_csv;
use crate::data::filter::FilteredView;
use crate::data::loader::{LoadReport, UploadedFile, ensure_folder, load_uploads};
use crate::data::model::Dataset;

// ---------------------------------------------------------------------------
// Source mode and persisted settings
// ---------------------------------------------------------------------------

/// Where the dataset comes from. The two modes are mutually exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SourceMode {
    #[default]
    Upload,
    Folder,
}

impl SourceMode {
    pub fn label(self) -> &'static str {
        match self {
            SourceMode::Upload => "Upload CSV files",
            SourceMode::Folder => "Load from folder",
        }
    }
}

/// UI settings remembered between launches.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub mode: SourceMode,
    pub folder_path: String,
    pub selected_symbol: Option<String>,
}

// ---------------------------------------------------------------------------
// Notices shown above the dashboard
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    fn new(level: NoticeLevel, text: impl Into<String>) -> Self {
        Self {
            level,
            text: text.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
///
/// The dataset is rebuilt only when the source changes and the filtered view
/// only when the selection changes; rendering reads the cached results.
#[derive(Debug, Default)]
pub struct AppState {
    pub mode: SourceMode,

    /// Uploaded blobs, in upload order.
    pub uploads: Vec<UploadedFile>,

    /// Contents of the folder text field (not yet committed).
    pub folder_input: String,

    /// Committed folder path, if any.
    pub folder_path: Option<PathBuf>,

    folder_cache: FolderCache,

    /// Outcome of the last load (None when there is no input).
    pub report: Option<LoadReport>,

    /// Distinct symbols of the dataset, sorted.
    pub symbols: Vec<String>,

    pub selected: Option<String>,

    /// Rows of the selected symbol (cached).
    pub view: Option<FilteredView>,

    pub color_map: ColorMap,

    /// Status line for export results.
    pub status_message: Option<String>,
}

impl AppState {
    /// Restore persisted settings, reloading the last folder if one was set.
    pub fn from_settings(settings: Settings) -> Self {
        let mut state = AppState {
            mode: settings.mode,
            folder_input: settings.folder_path,
            selected: settings.selected_symbol,
            ..Default::default()
        };
        if state.mode == SourceMode::Folder {
            state.submit_folder();
        }
        state
    }

    pub fn settings(&self) -> Settings {
        Settings {
            mode: self.mode,
            folder_path: self.folder_input.clone(),
            selected_symbol: self.selected.clone(),
        }
    }

    /// The loaded dataset, if the last load succeeded.
    pub fn dataset(&self) -> Option<&Dataset> {
        self.report
            .as_ref()
            .and_then(|r| r.result.as_ref().ok())
            .map(|loaded| &loaded.dataset)
    }

    // ---- Source changes ----

    pub fn set_mode(&mut self, mode: SourceMode) {
        if self.mode == mode {
            return;
        }
        self.mode = mode;
        self.reload();
    }

    /// Add uploaded blobs. A blob replaces an earlier upload of the same name.
    pub fn add_uploads(&mut self, files: Vec<UploadedFile>) {
        if files.is_empty() {
            return;
        }
        for file in files {
            match self.uploads.iter_mut().find(|u| u.name == file.name) {
                Some(existing) => *existing = file,
                None => self.uploads.push(file),
            }
        }
        self.mode = SourceMode::Upload;
        self.reload();
    }

    pub fn remove_upload(&mut self, index: usize) {
        if index < self.uploads.len() {
            self.uploads.remove(index);
            self.reload();
        }
    }

    pub fn clear_uploads(&mut self) {
        self.uploads.clear();
        self.reload();
    }

    /// Commit the folder text field and load it. Repeat submits of the same
    /// path are served by the folder cache.
    pub fn submit_folder(&mut self) {
        let trimmed = self.folder_input.trim();
        self.folder_path = (!trimmed.is_empty()).then(|| PathBuf::from(trimmed));
        self.reload();
    }

    /// Switch to folder mode on a path picked from a dialog.
    pub fn open_folder(&mut self, path: &Path) {
        self.folder_input = path.display().to_string();
        self.mode = SourceMode::Folder;
        self.submit_folder();
    }

    /// Forget the memoized load for the current folder and read it again.
    pub fn reload_folder(&mut self) {
        if let Some(path) = &self.folder_path {
            self.folder_cache.invalidate(path);
        }
        self.reload();
    }

    /// Rebuild the dataset from the active source.
    pub fn reload(&mut self) {
        let report = match self.mode {
            SourceMode::Upload if self.uploads.is_empty() => None,
            SourceMode::Upload => Some(load_uploads(&self.uploads)),
            SourceMode::Folder => match self.folder_path.clone() {
                None => None,
                Some(path) => Some(self.load_folder(&path)),
            },
        };
        self.install(report);
    }

    fn load_folder(&mut self, path: &Path) -> LoadReport {
        // Existence is checked on every load, even when the folder is cached.
        if let Err(e) = ensure_folder(path) {
            log::error!("{e}");
            return LoadReport::failed(e);
        }
        self.folder_cache.get_or_load(path)
    }

    fn install(&mut self, report: Option<LoadReport>) {
        self.report = report;
        self.status_message = None;

        self.symbols = self.dataset().map(Dataset::symbols).unwrap_or_default();
        self.color_map = ColorMap::new(&self.symbols);

        let keep = self
            .selected
            .as_ref()
            .is_some_and(|s| self.symbols.contains(s));
        if !keep {
            self.selected = self.symbols.first().cloned();
        }

        if let Some(ds) = self.dataset() {
            log::info!(
                "Loaded {} records from {} symbols",
                ds.len(),
                self.symbols.len()
            );
        }
        self.refresh_view();
    }

    // ---- Selection ----

    /// Select a symbol and recompute its filtered view.
    pub fn select_symbol(&mut self, symbol: &str) {
        if self.selected.as_deref() == Some(symbol) {
            return;
        }
        self.selected = Some(symbol.to_string());
        self.refresh_view();
    }

    fn refresh_view(&mut self) {
        self.view = match (self.dataset(), &self.selected) {
            (Some(ds), Some(symbol)) => Some(FilteredView::new(ds, symbol)),
            _ => None,
        };
    }

    // ---- Export ----

    /// Write the selected symbol's full view to `path`.
    pub fn export_to(&mut self, path: &Path) {
        let Some(view) = &self.view else {
            return;
        };
        self.status_message = Some(match save_csv(view, path) {
            Ok(()) => format!("Saved {} rows to {}", view.len(), path.display()),
            Err(e) => {
                log::error!("Export failed: {e:#}");
                format!("Export failed: {e:#}")
            }
        });
    }

    // ---- Messages ----

    /// Messages for the current state, in display order.
    pub fn notices(&self) -> Vec<Notice> {
        let Some(report) = &self.report else {
            let prompt = match self.mode {
                SourceMode::Upload => "Please upload your CSV files to get started",
                SourceMode::Folder => "Please enter a folder path to get started",
            };
            return vec![Notice::new(NoticeLevel::Info, prompt)];
        };

        let failure_level = match self.mode {
            SourceMode::Upload => NoticeLevel::Error,
            SourceMode::Folder => NoticeLevel::Warning,
        };
        let mut notices: Vec<Notice> = report
            .failures
            .iter()
            .map(|f| Notice::new(failure_level, format!("Could not load {}: {}", f.file, f.reason)))
            .collect();

        match &report.result {
            Err(e) => notices.push(Notice::new(NoticeLevel::Error, e.to_string())),
            Ok(loaded) => {
                notices.push(Notice::new(
                    NoticeLevel::Success,
                    format!(
                        "Loaded {} records from {} symbols",
                        loaded.dataset.len(),
                        self.symbols.len()
                    ),
                ));
                if loaded.skipped_rows > 0 {
                    notices.push(Notice::new(
                        NoticeLevel::Warning,
                        format!(
                            "Skipped {} row(s) with a blank symbol or datetime",
                            loaded.skipped_rows
                        ),
                    ));
                }
                if self.view.as_ref().is_some_and(FilteredView::is_empty) {
                    notices.push(Notice::new(
                        NoticeLevel::Warning,
                        "No data found for selected symbol",
                    ));
                }
            }
        }
        notices
    }
}
