use std::path::PathBuf;

use eframe::egui::{self, Color32, DroppedFile, RichText, Ui};

use crate::data::export::export_file_name;
use crate::data::filter::Summary;
use crate::data::loader::UploadedFile;
use crate::state::{AppState, NoticeLevel, SourceMode};

// ---------------------------------------------------------------------------
// Left side panel – data source and symbol selection
// ---------------------------------------------------------------------------

/// Render the left control panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Data source");
    ui.separator();

    let mut mode = state.mode;
    ui.label("Choose how to load your data:");
    for option in [SourceMode::Upload, SourceMode::Folder] {
        ui.radio_value(&mut mode, option, option.label());
    }
    state.set_mode(mode);
    ui.add_space(6.0);

    match state.mode {
        SourceMode::Upload => upload_controls(ui, state),
        SourceMode::Folder => folder_controls(ui, state),
    }

    ui.separator();
    symbol_selector(ui, state);
}

fn upload_controls(ui: &mut Ui, state: &mut AppState) {
    if ui.button("Browse CSV files…").clicked() {
        open_files_dialog(state);
    }
    ui.label(RichText::new("or drop CSV files onto the window").small());

    if state.uploads.is_empty() {
        return;
    }

    ui.add_space(4.0);
    let mut remove = None;
    for (i, file) in state.uploads.iter().enumerate() {
        ui.horizontal(|ui: &mut Ui| {
            if ui.small_button("✖").on_hover_text("Remove").clicked() {
                remove = Some(i);
            }
            ui.label(&file.name);
        });
    }
    if let Some(i) = remove {
        state.remove_upload(i);
    }
    if ui.small_button("Clear all").clicked() {
        state.clear_uploads();
    }
}

fn folder_controls(ui: &mut Ui, state: &mut AppState) {
    ui.label("Folder containing your CSV files:");
    let response = ui.text_edit_singleline(&mut state.folder_input);
    let mut submit = response.lost_focus();

    let mut browse = false;
    let mut reload = false;
    ui.horizontal(|ui: &mut Ui| {
        submit |= ui.button("Load").clicked();
        browse = ui.button("Browse…").clicked();
        reload = ui
            .add_enabled(state.folder_path.is_some(), egui::Button::new("Reload"))
            .on_hover_text("Read the folder again from disk")
            .clicked();
    });

    if browse {
        open_folder_dialog(state);
    } else if reload {
        state.reload_folder();
    } else if submit {
        state.submit_folder();
    }
}

fn symbol_selector(ui: &mut Ui, state: &mut AppState) {
    if state.symbols.is_empty() {
        ui.label("No dataset loaded.");
        return;
    }

    ui.strong("Select Stock Symbol:");
    let current = state.selected.clone().unwrap_or_default();
    let mut chosen = None;
    egui::ComboBox::from_id_salt("symbol")
        .selected_text(&current)
        .width(ui.available_width())
        .show_ui(ui, |ui: &mut Ui| {
            for symbol in &state.symbols {
                let text = RichText::new(symbol).color(state.color_map.color_for(symbol));
                if ui.selectable_label(current == *symbol, text).clicked() {
                    chosen = Some(symbol.clone());
                }
            }
        });

    if let Some(symbol) = chosen {
        state.select_symbol(&symbol);
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Upload CSV files…").clicked() {
                open_files_dialog(state);
                ui.close_menu();
            }
            if ui.button("Open folder…").clicked() {
                open_folder_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(loaded) = state.report.as_ref().and_then(|r| r.result.as_ref().ok()) {
            ui.label(format!(
                "{} records, {} symbols, {} file(s)",
                loaded.dataset.len(),
                state.symbols.len(),
                loaded.files_loaded
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(msg);
        }
    });
}

// ---------------------------------------------------------------------------
// Dashboard widgets
// ---------------------------------------------------------------------------

/// Render the current notices, coloured by level.
pub fn notices(ui: &mut Ui, state: &AppState) {
    for notice in state.notices() {
        let (icon, color) = match notice.level {
            NoticeLevel::Info => ("ℹ", Color32::LIGHT_BLUE),
            NoticeLevel::Success => ("✔", Color32::from_rgb(80, 200, 120)),
            NoticeLevel::Warning => ("⚠", Color32::from_rgb(230, 180, 40)),
            NoticeLevel::Error => ("✖", Color32::RED),
        };
        ui.label(RichText::new(format!("{icon} {}", notice.text)).color(color));
    }
}

/// Records, date range and latest close, side by side.
pub fn metrics_row(ui: &mut Ui, summary: &Summary) {
    ui.columns(3, |cols: &mut [Ui]| {
        metric(&mut cols[0], "Records", summary.records.to_string());
        metric(&mut cols[1], "Date Range", summary.date_range_label());
        metric(&mut cols[2], "Latest Close", summary.latest_close_label());
    });
}

fn metric(ui: &mut Ui, label: &str, value: String) {
    ui.group(|ui: &mut Ui| {
        ui.set_width(ui.available_width());
        ui.label(RichText::new(label).small());
        ui.label(RichText::new(value).size(22.0).strong());
    });
}

/// Save the whole filtered view as `{symbol}_data.csv`.
pub fn download_button(ui: &mut Ui, state: &mut AppState) {
    let Some(file_name) = state.view.as_ref().map(|v| export_file_name(&v.symbol)) else {
        return;
    };

    if ui.button("Download filtered data as CSV").clicked() {
        let target = rfd::FileDialog::new()
            .set_title("Save filtered data")
            .set_file_name(file_name)
            .add_filter("CSV", &["csv"])
            .save_file();
        if let Some(path) = target {
            state.export_to(&path);
        }
    }
}

// ---------------------------------------------------------------------------
// File dialogs and drag-and-drop
// ---------------------------------------------------------------------------

pub fn open_files_dialog(state: &mut AppState) {
    let files = rfd::FileDialog::new()
        .set_title("Upload CSV files")
        .add_filter("CSV", &["csv"])
        .pick_files();

    if let Some(paths) = files {
        read_uploads(state, paths);
    }
}

pub fn open_folder_dialog(state: &mut AppState) {
    let folder = rfd::FileDialog::new()
        .set_title("Folder containing CSV files")
        .pick_folder();

    if let Some(path) = folder {
        state.open_folder(&path);
    }
}

/// Turn files dropped on the window into uploads. Non-CSV files are ignored.
pub fn accept_dropped_files(state: &mut AppState, dropped: Vec<DroppedFile>) {
    let mut uploads = Vec::new();
    let mut paths = Vec::new();

    for file in dropped {
        let name = match (&file.path, file.name.is_empty()) {
            (Some(path), true) => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            _ => file.name.clone(),
        };
        if !name.ends_with(".csv") {
            log::warn!("Ignoring dropped file {name}: not a CSV");
            continue;
        }
        match (file.bytes, file.path) {
            (Some(bytes), _) => uploads.push(UploadedFile::new(name, bytes)),
            (None, Some(path)) => paths.push(path),
            (None, None) => log::warn!("Dropped file {name} has no content"),
        }
    }

    state.add_uploads(uploads);
    if !paths.is_empty() {
        read_uploads(state, paths);
    }
}

fn read_uploads(state: &mut AppState, paths: Vec<PathBuf>) {
    let mut files = Vec::new();
    let mut errors = Vec::new();
    for path in paths {
        match UploadedFile::from_path(&path) {
            Ok(file) => files.push(file),
            Err(e) => {
                log::error!("Failed to read {}: {e}", path.display());
                errors.push(format!("could not read {}: {e}", path.display()));
            }
        }
    }

    state.add_uploads(files);
    if !errors.is_empty() {
        state.status_message = Some(format!("Error: {}", errors.join("; ")));
    }
}
