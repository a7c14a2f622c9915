use eframe::egui::{self, Align2, Color32, Id, LayerId, Order, ScrollArea, TextStyle};

use crate::data::filter::FilteredView;
use crate::state::{AppState, Settings};
use crate::ui::{panels, plot, table};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct StockVisualizerApp {
    pub state: AppState,
}

impl StockVisualizerApp {
    /// Restore the settings saved by the previous session, if any.
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let settings: Settings = cc
            .storage
            .and_then(|storage| eframe::get_value(storage, eframe::APP_KEY))
            .unwrap_or_default();
        Self {
            state: AppState::from_settings(settings),
        }
    }
}

impl eframe::App for StockVisualizerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        accept_dropped_files(ctx, &mut self.state);

        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: source and symbol ----
        egui::SidePanel::left("control_panel")
            .default_width(240.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: dashboard ----
        egui::CentralPanel::default().show(ctx, |ui| {
            ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    ui.heading("Simple Stock Visualizer");
                    ui.add_space(4.0);
                    panels::notices(ui, &self.state);

                    let Some(summary) = self.state.view.as_ref().and_then(FilteredView::summary)
                    else {
                        return;
                    };

                    ui.add_space(8.0);
                    panels::metrics_row(ui, &summary);
                    ui.add_space(8.0);
                    plot::price_chart(ui, &self.state);

                    ui.add_space(8.0);
                    ui.heading("Recent Data");
                    if let Some(view) = &self.state.view {
                        table::recent_table(ui, view);
                    }

                    ui.add_space(8.0);
                    panels::download_button(ui, &mut self.state);
                });
        });
    }

    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        eframe::set_value(storage, eframe::APP_KEY, &self.state.settings());
    }
}

/// Queue dropped files as uploads and dim the window while files hover.
fn accept_dropped_files(ctx: &egui::Context, state: &mut AppState) {
    let hovering = ctx.input(|i| !i.raw.hovered_files.is_empty());
    if hovering {
        let painter = ctx.layer_painter(LayerId::new(Order::Foreground, Id::new("drop_target")));
        let screen = ctx.screen_rect();
        painter.rect_filled(screen, 0.0, Color32::from_black_alpha(160));
        painter.text(
            screen.center(),
            Align2::CENTER_CENTER,
            "Drop CSV files to upload",
            TextStyle::Heading.resolve(&ctx.style()),
            Color32::WHITE,
        );
    }

    let dropped = ctx.input(|i| i.raw.dropped_files.clone());
    if !dropped.is_empty() {
        panels::accept_dropped_files(state, dropped);
    }
}
