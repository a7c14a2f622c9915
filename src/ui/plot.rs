use chrono::{DateTime, NaiveDateTime};
use eframe::egui::Ui;
use egui_plot::{Line, Plot, PlotPoints};

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Close-price chart (central panel)
// ---------------------------------------------------------------------------

/// Plot x coordinate for a timestamp: seconds since the Unix epoch.
pub fn to_plot_x(datetime: NaiveDateTime) -> f64 {
    datetime.and_utc().timestamp_millis() as f64 / 1000.0
}

/// Date label for a plot x coordinate.
pub fn date_label(x: f64) -> String {
    DateTime::from_timestamp(x.round() as i64, 0)
        .map(|dt| dt.date_naive().to_string())
        .unwrap_or_default()
}

/// Render the selected symbol's close price over time.
pub fn price_chart(ui: &mut Ui, state: &AppState) {
    let Some(view) = state.view.as_ref().filter(|v| !v.is_empty()) else {
        return;
    };

    ui.heading(format!("{} - Close Price Over Time", view.symbol));

    let points: PlotPoints = view
        .close_series()
        .map(|(datetime, close)| [to_plot_x(datetime), close])
        .collect();

    let line = Line::new(points)
        .name(&view.symbol)
        .color(state.color_map.color_for(&view.symbol))
        .width(2.0);

    Plot::new("price_chart")
        .view_aspect(2.0)
        .x_axis_label("Date")
        .y_axis_label("Price ($)")
        .show_grid(true)
        .x_axis_formatter(|mark, _range| date_label(mark.value))
        .label_formatter(|_name, point| format!("{}\n${:.2}", date_label(point.x), point.y))
        .allow_scroll(false)
        .allow_boxed_zoom(true)
        .show(ui, |plot_ui| {
            plot_ui.line(line);
        });
}
