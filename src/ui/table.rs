use eframe::egui::Ui;
use egui_extras::{Column, TableBuilder};

use crate::data::filter::{FilteredView, RECENT_ROWS};

/// The most recent rows of the view, oldest first, in dataset column order.
pub fn recent_table(ui: &mut Ui, view: &FilteredView) {
    let rows = view.tail(RECENT_ROWS);

    TableBuilder::new(ui)
        .striped(true)
        .resizable(true)
        .vscroll(false)
        .columns(Column::auto().at_least(60.0), view.columns.len())
        .header(20.0, |mut header| {
            for col in &view.columns {
                header.col(|ui| {
                    ui.strong(col);
                });
            }
        })
        .body(|mut body| {
            for record in rows {
                body.row(18.0, |mut row| {
                    for col in &view.columns {
                        row.col(|ui| {
                            ui.label(record.display_field(col));
                        });
                    }
                });
            }
        });
}
