mod app;
mod color;
mod data;
mod state;
mod ui;

use app::StockVisualizerApp;
use eframe::egui;

fn main() -> eframe::Result {
    env_logger::init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 900.0])
            .with_min_inner_size([700.0, 500.0])
            .with_drag_and_drop(true),
        ..Default::default()
    };

    eframe::run_native(
        "Stock Visualizer",
        options,
        Box::new(|cc| Ok(Box::new(StockVisualizerApp::new(cc)))),
    )
}
