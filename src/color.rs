use std::collections::BTreeMap;

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.70, 0.50);
            let rgb: Srgb = hsl.into_color();
            Color32::from_rgb(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Symbol → Color32
// ---------------------------------------------------------------------------

/// Assigns each loaded symbol a line colour, stable for a given symbol list.
#[derive(Debug, Clone, Default)]
pub struct ColorMap {
    mapping: BTreeMap<String, Color32>,
}

impl ColorMap {
    pub fn new(symbols: &[String]) -> Self {
        let mapping = symbols
            .iter()
            .cloned()
            .zip(generate_palette(symbols.len()))
            .collect();
        ColorMap { mapping }
    }

    /// Colour for `symbol`; unknown symbols get the default plot blue.
    pub fn color_for(&self, symbol: &str) -> Color32 {
        self.mapping
            .get(symbol)
            .copied()
            .unwrap_or(Color32::LIGHT_BLUE)
    }
}
