use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Datelike, Duration, NaiveDate, Weekday};

/// Trading days written per symbol.
const DAYS: usize = 250;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// Weekdays starting at `start`, `n` of them.
fn business_days(start: NaiveDate, n: usize) -> Vec<NaiveDate> {
    let mut days = Vec::with_capacity(n);
    let mut day = start;
    while days.len() < n {
        if !matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
            days.push(day);
        }
        day += Duration::days(1);
    }
    days
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn main() -> Result<()> {
    let out_dir = PathBuf::from(
        std::env::args()
            .nth(1)
            .unwrap_or_else(|| "sample_data".to_string()),
    );
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("creating {}", out_dir.display()))?;

    let mut rng = SimpleRng::new(42);
    let start = NaiveDate::from_ymd_opt(2024, 1, 2).context("invalid start date")?;
    let days = business_days(start, DAYS);

    // (symbol, starting price, daily drift, daily volatility)
    let symbols = [
        ("AAPL", 185.0, 0.0004, 0.015),
        ("MSFT", 370.0, 0.0006, 0.013),
        ("GOOG", 140.0, 0.0003, 0.018),
    ];

    for (symbol, start_price, drift, vol) in symbols {
        let path = out_dir.join(format!("{symbol}.csv"));
        let mut writer = csv::Writer::from_path(&path)
            .with_context(|| format!("creating {}", path.display()))?;
        writer.write_record(["symbol", "datetime", "open", "high", "low", "close", "volume"])?;

        let mut close: f64 = start_price;
        for day in &days {
            let open = close * (1.0 + rng.gauss(0.0, vol / 4.0));
            close = (open * (1.0 + rng.gauss(drift, vol))).max(1.0);
            let high = open.max(close) * (1.0 + rng.next_f64() * vol / 2.0);
            let low = open.min(close) * (1.0 - rng.next_f64() * vol / 2.0);
            let volume = 20_000_000 + (rng.next_f64() * 60_000_000.0) as u64;

            writer.write_record([
                symbol.to_string(),
                format!("{day} 16:00:00"),
                format!("{:.2}", round2(open)),
                format!("{:.2}", round2(high)),
                format!("{:.2}", round2(low)),
                format!("{:.2}", round2(close)),
                volume.to_string(),
            ])?;
        }
        writer.flush()?;
    }

    println!(
        "Wrote {} days of prices for {} symbols to {}",
        days.len(),
        symbols.len(),
        out_dir.display()
    );
    Ok(())
}
