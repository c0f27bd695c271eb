use crate::domain::Candle;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const BAR_MS: i64 = 900_000; // 15m bars

/// Generate a seeded random-walk bar series for training runs and tests.
/// The same seed always yields the same series.
pub fn generate_bars(n: usize, start_price: f64, seed: u64) -> Vec<Candle> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut price = start_price.max(0.01);
    let mut bars = Vec::with_capacity(n);

    for i in 0..n {
        let open = price;
        // Per-bar return: slight drift plus noise, bounded so the walk
        // cannot go non-positive.
        let step: f64 = rng.gen_range(-0.02..0.021);
        price = (price * (1.0 + step)).max(0.01);
        let close = price;

        let span = open.max(close) * rng.gen_range(0.0..0.01);
        bars.push(Candle {
            open_time: i as i64 * BAR_MS,
            open,
            high: open.max(close) + span,
            low: (open.min(close) - span).max(0.001),
            close,
            volume: rng.gen_range(100.0..10_000.0),
            close_time: (i as i64 + 1) * BAR_MS - 1,
        });
    }

    bars
}
