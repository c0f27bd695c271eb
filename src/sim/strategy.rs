use crate::domain::{Candle, Side};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Long,
    Short,
    Close,
    Hold,
}

/// Boundary between signal generation and the simulator.
///
/// The simulator feeds the bar history seen so far (oldest first, current
/// bar last) plus the side of the open position, if any. Implementations
/// must be deterministic for a fixed seed so that replaying the same bar
/// stream reproduces the same trade sequence.
pub trait Strategy {
    fn on_bar(&mut self, history: &[Candle], position: Option<Side>) -> Signal;
}

/// Fast/slow moving-average regime baseline: long while the fast average
/// runs above the slow one, short while below, flat exit on the flip.
///
/// Entries are staggered by a seeded coin flip, so distinct agents with
/// distinct seeds enter at different bars on the same data while each
/// agent alone remains fully reproducible.
pub struct SmaCross {
    fast: usize,
    slow: usize,
    entry_prob: f64,
    rng: StdRng,
}

impl SmaCross {
    pub fn new(fast: usize, slow: usize, seed: u64) -> Self {
        debug_assert!(fast < slow);
        Self {
            fast,
            slow,
            entry_prob: 0.9,
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

fn sma(bars: &[Candle], n: usize) -> Option<f64> {
    if n == 0 || bars.len() < n {
        return None;
    }
    let sum: f64 = bars[bars.len() - n..].iter().map(|c| c.close).sum();
    Some(sum / n as f64)
}

impl Strategy for SmaCross {
    fn on_bar(&mut self, history: &[Candle], position: Option<Side>) -> Signal {
        let (fast, slow) = match (sma(history, self.fast), sma(history, self.slow)) {
            (Some(f), Some(s)) => (f, s),
            _ => return Signal::Hold,
        };

        let rising = fast > slow;
        let falling = fast < slow;

        match position {
            Some(Side::Long) if falling => Signal::Close,
            Some(Side::Short) if rising => Signal::Close,
            Some(_) => Signal::Hold,
            None if rising => {
                if self.rng.gen_bool(self.entry_prob) {
                    Signal::Long
                } else {
                    Signal::Hold
                }
            }
            None if falling => {
                if self.rng.gen_bool(self.entry_prob) {
                    Signal::Short
                } else {
                    Signal::Hold
                }
            }
            None => Signal::Hold,
        }
    }
}
