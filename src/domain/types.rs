use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// OHLCV bar of historical market data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub open_time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub close_time: i64,
}

impl Candle {
    pub fn datetime(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.open_time).unwrap_or_default()
    }

    /// All price and volume fields are finite numbers.
    pub fn is_finite(&self) -> bool {
        self.open.is_finite()
            && self.high.is_finite()
            && self.low.is_finite()
            && self.close.is_finite()
            && self.volume.is_finite()
    }
}

/// Trading symbol identifier
#[derive(Debug, Clone, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol(pub String);

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Long,
    Short,
}

/// A closed round-trip trade. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub symbol: String,
    pub side: Side,
    pub entry_price: f64,
    pub exit_price: f64,
    pub size: f64,
    pub entry_time: i64,
    pub exit_time: i64,
    pub bars_held: usize,
    pub pnl: f64,
    pub pnl_pct: f64,
}

impl Trade {
    pub fn is_win(&self) -> bool {
        self.pnl > 0.0
    }
}

/// One (timestamp, balance) sample of an agent's equity curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub timestamp: i64,
    pub balance: f64,
}

/// Per-agent simulation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    pub initial_balance: f64,
    pub taker_fee: f64,    // 0.0004 (0.04%)
    pub slippage_bps: f64, // basis points
    /// Fraction of the balance committed per position
    pub size_fraction: f64,
    /// Bars consumed before the strategy may act
    pub warmup: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            initial_balance: 1_000.0,
            taker_fee: 0.0004,
            slippage_bps: 2.0,
            size_fraction: 0.25,
            warmup: 50,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trade_is_win() {
        let mut trade = Trade {
            symbol: "BTCUSDT".into(),
            side: Side::Long,
            entry_price: 50_000.0,
            exit_price: 51_000.0,
            size: 0.1,
            entry_time: 0,
            exit_time: 1000,
            bars_held: 5,
            pnl: 100.0,
            pnl_pct: 2.0,
        };
        assert!(trade.is_win());
        trade.pnl = -10.0;
        assert!(!trade.is_win());
        trade.pnl = 0.0;
        assert!(!trade.is_win(), "breakeven trade is not a win");
    }

    #[test]
    fn test_symbol_display() {
        let sym = Symbol("XRPUSDT".to_string());
        assert_eq!(format!("{}", sym), "XRPUSDT");
    }

    #[test]
    fn test_agent_config_defaults() {
        let cfg = AgentConfig::default();
        assert_eq!(cfg.initial_balance, 1_000.0);
        assert_eq!(cfg.taker_fee, 0.0004);
        assert!(cfg.size_fraction > 0.0 && cfg.size_fraction <= 1.0);
        assert!(cfg.warmup > 0);
    }

    #[test]
    fn test_candle_datetime() {
        let candle = Candle {
            open_time: 1_700_000_000_000,
            open: 100.0,
            high: 101.0,
            low: 99.0,
            close: 100.0,
            volume: 1000.0,
            close_time: 1_700_000_899_999,
        };
        assert!(candle.datetime().timestamp() > 0);
    }

    #[test]
    fn test_candle_is_finite() {
        let mut candle = Candle {
            open_time: 0,
            open: 100.0,
            high: 101.0,
            low: 99.0,
            close: 100.0,
            volume: 1000.0,
            close_time: 899_999,
        };
        assert!(candle.is_finite());
        candle.close = f64::NAN;
        assert!(!candle.is_finite());
        candle.close = f64::INFINITY;
        assert!(!candle.is_finite());
    }

    #[test]
    fn test_symbol_hash_eq() {
        use std::collections::HashSet;
        let mut set = HashSet::new();
        set.insert(Symbol("BTC".into()));
        set.insert(Symbol("BTC".into()));
        set.insert(Symbol("ETH".into()));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_side_variants() {
        assert_ne!(Side::Long, Side::Short);
    }
}
