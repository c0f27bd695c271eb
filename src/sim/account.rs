use crate::domain::{AgentConfig, Side, Symbol, Trade};

/// An open position held by one agent.
#[derive(Debug, Clone)]
pub struct OpenPosition {
    pub side: Side,
    pub entry_price: f64,
    pub size: f64,
    pub entry_time: i64,
    pub entry_bar: usize,
}

/// Single-position trading account for one agent. Balance, position and
/// realized pnl are owned exclusively by the agent's worker.
#[derive(Debug, Clone)]
pub struct Account {
    pub balance: f64,
    pub position: Option<OpenPosition>,
    config: AgentConfig,
}

impl Account {
    pub fn new(config: AgentConfig) -> Self {
        debug_assert!(config.initial_balance > 0.0);
        Self {
            balance: config.initial_balance,
            position: None,
            config,
        }
    }

    /// Open a new position. Returns false if one is already held or the
    /// balance is exhausted.
    pub fn open(&mut self, side: Side, price: f64, time: i64, bar: usize) -> bool {
        if self.position.is_some() || self.balance <= 0.0 || price <= 0.0 {
            return false;
        }

        let notional = self.balance * self.config.size_fraction;
        let slippage = price * self.config.slippage_bps / 10_000.0;
        let entry_price = match side {
            Side::Long => price + slippage,
            Side::Short => price - slippage,
        };

        self.position = Some(OpenPosition {
            side,
            entry_price,
            size: notional / entry_price,
            entry_time: time,
            entry_bar: bar,
        });
        true
    }

    /// Close the current position, producing the immutable trade record.
    /// Entry and exit fees are both deducted here so pnl reflects the
    /// full round trip.
    pub fn close(&mut self, symbol: &Symbol, price: f64, time: i64, bar: usize) -> Option<Trade> {
        let pos = self.position.take()?;

        let slippage = price * self.config.slippage_bps / 10_000.0;
        let exit_price = match pos.side {
            Side::Long => price - slippage,
            Side::Short => price + slippage,
        };

        let gross = match pos.side {
            Side::Long => pos.size * (exit_price - pos.entry_price),
            Side::Short => pos.size * (pos.entry_price - exit_price),
        };

        let entry_notional = pos.size * pos.entry_price;
        let exit_notional = pos.size * exit_price;
        let fees = (entry_notional + exit_notional) * self.config.taker_fee;
        let pnl = gross - fees;
        let pnl_pct = if entry_notional > 0.0 {
            pnl / entry_notional * 100.0
        } else {
            0.0
        };

        self.balance += pnl;

        Some(Trade {
            symbol: symbol.0.clone(),
            side: pos.side,
            entry_price: pos.entry_price,
            exit_price,
            size: pos.size,
            entry_time: pos.entry_time,
            exit_time: time,
            bars_held: bar.saturating_sub(pos.entry_bar),
            pnl,
            pnl_pct,
        })
    }

    /// Mark-to-market balance including unrealized pnl.
    pub fn mark(&self, price: f64) -> f64 {
        let unrealized = match &self.position {
            Some(pos) => match pos.side {
                Side::Long => pos.size * (price - pos.entry_price),
                Side::Short => pos.size * (pos.entry_price - price),
            },
            None => 0.0,
        };
        self.balance + unrealized
    }

    pub fn has_position(&self) -> bool {
        self.position.is_some()
    }

    pub fn side(&self) -> Option<Side> {
        self.position.as_ref().map(|p| p.side)
    }
}
