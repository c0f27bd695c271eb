use crate::cycle::CycleResult;
use crate::metrics::{finite_or_zero, safe_ratio};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Terminal state of one symbol's worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgentStatus {
    Completed,
    /// Stopped by the session cancel signal; accumulated results kept.
    Cancelled,
    /// Worker hit a data error or crashed; accumulated results kept.
    Failed,
}

impl AgentStatus {
    pub fn is_completed(self) -> bool {
        self == AgentStatus::Completed
    }
}

/// Final per-symbol result. Mutated only by that symbol's worker until
/// finalization, owned by the session afterward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolResult {
    pub symbol: String,
    pub status: AgentStatus,
    pub initial_balance: f64,
    pub final_balance: f64,
    pub pnl_abs: f64,
    pub pnl_pct: f64,
    pub trade_count: usize,
    pub win_count: usize,
    pub loss_count: usize,
    pub long_count: usize,
    pub short_count: usize,
    /// Fraction of winning trades in [0, 1]
    pub win_rate: f64,
    /// Fractional decline from the symbol's lifetime balance peak
    pub max_drawdown: f64,
    pub cycles: Vec<CycleResult>,
    pub warnings: Vec<String>,
}

impl SymbolResult {
    /// Placeholder for a worker that produced nothing: missing data,
    /// crash before the first bar, and similar.
    pub fn zero_trade(
        symbol: &str,
        initial_balance: f64,
        status: AgentStatus,
        warnings: Vec<String>,
    ) -> Self {
        Self {
            symbol: symbol.to_string(),
            status,
            initial_balance,
            final_balance: initial_balance,
            pnl_abs: 0.0,
            pnl_pct: 0.0,
            trade_count: 0,
            win_count: 0,
            loss_count: 0,
            long_count: 0,
            short_count: 0,
            win_rate: 0.0,
            max_drawdown: 0.0,
            cycles: Vec::new(),
            warnings,
        }
    }

    /// Symbols that actually traded participate in session averages.
    pub fn is_active(&self) -> bool {
        self.trade_count > 0
    }
}

/// Session-wide aggregates over all finalized cycles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleStats {
    pub cycle_count: usize,
    pub avg_cycle_pnl: f64,
    pub avg_cycle_win_rate: f64,
    pub avg_cycle_drawdown: f64,
    pub avg_trades_per_cycle: f64,
    pub avg_bars_held: f64,
}

impl CycleStats {
    pub fn from_symbols(symbols: &[SymbolResult]) -> Self {
        let cycles: Vec<&CycleResult> = symbols.iter().flat_map(|s| s.cycles.iter()).collect();
        let n = cycles.len() as f64;
        let trade_total: usize = cycles.iter().map(|c| c.trade_count).sum();
        let bars_held_total: f64 = cycles
            .iter()
            .map(|c| c.avg_bars_held * c.trade_count as f64)
            .sum();

        Self {
            cycle_count: cycles.len(),
            avg_cycle_pnl: safe_ratio(cycles.iter().map(|c| c.pnl_sum).sum(), n),
            avg_cycle_win_rate: safe_ratio(cycles.iter().map(|c| c.win_rate).sum(), n),
            avg_cycle_drawdown: safe_ratio(cycles.iter().map(|c| c.max_drawdown).sum(), n),
            avg_trades_per_cycle: safe_ratio(trade_total as f64, n),
            avg_bars_held: safe_ratio(bars_held_total, trade_total as f64),
        }
    }
}

/// Best/worst agent entry for the session digest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentRanking {
    pub symbol: String,
    pub pnl_pct: f64,
}

/// One full parallel run across all configured symbols. Assembled once
/// every worker has resolved; read-only thereafter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub started_at: DateTime<Utc>,
    pub duration_secs: f64,
    pub initial_balance: f64,
    pub symbols: Vec<SymbolResult>,
    /// Mean pnl over symbols that traded; 0 when none did.
    pub global_pnl_avg_abs: f64,
    pub global_pnl_avg_pct: f64,
    pub global_win_rate: f64,
    pub trade_total: usize,
    pub win_total: usize,
    pub loss_total: usize,
    pub long_total: usize,
    pub short_total: usize,
    /// Worst symbol-level drawdown in the session
    pub max_drawdown: f64,
    pub cycle_stats: CycleStats,
    pub best_agent: Option<AgentRanking>,
    pub worst_agent: Option<AgentRanking>,
    /// True when any worker was cancelled or failed
    pub partial: bool,
}

/// True when `a` beats `b` for the best-agent slot: higher pnl, ties to
/// the higher trade count, then the alphabetically first symbol.
fn outranks(a: &SymbolResult, b: &SymbolResult) -> bool {
    if a.pnl_pct != b.pnl_pct {
        return a.pnl_pct > b.pnl_pct;
    }
    if a.trade_count != b.trade_count {
        return a.trade_count > b.trade_count;
    }
    a.symbol < b.symbol
}

/// True when `a` beats `b` for the worst-agent slot. Ties resolve the
/// same way as for best.
fn underranks(a: &SymbolResult, b: &SymbolResult) -> bool {
    if a.pnl_pct != b.pnl_pct {
        return a.pnl_pct < b.pnl_pct;
    }
    if a.trade_count != b.trade_count {
        return a.trade_count > b.trade_count;
    }
    a.symbol < b.symbol
}

fn ranking(result: &SymbolResult) -> AgentRanking {
    AgentRanking {
        symbol: result.symbol.clone(),
        pnl_pct: result.pnl_pct,
    }
}

impl SessionSummary {
    pub fn assemble(
        session_id: String,
        started_at: DateTime<Utc>,
        duration_secs: f64,
        initial_balance: f64,
        symbols: Vec<SymbolResult>,
    ) -> Self {
        let trade_total: usize = symbols.iter().map(|s| s.trade_count).sum();
        let win_total: usize = symbols.iter().map(|s| s.win_count).sum();
        let loss_total: usize = symbols.iter().map(|s| s.loss_count).sum();
        let long_total: usize = symbols.iter().map(|s| s.long_count).sum();
        let short_total: usize = symbols.iter().map(|s| s.short_count).sum();
        debug_assert_eq!(win_total + loss_total, trade_total);

        let active: Vec<&SymbolResult> = symbols.iter().filter(|s| s.is_active()).collect();
        let active_n = active.len() as f64;
        let global_pnl_avg_abs =
            finite_or_zero(safe_ratio(active.iter().map(|s| s.pnl_abs).sum(), active_n));
        let global_pnl_avg_pct =
            finite_or_zero(safe_ratio(active.iter().map(|s| s.pnl_pct).sum(), active_n));
        let global_win_rate = safe_ratio(win_total as f64, trade_total as f64);

        let max_drawdown = symbols
            .iter()
            .map(|s| s.max_drawdown)
            .fold(0.0_f64, f64::max);

        let mut best: Option<&SymbolResult> = None;
        let mut worst: Option<&SymbolResult> = None;
        for result in &symbols {
            if best.is_none_or(|b| outranks(result, b)) {
                best = Some(result);
            }
            if worst.is_none_or(|w| underranks(result, w)) {
                worst = Some(result);
            }
        }

        let partial = symbols.iter().any(|s| !s.status.is_completed());
        let cycle_stats = CycleStats::from_symbols(&symbols);

        Self {
            session_id,
            started_at,
            duration_secs,
            initial_balance,
            global_pnl_avg_abs,
            global_pnl_avg_pct,
            global_win_rate,
            trade_total,
            win_total,
            loss_total,
            long_total,
            short_total,
            max_drawdown: finite_or_zero(max_drawdown),
            cycle_stats,
            best_agent: best.map(ranking),
            worst_agent: worst.map(ranking),
            partial,
            symbols,
        }
    }
}
