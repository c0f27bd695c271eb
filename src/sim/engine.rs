use crate::cycle::{CycleAccumulator, CycleResult};
use crate::domain::{AgentConfig, Candle, EquityPoint, Side, Symbol, Trade};
use crate::metrics::safe_ratio;
use crate::session::results::{AgentStatus, SymbolResult};
use crate::sim::account::Account;
use crate::sim::strategy::{Signal, Strategy};
use tokio::sync::watch;

/// Everything one agent's run produced: the finalized result plus the
/// full trade log and equity curve for the detailed artifact.
#[derive(Debug, Clone)]
pub struct SymbolOutcome {
    pub result: SymbolResult,
    pub trades: Vec<Trade>,
    pub equity: Vec<EquityPoint>,
}

/// Runs one symbol's simulation over a bar stream.
///
/// Bars are processed strictly in time order; the running balance and
/// drawdown are path-dependent, so a later bar is never evaluated before
/// an earlier one settles. The simulator performs no I/O and holds no
/// state shared with other agents. Identical bars and strategy seed
/// reproduce the identical trade sequence.
pub struct SymbolSimulator<S> {
    symbol: Symbol,
    config: AgentConfig,
    strategy: S,
    cycle_bars: usize,
    cancel: Option<watch::Receiver<bool>>,
}

impl<S: Strategy> SymbolSimulator<S> {
    pub fn new(symbol: Symbol, config: AgentConfig, strategy: S, cycle_bars: usize) -> Self {
        Self {
            symbol,
            config,
            strategy,
            cycle_bars,
            cancel: None,
        }
    }

    /// Attach the session cancel signal; checked between bars.
    pub fn with_cancel(mut self, cancel: watch::Receiver<bool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn run(mut self, bars: &[Candle]) -> SymbolOutcome {
        let initial = self.config.initial_balance;

        // An empty or warmup-short stream is not an error: the agent
        // simply reports zero trades.
        if bars.len() <= self.config.warmup {
            return SymbolOutcome {
                result: SymbolResult::zero_trade(
                    &self.symbol.0,
                    initial,
                    AgentStatus::Completed,
                    Vec::new(),
                ),
                trades: Vec::new(),
                equity: Vec::new(),
            };
        }

        // Data gap guard: a stream that runs backwards in time is
        // rejected up front and the agent is skipped with a warning.
        for i in 1..bars.len() {
            if bars[i].open_time < bars[i - 1].open_time {
                return SymbolOutcome {
                    result: SymbolResult::zero_trade(
                        &self.symbol.0,
                        initial,
                        AgentStatus::Failed,
                        vec![format!("non-monotonic bar stream at index {}", i)],
                    ),
                    trades: Vec::new(),
                    equity: Vec::new(),
                };
            }
        }

        let mut account = Account::new(self.config.clone());
        let mut accumulator = CycleAccumulator::new(self.cycle_bars);
        let mut trades: Vec<Trade> = Vec::new();
        let mut cycles: Vec<CycleResult> = Vec::new();
        let mut warnings: Vec<String> = Vec::new();
        let mut status = AgentStatus::Completed;
        let mut last_good: Option<usize> = None;

        let mut equity = vec![EquityPoint {
            timestamp: bars[0].open_time,
            balance: initial,
        }];
        accumulator.observe_balance(initial);

        for i in self.config.warmup..bars.len() {
            if let Some(cancel) = &self.cancel {
                if *cancel.borrow() {
                    status = AgentStatus::Cancelled;
                    break;
                }
            }

            let bar = &bars[i];
            if !bar.is_finite() {
                warnings.push(format!("non-finite bar at index {}", i));
                status = AgentStatus::Failed;
                break;
            }
            last_good = Some(i);

            match self.strategy.on_bar(&bars[..=i], account.side()) {
                Signal::Long => {
                    account.open(Side::Long, bar.close, bar.close_time, i);
                }
                Signal::Short => {
                    account.open(Side::Short, bar.close, bar.close_time, i);
                }
                Signal::Close => {
                    if let Some(trade) = account.close(&self.symbol, bar.close, bar.close_time, i) {
                        accumulator.record_trade(&trade);
                        trades.push(trade);
                    }
                }
                Signal::Hold => {}
            }

            let marked = account.mark(bar.close);
            equity.push(EquityPoint {
                timestamp: bar.close_time,
                balance: marked,
            });
            accumulator.observe_balance(marked);

            if let Some(cycle) = accumulator.on_bar() {
                cycles.push(cycle);
            }
        }

        // Force-close a leftover position at the last bar that was
        // actually processed.
        if account.has_position() {
            if let Some(i) = last_good {
                let bar = &bars[i];
                if let Some(trade) = account.close(&self.symbol, bar.close, bar.close_time, i) {
                    accumulator.record_trade(&trade);
                    accumulator.observe_balance(account.balance);
                    equity.push(EquityPoint {
                        timestamp: bar.close_time,
                        balance: account.balance,
                    });
                    trades.push(trade);
                }
            }
        }

        if let Some(tail) = accumulator.finish() {
            cycles.push(tail);
        }

        let tally = accumulator.metrics().lifetime();
        let final_balance = account.balance;
        let result = SymbolResult {
            symbol: self.symbol.0.clone(),
            status,
            initial_balance: initial,
            final_balance,
            pnl_abs: final_balance - initial,
            pnl_pct: safe_ratio(final_balance - initial, initial) * 100.0,
            trade_count: tally.trades,
            win_count: tally.wins,
            loss_count: tally.losses,
            long_count: tally.longs,
            short_count: tally.shorts,
            win_rate: tally.win_rate(),
            max_drawdown: accumulator.metrics().lifetime_drawdown().max_drawdown(),
            cycles,
            warnings,
        };
        debug_assert_eq!(result.win_count + result.loss_count, result.trade_count);
        debug_assert!(result.max_drawdown >= 0.0);

        SymbolOutcome {
            result,
            trades,
            equity,
        }
    }
}
