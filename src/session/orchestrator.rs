use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tracing::warn;

use crate::domain::{AgentConfig, Candle, EquityPoint, Symbol, Trade};
use crate::session::results::{AgentStatus, SessionSummary, SymbolResult};
use crate::sim::engine::SymbolSimulator;
use crate::sim::strategy::Strategy;

/// Session-level configuration shared read-only with every worker.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub symbols: Vec<String>,
    pub agent: AgentConfig,
    pub cycle_bars: usize,
    pub seed: u64,
    /// Wall-clock budget for the whole session; workers past it are
    /// cancelled and their partial results kept.
    pub timeout: Option<Duration>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            symbols: Vec::new(),
            agent: AgentConfig::default(),
            cycle_bars: 500,
            seed: 42,
            timeout: None,
        }
    }
}

/// Per-symbol detail kept next to the summary for the full artifact.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SymbolDetail {
    pub symbol: String,
    pub trades: Vec<Trade>,
    pub equity: Vec<EquityPoint>,
}

/// What a session run hands back: the stable summary plus trade-level
/// detail for symbols whose workers resolved normally.
#[derive(Debug, Clone)]
pub struct SessionOutcome {
    pub summary: SessionSummary,
    pub details: Vec<SymbolDetail>,
}

/// Each worker's seed is derived from the session seed and the symbol
/// name with FNV-1a, so the mapping is stable across runs and platforms.
fn worker_seed(base: u64, symbol: &str) -> u64 {
    let mut hash = 0xcbf2_9ce4_8422_2325_u64;
    for byte in symbol.bytes() {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash ^ base
}

/// Run one parallel session: one independent worker per symbol, no
/// shared mutable state between them, joined regardless of completion
/// order. A failing or panicking worker costs only its own symbol.
///
/// `make_strategy` is called once per symbol with the derived worker
/// seed; signal generation itself lives behind the [`Strategy`] trait.
pub async fn run_session<S, F>(
    config: &SessionConfig,
    data: &HashMap<String, Arc<Vec<Candle>>>,
    make_strategy: F,
) -> SessionOutcome
where
    S: Strategy + Send + 'static,
    F: Fn(&str, u64) -> S,
{
    let started_at = Utc::now();
    let session_id = started_at.format("%Y%m%d_%H%M%S").to_string();
    let clock = std::time::Instant::now();

    let (cancel_tx, cancel_rx) = watch::channel(false);

    let mut handles = Vec::new();
    for symbol in &config.symbols {
        let Some(bars) = data.get(symbol) else {
            continue;
        };
        let strategy = make_strategy(symbol, worker_seed(config.seed, symbol));
        let simulator = SymbolSimulator::new(
            Symbol(symbol.clone()),
            config.agent.clone(),
            strategy,
            config.cycle_bars,
        )
        .with_cancel(cancel_rx.clone());
        let bars = Arc::clone(bars);
        let handle = tokio::task::spawn_blocking(move || simulator.run(&bars));
        handles.push((symbol.clone(), handle));
    }

    if let Some(timeout) = config.timeout {
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            let _ = cancel_tx.send(true);
        });
    }

    let mut resolved: HashMap<String, (SymbolResult, SymbolDetail)> = HashMap::new();
    for (symbol, handle) in handles {
        match handle.await {
            Ok(outcome) => {
                let detail = SymbolDetail {
                    symbol: symbol.clone(),
                    trades: outcome.trades,
                    equity: outcome.equity,
                };
                resolved.insert(symbol, (outcome.result, detail));
            }
            Err(err) => {
                warn!(symbol = %symbol, error = %err, "symbol worker crashed");
                let result = SymbolResult::zero_trade(
                    &symbol,
                    config.agent.initial_balance,
                    AgentStatus::Failed,
                    vec![format!("worker crashed: {}", err)],
                );
                let detail = SymbolDetail {
                    symbol: symbol.clone(),
                    trades: Vec::new(),
                    equity: Vec::new(),
                };
                resolved.insert(symbol, (result, detail));
            }
        }
    }

    // Assemble in the configured symbol order, independent of worker
    // completion order. Symbols without bar data are flagged here.
    let mut symbols = Vec::with_capacity(config.symbols.len());
    let mut details = Vec::new();
    for symbol in &config.symbols {
        match resolved.remove(symbol) {
            Some((result, detail)) => {
                symbols.push(result);
                details.push(detail);
            }
            None => {
                warn!(symbol = %symbol, "no bar data for symbol");
                symbols.push(SymbolResult::zero_trade(
                    symbol,
                    config.agent.initial_balance,
                    AgentStatus::Failed,
                    vec!["no bar data available".to_string()],
                ));
            }
        }
    }

    let summary = SessionSummary::assemble(
        session_id,
        started_at,
        clock.elapsed().as_secs_f64(),
        config.agent.initial_balance,
        symbols,
    );

    SessionOutcome { summary, details }
}
