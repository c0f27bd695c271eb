use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use serde::Serialize;

use crate::session::orchestrator::SymbolDetail;
use crate::session::results::{AgentStatus, SessionSummary};

/// Full-detail artifact: the summary plus every trade and equity sample.
#[derive(Serialize)]
struct CompleteResults<'a> {
    session: &'a SessionSummary,
    details: &'a [SymbolDetail],
}

/// Abbreviated artifact for quick status checks.
#[derive(Serialize)]
struct SummarySnapshot<'a> {
    session_id: &'a str,
    started_at: chrono::DateTime<chrono::Utc>,
    duration_secs: f64,
    symbol_count: usize,
    trade_total: usize,
    win_total: usize,
    loss_total: usize,
    global_win_rate: f64,
    global_pnl_avg_abs: f64,
    global_pnl_avg_pct: f64,
    max_drawdown: f64,
    best_agent: Option<&'a crate::session::results::AgentRanking>,
    worst_agent: Option<&'a crate::session::results::AgentRanking>,
    partial: bool,
}

/// Write the per-session artifact pair and return the generated file
/// names: `complete_results_<id>.json` and `summary_<id>.json`.
pub fn write_artifacts(
    summary: &SessionSummary,
    details: &[SymbolDetail],
    out_dir: &Path,
) -> Result<Vec<String>, Box<dyn std::error::Error>> {
    std::fs::create_dir_all(out_dir)?;

    let complete_name = format!("complete_results_{}.json", summary.session_id);
    let file = File::create(out_dir.join(&complete_name))?;
    serde_json::to_writer_pretty(BufWriter::new(file), &CompleteResults { session: summary, details })?;

    let snapshot = SummarySnapshot {
        session_id: &summary.session_id,
        started_at: summary.started_at,
        duration_secs: summary.duration_secs,
        symbol_count: summary.symbols.len(),
        trade_total: summary.trade_total,
        win_total: summary.win_total,
        loss_total: summary.loss_total,
        global_win_rate: summary.global_win_rate,
        global_pnl_avg_abs: summary.global_pnl_avg_abs,
        global_pnl_avg_pct: summary.global_pnl_avg_pct,
        max_drawdown: summary.max_drawdown,
        best_agent: summary.best_agent.as_ref(),
        worst_agent: summary.worst_agent.as_ref(),
        partial: summary.partial,
    };
    let summary_name = format!("summary_{}.json", summary.session_id);
    let file = File::create(out_dir.join(&summary_name))?;
    serde_json::to_writer_pretty(BufWriter::new(file), &snapshot)?;

    Ok(vec![complete_name, summary_name])
}

fn status_label(status: AgentStatus) -> &'static str {
    match status {
        AgentStatus::Completed => "ok",
        AgentStatus::Cancelled => "cancelled",
        AgentStatus::Failed => "failed",
    }
}

/// Console digest of a finished session.
pub fn print_summary(summary: &SessionSummary) {
    println!("\n{}", "=".repeat(70));
    println!("  SESSION RESULTS  {}", summary.session_id);
    println!("{}", "=".repeat(70));
    println!("  Duration:             {:>10.1}s", summary.duration_secs);
    println!("  Symbols:              {:>10}", summary.symbols.len());
    println!(
        "  Initial Balance:      ${:>10.2} per agent",
        summary.initial_balance
    );
    if summary.partial {
        println!("  NOTE: partial session (cancelled or failed workers)");
    }

    println!("\n  --- Global ---");
    println!(
        "  Avg PnL per Agent:    ${:>+10.2} ({:+.2}%)",
        summary.global_pnl_avg_abs, summary.global_pnl_avg_pct
    );
    println!(
        "  Global Win Rate:      {:>9.1}%",
        summary.global_win_rate * 100.0
    );
    println!("  Total Trades:         {:>10}", summary.trade_total);
    println!(
        "  Winning / Losing:     {:>6} / {}",
        summary.win_total, summary.loss_total
    );
    println!(
        "  Long / Short:         {:>6} / {}",
        summary.long_total, summary.short_total
    );
    println!(
        "  Max Drawdown:         {:>9.2}%",
        summary.max_drawdown * 100.0
    );

    let cycles = &summary.cycle_stats;
    if cycles.cycle_count > 0 {
        println!("\n  --- Cycles ---");
        println!("  Cycles:               {:>10}", cycles.cycle_count);
        println!("  Avg Cycle PnL:        ${:>+10.2}", cycles.avg_cycle_pnl);
        println!(
            "  Avg Cycle Win Rate:   {:>9.1}%",
            cycles.avg_cycle_win_rate * 100.0
        );
        println!(
            "  Avg Cycle Drawdown:   {:>9.2}%",
            cycles.avg_cycle_drawdown * 100.0
        );
        println!(
            "  Avg Trades per Cycle: {:>10.1}",
            cycles.avg_trades_per_cycle
        );
        println!("  Avg Bars Held:        {:>10.1}", cycles.avg_bars_held);
    }

    println!("\n  --- Top Performers ---");
    match &summary.best_agent {
        Some(best) => println!("  Best:   {:10} {:>+7.2}%", best.symbol, best.pnl_pct),
        None => println!("  Best:   n/a"),
    }
    match &summary.worst_agent {
        Some(worst) => println!("  Worst:  {:10} {:>+7.2}%", worst.symbol, worst.pnl_pct),
        None => println!("  Worst:  n/a"),
    }

    println!(
        "\n  {:10} {:>10} {:>8} {:>7} {:>7} {:>7}  {}",
        "Symbol", "PnL $", "PnL %", "Trades", "WinR%", "MaxDD%", "Status"
    );
    for result in &summary.symbols {
        println!(
            "  {:10} {:>+10.2} {:>+7.2}% {:>7} {:>6.1}% {:>6.2}%  {}",
            result.symbol,
            result.pnl_abs,
            result.pnl_pct,
            result.trade_count,
            result.win_rate * 100.0,
            result.max_drawdown * 100.0,
            status_label(result.status)
        );
    }
    println!("{}\n", "=".repeat(70));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::results::SymbolResult;
    use chrono::Utc;

    fn degenerate_summary() -> SessionSummary {
        // One active agent among idle ones; the global block must stay
        // finite.
        let mut active = SymbolResult::zero_trade("XRPUSDT", 1_000.0, AgentStatus::Completed, vec![]);
        active.trade_count = 9;
        active.win_count = 5;
        active.loss_count = 4;
        active.long_count = 6;
        active.short_count = 3;
        active.win_rate = 5.0 / 9.0;
        active.final_balance = 1_032.0;
        active.pnl_abs = 32.0;
        active.pnl_pct = 3.2;
        active.max_drawdown = 0.021;

        let symbols = vec![
            active,
            SymbolResult::zero_trade("PEPEUSDT", 1_000.0, AgentStatus::Completed, vec![]),
            SymbolResult::zero_trade("SHIBUSDT", 1_000.0, AgentStatus::Completed, vec![]),
        ];
        SessionSummary::assemble("20260805_120000".into(), Utc::now(), 12.5, 1_000.0, symbols)
    }

    #[test]
    fn test_write_artifacts_creates_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let summary = degenerate_summary();
        let names = write_artifacts(&summary, &[], dir.path()).unwrap();

        assert_eq!(
            names,
            vec![
                "complete_results_20260805_120000.json".to_string(),
                "summary_20260805_120000.json".to_string(),
            ]
        );
        for name in &names {
            assert!(dir.path().join(name).exists());
        }
    }

    #[test]
    fn test_artifacts_never_contain_non_finite_tokens() {
        let dir = tempfile::tempdir().unwrap();
        let summary = degenerate_summary();
        let names = write_artifacts(&summary, &[], dir.path()).unwrap();

        for name in &names {
            let text = std::fs::read_to_string(dir.path().join(name)).unwrap();
            let lowered = text.to_lowercase();
            assert!(!lowered.contains("nan"), "{} contains nan", name);
            assert!(!lowered.contains("inf"), "{} contains inf", name);
        }
    }

    #[test]
    fn test_snapshot_is_parseable_and_abbreviated() {
        let dir = tempfile::tempdir().unwrap();
        let summary = degenerate_summary();
        let names = write_artifacts(&summary, &[], dir.path()).unwrap();

        let text = std::fs::read_to_string(dir.path().join(&names[1])).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["session_id"], "20260805_120000");
        assert_eq!(value["trade_total"], 9);
        assert_eq!(value["symbol_count"], 3);
        assert_eq!(value["best_agent"]["symbol"], "XRPUSDT");
        assert!(value.get("symbols").is_none(), "snapshot omits per-symbol detail");
    }

    #[test]
    fn test_complete_results_carry_cycles_and_details() {
        let dir = tempfile::tempdir().unwrap();
        let summary = degenerate_summary();
        let details = vec![SymbolDetail {
            symbol: "XRPUSDT".into(),
            trades: Vec::new(),
            equity: Vec::new(),
        }];
        let names = write_artifacts(&summary, &details, dir.path()).unwrap();

        let text = std::fs::read_to_string(dir.path().join(&names[0])).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert!(value["session"]["symbols"].is_array());
        assert_eq!(value["details"][0]["symbol"], "XRPUSDT");
    }

    #[test]
    fn test_print_summary_smoke() {
        print_summary(&degenerate_summary());
    }
}
