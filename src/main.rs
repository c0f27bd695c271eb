use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use colmena::data;
use colmena::domain::{AgentConfig, Candle};
use colmena::session::{print_summary, run_session, write_artifacts, SessionConfig};
use colmena::sim::SmaCross;

#[derive(Parser)]
#[command(name = "colmena", about = "Parallel multi-agent crypto training system")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Run a parallel training session across all configured symbols
    Train {
        #[arg(
            short,
            long,
            default_value = "BTCUSDT,ETHUSDT,SOLUSDT,BNBUSDT,XRPUSDT,DOGEUSDT,AVAXUSDT,LINKUSDT"
        )]
        symbols: String,
        /// Initial balance per agent
        #[arg(short, long, default_value = "1000")]
        balance: f64,
        #[arg(short, long, default_value = "500")]
        cycle_bars: usize,
        #[arg(long)]
        timeout_secs: Option<u64>,
        #[arg(long, default_value = "42")]
        seed: u64,
        #[arg(short, long, default_value = "data")]
        data_dir: String,
        #[arg(short, long, default_value = "results")]
        out_dir: String,
    },
    /// Generate seeded synthetic bar files for a symbol list
    Generate {
        #[arg(
            short,
            long,
            default_value = "BTCUSDT,ETHUSDT,SOLUSDT,BNBUSDT,XRPUSDT,DOGEUSDT,AVAXUSDT,LINKUSDT"
        )]
        symbols: String,
        #[arg(short, long, default_value = "3000")]
        bars: usize,
        #[arg(long, default_value = "42")]
        seed: u64,
        #[arg(short, long, default_value = "data")]
        data_dir: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Train {
            symbols,
            balance,
            cycle_bars,
            timeout_secs,
            seed,
            data_dir,
            out_dir,
        } => {
            run_train(
                &symbols,
                balance,
                cycle_bars,
                timeout_secs,
                seed,
                &data_dir,
                &out_dir,
            )
            .await?;
        }
        Commands::Generate {
            symbols,
            bars,
            seed,
            data_dir,
        } => {
            run_generate(&symbols, bars, seed, &data_dir)?;
        }
    }

    Ok(())
}

fn run_generate(
    symbols: &str,
    bars: usize,
    seed: u64,
    data_dir: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    std::fs::create_dir_all(data_dir)?;
    for (i, symbol) in symbols.split(',').enumerate() {
        let start_price = 10.0 * (i as f64 + 1.0);
        let series = data::generate_bars(bars, start_price, seed.wrapping_add(i as u64));
        let path = data::bars_path(symbol, data_dir);
        data::save_bars(&series, &path)?;
        println!("Generated {} bars for {} at {}", series.len(), symbol, path);
    }
    Ok(())
}

async fn run_train(
    symbols_str: &str,
    balance: f64,
    cycle_bars: usize,
    timeout_secs: Option<u64>,
    seed: u64,
    data_dir: &str,
    out_dir: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let symbols: Vec<String> = symbols_str.split(',').map(|s| s.to_string()).collect();

    println!("=== Colmena Parallel Training ===");
    println!("Symbols: {:?}", symbols);
    println!(
        "Balance: ${} per agent, cycle: {} bars, seed: {}",
        balance, cycle_bars, seed
    );

    // Load whatever bar data is available; symbols without data are
    // flagged in the summary instead of aborting the session.
    let mut bar_data: HashMap<String, Arc<Vec<Candle>>> = HashMap::new();
    for symbol in &symbols {
        let path = data::bars_path(symbol, data_dir);
        match data::load_bars(&path) {
            Ok(bars) => {
                println!("{}: {} bars loaded", symbol, bars.len());
                bar_data.insert(symbol.clone(), Arc::new(bars));
            }
            Err(err) => {
                eprintln!("  Warning: no data for {}: {}", symbol, err);
            }
        }
    }

    let config = SessionConfig {
        symbols,
        agent: AgentConfig {
            initial_balance: balance,
            ..AgentConfig::default()
        },
        cycle_bars,
        seed,
        timeout: timeout_secs.map(Duration::from_secs),
    };

    let outcome = run_session(&config, &bar_data, |_, worker_seed| {
        SmaCross::new(10, 30, worker_seed)
    })
    .await;

    print_summary(&outcome.summary);

    let out_path = PathBuf::from(out_dir);
    let artifacts = write_artifacts(&outcome.summary, &outcome.details, &out_path)?;
    println!("Artifacts written to {}:", out_path.display());
    for name in &artifacts {
        println!("  {}", name);
    }

    Ok(())
}
