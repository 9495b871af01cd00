use anyhow::Result;
use chrono::Utc;
use celsius_signals::config::{Config, EnvConfig};
use celsius_signals::data::bracket::BracketParser;
use celsius_signals::data::snapshot::MarketSnapshot;
use celsius_signals::execution::persistence::SignalStore;
use celsius_signals::execution::risk::{RiskState, RiskTracker};
use celsius_signals::execution::simulator::PaperTradingSimulator;
use celsius_signals::monitoring::logger::CsvLogger;
use celsius_signals::strategies::weather_edge::{ScanContext, SignalGenerator};
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    tracing::info!("🚀 Celsius signal generator starting...");

    let env_config = EnvConfig::load();
    tracing::info!("Loading configuration: {}", env_config.config_path);
    let config = Config::load(&env_config.config_path)?;
    let dry_run = env_config.dry_run.unwrap_or(config.system.dry_run);

    tracing::info!("Dry run mode: {}", dry_run);
    tracing::info!("Paper trading: {}", config.paper_trading.enabled);
    tracing::info!("Bankroll: ${:.2}", config.risk.bankroll);

    tracing::info!("Initializing database: {}", config.system.database_path);
    let store = SignalStore::new(&config.system.database_path)?;
    tracing::info!("Open positions: {}", store.count_open_positions()?);

    let csv = if config.monitoring.csv_logging {
        Some(CsvLogger::new(config.monitoring.csv_log_path.clone())?)
    } else {
        None
    };

    let parser = BracketParser::with_default_cities()?;
    let generator = SignalGenerator::new(config.pipeline(), parser);
    let tracker = RiskTracker::new(config.risk.clone());
    // Settlement feedback arrives from outside this process; start from a clean state.
    let risk = RiskState::default();
    let mut simulator =
        PaperTradingSimulator::new(config.paper_trading.clone(), config.risk.bankroll);

    let mut interval = tokio::time::interval(Duration::from_secs(config.system.scan_interval_secs));

    tracing::info!("✅ Initialized, scanning every {}s", config.system.scan_interval_secs);

    loop {
        tokio::select! {
            _ = interval.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutting down...");
                break;
            }
        }

        let snapshot = match MarketSnapshot::load(&config.system.snapshot_path) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!("Snapshot unavailable, skipping cycle: {:#}", e);
                continue;
            }
        };
        let (markets, forecasts) = snapshot.into_parts();
        let open_positions = store.open_positions()?;

        let outcome = generator.generate(
            &markets,
            &forecasts,
            &open_positions,
            &risk,
            &ScanContext::at(Utc::now()),
        )?;

        for signal in &outcome.signals {
            store.insert_signal(signal)?;

            if let Some(csv) = &csv {
                csv.log_signal(signal)?;
            }

            if dry_run && config.paper_trading.enabled {
                if let Err(e) = tracker.validate_signal(&risk, signal, simulator.balance()) {
                    tracing::warn!("Signal {} rejected: {}", signal.id, e);
                    continue;
                }
                simulator.execute_signal(signal);
            }
        }

        tracing::info!(
            "Cycle done: {} signals, paper balance ${:.2}",
            outcome.signals.len(),
            simulator.balance()
        );
    }

    Ok(())
}
