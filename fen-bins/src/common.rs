//! Common CLI arguments, logging setup and summary printing.

use clap::Args;
use fen_core::gateway::PaperGateway;
use fen_core::oms::Oms;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Arguments shared by every fen binary.
#[derive(Args, Debug)]
pub struct CommonArgs {
    /// Log level filter (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Emit JSON log lines instead of human-readable output
    #[arg(long)]
    pub json_logs: bool,
}

/// Initialize tracing. `RUST_LOG` wins over the CLI level when set.
pub fn init_logging(log_level: &str, json_logs: bool) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    if json_logs {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_target(true).with_thread_ids(true))
            .init();
    }
}

/// Log the end-of-session account and order summary.
pub fn print_summary(gateway: &PaperGateway, oms: &Oms, symbols: &[String]) {
    info!("Session summary:");
    info!("  - Cash: {}", gateway.cash());
    for symbol in symbols {
        let volume = gateway.position(symbol);
        if !volume.is_zero() {
            info!(
                "  - {}: {} @ avg {}",
                symbol,
                volume,
                gateway.avg_price(symbol)
            );
        }
    }
    info!("  - Orders: {}", oms.get_all_orders().len());
    info!("  - Still working: {}", oms.get_all_active_orders().len());
    info!("  - Trades: {}", oms.get_all_trades().len());
    if let Some(account) = oms.get_account() {
        info!("  - Account balance: {}", account.balance);
    }
}
