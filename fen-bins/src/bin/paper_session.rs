//! Paper trading session driver.
//!
//! Wires the full stack together - event bus, paper gateway, OMS and the
//! signal adapter strategy - then drives it with a synthetic random-walk
//! bar stream and a small scripted rotation of decisions. Useful as a
//! smoke test of the whole pipeline and as a template for wiring a real
//! signal producer.

use anyhow::Result;
use clap::Parser;
use fen_bins::common::{init_logging, print_summary, CommonArgs};
use fen_core::data::{BarData, Decision, DecisionAction, SignalMap};
use fen_core::event::{
    Event, EventBus, EventData, EventHandler, EVENT_SIGNAL, EVENT_TIMER, EVENT_TRADE,
};
use fen_core::gateway::{Gateway, GatewayContext, PaperGateway, Setting};
use fen_core::oms::Oms;
use fen_strategies::{subscribe_signals, SignalStrategy, Strategy, TargetPositionCore};
use rand::Rng;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, SystemTime};
use tracing::{info, warn};

/// CLI arguments for the paper session.
#[derive(Parser, Debug)]
#[command(version, about = "Fen paper trading session")]
struct Args {
    #[command(flatten)]
    common: CommonArgs,

    /// Starting cash for the paper ledger
    #[arg(long, default_value = "100000")]
    initial_cash: f64,

    /// Comma-separated symbols to trade
    #[arg(long, value_delimiter = ',', default_value = "BTC/USDT,ETH/USDT")]
    symbols: Vec<String>,

    /// Number of bar rounds to run
    #[arg(long, default_value = "30")]
    rounds: u32,

    /// Milliseconds between bar rounds
    #[arg(long, default_value = "100")]
    bar_interval_ms: u64,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.common.log_level, args.common.json_logs);

    info!("=== Fen: paper trading session ===");
    info!("Symbols: {:?}", args.symbols);
    info!("Initial cash: {}", args.initial_cash);

    let bus = Arc::new(EventBus::new());
    let oms = Oms::new(&bus);
    let gateway = PaperGateway::new(Arc::clone(&bus));

    let mut setting = Setting::new();
    setting.insert("initial_cash".to_string(), args.initial_cash.into());
    gateway.connect(&setting)?;

    let core = TargetPositionCore::new(
        Arc::clone(&bus),
        Arc::clone(&gateway) as Arc<dyn Gateway>,
        Arc::clone(&oms),
        "paper-session",
        args.symbols.clone(),
    );
    let strategy = Arc::new(SignalStrategy::new(Arc::clone(&core), &Setting::new()));
    subscribe_signals(&bus, strategy as Arc<dyn Strategy>);

    // Keep the strategy's book in line with fills, acting as the trusted
    // observer of actual positions.
    {
        let core = Arc::clone(&core);
        let gateway = Arc::clone(&gateway);
        let handler: EventHandler = Arc::new(move |event: &Event| {
            if let EventData::Trade(trade) = &event.data {
                core.set_position(&trade.symbol, gateway.position(&trade.symbol));
            }
        });
        bus.register(EVENT_TRADE, handler);
    }

    // Periodic portfolio line driven by the bus timer.
    {
        let core = Arc::clone(&core);
        let handler: EventHandler = Arc::new(move |_event: &Event| {
            info!(
                "portfolio value: {} (cash available: {})",
                core.get_portfolio_value(),
                core.get_cash_available()
            );
        });
        bus.register(EVENT_TIMER, handler);
    }

    bus.start();

    let running = Arc::new(AtomicBool::new(true));
    {
        let running = Arc::clone(&running);
        ctrlc::set_handler(move || {
            warn!("Ctrl-C received, finishing up");
            running.store(false, Ordering::SeqCst);
        })?;
    }

    // Synthetic feed publishes through the same callbacks a market-data
    // gateway would use.
    let feed = GatewayContext::new(Arc::clone(&bus), "FEED");
    let mut prices: HashMap<String, Decimal> = args
        .symbols
        .iter()
        .map(|symbol| (symbol.clone(), dec!(100)))
        .collect();
    let mut rng = rand::thread_rng();

    for round in 0..args.rounds {
        if !running.load(Ordering::SeqCst) {
            break;
        }

        for symbol in &args.symbols {
            let price = prices
                .entry(symbol.clone())
                .or_insert(dec!(100));
            let drift = Decimal::from_f64(rng.gen_range(-0.8..0.8)).unwrap_or_default();
            *price = (*price + drift).max(dec!(1));

            feed.on_bar(BarData {
                symbol: symbol.clone(),
                timestamp: SystemTime::now(),
                open: *price - drift,
                high: (*price).max(*price - drift),
                low: (*price).min(*price - drift),
                close: *price,
                volume: Decimal::from(rng.gen_range(100u32..10_000)),
            });
        }

        // Every few rounds the scripted producer rotates through a small
        // buy / hold / sell cycle on the first symbol.
        if round % 5 == 0 {
            if let Some(symbol) = args.symbols.first() {
                let decision = match (round / 5) % 3 {
                    0 => Decision::new(DecisionAction::Buy, dec!(10), 75),
                    1 => Decision::hold(),
                    _ => Decision::new(DecisionAction::Sell, dec!(10), 60),
                };
                info!("decision for {symbol}: {:?}", decision.action);

                let mut decisions = SignalMap::new();
                decisions.insert(symbol.clone(), decision);
                bus.put(Event::new(EVENT_SIGNAL, EventData::Signal(decisions)));
            }
        }

        thread::sleep(Duration::from_millis(args.bar_interval_ms));
    }

    // Let the queue drain before reading the final snapshot.
    thread::sleep(Duration::from_millis(200));
    gateway.query_position();
    gateway.query_account();
    thread::sleep(Duration::from_millis(100));

    print_summary(&gateway, &oms, &args.symbols);

    bus.stop();
    info!("clean shutdown");
    Ok(())
}
