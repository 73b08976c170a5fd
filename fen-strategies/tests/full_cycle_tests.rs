//! Full stack round trip: signal -> strategy -> gateway -> bus -> OMS.

mod common;

use common::settle;
use fen_core::core::{Direction, Status};
use fen_core::data::{BarData, Decision, DecisionAction, SignalMap};
use fen_core::event::{Event, EventBus, EventData, EVENT_BAR, EVENT_SIGNAL};
use fen_core::gateway::{Gateway, PaperGateway, Setting};
use fen_core::oms::Oms;
use fen_strategies::{subscribe_signals, SignalStrategy, Strategy, TargetPositionCore};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

fn bar(symbol: &str, close: Decimal) -> BarData {
    BarData {
        symbol: symbol.to_string(),
        timestamp: SystemTime::now(),
        open: close,
        high: close,
        low: close,
        close,
        volume: dec!(5000),
    }
}

#[test]
fn test_buy_then_sell_full_cycle() {
    let bus = Arc::new(EventBus::with_interval(Duration::from_secs(60)));
    let oms = Oms::new(&bus);
    let gateway = PaperGateway::new(Arc::clone(&bus));

    let mut setting = Setting::new();
    setting.insert("initial_cash".to_string(), 10_000.0.into());
    gateway.connect(&setting).unwrap();

    let core = TargetPositionCore::new(
        Arc::clone(&bus),
        Arc::clone(&gateway) as Arc<dyn Gateway>,
        Arc::clone(&oms),
        "llm-crypto",
        vec!["BTC/USDT".to_string()],
    );
    let strategy = Arc::new(SignalStrategy::new(Arc::clone(&core), &Setting::new()));
    subscribe_signals(&bus, Arc::clone(&strategy) as Arc<dyn Strategy>);

    bus.start();

    // Market data first, then a buy decision for 0.1 BTC.
    bus.put(Event::new(EVENT_BAR, EventData::Bar(bar("BTC/USDT", dec!(50_000)))));
    let mut decisions = SignalMap::new();
    decisions.insert(
        "BTC/USDT".to_string(),
        Decision::new(DecisionAction::Buy, dec!(0.1), 80),
    );
    bus.put(Event::new(EVENT_SIGNAL, EventData::Signal(decisions)));
    settle(&bus);

    // The buy limit (50_000 * 1.001 = 50_050) crossed immediately.
    let long = oms.get_position_by_symbol("BTC/USDT", Direction::Long).unwrap();
    assert_eq!(long.volume, dec!(0.1));
    assert_eq!(long.avg_price, dec!(50_050));
    assert_eq!(gateway.position("BTC/USDT"), dec!(0.1));
    assert_eq!(gateway.cash(), dec!(10_000) - dec!(5_005));
    assert_eq!(oms.get_account().unwrap().balance, dec!(4_995));
    assert!(core.active_orderids().is_empty());

    // The strategy's book reflects the fill before the next decision.
    core.set_position("BTC/USDT", dec!(0.1));

    // Price moves up; the producer takes profit on the whole position.
    bus.put(Event::new(EVENT_BAR, EventData::Bar(bar("BTC/USDT", dec!(52_000)))));
    let mut decisions = SignalMap::new();
    decisions.insert(
        "BTC/USDT".to_string(),
        Decision::new(DecisionAction::Sell, dec!(0.1), 90),
    );
    bus.put(Event::new(EVENT_SIGNAL, EventData::Signal(decisions)));
    settle(&bus);

    // Sell limit at 52_000 * 0.999 = 51_948 fills at the limit.
    assert_eq!(gateway.position("BTC/USDT"), Decimal::ZERO);
    assert_eq!(gateway.cash(), dec!(4_995) + dec!(0.1) * dec!(51_948));

    let orders = oms.get_all_orders();
    assert_eq!(orders.len(), 2);
    assert!(orders.iter().all(|o| o.status == Status::AllTraded));
    assert_eq!(oms.get_all_trades().len(), 2);
    assert!(oms.get_all_active_orders().is_empty());

    // Position accounting is per-direction aggregation, not netting: the
    // close accrued on the short side, so both legs show 0.1 and the
    // advisory portfolio value still carries the long leg at the last
    // close.
    let long = oms.get_position_by_symbol("BTC/USDT", Direction::Long).unwrap();
    let short = oms.get_position_by_symbol("BTC/USDT", Direction::Short).unwrap();
    assert_eq!(long.volume, dec!(0.1));
    assert_eq!(short.volume, dec!(0.1));
    assert_eq!(short.avg_price, dec!(51_948));
    assert_eq!(
        core.get_portfolio_value(),
        gateway.cash() + dec!(0.1) * dec!(52_000)
    );

    bus.stop();
}

#[test]
fn test_portfolio_value_tracks_open_position() {
    let bus = Arc::new(EventBus::with_interval(Duration::from_secs(60)));
    let oms = Oms::new(&bus);
    let gateway = PaperGateway::new(Arc::clone(&bus));

    let mut setting = Setting::new();
    setting.insert("initial_cash".to_string(), 10_000.0.into());
    gateway.connect(&setting).unwrap();

    let core = TargetPositionCore::new(
        Arc::clone(&bus),
        Arc::clone(&gateway) as Arc<dyn Gateway>,
        Arc::clone(&oms),
        "llm-crypto",
        vec!["ETH/USDT".to_string()],
    );
    let strategy = Arc::new(SignalStrategy::new(Arc::clone(&core), &Setting::new()));
    subscribe_signals(&bus, strategy as Arc<dyn Strategy>);

    bus.start();

    bus.put(Event::new(EVENT_BAR, EventData::Bar(bar("ETH/USDT", dec!(2_000)))));
    let mut decisions = SignalMap::new();
    decisions.insert(
        "ETH/USDT".to_string(),
        Decision::new(DecisionAction::Buy, dec!(1), 70),
    );
    bus.put(Event::new(EVENT_SIGNAL, EventData::Signal(decisions)));
    settle(&bus);

    // Filled 1 ETH at 2_002; a new bar reprices the holding.
    bus.put(Event::new(EVENT_BAR, EventData::Bar(bar("ETH/USDT", dec!(2_100)))));
    settle(&bus);

    let cash = gateway.cash();
    assert_eq!(cash, dec!(10_000) - dec!(2_002));
    assert_eq!(core.get_portfolio_value(), cash + dec!(2_100));

    bus.stop();
}
