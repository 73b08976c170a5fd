//! Event envelope and type constants.
//!
//! Routing keys are plain strings used verbatim. Per-entity dispatch is
//! expressed by composing a base type with a composite id, e.g.
//! `eOrder` + `AAPL.PAPER000001`. Payloads are owned by the envelope, so
//! whatever is queued stays immutable no matter what the producer does
//! with its own copy afterwards.

use crate::data::{
    AccountData, BarData, OrderData, PositionData, SignalMap, TickData, TradeData,
};

pub const EVENT_TICK: &str = "eTick";
pub const EVENT_BAR: &str = "eBar";
pub const EVENT_ORDER: &str = "eOrder";
pub const EVENT_TRADE: &str = "eTrade";
pub const EVENT_POSITION: &str = "ePosition";
pub const EVENT_ACCOUNT: &str = "eAccount";
pub const EVENT_LOG: &str = "eLog";
pub const EVENT_TIMER: &str = "eTimer";
pub const EVENT_SIGNAL: &str = "eSignal";

/// Reserved sentinel type that wakes the dispatcher during shutdown.
/// Never dispatched to handlers.
pub const EVENT_STOP: &str = "_stop_";

/// Free-form log line routed through the bus.
#[derive(Debug, Clone)]
pub struct LogData {
    pub msg: String,
    /// Component that produced the line, e.g. a gateway name.
    pub source: String,
}

/// Event payload.
#[derive(Debug, Clone)]
pub enum EventData {
    Tick(TickData),
    Bar(BarData),
    Order(OrderData),
    Trade(TradeData),
    Position(PositionData),
    Account(AccountData),
    Log(LogData),
    Signal(SignalMap),
    Timer,
    /// No payload (sentinels, synthetic test events).
    Empty,
}

/// Minimal event envelope: a routing key and an owned payload.
#[derive(Debug, Clone)]
pub struct Event {
    pub etype: String,
    pub data: EventData,
}

impl Event {
    pub fn new(etype: impl Into<String>, data: EventData) -> Self {
        Self {
            etype: etype.into(),
            data,
        }
    }

    /// Periodic timer tick.
    pub fn timer() -> Self {
        Self::new(EVENT_TIMER, EventData::Timer)
    }

    pub(crate) fn stop_sentinel() -> Self {
        Self::new(EVENT_STOP, EventData::Empty)
    }
}
