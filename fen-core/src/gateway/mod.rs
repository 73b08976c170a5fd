//! Gateway contract.
//!
//! A gateway translates between an exchange API and the internal contract:
//! requests go in, events come out. Implementations never call other
//! components directly - every state change is published through the bus
//! via [`GatewayContext`], and consumers (OMS, strategies) pick it up from
//! there.

pub mod paper;

pub use paper::PaperGateway;

use crate::core::GatewayError;
use crate::data::{
    AccountData, BarData, CancelRequest, OrderData, OrderRequest, PositionData, TickData,
    TradeData,
};
use crate::event::{
    Event, EventBus, EventData, LogData, EVENT_ACCOUNT, EVENT_BAR, EVENT_LOG, EVENT_ORDER,
    EVENT_POSITION, EVENT_TICK, EVENT_TRADE,
};
use std::sync::Arc;
use std::time::SystemTime;

/// Configuration map handed to [`Gateway::connect`]. Keys are enumerated
/// per gateway; unknown keys are ignored for forward compatibility.
pub type Setting = serde_json::Map<String, serde_json::Value>;

/// Adapter contract every gateway implements.
///
/// `send_order` and `cancel_order` never fail: they complete by publishing
/// the appropriate `eOrder` event. Even a transport failure must surface
/// as an `Order(Rejected)` event so the OMS and strategies do not lose
/// track of the intent.
pub trait Gateway: Send + Sync {
    /// Gateway name, used as the event source and account id.
    fn name(&self) -> &str;

    /// Acquire credentials/session from the configuration map.
    fn connect(&self, setting: &Setting) -> Result<(), GatewayError>;

    /// Register interest in market data for a symbol. May be a no-op.
    fn subscribe(&self, symbol: &str);

    /// Assign a local order id and publish `Order(Submitting)` before
    /// returning. Returns the composite order id, or an empty string when
    /// the request dies synchronously on a terminal rejection path (a
    /// `Rejected` event is still published).
    fn send_order(&self, req: OrderRequest) -> String;

    /// Best-effort cancellation; always safe to call on unknown ids.
    fn cancel_order(&self, req: CancelRequest);

    /// Fetch the account balance; delivered asynchronously via an
    /// `eAccount` event.
    fn query_account(&self);

    /// Fetch current positions; delivered asynchronously via `ePosition`
    /// events.
    fn query_position(&self);

    /// Fetch historical bars. Gateways without history support keep the
    /// default empty result.
    fn query_history(
        &self,
        _symbol: &str,
        _start: SystemTime,
        _end: SystemTime,
        _interval: &str,
    ) -> Vec<BarData> {
        Vec::new()
    }

    /// Release resources.
    fn close(&self);
}

/// Publishing half shared by every gateway implementation.
///
/// Order and trade callbacks publish twice - once under the composite
/// per-entity type for narrow listeners and once under the bare type for
/// aggregators. The envelope owns a clone of the payload, so a gateway
/// mutating its own record after the callback cannot corrupt queued
/// events.
pub struct GatewayContext {
    bus: Arc<EventBus>,
    name: String,
}

impl GatewayContext {
    pub fn new(bus: Arc<EventBus>, name: impl Into<String>) -> Self {
        Self {
            bus,
            name: name.into(),
        }
    }

    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn on_tick(&self, tick: TickData) {
        self.bus.put(Event::new(
            format!("{EVENT_TICK}{}", tick.symbol),
            EventData::Tick(tick.clone()),
        ));
        self.bus.put(Event::new(EVENT_TICK, EventData::Tick(tick)));
    }

    pub fn on_bar(&self, bar: BarData) {
        self.bus.put(Event::new(
            format!("{EVENT_BAR}{}", bar.symbol),
            EventData::Bar(bar.clone()),
        ));
        self.bus.put(Event::new(EVENT_BAR, EventData::Bar(bar)));
    }

    pub fn on_order(&self, order: OrderData) {
        self.bus.put(Event::new(
            format!("{EVENT_ORDER}{}", order.qualified_id()),
            EventData::Order(order.clone()),
        ));
        self.bus.put(Event::new(EVENT_ORDER, EventData::Order(order)));
    }

    pub fn on_trade(&self, trade: TradeData) {
        self.bus.put(Event::new(
            format!("{EVENT_TRADE}{}", trade.qualified_id()),
            EventData::Trade(trade.clone()),
        ));
        self.bus.put(Event::new(EVENT_TRADE, EventData::Trade(trade)));
    }

    pub fn on_position(&self, position: PositionData) {
        self.bus
            .put(Event::new(EVENT_POSITION, EventData::Position(position)));
    }

    pub fn on_account(&self, account: AccountData) {
        self.bus
            .put(Event::new(EVENT_ACCOUNT, EventData::Account(account)));
    }

    /// Publish a log line attributed to this gateway.
    pub fn write_log(&self, msg: impl Into<String>) {
        self.bus.put(Event::new(
            EVENT_LOG,
            EventData::Log(LogData {
                msg: msg.into(),
                source: self.name.clone(),
            }),
        ));
    }
}
