//! Target-position strategy machinery.
//!
//! `TargetPositionCore` carries the state every reconciling strategy
//! needs: per-symbol actual and desired positions, a private mirror of the
//! orders it has sent, and the live set of its working order ids. The
//! mirror is deliberately independent of the OMS - a strategy must stay
//! reusable against any engine wiring, so it tracks its own order events.
//!
//! Order tracking uses the narrow side of dual-layer routing: after a
//! successful send the core subscribes to the composite
//! `eOrder<symbol>.<id>` type and drops the subscription once the order
//! reaches a terminal state.
//!
//! Mutable state is lock-protected, so calling into the core from any
//! thread is safe. Strict lifecycle tracking additionally wants order flow
//! to run on the dispatcher thread (the `eSignal` wiring does this): there
//! the subscription is guaranteed to be registered before the gateway's
//! events can be dispatched. A send from a producer thread can race a very
//! fast fill and miss its first transitions; the state stays consistent,
//! the mirror just lags until the next observed event.

use fen_core::core::{Action, Direction, OrderType};
use fen_core::data::{BarData, OrderData, OrderRequest};
use fen_core::event::{Event, EventBus, EventData, EventHandler, EVENT_ORDER};
use fen_core::gateway::Gateway;
use fen_core::oms::Oms;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Shared state and order plumbing for target-position strategies.
pub struct TargetPositionCore {
    name: String,
    symbols: Vec<String>,
    bus: Arc<EventBus>,
    gateway: Arc<dyn Gateway>,
    oms: Arc<Oms>,

    /// Actual positions, updated by fills or a trusted observer.
    pos: Mutex<HashMap<String, Decimal>>,
    /// Desired positions.
    target: Mutex<HashMap<String, Decimal>>,

    /// Mirror of every order this strategy has sent, by composite id.
    orders: Mutex<HashMap<String, OrderData>>,
    /// Composite ids of orders still working.
    active_orderids: Mutex<HashSet<String>>,
    /// Live composite-type subscriptions, kept so they can be
    /// unregistered when the order finishes.
    subscriptions: Mutex<HashMap<String, EventHandler>>,
}

impl TargetPositionCore {
    pub fn new(
        bus: Arc<EventBus>,
        gateway: Arc<dyn Gateway>,
        oms: Arc<Oms>,
        name: impl Into<String>,
        symbols: Vec<String>,
    ) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            symbols,
            bus,
            gateway,
            oms,
            pos: Mutex::new(HashMap::new()),
            target: Mutex::new(HashMap::new()),
            orders: Mutex::new(HashMap::new()),
            active_orderids: Mutex::new(HashSet::new()),
            subscriptions: Mutex::new(HashMap::new()),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn oms(&self) -> &Arc<Oms> {
        &self.oms
    }

    pub fn gateway(&self) -> &Arc<dyn Gateway> {
        &self.gateway
    }

    // ------------------------------------------------------------------
    // Target-position interface
    // ------------------------------------------------------------------

    /// Set the desired holding for a symbol.
    pub fn set_target(&self, symbol: &str, target: Decimal) {
        self.target.lock().insert(symbol.to_string(), target);
    }

    /// Desired holding (zero when never set).
    pub fn target(&self, symbol: &str) -> Decimal {
        self.target
            .lock()
            .get(symbol)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    /// Actual holding (zero when never set).
    pub fn position(&self, symbol: &str) -> Decimal {
        self.pos
            .lock()
            .get(symbol)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    /// Trusted-observer update of the actual holding.
    pub fn set_position(&self, symbol: &str, volume: Decimal) {
        self.pos.lock().insert(symbol.to_string(), volume);
    }

    // ------------------------------------------------------------------
    // Order execution
    // ------------------------------------------------------------------

    /// Cancel every working order, then send one limit order per symbol
    /// whose target and actual positions differ. Buys quote at
    /// `close * (1 + price_add)`, sells at `close * (1 - price_add)`.
    pub fn execute_trading(
        self: &Arc<Self>,
        bars: &HashMap<String, BarData>,
        price_add: Decimal,
    ) {
        self.cancel_all();

        for (symbol, bar) in bars {
            let diff = self.target(symbol) - self.position(symbol);
            if diff > Decimal::ZERO {
                let price = bar.close * (Decimal::ONE + price_add);
                self.buy(symbol, price, diff);
            } else if diff < Decimal::ZERO {
                let price = bar.close * (Decimal::ONE - price_add);
                self.sell(symbol, price, -diff);
            }
        }
    }

    /// Open long exposure. Returns the composite order id when accepted.
    pub fn buy(self: &Arc<Self>, symbol: &str, price: Decimal, volume: Decimal) -> Option<String> {
        self.send_order(symbol, Direction::Long, Action::Open, price, volume)
    }

    /// Close long exposure.
    pub fn sell(self: &Arc<Self>, symbol: &str, price: Decimal, volume: Decimal) -> Option<String> {
        self.send_order(symbol, Direction::Short, Action::Close, price, volume)
    }

    /// Open short exposure.
    pub fn short(self: &Arc<Self>, symbol: &str, price: Decimal, volume: Decimal) -> Option<String> {
        self.send_order(symbol, Direction::Short, Action::Open, price, volume)
    }

    /// Close short exposure.
    pub fn cover(self: &Arc<Self>, symbol: &str, price: Decimal, volume: Decimal) -> Option<String> {
        self.send_order(symbol, Direction::Long, Action::Close, price, volume)
    }

    /// Issue a cancel for every order this strategy still has working.
    pub fn cancel_all(&self) {
        let active: Vec<String> = self.active_orderids.lock().iter().cloned().collect();
        for qualified_id in active {
            let req = self
                .orders
                .lock()
                .get(&qualified_id)
                .filter(|order| order.is_active())
                .map(|order| order.create_cancel_request());
            if let Some(req) = req {
                self.gateway.cancel_order(req);
            }
        }
    }

    fn send_order(
        self: &Arc<Self>,
        symbol: &str,
        direction: Direction,
        action: Action,
        price: Decimal,
        volume: Decimal,
    ) -> Option<String> {
        let req = OrderRequest {
            symbol: symbol.to_string(),
            direction,
            action,
            order_type: OrderType::Limit,
            volume,
            price,
            reference: self.name.clone(),
        };

        let qualified_id = self.gateway.send_order(req);
        if qualified_id.is_empty() {
            tracing::warn!(
                strategy = %self.name,
                %symbol,
                %volume,
                "order rejected at submission"
            );
            return None;
        }

        self.active_orderids.lock().insert(qualified_id.clone());
        self.track(&qualified_id);
        Some(qualified_id)
    }

    /// Subscribe to the composite order event type for one order.
    fn track(self: &Arc<Self>, qualified_id: &str) {
        let handler: EventHandler = {
            let this = Arc::clone(self);
            Arc::new(move |event: &Event| {
                if let EventData::Order(order) = &event.data {
                    this.on_order(order);
                }
            })
        };
        self.subscriptions
            .lock()
            .insert(qualified_id.to_string(), Arc::clone(&handler));
        self.bus
            .register(&format!("{EVENT_ORDER}{qualified_id}"), handler);
    }

    /// Order lifecycle callback: refresh the mirror, maintain the active
    /// set, and drop the composite subscription once the order finishes.
    pub fn on_order(&self, order: &OrderData) {
        let qualified_id = order.qualified_id();
        self.orders
            .lock()
            .insert(qualified_id.clone(), order.clone());

        if order.is_active() {
            self.active_orderids.lock().insert(qualified_id);
        } else {
            self.active_orderids.lock().remove(&qualified_id);
            let handler = self.subscriptions.lock().remove(&qualified_id);
            if let Some(handler) = handler {
                self.bus
                    .unregister(&format!("{EVENT_ORDER}{qualified_id}"), &handler);
            }
        }
    }

    /// Snapshot of the working order ids.
    pub fn active_orderids(&self) -> HashSet<String> {
        self.active_orderids.lock().clone()
    }

    /// Mirror lookup by composite id.
    pub fn get_order(&self, qualified_id: &str) -> Option<OrderData> {
        self.orders.lock().get(qualified_id).cloned()
    }

    // ------------------------------------------------------------------
    // Portfolio queries - advisory, backed by the OMS snapshot
    // ------------------------------------------------------------------

    /// Available cash from the latest account snapshot, zero when none
    /// has arrived yet.
    pub fn get_cash_available(&self) -> Decimal {
        self.oms
            .get_account()
            .map(|account| account.available())
            .unwrap_or(Decimal::ZERO)
    }

    /// Approximate portfolio value: cash plus long holdings at the
    /// latest bar close, falling back to the position's average price
    /// when no bar is available.
    pub fn get_portfolio_value(&self) -> Decimal {
        let mut value = self.get_cash_available();
        for symbol in &self.symbols {
            if let Some(pos) = self.oms.get_position_by_symbol(symbol, Direction::Long) {
                if pos.volume > Decimal::ZERO {
                    let price = self
                        .oms
                        .get_bar(symbol)
                        .map(|bar| bar.close)
                        .unwrap_or(pos.avg_price);
                    value += pos.volume * price;
                }
            }
        }
        value
    }
}
