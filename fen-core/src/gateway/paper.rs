//! In-process simulated exchange for paper trading and tests.
//!
//! Orders are matched against live price events instead of a real venue:
//! market orders fill immediately at the last seen price, limit orders
//! queue until a bar close or tick midpoint crosses their limit. A single
//! cash + position ledger backs account queries.
//!
//! Fills are all-or-nothing. The one exception is a close that exceeds the
//! held volume, which clamps to what is actually held. The ledger is
//! LONG-only: a `Short` order reduces long exposure and rejects when there
//! is nothing to close.

use super::{Gateway, GatewayContext, Setting};
use crate::core::{Direction, GatewayError, OrderType, Status};
use crate::data::{
    AccountData, CancelRequest, OrderData, OrderRequest, PositionData, TradeData,
};
use crate::event::{Event, EventBus, EventData, EventHandler, EVENT_BAR, EVENT_TICK};
use parking_lot::Mutex;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::SystemTime;

const DEFAULT_INITIAL_CASH: Decimal = dec!(100_000);

/// Ledger state. Every mutation happens under one mutex; publishes happen
/// after the guard is dropped so a handler may re-enter the gateway
/// without deadlocking.
struct Ledger {
    cash: Decimal,
    positions: HashMap<String, Decimal>,
    avg_prices: HashMap<String, Decimal>,
    pending_orders: HashMap<String, OrderData>,
    last_prices: HashMap<String, Decimal>,
    order_counter: u64,
}

impl Ledger {
    fn new(cash: Decimal) -> Self {
        Self {
            cash,
            positions: HashMap::new(),
            avg_prices: HashMap::new(),
            pending_orders: HashMap::new(),
            last_prices: HashMap::new(),
            order_counter: 0,
        }
    }
}

/// Simulated paper-trading gateway.
///
/// Useful for unit and integration tests (no venue needed), paper trading
/// against a live data feed, and backtest harnesses that push bar events.
pub struct PaperGateway {
    ctx: GatewayContext,
    ledger: Mutex<Ledger>,
}

impl PaperGateway {
    pub const NAME: &'static str = "PAPER";

    /// Create the gateway and hook it onto `eBar`/`eTick` so pending limit
    /// orders are matched against incoming prices.
    pub fn new(bus: Arc<EventBus>) -> Arc<Self> {
        let gateway = Arc::new(Self {
            ctx: GatewayContext::new(Arc::clone(&bus), Self::NAME),
            ledger: Mutex::new(Ledger::new(DEFAULT_INITIAL_CASH)),
        });

        let on_bar: EventHandler = {
            let gw = Arc::clone(&gateway);
            Arc::new(move |event: &Event| {
                if let EventData::Bar(bar) = &event.data {
                    gw.on_price(&bar.symbol, bar.close);
                }
            })
        };
        bus.register(EVENT_BAR, on_bar);

        let on_tick: EventHandler = {
            let gw = Arc::clone(&gateway);
            Arc::new(move |event: &Event| {
                if let EventData::Tick(tick) = &event.data {
                    gw.on_price(&tick.symbol, tick.midpoint());
                }
            })
        };
        bus.register(EVENT_TICK, on_tick);

        gateway
    }

    /// Current cash balance.
    pub fn cash(&self) -> Decimal {
        self.ledger.lock().cash
    }

    /// Held volume for a symbol (zero when never traded).
    pub fn position(&self, symbol: &str) -> Decimal {
        self.ledger
            .lock()
            .positions
            .get(symbol)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    /// Volume-weighted average cost for a symbol.
    pub fn avg_price(&self, symbol: &str) -> Decimal {
        self.ledger
            .lock()
            .avg_prices
            .get(symbol)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    /// Number of limit orders still waiting for a price.
    pub fn pending_order_count(&self) -> usize {
        self.ledger.lock().pending_orders.len()
    }

    /// Record a new reference price and attempt to fill pending limit
    /// orders on that symbol.
    fn on_price(&self, symbol: &str, price: Decimal) {
        let matched: Vec<OrderData> = {
            let mut ledger = self.ledger.lock();
            ledger.last_prices.insert(symbol.to_string(), price);

            let ids: Vec<String> = ledger
                .pending_orders
                .values()
                .filter(|order| order.symbol == symbol && limit_crossed(order, price))
                .map(|order| order.orderid.clone())
                .collect();
            ids.iter()
                .filter_map(|id| ledger.pending_orders.remove(id))
                .collect()
        };

        for order in matched {
            // Conservative model: the fill always happens at the limit.
            let limit = order.price;
            self.fill_order(order, limit);
        }
    }

    /// Execute a fill: mutate the ledger, then publish the terminal order
    /// event, the trade record, and a fresh account snapshot. Returns
    /// false when the fill was rejected.
    fn fill_order(&self, mut order: OrderData, fill_price: Decimal) -> bool {
        let volume = order.volume;

        let filled_volume = {
            let mut ledger = self.ledger.lock();
            match order.direction {
                Direction::Long => {
                    let cost = fill_price * volume;
                    if cost > ledger.cash {
                        None
                    } else {
                        ledger.cash -= cost;
                        let old_vol = ledger
                            .positions
                            .get(&order.symbol)
                            .copied()
                            .unwrap_or(Decimal::ZERO);
                        let old_avg = ledger
                            .avg_prices
                            .get(&order.symbol)
                            .copied()
                            .unwrap_or(Decimal::ZERO);
                        let new_vol = old_vol + volume;
                        let new_avg = if new_vol > Decimal::ZERO {
                            (old_avg * old_vol + fill_price * volume) / new_vol
                        } else {
                            Decimal::ZERO
                        };
                        ledger.avg_prices.insert(order.symbol.clone(), new_avg);
                        ledger.positions.insert(order.symbol.clone(), new_vol);
                        Some(volume)
                    }
                }
                Direction::Short => {
                    let held = ledger
                        .positions
                        .get(&order.symbol)
                        .copied()
                        .unwrap_or(Decimal::ZERO);
                    let actual = volume.min(held);
                    if actual <= Decimal::ZERO {
                        None
                    } else {
                        ledger.cash += fill_price * actual;
                        ledger.positions.insert(order.symbol.clone(), held - actual);
                        Some(actual)
                    }
                }
            }
        };

        let Some(filled_volume) = filled_volume else {
            order.status = Status::Rejected;
            tracing::debug!(
                order = %order.qualified_id(),
                direction = %order.direction,
                %volume,
                "paper fill rejected"
            );
            self.ctx.on_order(order);
            return false;
        };

        // An oversized close clamps: the published volume reflects what
        // actually traded, not the request.
        order.status = Status::AllTraded;
        order.volume = filled_volume;
        order.traded = filled_volume;
        self.ctx.on_order(order.clone());

        let trade = TradeData {
            symbol: order.symbol.clone(),
            orderid: order.orderid.clone(),
            tradeid: random_trade_id(),
            direction: order.direction,
            price: fill_price,
            volume: filled_volume,
            timestamp: SystemTime::now(),
        };
        tracing::debug!(
            trade = %trade.qualified_id(),
            price = %fill_price,
            volume = %filled_volume,
            "paper fill"
        );
        self.ctx.on_trade(trade);

        self.query_account();
        true
    }
}

impl Gateway for PaperGateway {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn connect(&self, setting: &Setting) -> Result<(), GatewayError> {
        if let Some(value) = setting.get("initial_cash") {
            let cash = value
                .as_f64()
                .and_then(Decimal::from_f64)
                .ok_or_else(|| GatewayError::InvalidSetting {
                    key: "initial_cash",
                    reason: format!("expected a number, got {value}"),
                })?;
            self.ledger.lock().cash = cash;
        }
        self.query_account();
        Ok(())
    }

    fn subscribe(&self, _symbol: &str) {
        // Any symbol is accepted; prices arrive through bus events.
    }

    fn send_order(&self, req: OrderRequest) -> String {
        let orderid = {
            let mut ledger = self.ledger.lock();
            ledger.order_counter += 1;
            format!("PAPER{:06}", ledger.order_counter)
        };

        let order = req.create_order_data(orderid.clone());
        let qualified_id = order.qualified_id();
        self.ctx.on_order(order.clone()); // Submitting

        match order.order_type {
            OrderType::Market => {
                let last = self.ledger.lock().last_prices.get(&order.symbol).copied();
                let fill_price = match last {
                    Some(price) if price > Decimal::ZERO => price,
                    // No price seen yet: fall back to the request's price.
                    _ => order.price,
                };
                if self.fill_order(order, fill_price) {
                    qualified_id
                } else {
                    String::new()
                }
            }
            OrderType::Limit => {
                let last = {
                    let mut ledger = self.ledger.lock();
                    ledger.pending_orders.insert(orderid.clone(), order.clone());
                    ledger.last_prices.get(&order.symbol).copied()
                };

                // Placement is idempotent with respect to event order: a
                // price that already satisfies the limit fills right away
                // instead of waiting for the next price event.
                match last {
                    Some(price) if price > Decimal::ZERO && limit_crossed(&order, price) => {
                        let pending = self.ledger.lock().pending_orders.remove(&orderid);
                        match pending {
                            Some(pending) => {
                                let limit = pending.price;
                                if self.fill_order(pending, limit) {
                                    qualified_id
                                } else {
                                    String::new()
                                }
                            }
                            // A concurrent price event won the race and
                            // owns the fill.
                            None => qualified_id,
                        }
                    }
                    _ => qualified_id,
                }
            }
        }
    }

    fn cancel_order(&self, req: CancelRequest) {
        let order = self.ledger.lock().pending_orders.remove(&req.orderid);
        // Unknown or already-finished ids are silent no-ops.
        if let Some(mut order) = order {
            order.status = Status::Cancelled;
            self.ctx.on_order(order);
        }
    }

    fn query_account(&self) {
        let balance = self.ledger.lock().cash;
        self.ctx.on_account(AccountData {
            accountid: Self::NAME.to_string(),
            balance,
            frozen: Decimal::ZERO,
        });
    }

    fn query_position(&self) {
        let snapshot: Vec<PositionData> = {
            let ledger = self.ledger.lock();
            ledger
                .positions
                .iter()
                .filter(|(_, volume)| **volume != Decimal::ZERO)
                .map(|(symbol, volume)| PositionData {
                    symbol: symbol.clone(),
                    direction: Direction::Long,
                    volume: *volume,
                    frozen: Decimal::ZERO,
                    avg_price: ledger
                        .avg_prices
                        .get(symbol)
                        .copied()
                        .unwrap_or(Decimal::ZERO),
                    pnl: Decimal::ZERO,
                })
                .collect()
        };
        for position in snapshot {
            self.ctx.on_position(position);
        }
    }

    fn close(&self) {}
}

/// Limit-fill eligibility: a buy fills when the market trades at or below
/// the limit, a sell when it trades at or above.
fn limit_crossed(order: &OrderData, market_price: Decimal) -> bool {
    match order.direction {
        Direction::Long => market_price <= order.price,
        Direction::Short => market_price >= order.price,
    }
}

fn random_trade_id() -> String {
    use rand::distributions::Alphanumeric;
    use rand::Rng;
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(char::from)
        .collect()
}
