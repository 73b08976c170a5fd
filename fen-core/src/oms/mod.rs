//! Order management state.
//!
//! The OMS consumes `eTick`, `eBar`, `eOrder`, `eTrade`, `ePosition` and
//! `eAccount` events and maintains the authoritative in-memory snapshot:
//! latest market data per symbol, the full order and trade history, the
//! live active-order sub-index, aggregated positions and the account.
//!
//! Writes happen only on the dispatcher thread (single writer). Readers on
//! other threads receive cloned snapshots and accept eventual consistency;
//! a reader that needs to observe a consistent point in the stream should
//! do its read from a bus handler instead.

use crate::core::Direction;
use crate::data::{
    AccountData, BarData, OrderData, PositionData, TickData, TradeData,
};
use crate::event::{
    Event, EventBus, EventData, EventHandler, EVENT_ACCOUNT, EVENT_BAR, EVENT_ORDER,
    EVENT_POSITION, EVENT_TICK, EVENT_TRADE,
};
use dashmap::DashMap;
use parking_lot::RwLock;
use rust_decimal::Decimal;
use std::sync::Arc;

/// In-memory state mirror driven by bus events.
///
/// All indexes are keyed by the composite ids carried on the data objects
/// (`<symbol>.<orderid>`, `<symbol>.<tradeid>`, `<symbol>.<direction>`).
pub struct Oms {
    ticks: DashMap<String, TickData>,
    bars: DashMap<String, BarData>,
    /// Full order history.
    orders: DashMap<String, OrderData>,
    /// Live sub-index; every entry also exists in `orders` and has an
    /// active status.
    active_orders: DashMap<String, OrderData>,
    trades: DashMap<String, TradeData>,
    positions: DashMap<String, PositionData>,
    account: RwLock<Option<AccountData>>,
}

impl Oms {
    /// Create the OMS and register it for every event type it mirrors.
    pub fn new(bus: &Arc<EventBus>) -> Arc<Self> {
        let oms = Arc::new(Self {
            ticks: DashMap::new(),
            bars: DashMap::new(),
            orders: DashMap::new(),
            active_orders: DashMap::new(),
            trades: DashMap::new(),
            positions: DashMap::new(),
            account: RwLock::new(None),
        });

        let handler: EventHandler = {
            let oms = Arc::clone(&oms);
            Arc::new(move |event: &Event| oms.process(event))
        };
        for etype in [
            EVENT_TICK,
            EVENT_BAR,
            EVENT_ORDER,
            EVENT_TRADE,
            EVENT_POSITION,
            EVENT_ACCOUNT,
        ] {
            bus.register(etype, Arc::clone(&handler));
        }

        oms
    }

    fn process(&self, event: &Event) {
        match &event.data {
            EventData::Tick(tick) => {
                self.ticks.insert(tick.symbol.clone(), tick.clone());
            }
            EventData::Bar(bar) => {
                self.bars.insert(bar.symbol.clone(), bar.clone());
            }
            EventData::Order(order) => self.process_order(order),
            EventData::Trade(trade) => self.process_trade(trade),
            EventData::Position(position) => {
                self.positions
                    .insert(position.qualified_id(), position.clone());
            }
            EventData::Account(account) => {
                *self.account.write() = Some(account.clone());
            }
            _ => {}
        }
    }

    /// Overwrite the stored order with the latest event and keep the
    /// active sub-index consistent with its status.
    fn process_order(&self, order: &OrderData) {
        let id = order.qualified_id();
        self.orders.insert(id.clone(), order.clone());

        if order.is_active() {
            self.active_orders.insert(id, order.clone());
        } else {
            self.active_orders.remove(&id);
        }
    }

    fn process_trade(&self, trade: &TradeData) {
        self.trades.insert(trade.qualified_id(), trade.clone());
        self.apply_trade_to_position(trade);
    }

    /// Incremental per-direction aggregation: volume accumulates and the
    /// average price is re-weighted by the fill. Closing flow is a
    /// separate direction, not netted here.
    fn apply_trade_to_position(&self, trade: &TradeData) {
        let key = format!("{}.{}", trade.symbol, trade.direction.as_str());
        let mut position = self
            .positions
            .entry(key)
            .or_insert_with(|| PositionData::new(trade.symbol.clone(), trade.direction));

        let old_volume = position.volume;
        let new_volume = old_volume + trade.volume;
        position.avg_price = if new_volume > Decimal::ZERO {
            (position.avg_price * old_volume + trade.price * trade.volume) / new_volume
        } else {
            Decimal::ZERO
        };
        position.volume = new_volume;
    }

    // ------------------------------------------------------------------
    // Queries - O(1) lookups, cloned snapshots
    // ------------------------------------------------------------------

    pub fn get_tick(&self, symbol: &str) -> Option<TickData> {
        self.ticks.get(symbol).map(|entry| entry.clone())
    }

    pub fn get_bar(&self, symbol: &str) -> Option<BarData> {
        self.bars.get(symbol).map(|entry| entry.clone())
    }

    pub fn get_order(&self, qualified_id: &str) -> Option<OrderData> {
        self.orders.get(qualified_id).map(|entry| entry.clone())
    }

    pub fn get_all_orders(&self) -> Vec<OrderData> {
        self.orders.iter().map(|entry| entry.value().clone()).collect()
    }

    pub fn get_all_active_orders(&self) -> Vec<OrderData> {
        self.active_orders
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    pub fn get_trade(&self, qualified_id: &str) -> Option<TradeData> {
        self.trades.get(qualified_id).map(|entry| entry.clone())
    }

    pub fn get_all_trades(&self) -> Vec<TradeData> {
        self.trades.iter().map(|entry| entry.value().clone()).collect()
    }

    /// Look up by full composite id, e.g. `AAPL.long`.
    pub fn get_position(&self, qualified_id: &str) -> Option<PositionData> {
        self.positions.get(qualified_id).map(|entry| entry.clone())
    }

    pub fn get_position_by_symbol(
        &self,
        symbol: &str,
        direction: Direction,
    ) -> Option<PositionData> {
        self.get_position(&format!("{}.{}", symbol, direction.as_str()))
    }

    pub fn get_all_positions(&self) -> Vec<PositionData> {
        self.positions
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    pub fn get_account(&self) -> Option<AccountData> {
        self.account.read().clone()
    }
}
