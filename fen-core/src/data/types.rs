//! Market data, order and account value objects.
//!
//! Entities are addressed across subsystems by composite string ids of the
//! form `<symbol>.<local id>` (orders, trades) and
//! `<symbol>.<direction>` (positions). Event publishing clones these
//! records, so a producer mutating its own copy after the fact can never
//! corrupt a queued event.

use crate::core::{Action, Direction, OrderType, Status};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// OHLCV bar for a single interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarData {
    pub symbol: String,
    pub timestamp: SystemTime,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
}

/// Real-time quote snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickData {
    pub symbol: String,
    pub timestamp: SystemTime,
    pub last_price: Decimal,
    pub bid_price: Decimal,
    pub ask_price: Decimal,
    pub bid_volume: Decimal,
    pub ask_volume: Decimal,
    /// Cumulative session volume.
    pub total_volume: Decimal,
}

impl TickData {
    /// Quote midpoint, the reference price for simulated matching.
    pub fn midpoint(&self) -> Decimal {
        (self.bid_price + self.ask_price) / Decimal::TWO
    }
}

/// Order state - tracks the lifecycle of one submitted order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderData {
    pub symbol: String,
    /// Gateway-local order id (e.g. `PAPER000001`).
    pub orderid: String,
    pub direction: Direction,
    pub action: Action,
    pub order_type: OrderType,
    pub price: Decimal,
    pub volume: Decimal,
    /// Volume filled so far.
    pub traded: Decimal,
    pub status: Status,
    /// When the request was accepted by the gateway.
    pub timestamp: SystemTime,
}

impl OrderData {
    /// Composite id addressable across subsystems: `<symbol>.<orderid>`.
    pub fn qualified_id(&self) -> String {
        format!("{}.{}", self.symbol, self.orderid)
    }

    /// True while the order is still working.
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// Cancel request targeting this order.
    pub fn create_cancel_request(&self) -> CancelRequest {
        CancelRequest {
            symbol: self.symbol.clone(),
            orderid: self.orderid.clone(),
        }
    }
}

/// A single fill. One order may produce several of these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeData {
    pub symbol: String,
    /// Local id of the order this fill belongs to.
    pub orderid: String,
    pub tradeid: String,
    pub direction: Direction,
    pub price: Decimal,
    pub volume: Decimal,
    pub timestamp: SystemTime,
}

impl TradeData {
    /// Composite trade id: `<symbol>.<tradeid>`.
    pub fn qualified_id(&self) -> String {
        format!("{}.{}", self.symbol, self.tradeid)
    }

    /// Composite id of the parent order: `<symbol>.<orderid>`.
    pub fn qualified_order_id(&self) -> String {
        format!("{}.{}", self.symbol, self.orderid)
    }
}

/// Position state for one (symbol, direction) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionData {
    pub symbol: String,
    pub direction: Direction,
    pub volume: Decimal,
    /// Volume locked by working close orders.
    pub frozen: Decimal,
    /// Volume-weighted average cost of the opening fills.
    pub avg_price: Decimal,
    /// Unrealized profit and loss.
    pub pnl: Decimal,
}

impl PositionData {
    /// Empty position for a (symbol, direction) pair.
    pub fn new(symbol: impl Into<String>, direction: Direction) -> Self {
        Self {
            symbol: symbol.into(),
            direction,
            volume: Decimal::ZERO,
            frozen: Decimal::ZERO,
            avg_price: Decimal::ZERO,
            pnl: Decimal::ZERO,
        }
    }

    /// Composite position id: `<symbol>.<direction>`.
    pub fn qualified_id(&self) -> String {
        format!("{}.{}", self.symbol, self.direction.as_str())
    }
}

/// Account balance snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountData {
    pub accountid: String,
    pub balance: Decimal,
    pub frozen: Decimal,
}

impl AccountData {
    /// Balance not locked by working orders.
    pub fn available(&self) -> Decimal {
        self.balance - self.frozen
    }
}

/// Intent to place an order, sent to a gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub symbol: String,
    pub direction: Direction,
    pub action: Action,
    pub order_type: OrderType,
    pub volume: Decimal,
    pub price: Decimal,
    /// Free-form attribution, conventionally the originating strategy name.
    pub reference: String,
}

impl OrderRequest {
    /// Materialize the order record once the gateway has assigned a local
    /// id. Fresh orders start in `Submitting` with nothing traded.
    pub fn create_order_data(&self, orderid: impl Into<String>) -> OrderData {
        OrderData {
            symbol: self.symbol.clone(),
            orderid: orderid.into(),
            direction: self.direction,
            action: self.action,
            order_type: self.order_type,
            price: self.price,
            volume: self.volume,
            traded: Decimal::ZERO,
            status: Status::Submitting,
            timestamp: SystemTime::now(),
        }
    }
}

/// Intent to cancel an existing order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CancelRequest {
    pub symbol: String,
    pub orderid: String,
}
