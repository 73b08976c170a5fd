//! Fen Core - Event-Driven Paper Trading Runtime
//!
//! Fen turns a stream of heterogeneous events - market data, order
//! acknowledgements, fills, account snapshots, timer ticks, external
//! trading signals - into correctly sequenced, idempotent trading actions
//! while keeping an authoritative in-memory view of orders, trades,
//! positions and account balance.
//!
//! ## Architecture
//! - **Event bus**: one multi-producer queue drained by a single dispatcher
//!   thread, plus a timer thread. Two routing layers: type-indexed handler
//!   lists and a global handler list.
//! - **Dual-layer publishing**: gateways publish every order/trade change
//!   twice, once under a composite per-entity type (`eOrder<symbol>.<id>`)
//!   for narrow listeners and once under the bare type for aggregators.
//! - **Single mediator**: components hold a reference to the bus, never to
//!   each other. The OMS and strategies observe; gateways act.
//!
//! ## Core Modules
//! - `core`: shared enums (`Direction`, `Action`, `OrderType`, `Status`)
//!   and domain errors
//! - `data`: value objects (bars, ticks, orders, trades, positions,
//!   accounts, requests) and the external decision schema
//! - `event`: the queued pub/sub bus
//! - `gateway`: the adapter contract plus the in-process paper gateway
//! - `oms`: the event-driven order management snapshot

pub mod core;
pub mod data;
pub mod event;
pub mod gateway;
pub mod oms;

// Re-export the types almost every consumer needs
pub use crate::core::{Action, Direction, GatewayError, OrderType, Status};
pub use data::{
    AccountData, BarData, CancelRequest, Decision, DecisionAction, OrderData, OrderRequest,
    PositionData, SignalMap, TickData, TradeData,
};
pub use event::{Event, EventBus, EventData, EventHandler};
pub use gateway::{Gateway, GatewayContext, PaperGateway, Setting};
pub use oms::Oms;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::core::{Action, Direction, GatewayError, OrderType, Status};
    pub use crate::data::{
        AccountData, BarData, CancelRequest, Decision, DecisionAction, OrderData, OrderRequest,
        PositionData, SignalMap, TickData, TradeData,
    };
    pub use crate::event::{
        Event, EventBus, EventData, EventHandler, EVENT_ACCOUNT, EVENT_BAR, EVENT_LOG,
        EVENT_ORDER, EVENT_POSITION, EVENT_SIGNAL, EVENT_TICK, EVENT_TIMER, EVENT_TRADE,
    };
    pub use crate::gateway::{Gateway, GatewayContext, PaperGateway, Setting};
    pub use crate::oms::Oms;
}
