//! Value objects flowing through the runtime.

pub mod signal;
pub mod types;

pub use signal::{Decision, DecisionAction, SignalMap, UnknownAction};
pub use types::{
    AccountData, BarData, CancelRequest, OrderData, OrderRequest, PositionData, TickData,
    TradeData,
};
