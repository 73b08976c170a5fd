//! Queued pub/sub event bus.

pub mod bus;
pub mod types;

pub use bus::{DispatchErrorHandler, EventBus, EventHandler};
pub use types::{
    Event, EventData, LogData, EVENT_ACCOUNT, EVENT_BAR, EVENT_LOG, EVENT_ORDER, EVENT_POSITION,
    EVENT_SIGNAL, EVENT_STOP, EVENT_TICK, EVENT_TIMER, EVENT_TRADE,
};
