//! Fen Strategies - target-position trading strategies.
//!
//! A strategy here is a reconciler: it keeps the position it *wants* next
//! to the position it *has* and closes the gap by cancelling stale working
//! orders and sending compensating limit orders. The machinery lives in
//! [`TargetPositionCore`]; concrete strategies compose it rather than
//! inherit from it.
//!
//! ## Strategies
//! - [`SignalStrategy`]: adapts external decision maps (`buy` / `sell` /
//!   `short` / `cover` / `hold` with quantities) into target deltas.

pub mod signal_adapter;
pub mod template;

pub use signal_adapter::SignalStrategy;
pub use template::TargetPositionCore;

use fen_core::data::{BarData, SignalMap};
use fen_core::event::{Event, EventBus, EventData, EventHandler, EVENT_SIGNAL};
use std::collections::HashMap;
use std::sync::Arc;

/// Seam held by signal producers. Producers only ever call these entry
/// points; everything else (order flow, lifecycle tracking) is internal
/// to the strategy.
pub trait Strategy: Send + Sync {
    fn name(&self) -> &str;

    /// Called once before trading begins.
    fn on_init(&self) {}

    /// Called with the latest bars for the strategy's symbols.
    fn on_bars(&self, _bars: &HashMap<String, BarData>) {}

    /// Called when an external decision set arrives.
    fn on_signal(&self, _signal: &SignalMap) {}
}

/// Route `eSignal` events into `strategy.on_signal`.
///
/// With this wiring a producer can publish decisions through the bus
/// instead of calling the strategy directly, which moves all strategy
/// mutations onto the dispatcher thread.
pub fn subscribe_signals(bus: &Arc<EventBus>, strategy: Arc<dyn Strategy>) {
    let handler: EventHandler = Arc::new(move |event: &Event| {
        if let EventData::Signal(decisions) = &event.data {
            strategy.on_signal(decisions);
        }
    });
    bus.register(EVENT_SIGNAL, handler);
}
