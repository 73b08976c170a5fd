//! Shared helpers for the integration suites.

use fen_core::event::{Event, EventBus, EventData, EventHandler};
use std::sync::Arc;
use std::time::Duration;

/// Block until the dispatcher has drained everything enqueued so far.
///
/// Runs three marker rounds so events published from inside handlers
/// (fills triggered by a bar, the account refresh triggered by a fill)
/// are drained as well.
pub fn settle(bus: &Arc<EventBus>) {
    for _ in 0..3 {
        let (tx, rx) = crossbeam::channel::bounded(1);
        let handler: EventHandler = Arc::new(move |_event: &Event| {
            let _ = tx.try_send(());
        });
        bus.register("eSettle", Arc::clone(&handler));
        bus.put(Event::new("eSettle", EventData::Empty));
        rx.recv_timeout(Duration::from_secs(2))
            .expect("dispatcher should drain the queue");
        bus.unregister("eSettle", &handler);
    }
}
