//! Shared helpers for the integration suites.
#![allow(dead_code)]

use fen_core::event::{Event, EventBus, EventData, EventHandler};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

/// Block until the dispatcher has drained everything enqueued so far.
///
/// Runs three marker rounds so events published from inside handlers
/// (fills, account refreshes) are drained as well.
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

/// Run a closure on the dispatcher thread and return its result.
///
/// Strategies get strict lifecycle tracking when their order flow runs on
/// the dispatcher (fills enqueued during a send cannot be dispatched until
/// the current handler returns), so the tests drive them the same way the
/// `eSignal` wiring would.
pub fn run_on_dispatcher<T: Send + 'static>(
    bus: &Arc<EventBus>,
    f: impl FnOnce() -> T + Send + 'static,
) -> T {
    let (tx, rx) = crossbeam::channel::bounded(1);
    let job = Mutex::new(Some(Box::new(move || {
        let _ = tx.send(f());
    }) as Box<dyn FnOnce() + Send>));

    let handler: EventHandler = Arc::new(move |_event: &Event| {
        if let Some(job) = job.lock().take() {
            job();
        }
    });
    bus.register("eRun", Arc::clone(&handler));
    bus.put(Event::new("eRun", EventData::Empty));

    let out = rx
        .recv_timeout(Duration::from_secs(2))
        .expect("dispatcher should run the job");
    bus.unregister("eRun", &handler);
    out
}
