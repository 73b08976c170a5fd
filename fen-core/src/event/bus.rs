//! Thread-safe event bus.
//!
//! One unbounded multi-producer queue drains into a single dispatcher
//! thread; a second thread emits `eTimer` ticks at a fixed interval while
//! the bus is active. Everything else in the process is a producer.
//!
//! Routing is two-layered: handlers registered for a specific type string
//! run first (in registration order), then handlers registered for the
//! global channel. Both registries are snapshotted before iteration, so a
//! registration performed inside a handler takes effect on the next event,
//! not the one being dispatched.
//!
//! A panicking handler never halts the dispatcher and never shadows its
//! sibling handlers; the panic is routed to the registered error callback,
//! falling back to a `tracing::error!` line.

use super::types::{Event, EVENT_STOP};
use crossbeam::channel::{self, Receiver, Sender};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Handler invoked with every matching event on the dispatcher thread.
pub type EventHandler = Arc<dyn Fn(&Event) + Send + Sync>;

/// Callback invoked when a handler panics during dispatch. Receives the
/// offending event and the panic message.
pub type DispatchErrorHandler = Arc<dyn Fn(&Event, &str) + Send + Sync>;

/// Queued pub/sub bus with a dedicated dispatcher and timer thread.
pub struct EventBus {
    interval: Duration,
    active: AtomicBool,
    tx: Sender<Event>,
    rx: Receiver<Event>,
    /// Interruptible sleep for the timer thread: `stop()` sends one unit
    /// so a mid-sleep timer wakes immediately instead of finishing its
    /// interval.
    timer_shutdown_tx: Sender<()>,
    timer_shutdown_rx: Receiver<()>,
    handlers: Mutex<HashMap<String, Vec<EventHandler>>>,
    general_handlers: Mutex<Vec<EventHandler>>,
    error_handler: Mutex<Option<DispatchErrorHandler>>,
    threads: Mutex<Vec<JoinHandle<()>>>,
}

impl EventBus {
    /// Bus with the default 1 second timer interval.
    pub fn new() -> Self {
        Self::with_interval(Duration::from_secs(1))
    }

    /// Bus with a custom timer interval.
    pub fn with_interval(interval: Duration) -> Self {
        let (tx, rx) = channel::unbounded();
        let (timer_shutdown_tx, timer_shutdown_rx) = channel::bounded(1);
        Self {
            interval,
            active: AtomicBool::new(false),
            tx,
            rx,
            timer_shutdown_tx,
            timer_shutdown_rx,
            handlers: Mutex::new(HashMap::new()),
            general_handlers: Mutex::new(Vec::new()),
            error_handler: Mutex::new(None),
            threads: Mutex::new(Vec::new()),
        }
    }

    /// True between `start()` and `stop()`.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Enqueue an event. Never blocks on handlers, never drops.
    pub fn put(&self, event: Event) {
        // Send only fails once the receiver is gone, which outlives self.
        let _ = self.tx.send(event);
    }

    /// Register `handler` for events of type `etype`. Duplicate
    /// registrations of the same handler are ignored.
    pub fn register(&self, etype: &str, handler: EventHandler) {
        let mut handlers = self.handlers.lock();
        let list = handlers.entry(etype.to_string()).or_default();
        if !list.iter().any(|h| Arc::ptr_eq(h, &handler)) {
            list.push(handler);
        }
    }

    /// Remove `handler` from events of type `etype`. Unknown handlers are
    /// a no-op.
    pub fn unregister(&self, etype: &str, handler: &EventHandler) {
        let mut handlers = self.handlers.lock();
        if let Some(list) = handlers.get_mut(etype) {
            list.retain(|h| !Arc::ptr_eq(h, handler));
            if list.is_empty() {
                handlers.remove(etype);
            }
        }
    }

    /// Register a handler that receives every event.
    pub fn register_general(&self, handler: EventHandler) {
        let mut list = self.general_handlers.lock();
        if !list.iter().any(|h| Arc::ptr_eq(h, &handler)) {
            list.push(handler);
        }
    }

    /// Remove a general handler. Unknown handlers are a no-op.
    pub fn unregister_general(&self, handler: &EventHandler) {
        self.general_handlers
            .lock()
            .retain(|h| !Arc::ptr_eq(h, handler));
    }

    /// Install the callback that receives handler panics. Replaces any
    /// previous callback.
    pub fn set_error_handler(&self, handler: DispatchErrorHandler) {
        *self.error_handler.lock() = Some(handler);
    }

    /// Launch the dispatcher and timer threads. Calling `start` on an
    /// already running bus is a no-op.
    pub fn start(self: &Arc<Self>) {
        if self.active.swap(true, Ordering::SeqCst) {
            return;
        }

        // Clear any wake signal left over from a previous stop so a
        // restarted timer does not exit immediately.
        while self.timer_shutdown_rx.try_recv().is_ok() {}

        let dispatcher = {
            let bus = Arc::clone(self);
            thread::Builder::new()
                .name("fen-dispatcher".to_string())
                .spawn(move || bus.run_dispatch())
        };
        let timer = {
            let bus = Arc::clone(self);
            thread::Builder::new()
                .name("fen-timer".to_string())
                .spawn(move || bus.run_timer())
        };

        let mut threads = self.threads.lock();
        match (dispatcher, timer) {
            (Ok(d), Ok(t)) => {
                threads.push(d);
                threads.push(t);
            }
            (d, t) => {
                // Spawn failure is a process-level problem; undo the start.
                self.active.store(false, Ordering::SeqCst);
                threads.extend(d.into_iter().chain(t));
                tracing::error!("failed to spawn event bus threads");
            }
        }
    }

    /// Signal both threads to exit and join them. Idempotent; no event is
    /// emitted after this returns. Must not be called from a handler.
    pub fn stop(&self) {
        if !self.active.swap(false, Ordering::SeqCst) {
            return;
        }

        // Wake the dispatcher if it is blocked on an empty queue, and the
        // timer if it is mid-sleep.
        let _ = self.tx.send(Event::stop_sentinel());
        let _ = self.timer_shutdown_tx.try_send(());

        let mut threads = self.threads.lock();
        for handle in threads.drain(..) {
            let _ = handle.join();
        }
    }

    fn run_dispatch(&self) {
        while let Ok(event) = self.rx.recv() {
            if event.etype == EVENT_STOP {
                break;
            }
            self.dispatch(&event);
        }
    }

    fn run_timer(&self) {
        use crossbeam::channel::RecvTimeoutError;

        while self.active.load(Ordering::SeqCst) {
            match self.timer_shutdown_rx.recv_timeout(self.interval) {
                // Full interval elapsed undisturbed.
                Err(RecvTimeoutError::Timeout) => {}
                // Woken by stop(), or the bus is being torn down.
                _ => break,
            }
            // Re-check after the sleep so no stray tick is emitted once
            // shutdown has begun.
            if !self.active.load(Ordering::SeqCst) {
                break;
            }
            self.put(Event::timer());
        }
    }

    fn dispatch(&self, event: &Event) {
        let typed: Vec<EventHandler> = self
            .handlers
            .lock()
            .get(&event.etype)
            .cloned()
            .unwrap_or_default();
        for handler in &typed {
            self.invoke(handler, event);
        }

        let general: Vec<EventHandler> = self.general_handlers.lock().clone();
        for handler in &general {
            self.invoke(handler, event);
        }
    }

    fn invoke(&self, handler: &EventHandler, event: &Event) {
        if let Err(payload) = catch_unwind(AssertUnwindSafe(|| handler(event))) {
            let reason = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "handler panicked".to_string());

            let callback = self.error_handler.lock().clone();
            match callback {
                Some(callback) => callback(event, &reason),
                None => {
                    tracing::error!(etype = %event.etype, %reason, "event handler panicked")
                }
            }
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
