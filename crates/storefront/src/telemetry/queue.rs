//! Detached telemetry queue.
//!
//! `emit` hands an event to a background worker and returns immediately.
//! The worker delivers each event in its own task after a short delay, so
//! deliveries are not ordered relative to each other or to later store
//! mutations. Failed deliveries are logged and dropped; nothing is retried.
//!
//! `capacity` bounds both the events waiting in the channel and the
//! deliveries in flight. While every delivery slot is taken the worker stops
//! receiving, so a stalled sink fills the channel and new events are dropped
//! rather than blocking the caller.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{OwnedSemaphorePermit, Semaphore, mpsc, oneshot};
use tokio::task::JoinSet;
use tracing::{debug, warn};

use super::event::TelemetryEvent;
use super::sink::TelemetrySink;

enum Message {
    Event(TelemetryEvent),
    Flush(oneshot::Sender<()>),
}

/// Handle to the telemetry worker. Cheap to clone.
#[derive(Clone, Debug)]
pub struct TelemetryQueue {
    tx: Option<mpsc::Sender<Message>>,
}

impl std::fmt::Debug for Message {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Event(event) => f.debug_tuple("Event").field(&event.name).finish(),
            Self::Flush(_) => f.write_str("Flush"),
        }
    }
}

impl TelemetryQueue {
    /// Start a worker delivering to `sink`.
    ///
    /// Must be called from within a Tokio runtime. The worker stops once every
    /// handle has been dropped and in-flight deliveries have finished.
    #[must_use]
    pub fn spawn<S>(sink: S, delay: Duration, capacity: usize) -> Self
    where
        S: TelemetrySink + 'static,
    {
        let capacity = capacity.max(1);
        let (tx, rx) = mpsc::channel(capacity);
        tokio::spawn(run_worker(Arc::new(sink), rx, delay, capacity));
        Self { tx: Some(tx) }
    }

    /// A queue that discards every event.
    #[must_use]
    pub const fn disabled() -> Self {
        Self { tx: None }
    }

    /// Whether events are delivered anywhere.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.tx.is_some()
    }

    /// Schedule an event for delivery. Never blocks and never fails.
    pub fn emit(&self, event: TelemetryEvent) {
        let Some(tx) = &self.tx else {
            return;
        };

        match tx.try_send(Message::Event(event)) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(message)) => {
                warn!(message = ?message, "Telemetry queue full, dropping event");
            }
            Err(mpsc::error::TrySendError::Closed(message)) => {
                debug!(message = ?message, "Telemetry worker stopped, dropping event");
            }
        }
    }

    /// Wait until every event emitted before this call has been attempted.
    ///
    /// Used before process exit; ordinary callers never need it.
    pub async fn flush(&self) {
        let Some(tx) = &self.tx else {
            return;
        };

        let (done_tx, done_rx) = oneshot::channel();
        if tx.send(Message::Flush(done_tx)).await.is_err() {
            return;
        }
        let _ = done_rx.await;
    }
}

async fn run_worker<S>(
    sink: Arc<S>,
    mut rx: mpsc::Receiver<Message>,
    delay: Duration,
    capacity: usize,
) where
    S: TelemetrySink + 'static,
{
    let slots = Arc::new(Semaphore::new(capacity));
    let mut in_flight = JoinSet::new();

    loop {
        tokio::select! {
            Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                if let Err(e) = joined {
                    warn!(error = %e, "Telemetry delivery task failed");
                }
            }
            message = rx.recv() => match message {
                Some(Message::Event(event)) => {
                    // Waits while every slot is taken; the channel buffers meanwhile.
                    let Ok(permit) = Arc::clone(&slots).acquire_owned().await else {
                        break;
                    };
                    in_flight.spawn(deliver(Arc::clone(&sink), event, delay, permit));
                }
                Some(Message::Flush(done)) => {
                    while in_flight.join_next().await.is_some() {}
                    let _ = done.send(());
                }
                None => break,
            },
        }
    }

    while in_flight.join_next().await.is_some() {}
    debug!("Telemetry worker stopped");
}

async fn deliver<S>(
    sink: Arc<S>,
    event: TelemetryEvent,
    delay: Duration,
    _permit: OwnedSemaphorePermit,
) where
    S: TelemetrySink + 'static,
{
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    if let Err(e) = sink.send(&event).await {
        warn!(event = %event.name, error = %e, "Failed to deliver telemetry event");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use cartkit_core::{CurrencyCode, ProductState};

    use super::*;
    use crate::telemetry::{EventName, TelemetryError};

    #[derive(Default)]
    struct RecordingSink {
        events: Arc<Mutex<Vec<TelemetryEvent>>>,
    }

    impl TelemetrySink for RecordingSink {
        async fn send(&self, event: &TelemetryEvent) -> Result<(), TelemetryError> {
            self.events.lock().unwrap().push(event.clone());
            Ok(())
        }
    }

    struct FailingSink {
        attempts: Arc<AtomicUsize>,
    }

    impl TelemetrySink for FailingSink {
        async fn send(&self, _event: &TelemetryEvent) -> Result<(), TelemetryError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            Err(TelemetryError::Rejected {
                status: 500,
                message: "collector down".to_string(),
            })
        }
    }

    fn event(id: i32) -> TelemetryEvent {
        TelemetryEvent::for_product(
            EventName::AddToCart,
            &ProductState::with_quantity(id, 1),
            CurrencyCode::USD,
        )
    }

    #[tokio::test]
    async fn test_flush_waits_for_delivery() {
        let sink = RecordingSink::default();
        let events = Arc::clone(&sink.events);
        let queue = TelemetryQueue::spawn(sink, Duration::from_millis(5), 16);

        queue.emit(event(1));
        queue.emit(event(2));
        queue.emit(event(3));
        queue.flush().await;

        let mut ids: Vec<String> = events
            .lock()
            .unwrap()
            .iter()
            .flat_map(|e| e.params.items.iter().map(|i| i.item_id.clone()))
            .collect();
        ids.sort();
        assert_eq!(ids, vec!["1", "2", "3"]);
    }

    #[tokio::test]
    async fn test_failures_are_swallowed() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let queue = TelemetryQueue::spawn(
            FailingSink {
                attempts: Arc::clone(&attempts),
            },
            Duration::ZERO,
            16,
        );

        queue.emit(event(1));
        queue.flush().await;
        queue.emit(event(2));
        queue.flush().await;

        // Each event is attempted exactly once.
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_full_queue_drops_instead_of_blocking() {
        let sink = RecordingSink::default();
        let events = Arc::clone(&sink.events);
        let queue = TelemetryQueue::spawn(sink, Duration::ZERO, 2);

        // The current-thread test runtime does not run the worker until we
        // yield, so only the first two events fit.
        for id in 0..5 {
            queue.emit(event(id));
        }
        queue.flush().await;

        assert_eq!(events.lock().unwrap().len(), 2);
    }

    /// A collector that accepts a connection and never answers.
    struct StalledSink {
        started: Arc<AtomicUsize>,
    }

    impl TelemetrySink for StalledSink {
        async fn send(&self, _event: &TelemetryEvent) -> Result<(), TelemetryError> {
            self.started.fetch_add(1, Ordering::SeqCst);
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn test_stalled_sink_bounds_deliveries_in_flight() {
        let started = Arc::new(AtomicUsize::new(0));
        let queue = TelemetryQueue::spawn(
            StalledSink {
                started: Arc::clone(&started),
            },
            Duration::ZERO,
            2,
        );

        for id in 0..1000 {
            queue.emit(event(id));
            tokio::task::yield_now().await;
        }

        assert_eq!(started.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_disabled_queue_is_inert() {
        let queue = TelemetryQueue::disabled();
        assert!(!queue.is_enabled());
        queue.emit(event(1));
        queue.flush().await;
    }
}
