//! Thread-safe FIFO of pending events between callers and the worker.
//!
//! Every field lives behind one mutex paired with one condition variable.
//! Enqueueing, draining and the exit request all take that lock, so the
//! worker can never miss a wakeup.

use crate::config::ShutdownPolicy;
use crate::core::EventId;
use crate::error::EngineError;
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::mem;

#[derive(Debug, Default)]
struct Inner {
    events: VecDeque<EventId>,
    /// Drained by the worker but not yet applied.
    in_flight: usize,
    open: bool,
    exit: bool,
    discard: bool,
}

/// Events handed to the worker by one `drain_all` call.
#[derive(Debug)]
pub(crate) struct Batch {
    pub(crate) events: VecDeque<EventId>,
    pub(crate) exit: bool,
}

#[derive(Debug, Default)]
pub(crate) struct EventQueue {
    inner: Mutex<Inner>,
    ready: Condvar,
}

impl EventQueue {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Start accepting events for a new run.
    pub(crate) fn open(&self) {
        let mut inner = self.inner.lock();
        inner.events.clear();
        inner.in_flight = 0;
        inner.open = true;
        inner.exit = false;
        inner.discard = false;
    }

    /// Append an event at the tail and wake the worker.
    pub(crate) fn enqueue(&self, event: EventId) -> Result<(), EngineError> {
        let mut inner = self.inner.lock();
        if !inner.open {
            return Err(EngineError::NotRunning);
        }
        inner.events.push_back(event);
        self.ready.notify_one();
        Ok(())
    }

    /// Block until events are queued or exit is requested, then take every
    /// queued event in FIFO order.
    pub(crate) fn drain_all(&self) -> Batch {
        let mut inner = self.inner.lock();
        while inner.events.is_empty() && !inner.exit {
            self.ready.wait(&mut inner);
        }
        let events = mem::take(&mut inner.events);
        inner.in_flight = events.len();
        Batch {
            events,
            exit: inner.exit,
        }
    }

    /// Mark one drained event as applied. Returns `false` when the rest of
    /// the current batch must be abandoned.
    pub(crate) fn complete_one(&self) -> bool {
        let mut inner = self.inner.lock();
        inner.in_flight = inner.in_flight.saturating_sub(1);
        if inner.discard {
            inner.in_flight = 0;
            return false;
        }
        true
    }

    /// Stop accepting events and ask the worker to exit. Under
    /// `ShutdownPolicy::Discard` queued events are dropped; the number
    /// dropped is returned.
    pub(crate) fn request_exit(&self, policy: ShutdownPolicy) -> usize {
        let mut inner = self.inner.lock();
        inner.open = false;
        inner.exit = true;
        let dropped = match policy {
            ShutdownPolicy::Drain => 0,
            ShutdownPolicy::Discard => {
                inner.discard = true;
                let dropped = inner.events.len();
                inner.events.clear();
                dropped
            }
        };
        self.ready.notify_all();
        dropped
    }

    /// Stop accepting events and drop everything pending, including the
    /// unapplied remainder of an in-flight batch.
    pub(crate) fn close(&self) -> usize {
        let mut inner = self.inner.lock();
        inner.open = false;
        let dropped = inner.events.len() + inner.in_flight;
        inner.events.clear();
        inner.in_flight = 0;
        dropped
    }

    /// Queued or in-flight events exist. A racy sample, only good as a
    /// liveness hint.
    pub(crate) fn has_pending(&self) -> bool {
        let inner = self.inner.lock();
        !inner.events.is_empty() || inner.in_flight > 0
    }

    /// `stop` has been requested and the run has not been reopened.
    pub(crate) fn is_shutting_down(&self) -> bool {
        let inner = self.inner.lock();
        inner.exit && !inner.open
    }

    #[cfg(test)]
    pub(crate) fn is_open(&self) -> bool {
        self.inner.lock().open
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.inner.lock().events.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    fn ids(batch: &Batch) -> Vec<&str> {
        batch.events.iter().map(|e| e.as_str()).collect()
    }

    #[test]
    fn closed_queue_rejects_events() {
        let queue = EventQueue::new();
        assert!(!queue.is_open());
        assert!(matches!(
            queue.enqueue("on".into()),
            Err(EngineError::NotRunning)
        ));
        assert_eq!(queue.len(), 0);
    }

    #[test]
    fn drain_returns_events_in_fifo_order() {
        let queue = EventQueue::new();
        queue.open();
        for event in ["on", "maintain_speed", "off"] {
            queue.enqueue(event.into()).unwrap();
        }
        assert_eq!(queue.len(), 3);

        let batch = queue.drain_all();
        assert_eq!(ids(&batch), vec!["on", "maintain_speed", "off"]);
        assert!(!batch.exit);
        assert_eq!(queue.len(), 0);
    }

    #[test]
    fn in_flight_events_count_as_pending() {
        let queue = EventQueue::new();
        queue.open();
        queue.enqueue("a".into()).unwrap();
        queue.enqueue("b".into()).unwrap();

        let _batch = queue.drain_all();
        assert!(queue.has_pending());
        assert!(queue.complete_one());
        assert!(queue.has_pending());
        assert!(queue.complete_one());
        assert!(!queue.has_pending());
    }

    #[test]
    fn drain_blocks_until_an_event_arrives() {
        let queue = Arc::new(EventQueue::new());
        queue.open();

        let producer = Arc::clone(&queue);
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            producer.enqueue("late".into()).unwrap();
        });

        let batch = queue.drain_all();
        assert_eq!(ids(&batch), vec!["late"]);
        handle.join().unwrap();
    }

    #[test]
    fn exit_request_wakes_an_idle_drain() {
        let queue = Arc::new(EventQueue::new());
        queue.open();

        let stopper = Arc::clone(&queue);
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            stopper.request_exit(ShutdownPolicy::Drain)
        });

        let batch = queue.drain_all();
        assert!(batch.events.is_empty());
        assert!(batch.exit);
        assert_eq!(handle.join().unwrap(), 0);
    }

    #[test]
    fn drain_policy_keeps_queued_events() {
        let queue = EventQueue::new();
        queue.open();
        queue.enqueue("a".into()).unwrap();
        queue.enqueue("b".into()).unwrap();

        assert_eq!(queue.request_exit(ShutdownPolicy::Drain), 0);
        assert!(matches!(
            queue.enqueue("c".into()),
            Err(EngineError::NotRunning)
        ));

        let batch = queue.drain_all();
        assert_eq!(ids(&batch), vec!["a", "b"]);
        assert!(batch.exit);
    }

    #[test]
    fn discard_policy_drops_queued_and_in_flight_events() {
        let queue = EventQueue::new();
        queue.open();
        queue.enqueue("a".into()).unwrap();
        queue.enqueue("b".into()).unwrap();
        let _batch = queue.drain_all();
        queue.enqueue("c".into()).unwrap();

        assert_eq!(queue.request_exit(ShutdownPolicy::Discard), 1);
        assert!(!queue.complete_one());
        assert!(!queue.has_pending());
    }

    #[test]
    fn close_drops_everything_pending() {
        let queue = EventQueue::new();
        queue.open();
        queue.enqueue("a".into()).unwrap();
        queue.enqueue("b".into()).unwrap();
        let _batch = queue.drain_all();
        queue.enqueue("c".into()).unwrap();

        assert_eq!(queue.close(), 3);
        assert!(!queue.has_pending());
        assert!(!queue.is_open());
    }

    #[test]
    fn reopening_resets_exit_state() {
        let queue = EventQueue::new();
        queue.open();
        queue.request_exit(ShutdownPolicy::Discard);
        queue.open();

        queue.enqueue("again".into()).unwrap();
        let batch = queue.drain_all();
        assert_eq!(ids(&batch), vec!["again"]);
        assert!(!batch.exit);
        assert!(queue.complete_one());
    }

    #[test]
    fn shutting_down_only_between_exit_request_and_reopen() {
        let queue = EventQueue::new();
        assert!(!queue.is_shutting_down());

        queue.open();
        assert!(!queue.is_shutting_down());
        queue.request_exit(ShutdownPolicy::Drain);
        assert!(queue.is_shutting_down());
        queue.close();
        assert!(queue.is_shutting_down());

        queue.open();
        assert!(!queue.is_shutting_down());
        queue.close();
        assert!(!queue.is_shutting_down());
    }
}
