//! Event capture hand-off
//!
//! The pointer listener runs outside this crate and pushes events through an
//! [`EventSink`]. Collection drains them into an owned [`CaptureBuffer`] for a
//! fixed wall-clock duration, then freezes the buffer into a [`Session`].
//! Analysis only ever sees the finished session.

use crate::types::{Button, Event, Session};
use chrono::Utc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::{Duration, Instant};

/// Wall-clock time in seconds, used to stamp captured events
pub fn now_seconds() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

/// Growable buffer owned by the capture phase
#[derive(Debug, Default)]
pub struct CaptureBuffer {
    events: Vec<Event>,
}

impl CaptureBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Take everything captured so far as a session, leaving the buffer empty
    pub fn finish(&mut self) -> Session {
        Session::new(std::mem::take(&mut self.events))
    }
}

/// Sender shared by every sink clone, emptied when collection ends
type SenderSlot = Mutex<Option<Sender<Event>>>;

fn lock_slot(slot: &SenderSlot) -> MutexGuard<'_, Option<Sender<Event>>> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Producer handle for the pointer listener
///
/// Every method returns `false` once collection has ended and the event was
/// dropped. An event that was accepted always ends up in the session.
#[derive(Debug, Clone)]
pub struct EventSink {
    slot: Arc<SenderSlot>,
}

impl EventSink {
    /// Forward an already timestamped event
    pub fn send(&self, event: Event) -> bool {
        match lock_slot(&self.slot).as_ref() {
            Some(tx) => tx.send(event).is_ok(),
            None => false,
        }
    }

    pub fn on_move(&self, x: f64, y: f64) -> bool {
        self.send(Event::Move {
            x,
            y,
            timestamp: now_seconds(),
        })
    }

    pub fn on_click(&self, x: f64, y: f64, button: Button, pressed: bool) -> bool {
        self.send(Event::Click {
            x,
            y,
            button,
            pressed,
            timestamp: now_seconds(),
        })
    }

    pub fn on_scroll(&self, x: f64, y: f64, dx: f64, dy: f64) -> bool {
        self.send(Event::Scroll {
            x,
            y,
            dx,
            dy,
            timestamp: now_seconds(),
        })
    }
}

/// Consumer side of a capture interval
#[derive(Debug)]
pub struct CaptureHandle {
    rx: Receiver<Event>,
    slot: Weak<SenderSlot>,
}

impl CaptureHandle {
    /// Collect events for `duration`, or until every sink is dropped
    ///
    /// Sinks are closed before the final drain, so every event a sink
    /// accepted is in the session and later events are rejected at the sink.
    pub fn collect_for(self, duration: Duration) -> Session {
        let deadline = Instant::now() + duration;
        let mut buffer = CaptureBuffer::new();

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            match self.rx.recv_timeout(remaining) {
                Ok(event) => buffer.push(event),
                Err(RecvTimeoutError::Timeout) => break,
                Err(RecvTimeoutError::Disconnected) => {
                    tracing::debug!("all event sinks closed before deadline");
                    break;
                }
            }
        }

        if let Some(slot) = self.slot.upgrade() {
            lock_slot(&slot).take();
        }
        for event in self.rx.try_iter() {
            buffer.push(event);
        }
        drop(self.rx);

        let session = buffer.finish();
        tracing::info!(events = session.len(), "capture complete");
        session
    }
}

/// Open a capture interval
pub fn channel() -> (EventSink, CaptureHandle) {
    let (tx, rx) = mpsc::channel();
    let slot = Arc::new(Mutex::new(Some(tx)));
    let handle = CaptureHandle {
        rx,
        slot: Arc::downgrade(&slot),
    };
    (EventSink { slot }, handle)
}
