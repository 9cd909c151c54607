//! Observers receive the events a cache reports.

use sheetbase_core::CacheEvent;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Receiver of cache events.
///
/// Called synchronously from the task that produced the event, so
/// implementations must not block.
pub trait CacheObserver: Send + Sync {
    fn on_event(&self, event: &CacheEvent);
}

impl<F> CacheObserver for F
where
    F: Fn(&CacheEvent) + Send + Sync,
{
    fn on_event(&self, event: &CacheEvent) {
        self(event)
    }
}

/// Forwards events into an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    sender: mpsc::UnboundedSender<CacheEvent>,
}

impl ChannelObserver {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<CacheEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl CacheObserver for ChannelObserver {
    fn on_event(&self, event: &CacheEvent) {
        // Receiver gone means nobody is listening any more
        let _ = self.sender.send(event.clone());
    }
}

/// Fan-out to every registered observer, with a log line per event.
#[derive(Clone)]
pub(crate) struct EventSink {
    observers: Arc<[Arc<dyn CacheObserver>]>,
}

impl EventSink {
    pub(crate) fn new(observers: Vec<Arc<dyn CacheObserver>>) -> Self {
        Self {
            observers: observers.into(),
        }
    }

    pub(crate) fn emit(&self, event: CacheEvent) {
        match &event {
            CacheEvent::FetchFailed { partition, error } => tracing::error!(
                partition = %partition,
                error = %error,
                kind = error.kind(),
                "Document fetch failed, using fallback document"
            ),
            CacheEvent::SaveSucceeded {
                partition,
                sequence,
            } => tracing::info!(partition = %partition, sequence, "Document saved"),
            CacheEvent::SaveFailed {
                partition,
                sequence,
                error,
            } => tracing::error!(
                partition = %partition,
                sequence,
                error = %error,
                kind = error.kind(),
                "Document save failed, changes may not persist"
            ),
        }
        for observer in self.observers.iter() {
            observer.on_event(&event);
        }
    }
}
