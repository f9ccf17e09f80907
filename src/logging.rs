//! A `tracing` layer that forwards events over a crossbeam channel.
//!
//! With the `tracing` feature the engine emits its SQL, veto and failure
//! messages as `tracing` events. This layer lets an application drain them
//! on its own thread, or lets tests assert on what was emitted:
//!
//! ```no_run
//! use tracing_subscriber::layer::SubscriberExt;
//!
//! let (layer, events) = dbrecord::logging::channel_layer(1024);
//! let subscriber = tracing_subscriber::registry().with(layer);
//! tracing::subscriber::with_default(subscriber, || {
//!     tracing::info!(table = "contact", "saved");
//! });
//! let event = events.try_recv().unwrap();
//! assert_eq!(event.message, "saved");
//! ```

use crossbeam_channel::{bounded, Receiver, Sender};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

/// One captured `tracing` event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEvent {
    pub level: Level,
    pub target: String,
    pub message: String,
    pub fields: BTreeMap<String, String>,
}

#[derive(Default)]
struct FieldVisitor {
    message: String,
    fields: BTreeMap<String, String>,
}

impl Visit for FieldVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.fields.insert(field.name().to_string(), value.to_string());
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        } else {
            self.fields.insert(field.name().to_string(), format!("{value:?}"));
        }
    }
}

/// Layer sending every event to a bounded channel.
///
/// Events are dropped when the channel is full or the receiver is gone;
/// [`ChannelLayer::dropped`] counts them.
#[derive(Debug, Clone)]
pub struct ChannelLayer {
    sender: Sender<LogEvent>,
    dropped: Arc<AtomicU64>,
}

impl ChannelLayer {
    pub fn new(sender: Sender<LogEvent>) -> Self {
        Self {
            sender,
            dropped: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Number of events that could not be delivered.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl<S: Subscriber> Layer<S> for ChannelLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);

        let metadata = event.metadata();
        let record = LogEvent {
            level: *metadata.level(),
            target: metadata.target().to_string(),
            message: visitor.message,
            fields: visitor.fields,
        };

        if self.sender.try_send(record).is_err() {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
    }
}

/// A [`ChannelLayer`] and the receiving end of its channel.
pub fn channel_layer(capacity: usize) -> (ChannelLayer, Receiver<LogEvent>) {
    let (tx, rx) = bounded(capacity);
    (ChannelLayer::new(tx), rx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::layer::SubscriberExt;

    #[test]
    fn test_events_are_forwarded() {
        let (layer, rx) = channel_layer(8);
        let subscriber = tracing_subscriber::registry().with(layer);
        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!(table = "contact", rows = 2, "update failed");
        });

        let event = rx.try_recv().unwrap();
        assert_eq!(event.level, Level::WARN);
        assert_eq!(event.message, "update failed");
        assert_eq!(event.fields.get("table").unwrap(), "contact");
        assert_eq!(event.fields.get("rows").unwrap(), "2");
    }

    #[test]
    fn test_full_channel_drops_events() {
        let (layer, rx) = channel_layer(1);
        let handle = layer.clone();
        let subscriber = tracing_subscriber::registry().with(layer);
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!("first");
            tracing::info!("second");
        });

        assert_eq!(rx.try_recv().unwrap().message, "first");
        assert!(rx.try_recv().is_err());
        assert_eq!(handle.dropped(), 1);
    }
}
