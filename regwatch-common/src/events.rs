//! Change events and the in-process event bus
//!
//! Every mutating repository call publishes a [`RegwatchEvent`] describing the
//! affected row. Stream endpoints subscribe to the bus and relay the events
//! that concern their collection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::models::{AuditReport, Feature, Source, SourceContent};

/// Kind of mutation that produced an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeOperation {
    Insert,
    Update,
    Delete,
}

/// Row-level change notification
///
/// The document is the row after the change; it is `None` for deletes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RegwatchEvent {
    FeatureChanged {
        operation: ChangeOperation,
        feature_id: String,
        feature: Option<Feature>,
        timestamp: DateTime<Utc>,
    },
    SourceChanged {
        operation: ChangeOperation,
        source_id: String,
        source: Option<Source>,
        timestamp: DateTime<Utc>,
    },
    SourceContentChanged {
        operation: ChangeOperation,
        source_content_id: String,
        source_content: Option<SourceContent>,
        timestamp: DateTime<Utc>,
    },
    AuditReportChanged {
        operation: ChangeOperation,
        audit_report_id: String,
        audit_report: Option<AuditReport>,
        timestamp: DateTime<Utc>,
    },
}

impl RegwatchEvent {
    pub fn feature(operation: ChangeOperation, feature_id: &str, feature: Option<Feature>) -> Self {
        RegwatchEvent::FeatureChanged {
            operation,
            feature_id: feature_id.to_string(),
            feature,
            timestamp: Utc::now(),
        }
    }

    pub fn source(operation: ChangeOperation, source_id: &str, source: Option<Source>) -> Self {
        RegwatchEvent::SourceChanged {
            operation,
            source_id: source_id.to_string(),
            source,
            timestamp: Utc::now(),
        }
    }

    pub fn source_content(
        operation: ChangeOperation,
        source_content_id: &str,
        source_content: Option<SourceContent>,
    ) -> Self {
        RegwatchEvent::SourceContentChanged {
            operation,
            source_content_id: source_content_id.to_string(),
            source_content,
            timestamp: Utc::now(),
        }
    }

    pub fn audit_report(
        operation: ChangeOperation,
        audit_report_id: &str,
        audit_report: Option<AuditReport>,
    ) -> Self {
        RegwatchEvent::AuditReportChanged {
            operation,
            audit_report_id: audit_report_id.to_string(),
            audit_report,
            timestamp: Utc::now(),
        }
    }
}

/// Broadcast bus carrying [`RegwatchEvent`]s to every subscriber
///
/// Cloning the bus shares the underlying channel.
///
/// # Examples
///
/// ```
/// use regwatch_common::events::{ChangeOperation, EventBus, RegwatchEvent};
///
/// let event_bus = EventBus::new(16);
/// let mut rx = event_bus.subscribe();
///
/// event_bus.emit_lossy(RegwatchEvent::source(ChangeOperation::Delete, "s1", None));
/// assert!(rx.try_recv().is_ok());
/// ```
#[derive(Clone, Debug)]
pub struct EventBus {
    tx: broadcast::Sender<RegwatchEvent>,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// Subscribers that fall more than `capacity` events behind observe
    /// `RecvError::Lagged` and lose the oldest events.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<RegwatchEvent> {
        self.tx.subscribe()
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: RegwatchEvent) {
        let _ = self.tx.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::broadcast::error::{RecvError, TryRecvError};

    #[tokio::test]
    async fn subscriber_receives_emitted_event() {
        let bus = EventBus::new(10);
        let mut rx = bus.subscribe();

        bus.emit_lossy(RegwatchEvent::feature(ChangeOperation::Insert, "f1", None));

        match rx.recv().await.unwrap() {
            RegwatchEvent::FeatureChanged {
                operation,
                feature_id,
                ..
            } => {
                assert_eq!(operation, ChangeOperation::Insert);
                assert_eq!(feature_id, "f1");
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn emit_without_subscribers_is_dropped() {
        let bus = EventBus::new(10);
        bus.emit_lossy(RegwatchEvent::source(ChangeOperation::Delete, "s1", None));

        let mut rx = bus.subscribe();
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    }

    #[test]
    fn clones_share_the_channel() {
        let bus = EventBus::new(4);
        let mut rx = bus.clone().subscribe();
        bus.emit_lossy(RegwatchEvent::source(ChangeOperation::Insert, "s1", None));
        assert!(rx.try_recv().is_ok());
    }

    #[tokio::test]
    async fn slow_subscriber_observes_lag() {
        let bus = EventBus::new(2);
        let mut rx = bus.subscribe();
        for i in 0..5 {
            bus.emit_lossy(RegwatchEvent::audit_report(
                ChangeOperation::Update,
                &format!("r{}", i),
                None,
            ));
        }
        assert!(matches!(rx.recv().await, Err(RecvError::Lagged(_))));
    }

    #[test]
    fn event_serializes_with_type_tag() {
        let event = RegwatchEvent::source(ChangeOperation::Update, "s1", None);
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "SourceChanged");
        assert_eq!(value["operation"], "update");
        assert_eq!(value["source_id"], "s1");
    }
}
