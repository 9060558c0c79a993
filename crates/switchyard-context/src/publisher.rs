//! Change notification for context fields.
//!
//! The context calls [`EventPublisher::publish`] after every store that
//! changes a value. Implementations decide what to do with it (forward,
//! log, ignore).

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::debug;

/// Event name used for context field changes.
pub const FIELD_CHANGED: &str = "context.field_changed";

/// Receives context change events.
///
/// Calls happen inline on the storing thread, so implementations must not
/// block. There is no error channel: a publisher that cannot deliver drops
/// the event.
pub trait EventPublisher: Send + Sync {
  /// Publish an event.
  ///
  /// For [`FIELD_CHANGED`] the payload is
  /// `{"field": name, "previous": value, "current": value}`, with `null`
  /// standing for an absent value.
  fn publish(&self, event_name: &str, caller_name: &str, payload: serde_json::Value);
}

/// Discards every event.
#[derive(Debug, Clone, Default)]
pub struct NoopPublisher;

impl EventPublisher for NoopPublisher {
  fn publish(&self, _event_name: &str, _caller_name: &str, _payload: serde_json::Value) {}
}

/// Logs every event at debug level.
#[derive(Debug, Clone, Default)]
pub struct TracingPublisher;

impl EventPublisher for TracingPublisher {
  fn publish(&self, event_name: &str, caller_name: &str, payload: serde_json::Value) {
    debug!(event = event_name, caller = caller_name, payload = %payload, "context event");
  }
}

/// An event as delivered by [`ChannelPublisher`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishedEvent {
  pub event_name: String,
  pub caller_name: String,
  pub payload: serde_json::Value,
}

/// Forwards events to an unbounded channel.
///
/// Unbounded so a slow consumer never stalls a store; events are small and
/// one is sent per changed value.
#[derive(Debug, Clone)]
pub struct ChannelPublisher {
  sender: mpsc::UnboundedSender<PublishedEvent>,
}

impl ChannelPublisher {
  pub fn new(sender: mpsc::UnboundedSender<PublishedEvent>) -> Self {
    Self { sender }
  }

  /// Create a publisher together with the receiving end of its channel.
  pub fn channel() -> (Self, mpsc::UnboundedReceiver<PublishedEvent>) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (Self::new(sender), receiver)
  }
}

impl EventPublisher for ChannelPublisher {
  fn publish(&self, event_name: &str, caller_name: &str, payload: serde_json::Value) {
    // Receiver may have been dropped
    let _ = self.sender.send(PublishedEvent {
      event_name: event_name.to_string(),
      caller_name: caller_name.to_string(),
      payload,
    });
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[tokio::test]
  async fn test_channel_publisher_delivers() {
    let (publisher, mut receiver) = ChannelPublisher::channel();
    publisher.publish(FIELD_CHANGED, "run-1", json!({ "field": "count" }));

    let event = receiver.recv().await.unwrap();
    assert_eq!(event.event_name, FIELD_CHANGED);
    assert_eq!(event.caller_name, "run-1");
    assert_eq!(event.payload["field"], "count");
  }

  #[test]
  fn test_channel_publisher_ignores_closed_receiver() {
    let (publisher, receiver) = ChannelPublisher::channel();
    drop(receiver);

    publisher.publish(FIELD_CHANGED, "run-1", json!(null));
  }
}
