//! Driver events and notifiers for observability.
//!
//! Drivers emit events as they step so consumers can follow progress,
//! persist history, stream to a UI, etc.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Events emitted while a driver runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DriverEvent {
  /// The first step of a run has begun.
  DriverStarted { run_id: String, definition: String },

  /// A node is about to execute.
  NodeStarted { run_id: String, node: String },

  /// A node executed and produced a code.
  NodeCompleted {
    run_id: String,
    node: String,
    code: String,
  },

  /// A step failed on this node.
  NodeFailed {
    run_id: String,
    node: String,
    error: String,
  },

  /// No link matched the last code; the run is complete.
  DriverFinished {
    run_id: String,
    node: String,
    code: String,
  },

  /// The run failed and the driver is retired.
  DriverFailed { run_id: String, error: String },
}

/// Trait for receiving driver events.
///
/// Called inline by the driver; implementations must not block.
pub trait DriverNotifier: Send + Sync {
  fn notify(&self, event: DriverEvent);
}

/// Discards all events.
#[derive(Debug, Clone, Default)]
pub struct NoopNotifier;

impl DriverNotifier for NoopNotifier {
  fn notify(&self, _event: DriverEvent) {}
}

/// Sends events to an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
  // Unbounded so a slow consumer never stalls a driver. Volume is a few
  // events per step.
  sender: mpsc::UnboundedSender<DriverEvent>,
}

impl ChannelNotifier {
  pub fn new(sender: mpsc::UnboundedSender<DriverEvent>) -> Self {
    Self { sender }
  }
}

impl DriverNotifier for ChannelNotifier {
  fn notify(&self, event: DriverEvent) {
    // Ignore send errors - receiver may have been dropped
    let _ = self.sender.send(event);
  }
}
