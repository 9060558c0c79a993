//! Runtime error types.

use switchyard_context::ContextError;

use crate::outcome::DriverStatus;

/// Errors that can occur while constructing or stepping a driver.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
  /// A required input was missing.
  #[error("invalid argument: {message}")]
  InvalidArgument { message: String },

  /// The node's behavior type has no registered constructor, or the
  /// constructed behavior did not bind to the node's key.
  #[error("cannot construct node '{node}' with behavior '{behavior}': {message}")]
  InvalidNodeType {
    node: String,
    behavior: String,
    message: String,
  },

  /// A node with outgoing links produced a code none of them handle.
  /// Only raised with `strict_transitions` enabled.
  #[error("node '{node}' produced code '{code}' but has no link for it")]
  ActionNotFound { node: String, code: String },

  /// The node behavior returned an error.
  #[error("node '{node}' failed: {source}")]
  ExecutionFailure {
    node: String,
    #[source]
    source: BehaviorError,
  },

  /// The node behavior did not finish within the configured timeout.
  #[error("node '{node}' timed out after {timeout_ms}ms")]
  Timeout { node: String, timeout_ms: u64 },

  /// The run was cancelled between steps.
  #[error("execution cancelled")]
  Cancelled,

  /// The driver hit its configured step budget.
  #[error("step limit of {limit} exceeded")]
  StepLimitExceeded { limit: usize },

  /// The driver already finished or failed and accepts no more steps.
  #[error("driver is {status} and accepts no further steps")]
  Retired { status: DriverStatus },

  /// A node key is not part of the definition.
  #[error("node '{node}' not found in definition")]
  NodeNotFound { node: String },
}

/// Error returned by a node behavior.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct BehaviorError {
  message: String,
  #[source]
  source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl BehaviorError {
  pub fn new(message: impl Into<String>) -> Self {
    Self {
      message: message.into(),
      source: None,
    }
  }

  pub fn with_source(
    message: impl Into<String>,
    source: impl std::error::Error + Send + Sync + 'static,
  ) -> Self {
    Self {
      message: message.into(),
      source: Some(Box::new(source)),
    }
  }

  pub fn message(&self) -> &str {
    &self.message
  }
}

impl From<ContextError> for BehaviorError {
  fn from(err: ContextError) -> Self {
    Self::with_source("context access failed", err)
  }
}
