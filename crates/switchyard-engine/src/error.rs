use switchyard_runtime::RuntimeError;

/// Errors that can occur while running flows.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
  /// The runner's trigger channel is closed.
  #[error("flow runner channel closed")]
  ChannelClosed,

  #[error(transparent)]
  Runtime(#[from] RuntimeError),
}
