use thiserror::Error;

/// Errors raised by key construction and keyed collection access.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
  /// A required input was empty.
  #[error("invalid argument: {message}")]
  InvalidArgument { message: String },

  /// The key is already registered in the collection.
  #[error("duplicate key: {key}")]
  DuplicateKey { key: String },

  /// The key is not registered in the collection.
  #[error("key not found: {key}")]
  KeyNotFound { key: String },
}

impl KeyError {
  pub fn invalid_argument(message: impl Into<String>) -> Self {
    Self::InvalidArgument {
      message: message.into(),
    }
  }
}
