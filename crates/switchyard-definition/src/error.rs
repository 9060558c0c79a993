use switchyard_keys::KeyError;
use thiserror::Error;

/// Errors raised while assembling or loading a definition.
#[derive(Debug, Error)]
pub enum DefinitionError {
  /// A required input was empty.
  #[error("invalid argument: {message}")]
  InvalidArgument { message: String },

  /// A node with this key was already added.
  #[error("duplicate node: {node}")]
  DuplicateNode { node: String },

  /// A link leaving `from` with `code` was already added.
  #[error("duplicate link: node '{from}' already has a link for code '{code}'")]
  DuplicateLink { from: String, code: String },

  /// A link with this key was already added.
  #[error("duplicate link key: {key}")]
  DuplicateKey { key: String },

  /// Lookup of a node that is not part of the definition.
  #[error("node not found: {node}")]
  NodeNotFound { node: String },

  /// The graph failed validation at build time.
  ///
  /// `keys` names the offending node or link keys.
  #[error("invalid definition: {message}")]
  InvalidDefinition { message: String, keys: Vec<String> },

  /// A serialized definition could not be parsed.
  #[error("failed to parse definition: {0}")]
  Parse(#[from] serde_json::Error),

  /// A definition file could not be read.
  #[error("failed to read definition: {0}")]
  Io(#[from] std::io::Error),
}

impl DefinitionError {
  pub(crate) fn invalid_definition(message: impl Into<String>, keys: Vec<String>) -> Self {
    Self::InvalidDefinition {
      message: message.into(),
      keys,
    }
  }
}

impl From<KeyError> for DefinitionError {
  fn from(err: KeyError) -> Self {
    match err {
      KeyError::InvalidArgument { message } => Self::InvalidArgument { message },
      KeyError::DuplicateKey { key } => Self::DuplicateKey { key },
      KeyError::KeyNotFound { key } => Self::NodeNotFound { node: key },
    }
  }
}
