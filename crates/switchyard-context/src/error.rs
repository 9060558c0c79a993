/// Errors raised by context access.
#[derive(Debug, thiserror::Error)]
pub enum ContextError {
  /// The stored value does not match the type requested by the field.
  #[error("field '{field}' does not hold a {expected}: {source}")]
  TypeMismatch {
    field: String,
    expected: &'static str,
    #[source]
    source: serde_json::Error,
  },

  /// Seed data for a context was not a JSON object with valid field names.
  #[error("invalid context seed: {message}")]
  InvalidSeed { message: String },
}
