use serde::{Deserialize, Serialize};
use switchyard_keys::SymbolicKey;

use crate::code::ExitCode;

/// A directed edge taken when node `from` produces `code`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkDefinition {
  key: SymbolicKey,
  from: SymbolicKey,
  to: SymbolicKey,
  code: ExitCode,
}

impl LinkDefinition {
  pub(crate) fn new(key: SymbolicKey, from: SymbolicKey, code: ExitCode, to: SymbolicKey) -> Self {
    Self {
      key,
      from,
      to,
      code,
    }
  }

  pub fn key(&self) -> &SymbolicKey {
    &self.key
  }

  /// Source node.
  pub fn from(&self) -> &SymbolicKey {
    &self.from
  }

  /// Target node.
  pub fn to(&self) -> &SymbolicKey {
    &self.to
  }

  pub fn code(&self) -> &ExitCode {
    &self.code
  }
}
