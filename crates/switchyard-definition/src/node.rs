use serde::{Deserialize, Serialize};
use switchyard_keys::SymbolicKey;

use crate::code::BehaviorType;

/// What a node is: its key and the behavior variant that runs it.
///
/// This is not a live instance; the runtime materializes one per driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeDefinition {
  key: SymbolicKey,
  behavior: BehaviorType,
}

impl NodeDefinition {
  pub(crate) fn new(key: SymbolicKey, behavior: BehaviorType) -> Self {
    Self { key, behavior }
  }

  pub fn key(&self) -> &SymbolicKey {
    &self.key
  }

  pub fn behavior(&self) -> &BehaviorType {
    &self.behavior
  }
}
