use serde::{Deserialize, Serialize};

/// Driver configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
  /// Maximum number of steps a driver may execute before failing.
  pub max_steps: usize,
  /// Per-node execution timeout. Only enforced by the async driver.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub node_timeout_ms: Option<u64>,
  /// Fail with `ActionNotFound` instead of finishing when a node that has
  /// outgoing links produces a code none of them match.
  pub strict_transitions: bool,
}

impl Default for DriverConfig {
  fn default() -> Self {
    Self {
      max_steps: 1000,
      node_timeout_ms: None,
      strict_transitions: false,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_partial_config_uses_defaults() {
    let config: DriverConfig = serde_json::from_str(r#"{ "node_timeout_ms": 250 }"#).unwrap();

    assert_eq!(config.max_steps, 1000);
    assert_eq!(config.node_timeout_ms, Some(250));
    assert!(!config.strict_transitions);
  }
}
