//! Driver status and step/run result types.

use std::fmt;

use serde::{Deserialize, Serialize};
use switchyard_definition::ExitCode;
use switchyard_keys::SymbolicKey;

/// Lifecycle of a driver.
///
/// `Created -> Running -> {Finished, Failed}`. Finished and Failed are
/// terminal: the driver is retired and rejects further steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriverStatus {
  Created,
  Running,
  Finished,
  Failed,
}

impl DriverStatus {
  pub fn is_retired(self) -> bool {
    matches!(self, Self::Finished | Self::Failed)
  }
}

impl fmt::Display for DriverStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      Self::Created => "created",
      Self::Running => "running",
      Self::Finished => "finished",
      Self::Failed => "failed",
    };
    f.write_str(name)
  }
}

/// Result of a single successful step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
  /// The node produced `code` and the driver followed its link to `to`.
  Moved {
    from: SymbolicKey,
    code: ExitCode,
    to: SymbolicKey,
  },
  /// No link matched `code`; the driver is finished.
  Finished { node: SymbolicKey, code: ExitCode },
}

impl StepOutcome {
  pub fn is_finished(&self) -> bool {
    matches!(self, Self::Finished { .. })
  }
}

/// One executed node and the code it produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Visit {
  pub node: SymbolicKey,
  pub code: ExitCode,
}

/// Result of driving a run to completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunOutcome {
  pub run_id: String,
  /// The node that finished the run.
  pub node: SymbolicKey,
  /// The terminal exit code.
  pub code: ExitCode,
  pub steps: usize,
  pub history: Vec<Visit>,
}
