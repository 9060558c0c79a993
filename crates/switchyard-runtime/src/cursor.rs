//! Step bookkeeping shared by the sync and async drivers.

use std::sync::Arc;

use switchyard_definition::{Definition, ExitCode};
use switchyard_keys::SymbolicKey;
use tracing::{error, info};

use crate::config::DriverConfig;
use crate::error::RuntimeError;
use crate::events::{DriverEvent, DriverNotifier, NoopNotifier};
use crate::outcome::{DriverStatus, RunOutcome, StepOutcome, Visit};

/// Where a produced code leads.
pub(crate) enum Route {
  Move(SymbolicKey),
  Finish,
}

pub(crate) struct Cursor {
  run_id: String,
  definition: Arc<Definition>,
  config: DriverConfig,
  notifier: Arc<dyn DriverNotifier>,
  status: DriverStatus,
  current: SymbolicKey,
  last_code: Option<ExitCode>,
  steps: usize,
  history: Vec<Visit>,
}

impl Cursor {
  pub(crate) fn new(definition: Arc<Definition>) -> Self {
    Self {
      run_id: uuid::Uuid::new_v4().to_string(),
      current: definition.initial().clone(),
      definition,
      config: DriverConfig::default(),
      notifier: Arc::new(NoopNotifier),
      status: DriverStatus::Created,
      last_code: None,
      steps: 0,
      history: Vec::new(),
    }
  }

  pub(crate) fn set_config(&mut self, config: DriverConfig) {
    self.config = config;
  }

  pub(crate) fn set_notifier(&mut self, notifier: Arc<dyn DriverNotifier>) {
    self.notifier = notifier;
  }

  pub(crate) fn run_id(&self) -> &str {
    &self.run_id
  }

  pub(crate) fn definition(&self) -> &Arc<Definition> {
    &self.definition
  }

  pub(crate) fn config(&self) -> &DriverConfig {
    &self.config
  }

  pub(crate) fn status(&self) -> DriverStatus {
    self.status
  }

  pub(crate) fn current(&self) -> &SymbolicKey {
    &self.current
  }

  pub(crate) fn last_code(&self) -> Option<&ExitCode> {
    self.last_code.as_ref()
  }

  pub(crate) fn steps(&self) -> usize {
    self.steps
  }

  pub(crate) fn history(&self) -> &[Visit] {
    &self.history
  }

  /// Admit a new step and return the node to execute.
  pub(crate) fn begin_step(&mut self) -> Result<SymbolicKey, RuntimeError> {
    if self.status.is_retired() {
      return Err(RuntimeError::Retired {
        status: self.status,
      });
    }

    if self.steps >= self.config.max_steps {
      return Err(self.fail(RuntimeError::StepLimitExceeded {
        limit: self.config.max_steps,
      }));
    }

    if self.status == DriverStatus::Created {
      self.status = DriverStatus::Running;
      info!(
        run_id = %self.run_id,
        definition = %self.definition.name(),
        initial = %self.current,
        "driver_started"
      );
      self.notifier.notify(DriverEvent::DriverStarted {
        run_id: self.run_id.clone(),
        definition: self.definition.name().to_string(),
      });
    }

    self.notifier.notify(DriverEvent::NodeStarted {
      run_id: self.run_id.clone(),
      node: self.current.name().to_string(),
    });

    Ok(self.current.clone())
  }

  /// Resolve the link for a code produced by `node`.
  pub(crate) fn route(&self, node: &SymbolicKey, code: &ExitCode) -> Result<Route, RuntimeError> {
    if let Some(link) = self.definition.get_link(node.name(), code.as_str()) {
      return Ok(Route::Move(link.to().clone()));
    }

    if self.config.strict_transitions && !self.definition.is_terminal(node.name()) {
      return Err(RuntimeError::ActionNotFound {
        node: node.name().to_string(),
        code: code.to_string(),
      });
    }

    Ok(Route::Finish)
  }

  /// Record a completed step.
  pub(crate) fn commit(&mut self, node: SymbolicKey, code: ExitCode, route: Route) -> StepOutcome {
    self.steps += 1;
    self.history.push(Visit {
      node: node.clone(),
      code: code.clone(),
    });
    self.last_code = Some(code.clone());

    info!(run_id = %self.run_id, node = %node, code = %code, "node_completed");
    self.notifier.notify(DriverEvent::NodeCompleted {
      run_id: self.run_id.clone(),
      node: node.name().to_string(),
      code: code.to_string(),
    });

    match route {
      Route::Move(to) => {
        self.current = to.clone();
        StepOutcome::Moved {
          from: node,
          code,
          to,
        }
      }
      Route::Finish => {
        self.status = DriverStatus::Finished;
        info!(
          run_id = %self.run_id,
          node = %node,
          code = %code,
          steps = self.steps,
          "driver_finished"
        );
        self.notifier.notify(DriverEvent::DriverFinished {
          run_id: self.run_id.clone(),
          node: node.name().to_string(),
          code: code.to_string(),
        });
        StepOutcome::Finished { node, code }
      }
    }
  }

  /// Retire the driver as failed and hand the error back.
  pub(crate) fn fail(&mut self, err: RuntimeError) -> RuntimeError {
    self.status = DriverStatus::Failed;

    error!(
      run_id = %self.run_id,
      node = %self.current,
      steps = self.steps,
      error = %err,
      "driver_failed"
    );
    self.notifier.notify(DriverEvent::NodeFailed {
      run_id: self.run_id.clone(),
      node: self.current.name().to_string(),
      error: err.to_string(),
    });
    self.notifier.notify(DriverEvent::DriverFailed {
      run_id: self.run_id.clone(),
      error: err.to_string(),
    });

    err
  }

  /// Summary of a finished run.
  pub(crate) fn outcome(&self) -> Result<RunOutcome, RuntimeError> {
    let code = match (self.status, &self.last_code) {
      (DriverStatus::Finished, Some(code)) => code.clone(),
      _ => {
        return Err(RuntimeError::InvalidArgument {
          message: format!("driver is {} and has no outcome", self.status),
        });
      }
    };

    Ok(RunOutcome {
      run_id: self.run_id.clone(),
      node: self.current.clone(),
      code,
      steps: self.steps,
      history: self.history.clone(),
    })
  }
}
