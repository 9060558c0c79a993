//! Asynchronous single-active-node driver.

use std::sync::Arc;
use std::time::Duration;

use switchyard_context::Context;
use switchyard_definition::{Definition, ExitCode};
use switchyard_keys::SymbolicKey;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

use crate::behavior::AsyncNodeBehavior;
use crate::config::DriverConfig;
use crate::cursor::{Cursor, Route};
use crate::error::RuntimeError;
use crate::events::DriverNotifier;
use crate::factory::AsyncNodeFactory;
use crate::graph::RuntimeGraph;
use crate::outcome::{DriverStatus, RunOutcome, StepOutcome, Visit};

/// Drives one execution of a definition whose behaviors may await.
///
/// Suspension happens only inside a node's `execute`; steps of one driver
/// never overlap. Cancellation is observed between nodes.
pub struct AsyncDriver {
  cursor: Cursor,
  graph: RuntimeGraph<dyn AsyncNodeBehavior>,
  context: Context,
}

impl AsyncDriver {
  /// Create a driver positioned on the definition's initial node.
  ///
  /// # Errors
  /// Returns [`RuntimeError::InvalidNodeType`] if the factory cannot build
  /// one of the definition's behavior types.
  pub fn new(
    definition: Arc<Definition>,
    factory: Arc<AsyncNodeFactory>,
    context: Context,
  ) -> Result<Self, RuntimeError> {
    let graph = RuntimeGraph::new(definition.clone(), factory)?;
    Ok(Self {
      cursor: Cursor::new(definition),
      graph,
      context,
    })
  }

  pub fn with_config(mut self, config: DriverConfig) -> Self {
    self.cursor.set_config(config);
    self
  }

  pub fn with_notifier(mut self, notifier: Arc<dyn DriverNotifier>) -> Self {
    self.cursor.set_notifier(notifier);
    self
  }

  /// Execute the current node and follow the link for its exit code.
  ///
  /// A node that exceeds `node_timeout_ms` fails the driver with
  /// [`RuntimeError::Timeout`], including a blocking node that overran
  /// without yielding; its result is discarded. Any failure rolls the context back to its
  /// state before the step.
  #[instrument(
    name = "async_driver_step",
    skip(self),
    fields(
      run_id = %self.cursor.run_id(),
      definition = %self.cursor.definition().name(),
      node = %self.cursor.current(),
    )
  )]
  pub async fn step(&mut self) -> Result<StepOutcome, RuntimeError> {
    let node = self.cursor.begin_step()?;
    let snapshot = self.context.snapshot();

    match self.execute(&node).await {
      Ok((code, route)) => Ok(self.cursor.commit(node, code, route)),
      Err(err) => {
        self.context.restore(snapshot);
        Err(self.cursor.fail(err))
      }
    }
  }

  /// Step until the driver finishes or `cancel` fires.
  ///
  /// Cancellation returns [`RuntimeError::Cancelled`] with the context as
  /// committed by the last completed step. The driver stays `Running`, so
  /// a later `run` or `step` resumes from the current node.
  #[instrument(
    name = "async_driver_run",
    skip(self, cancel),
    fields(
      run_id = %self.cursor.run_id(),
      definition = %self.cursor.definition().name(),
    )
  )]
  pub async fn run(&mut self, cancel: CancellationToken) -> Result<RunOutcome, RuntimeError> {
    loop {
      if cancel.is_cancelled() {
        info!(
          run_id = %self.cursor.run_id(),
          node = %self.cursor.current(),
          steps = self.cursor.steps(),
          "driver_cancelled"
        );
        return Err(RuntimeError::Cancelled);
      }

      if self.step().await?.is_finished() {
        return self.cursor.outcome();
      }
    }
  }

  async fn execute(&mut self, node: &SymbolicKey) -> Result<(ExitCode, Route), RuntimeError> {
    let timeout_ms = self.cursor.config().node_timeout_ms;
    let behavior = self.graph.node_mut(node)?.behavior_mut();
    let execution = behavior.execute(&mut self.context);
    let started = Instant::now();

    let result = match timeout_ms {
      Some(ms) => {
        let limit = Duration::from_millis(ms);
        let timed_out = || RuntimeError::Timeout {
          node: node.name().to_string(),
          timeout_ms: ms,
        };
        let result = tokio::time::timeout(limit, execution)
          .await
          .map_err(|_| timed_out())?;
        // A behavior that never yields cannot be interrupted; judge it by
        // wall time once it returns.
        if started.elapsed() > limit {
          return Err(timed_out());
        }
        result
      }
      None => execution.await,
    };

    let code = result.map_err(|source| RuntimeError::ExecutionFailure {
      node: node.name().to_string(),
      source,
    })?;

    let route = self.cursor.route(node, &code)?;
    if let Route::Move(to) = &route {
      self.graph.materialize(to)?;
    }
    Ok((code, route))
  }

  pub fn run_id(&self) -> &str {
    self.cursor.run_id()
  }

  pub fn definition(&self) -> &Arc<Definition> {
    self.cursor.definition()
  }

  pub fn config(&self) -> &DriverConfig {
    self.cursor.config()
  }

  pub fn status(&self) -> DriverStatus {
    self.cursor.status()
  }

  pub fn current(&self) -> &SymbolicKey {
    self.cursor.current()
  }

  pub fn last_code(&self) -> Option<&ExitCode> {
    self.cursor.last_code()
  }

  pub fn steps(&self) -> usize {
    self.cursor.steps()
  }

  pub fn history(&self) -> &[Visit] {
    self.cursor.history()
  }

  pub fn context(&self) -> &Context {
    &self.context
  }

  pub fn context_mut(&mut self) -> &mut Context {
    &mut self.context
  }

  pub fn into_context(self) -> Context {
    self.context
  }
}

impl std::fmt::Debug for AsyncDriver {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("AsyncDriver")
      .field("run_id", &self.cursor.run_id())
      .field("status", &self.cursor.status())
      .field("current", self.cursor.current())
      .field("steps", &self.cursor.steps())
      .finish_non_exhaustive()
  }
}
