//! Synchronous single-active-node driver.

use std::sync::Arc;

use switchyard_context::Context;
use switchyard_definition::{Definition, ExitCode};
use switchyard_keys::SymbolicKey;
use tracing::instrument;

use crate::behavior::NodeBehavior;
use crate::config::DriverConfig;
use crate::cursor::{Cursor, Route};
use crate::error::RuntimeError;
use crate::events::DriverNotifier;
use crate::factory::SyncNodeFactory;
use crate::graph::RuntimeGraph;
use crate::outcome::{DriverStatus, RunOutcome, StepOutcome, Visit};

/// Drives one execution of a definition on the caller's thread.
///
/// # Usage
///
/// ```ignore
/// let mut driver = Driver::new(definition, factory, Context::new("order-42"))?
///   .with_config(DriverConfig { max_steps: 50, ..Default::default() });
///
/// while !driver.step()?.is_finished() {}
/// let context = driver.into_context();
/// ```
pub struct Driver {
  cursor: Cursor,
  graph: RuntimeGraph<dyn NodeBehavior>,
  context: Context,
}

impl Driver {
  /// Create a driver positioned on the definition's initial node.
  ///
  /// # Errors
  /// Returns [`RuntimeError::InvalidNodeType`] if the factory cannot build
  /// one of the definition's behavior types.
  pub fn new(
    definition: Arc<Definition>,
    factory: Arc<SyncNodeFactory>,
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
  /// On error the context is rolled back to its state before the step and
  /// the driver is `Failed`. Stepping a finished or failed driver returns
  /// [`RuntimeError::Retired`] and changes nothing.
  #[instrument(
    name = "driver_step",
    skip(self),
    fields(
      run_id = %self.cursor.run_id(),
      definition = %self.cursor.definition().name(),
      node = %self.cursor.current(),
    )
  )]
  pub fn step(&mut self) -> Result<StepOutcome, RuntimeError> {
    let node = self.cursor.begin_step()?;
    let snapshot = self.context.snapshot();

    match self.execute(&node) {
      Ok((code, route)) => Ok(self.cursor.commit(node, code, route)),
      Err(err) => {
        self.context.restore(snapshot);
        Err(self.cursor.fail(err))
      }
    }
  }

  /// Step until the driver finishes.
  pub fn run(&mut self) -> Result<RunOutcome, RuntimeError> {
    while !self.step()?.is_finished() {}
    self.cursor.outcome()
  }

  fn execute(&mut self, node: &SymbolicKey) -> Result<(ExitCode, Route), RuntimeError> {
    let code = self
      .graph
      .node_mut(node)?
      .behavior_mut()
      .execute(&mut self.context)
      .map_err(|source| RuntimeError::ExecutionFailure {
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

  /// The node the next step executes, or the node that finished the run.
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

impl std::fmt::Debug for Driver {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Driver")
      .field("run_id", &self.cursor.run_id())
      .field("status", &self.cursor.status())
      .field("current", self.cursor.current())
      .field("steps", &self.cursor.steps())
      .finish_non_exhaustive()
  }
}
