//! Flow runner with channel-based triggering.
//!
//! The `FlowRunner` owns an mpsc channel of initial contexts and runs one
//! [`AsyncDriver`] per received context.

use std::sync::Arc;

use switchyard_context::Context;
use switchyard_definition::Definition;
use switchyard_runtime::{
  AsyncDriver, AsyncNodeFactory, DriverConfig, DriverNotifier, NoopNotifier, RunOutcome,
  RuntimeError,
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument};

use crate::error::EngineError;

/// Runs a definition once for every context sent to it.
///
/// All runs share one definition and one factory; each run gets its own
/// driver and context. Runs are executed one after another.
///
/// # Usage
///
/// ```ignore
/// let runner = FlowRunner::new(definition, factory);
///
/// // Hand the sender to whatever produces work
/// let sender = runner.sender();
///
/// let cancel = CancellationToken::new();
/// runner.start(cancel).await?;
/// ```
pub struct FlowRunner {
  sender: mpsc::Sender<Context>,
  receiver: mpsc::Receiver<Context>,
  definition: Arc<Definition>,
  factory: Arc<AsyncNodeFactory>,
  config: DriverConfig,
  notifier: Arc<dyn DriverNotifier>,
}

impl FlowRunner {
  pub fn new(definition: Arc<Definition>, factory: Arc<AsyncNodeFactory>) -> Self {
    Self::with_buffer_size(definition, factory, 100)
  }

  pub fn with_buffer_size(
    definition: Arc<Definition>,
    factory: Arc<AsyncNodeFactory>,
    buffer_size: usize,
  ) -> Self {
    let (sender, receiver) = mpsc::channel(buffer_size);
    Self {
      sender,
      receiver,
      definition,
      factory,
      config: DriverConfig::default(),
      notifier: Arc::new(NoopNotifier),
    }
  }

  /// Driver configuration applied to every run.
  pub fn with_config(mut self, config: DriverConfig) -> Self {
    self.config = config;
    self
  }

  /// Notifier handed to every run's driver.
  pub fn with_notifier(mut self, notifier: Arc<dyn DriverNotifier>) -> Self {
    self.notifier = notifier;
    self
  }

  /// Get a sender handle for triggering runs.
  pub fn sender(&self) -> mpsc::Sender<Context> {
    self.sender.clone()
  }

  /// Queue a run with the given initial context.
  pub async fn run(&self, context: Context) -> Result<(), EngineError> {
    self
      .sender
      .send(context)
      .await
      .map_err(|_| EngineError::ChannelClosed)
  }

  /// Start the execution loop.
  ///
  /// Blocks until the cancellation token is triggered or every sender
  /// handed out by [`sender`](Self::sender) has been dropped. A failed run
  /// is logged and does not stop the loop.
  #[instrument(
    name = "flow_runner",
    skip(self, cancel),
    fields(definition = %self.definition.name())
  )]
  pub async fn start(mut self, cancel: CancellationToken) -> Result<(), EngineError> {
    info!(definition = %self.definition.name(), "starting flow runner");

    // Only external senders keep the channel open from here on.
    let (detached, _) = mpsc::channel(1);
    self.sender = detached;

    loop {
      tokio::select! {
        _ = cancel.cancelled() => {
          info!(definition = %self.definition.name(), "flow runner cancelled");
          break;
        }
        context = self.receiver.recv() => {
          let Some(context) = context else {
            info!(definition = %self.definition.name(), "flow runner channel closed");
            break;
          };

          match self.execute_once(context, cancel.child_token()).await {
            Ok(outcome) => {
              info!(
                run_id = %outcome.run_id,
                node = %outcome.node,
                code = %outcome.code,
                steps = outcome.steps,
                "run completed"
              );
            }
            Err(EngineError::Runtime(RuntimeError::Cancelled)) => {
              info!(definition = %self.definition.name(), "run cancelled");
            }
            Err(e) => {
              error!(definition = %self.definition.name(), error = %e, "run failed");
            }
          }
        }
      }
    }

    Ok(())
  }

  /// Execute a single run directly, without the channel.
  pub async fn execute_once(
    &self,
    context: Context,
    cancel: CancellationToken,
  ) -> Result<RunOutcome, EngineError> {
    let mut driver = AsyncDriver::new(self.definition.clone(), self.factory.clone(), context)?
      .with_config(self.config.clone())
      .with_notifier(self.notifier.clone());

    Ok(driver.run(cancel).await?)
  }

  pub fn definition(&self) -> &Arc<Definition> {
    &self.definition
  }
}
