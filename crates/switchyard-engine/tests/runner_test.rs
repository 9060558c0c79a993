use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use switchyard_context::{Context, Field};
use switchyard_definition::{Definition, ExitCode};
use switchyard_engine::FlowRunner;
use switchyard_keys::SymbolicKey;
use switchyard_runtime::{
  AsyncNodeBehavior, AsyncNodeFactory, BehaviorError, ChannelNotifier, DriverEvent,
  KeyedBehavior,
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

fn order_id() -> Field<String> {
  Field::new("order_id").unwrap()
}

/// Approves orders that carry an id.
struct Approve {
  key: SymbolicKey,
}

impl KeyedBehavior for Approve {
  const BEHAVIOR: &'static str = "approve";

  fn from_key(key: SymbolicKey) -> Self {
    Self { key }
  }
}

#[async_trait]
impl AsyncNodeBehavior for Approve {
  fn key(&self) -> &SymbolicKey {
    &self.key
  }

  async fn execute(&mut self, context: &mut Context) -> Result<ExitCode, BehaviorError> {
    tokio::task::yield_now().await;
    if context.value(&order_id()).is_empty() {
      return Err(BehaviorError::new("order id missing"));
    }
    Ok(ExitCode::OK)
  }
}

struct Archive {
  key: SymbolicKey,
}

impl KeyedBehavior for Archive {
  const BEHAVIOR: &'static str = "archive";

  fn from_key(key: SymbolicKey) -> Self {
    Self { key }
  }
}

#[async_trait]
impl AsyncNodeBehavior for Archive {
  fn key(&self) -> &SymbolicKey {
    &self.key
  }

  async fn execute(&mut self, _context: &mut Context) -> Result<ExitCode, BehaviorError> {
    Ok(ExitCode::DONE)
  }
}

fn create_runner() -> FlowRunner {
  let mut builder = Definition::builder("orders");
  builder
    .add_node("Approve", "approve")
    .unwrap()
    .add_node("Archive", "archive")
    .unwrap()
    .add_link("Approve", ExitCode::OK, "Archive")
    .unwrap()
    .set_initial("Approve")
    .unwrap();

  let mut factory = AsyncNodeFactory::new();
  factory.register::<Approve>().register::<Archive>();

  FlowRunner::new(Arc::new(builder.build().unwrap()), Arc::new(factory))
}

fn order(id: &str) -> Context {
  let mut context = Context::new(format!("order-{id}"));
  context.store(&order_id(), id.to_string());
  context
}

#[tokio::test]
async fn test_execute_once() {
  let runner = create_runner();

  let outcome = runner
    .execute_once(order("1"), CancellationToken::new())
    .await
    .unwrap();

  assert_eq!(outcome.node.name(), "Archive");
  assert_eq!(outcome.code, ExitCode::DONE);
  assert_eq!(outcome.steps, 2);
}

#[tokio::test]
async fn test_loop_runs_each_trigger_and_survives_failures() {
  let (events_tx, mut events_rx) = mpsc::unbounded_channel();
  let runner = create_runner().with_notifier(Arc::new(ChannelNotifier::new(events_tx)));
  let sender = runner.sender();

  let cancel = CancellationToken::new();
  let handle = tokio::spawn(runner.start(cancel.clone()));

  sender.send(order("1")).await.unwrap();
  sender.send(Context::new("no-id")).await.unwrap();
  sender.send(order("2")).await.unwrap();

  let mut finished = 0;
  let mut failed = 0;
  while finished + failed < 3 {
    let event = tokio::time::timeout(Duration::from_secs(5), events_rx.recv())
      .await
      .unwrap()
      .unwrap();
    match event {
      DriverEvent::DriverFinished { node, .. } => {
        assert_eq!(node, "Archive");
        finished += 1;
      }
      DriverEvent::DriverFailed { error, .. } => {
        assert!(error.contains("order id missing"));
        failed += 1;
      }
      _ => {}
    }
  }
  assert_eq!((finished, failed), (2, 1));

  cancel.cancel();
  assert!(handle.await.unwrap().is_ok());
}

#[tokio::test]
async fn test_cancelled_token_stops_run_before_first_step() {
  let runner = create_runner();
  let cancel = CancellationToken::new();
  cancel.cancel();

  let result = runner.execute_once(order("1"), cancel).await;
  assert!(matches!(
    result,
    Err(switchyard_engine::EngineError::Runtime(
      switchyard_runtime::RuntimeError::Cancelled
    ))
  ));
}
