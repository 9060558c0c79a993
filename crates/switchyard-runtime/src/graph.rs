//! Materialized runtime graph for a single driver.

use std::fmt;
use std::sync::Arc;

use switchyard_definition::Definition;
use switchyard_keys::{KeyedCollection, SymbolicKey};
use tracing::debug;

use crate::error::RuntimeError;
use crate::factory::{BoundBehavior, NodeFactory};

/// A live node: its key and the behavior instance that runs it.
pub struct RuntimeNode<B: ?Sized> {
  key: SymbolicKey,
  behavior: Box<B>,
}

impl<B: ?Sized> RuntimeNode<B> {
  pub(crate) fn new(key: SymbolicKey, behavior: Box<B>) -> Self {
    Self { key, behavior }
  }

  pub fn key(&self) -> &SymbolicKey {
    &self.key
  }

  pub fn behavior(&self) -> &B {
    &self.behavior
  }

  pub fn behavior_mut(&mut self) -> &mut B {
    &mut self.behavior
  }
}

impl<B: ?Sized> fmt::Debug for RuntimeNode<B> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("RuntimeNode")
      .field("key", &self.key)
      .finish_non_exhaustive()
  }
}

/// The live nodes of one driver.
///
/// Nodes are created on first visit and reused on later visits, so a
/// behavior can keep state across loops in the graph. The graph is owned
/// by exactly one driver.
pub struct RuntimeGraph<B: ?Sized> {
  definition: Arc<Definition>,
  factory: Arc<NodeFactory<B>>,
  nodes: KeyedCollection<RuntimeNode<B>>,
}

impl<B: ?Sized + BoundBehavior> RuntimeGraph<B> {
  /// Create an empty runtime graph.
  ///
  /// # Errors
  /// Returns [`RuntimeError::InvalidNodeType`] if any node's behavior type is
  /// not registered in the factory.
  pub fn new(definition: Arc<Definition>, factory: Arc<NodeFactory<B>>) -> Result<Self, RuntimeError> {
    factory.validate(&definition)?;

    Ok(Self {
      definition,
      factory,
      nodes: KeyedCollection::new(),
    })
  }

  pub fn definition(&self) -> &Arc<Definition> {
    &self.definition
  }

  /// Make sure the node exists, constructing it if needed.
  pub fn materialize(&mut self, key: &SymbolicKey) -> Result<(), RuntimeError> {
    if self.nodes.contains_key(key) {
      return Ok(());
    }

    let node_definition = self
      .definition
      .node(key.name())
      .ok_or_else(|| RuntimeError::NodeNotFound {
        node: key.name().to_string(),
      })?;
    let node = self.factory.create(node_definition)?;

    debug!(
      definition = %self.definition.name(),
      node = %key,
      behavior = %node_definition.behavior(),
      "node materialized"
    );

    self
      .nodes
      .add(node_definition.key().clone(), node)
      .map_err(|e| RuntimeError::InvalidArgument {
        message: e.to_string(),
      })
  }

  /// The live node for a key, materializing it on first access.
  pub fn node_mut(&mut self, key: &SymbolicKey) -> Result<&mut RuntimeNode<B>, RuntimeError> {
    self.materialize(key)?;
    self
      .nodes
      .try_get_mut(key)
      .ok_or_else(|| RuntimeError::NodeNotFound {
        node: key.name().to_string(),
      })
  }

  pub fn is_materialized(&self, key: &str) -> bool {
    self.nodes.contains_key(key)
  }

  /// Number of nodes instantiated so far.
  pub fn materialized_len(&self) -> usize {
    self.nodes.len()
  }
}

#[cfg(test)]
mod tests {
  use switchyard_context::Context;
  use switchyard_definition::ExitCode;

  use super::*;
  use crate::behavior::{KeyedBehavior, NodeBehavior};
  use crate::error::BehaviorError;
  use crate::factory::SyncNodeFactory;

  struct Counter {
    key: SymbolicKey,
    runs: u32,
  }

  impl KeyedBehavior for Counter {
    const BEHAVIOR: &'static str = "counter";

    fn from_key(key: SymbolicKey) -> Self {
      Self { key, runs: 0 }
    }
  }

  impl NodeBehavior for Counter {
    fn key(&self) -> &SymbolicKey {
      &self.key
    }

    fn execute(&mut self, _context: &mut Context) -> Result<ExitCode, BehaviorError> {
      self.runs += 1;
      Ok(ExitCode::new(self.runs.to_string()))
    }
  }

  fn graph() -> RuntimeGraph<dyn NodeBehavior> {
    let mut builder = Definition::builder("lazy");
    builder
      .add_node("A", "counter")
      .unwrap()
      .add_node("B", "counter")
      .unwrap()
      .add_link("A", ExitCode::NEXT, "B")
      .unwrap()
      .set_initial("A")
      .unwrap();

    let mut factory = SyncNodeFactory::new();
    factory.register::<Counter>();

    RuntimeGraph::new(Arc::new(builder.build().unwrap()), Arc::new(factory)).unwrap()
  }

  #[test]
  fn test_nodes_materialize_lazily_and_are_reused() {
    let mut graph = graph();
    let a = SymbolicKey::new("A").unwrap();
    let mut context = Context::new("test");

    assert_eq!(graph.materialized_len(), 0);

    let first = graph.node_mut(&a).unwrap().behavior_mut().execute(&mut context).unwrap();
    let second = graph.node_mut(&a).unwrap().behavior_mut().execute(&mut context).unwrap();

    assert_eq!(first, "1");
    assert_eq!(second, "2");
    assert_eq!(graph.materialized_len(), 1);
    assert!(!graph.is_materialized("B"));
  }

  #[test]
  fn test_unknown_node() {
    let mut graph = graph();
    let err = graph.node_mut(&SymbolicKey::new("Z").unwrap()).unwrap_err();

    assert!(matches!(err, RuntimeError::NodeNotFound { node } if node == "Z"));
  }

  #[test]
  fn test_unregistered_behavior_rejected_up_front() {
    let mut builder = Definition::builder("bad");
    builder
      .add_node("A", "unknown")
      .unwrap()
      .set_initial("A")
      .unwrap();

    let result = RuntimeGraph::<dyn NodeBehavior>::new(
      Arc::new(builder.build().unwrap()),
      Arc::new(SyncNodeFactory::new()),
    );
    assert!(matches!(result, Err(RuntimeError::InvalidNodeType { .. })));
  }
}
