//! Node materialization.
//!
//! The factory is the only place that turns a behavior type name into a
//! live object. Each behavior type is registered once with a constructor
//! that takes the node key and nothing else.

use std::collections::HashMap;
use std::fmt;

use switchyard_definition::{BehaviorType, Definition, NodeDefinition};
use switchyard_keys::SymbolicKey;

use crate::behavior::{AsyncNodeBehavior, Blocking, KeyedBehavior, NodeBehavior};
use crate::error::RuntimeError;
use crate::graph::RuntimeNode;

type Constructor<B> = Box<dyn Fn(SymbolicKey) -> Box<B> + Send + Sync>;

/// Registry mapping behavior type names to constructors.
///
/// `B` is the behavior object type produced, `dyn NodeBehavior` for the
/// synchronous driver or `dyn AsyncNodeBehavior` for the async one. A
/// factory is immutable once shared, so one `Arc<NodeFactory<_>>` can
/// serve any number of drivers.
pub struct NodeFactory<B: ?Sized> {
  constructors: HashMap<BehaviorType, Constructor<B>>,
}

/// Factory for [`Driver`](crate::Driver).
pub type SyncNodeFactory = NodeFactory<dyn NodeBehavior>;

/// Factory for [`AsyncDriver`](crate::AsyncDriver).
pub type AsyncNodeFactory = NodeFactory<dyn AsyncNodeBehavior>;

impl<B: ?Sized> NodeFactory<B> {
  pub fn new() -> Self {
    Self {
      constructors: HashMap::new(),
    }
  }

  /// Register a constructor for a behavior type, replacing any previous one.
  pub fn register_fn<F>(&mut self, behavior: impl Into<BehaviorType>, constructor: F) -> &mut Self
  where
    F: Fn(SymbolicKey) -> Box<B> + Send + Sync + 'static,
  {
    self
      .constructors
      .insert(behavior.into(), Box::new(constructor));
    self
  }

  pub fn is_registered(&self, behavior: &BehaviorType) -> bool {
    self.constructors.contains_key(behavior)
  }

  /// Registered behavior type names, in no particular order.
  pub fn behaviors(&self) -> impl Iterator<Item = &BehaviorType> {
    self.constructors.keys()
  }

  /// Check that every node of a definition can be constructed.
  ///
  /// Nodes are checked in definition order; the first unregistered
  /// behavior is reported.
  pub fn validate(&self, definition: &Definition) -> Result<(), RuntimeError> {
    for node in definition.nodes().values() {
      if !self.is_registered(node.behavior()) {
        return Err(unregistered(node));
      }
    }
    Ok(())
  }
}

impl<B: ?Sized + BoundBehavior> NodeFactory<B> {
  /// Create a live node bound to the definition's key.
  ///
  /// # Errors
  /// Returns [`RuntimeError::InvalidNodeType`] if the behavior type is not
  /// registered or the constructed behavior reports a different key.
  pub fn create(&self, definition: &NodeDefinition) -> Result<RuntimeNode<B>, RuntimeError> {
    let constructor = self
      .constructors
      .get(definition.behavior())
      .ok_or_else(|| unregistered(definition))?;

    let behavior = constructor(definition.key().clone());
    if behavior.bound_key() != definition.key() {
      return Err(RuntimeError::InvalidNodeType {
        node: definition.key().name().to_string(),
        behavior: definition.behavior().to_string(),
        message: format!(
          "constructor bound the behavior to key '{}'",
          behavior.bound_key()
        ),
      });
    }

    Ok(RuntimeNode::new(definition.key().clone(), behavior))
  }

  /// Create a live node for a definition that may be absent.
  ///
  /// Convenient after a lookup such as `definition.node(key)`.
  ///
  /// # Errors
  /// - [`RuntimeError::InvalidArgument`] if `definition` is `None`
  /// - [`RuntimeError::InvalidNodeType`] as for [`create`](Self::create)
  pub fn create_node(
    &self,
    definition: Option<&NodeDefinition>,
  ) -> Result<RuntimeNode<B>, RuntimeError> {
    let definition = definition.ok_or_else(|| RuntimeError::InvalidArgument {
      message: "node definition is required".to_string(),
    })?;
    self.create(definition)
  }
}

impl NodeFactory<dyn NodeBehavior> {
  /// Register a behavior type under its [`KeyedBehavior::BEHAVIOR`] name.
  pub fn register<T>(&mut self) -> &mut Self
  where
    T: NodeBehavior + KeyedBehavior + 'static,
  {
    self.register_fn(T::BEHAVIOR, |key| {
      Box::new(T::from_key(key)) as Box<dyn NodeBehavior>
    })
  }
}

impl NodeFactory<dyn AsyncNodeBehavior> {
  /// Register an async behavior type under its [`KeyedBehavior::BEHAVIOR`] name.
  pub fn register<T>(&mut self) -> &mut Self
  where
    T: AsyncNodeBehavior + KeyedBehavior + 'static,
  {
    self.register_fn(T::BEHAVIOR, |key| {
      Box::new(T::from_key(key)) as Box<dyn AsyncNodeBehavior>
    })
  }

  /// Register a synchronous behavior type to run under the async driver.
  pub fn register_blocking<T>(&mut self) -> &mut Self
  where
    T: NodeBehavior + KeyedBehavior + 'static,
  {
    self.register_fn(T::BEHAVIOR, |key| {
      Box::new(Blocking::new(T::from_key(key))) as Box<dyn AsyncNodeBehavior>
    })
  }
}

impl<B: ?Sized> Default for NodeFactory<B> {
  fn default() -> Self {
    Self::new()
  }
}

impl<B: ?Sized> fmt::Debug for NodeFactory<B> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut behaviors: Vec<&str> = self.behaviors().map(|b| b.as_str()).collect();
    behaviors.sort_unstable();
    f.debug_struct("NodeFactory")
      .field("behaviors", &behaviors)
      .finish()
  }
}

/// Access to the key a behavior object was constructed with.
pub trait BoundBehavior {
  fn bound_key(&self) -> &SymbolicKey;
}

impl BoundBehavior for dyn NodeBehavior {
  fn bound_key(&self) -> &SymbolicKey {
    self.key()
  }
}

impl BoundBehavior for dyn AsyncNodeBehavior {
  fn bound_key(&self) -> &SymbolicKey {
    self.key()
  }
}

fn unregistered(definition: &NodeDefinition) -> RuntimeError {
  RuntimeError::InvalidNodeType {
    node: definition.key().name().to_string(),
    behavior: definition.behavior().to_string(),
    message: "no constructor registered for this behavior type".to_string(),
  }
}

#[cfg(test)]
mod tests {
  use switchyard_context::Context;
  use switchyard_definition::ExitCode;

  use super::*;
  use crate::error::BehaviorError;

  struct Emit {
    key: SymbolicKey,
  }

  impl KeyedBehavior for Emit {
    const BEHAVIOR: &'static str = "emit";

    fn from_key(key: SymbolicKey) -> Self {
      Self { key }
    }
  }

  impl NodeBehavior for Emit {
    fn key(&self) -> &SymbolicKey {
      &self.key
    }

    fn execute(&mut self, _context: &mut Context) -> Result<ExitCode, BehaviorError> {
      Ok(ExitCode::OK)
    }
  }

  fn definition_with(behavior: &'static str) -> Definition {
    let mut builder = Definition::builder("factory");
    builder
      .add_node("A", behavior)
      .unwrap()
      .set_initial("A")
      .unwrap();
    builder.build().unwrap()
  }

  #[test]
  fn test_create_binds_key() {
    let mut factory = SyncNodeFactory::new();
    factory.register::<Emit>();

    let definition = definition_with("emit");
    let node = factory.create(definition.node("A").unwrap()).unwrap();

    assert_eq!(node.key().name(), "A");
    assert_eq!(node.behavior().key().name(), "A");
  }

  #[test]
  fn test_unregistered_behavior_is_invalid_node_type() {
    let factory = SyncNodeFactory::new();
    let definition = definition_with("missing");

    let err = factory.create(definition.node("A").unwrap()).unwrap_err();
    assert!(matches!(
      err,
      RuntimeError::InvalidNodeType { node, behavior, .. } if node == "A" && behavior == "missing"
    ));
    assert!(factory.validate(&definition).is_err());
  }

  #[test]
  fn test_absent_definition_is_invalid_argument() {
    let mut factory = SyncNodeFactory::new();
    factory.register::<Emit>();

    let definition = definition_with("emit");
    let err = factory.create_node(definition.node("Nope")).unwrap_err();
    assert!(matches!(err, RuntimeError::InvalidArgument { .. }));
  }

  #[test]
  fn test_constructor_must_bind_given_key() {
    let mut factory = SyncNodeFactory::new();
    factory.register_fn("emit", |_key| {
      Box::new(Emit {
        key: SymbolicKey::new("Elsewhere").unwrap(),
      }) as Box<dyn NodeBehavior>
    });

    let definition = definition_with("emit");
    let err = factory.create(definition.node("A").unwrap()).unwrap_err();
    assert!(matches!(err, RuntimeError::InvalidNodeType { .. }));
  }

  #[test]
  fn test_blocking_registration_for_async_factory() {
    let mut factory = AsyncNodeFactory::new();
    factory.register_blocking::<Emit>();

    let definition = definition_with("emit");
    assert!(factory.validate(&definition).is_ok());
    assert!(factory.create(definition.node("A").unwrap()).is_ok());
  }
}
