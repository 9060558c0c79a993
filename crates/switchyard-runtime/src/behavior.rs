//! Node behavior contracts.
//!
//! A behavior is the business logic behind a node: given the context it
//! returns the exit code that selects the next link, and may read or write
//! context fields on the way.

use async_trait::async_trait;
use switchyard_context::Context;
use switchyard_definition::ExitCode;
use switchyard_keys::SymbolicKey;

use crate::error::BehaviorError;

/// Synchronous node behavior, run by [`Driver`](crate::Driver).
pub trait NodeBehavior: Send {
  /// The node key this instance was constructed for.
  fn key(&self) -> &SymbolicKey;

  fn execute(&mut self, context: &mut Context) -> Result<ExitCode, BehaviorError>;
}

/// Asynchronous node behavior, run by [`AsyncDriver`](crate::AsyncDriver).
///
/// A driver only suspends inside `execute`; it never starts another node
/// of the same run while one is pending.
#[async_trait]
pub trait AsyncNodeBehavior: Send {
  fn key(&self) -> &SymbolicKey;

  async fn execute(&mut self, context: &mut Context) -> Result<ExitCode, BehaviorError>;
}

/// Behaviors constructible from nothing but their node key.
///
/// Implementing this lets a factory register the type by name with
/// `register::<T>()`.
pub trait KeyedBehavior: Sized {
  /// Behavior type name that node definitions refer to.
  const BEHAVIOR: &'static str;

  fn from_key(key: SymbolicKey) -> Self;
}

/// Runs a synchronous behavior under an [`AsyncDriver`](crate::AsyncDriver).
///
/// The wrapped behavior runs inline on the driving task.
pub struct Blocking<T> {
  inner: T,
}

impl<T: NodeBehavior> Blocking<T> {
  pub fn new(inner: T) -> Self {
    Self { inner }
  }

  pub fn into_inner(self) -> T {
    self.inner
  }
}

#[async_trait]
impl<T: NodeBehavior> AsyncNodeBehavior for Blocking<T> {
  fn key(&self) -> &SymbolicKey {
    self.inner.key()
  }

  async fn execute(&mut self, context: &mut Context) -> Result<ExitCode, BehaviorError> {
    self.inner.execute(context)
  }
}
