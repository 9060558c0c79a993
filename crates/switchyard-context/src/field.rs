use std::fmt;
use std::marker::PhantomData;

use switchyard_keys::{IntoKey, KeyError, SymbolicKey};

/// A typed key into a [`Context`](crate::Context).
///
/// The type parameter only exists at compile time; two fields with the same
/// name address the same slot.
pub struct Field<T> {
  key: SymbolicKey,
  _marker: PhantomData<fn() -> T>,
}

impl<T> Field<T> {
  pub fn new(name: impl IntoKey) -> Result<Self, KeyError> {
    Ok(Self::from_key(name.into_key()?))
  }

  pub fn from_key(key: SymbolicKey) -> Self {
    Self {
      key,
      _marker: PhantomData,
    }
  }

  pub fn key(&self) -> &SymbolicKey {
    &self.key
  }

  pub fn name(&self) -> &str {
    self.key.name()
  }
}

impl<T> Clone for Field<T> {
  fn clone(&self) -> Self {
    Self::from_key(self.key.clone())
  }
}

impl<T> fmt::Debug for Field<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Field")
      .field("name", &self.key.name())
      .field("type", &std::any::type_name::<T>())
      .finish()
  }
}
