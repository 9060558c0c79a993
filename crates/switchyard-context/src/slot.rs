//! Storage cell for one context field.

use std::any::Any;
use std::fmt;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

/// A stored value with its concrete type intact.
trait StoredValue: Send {
  fn as_any(&self) -> &dyn Any;
  fn clone_boxed(&self) -> Box<dyn StoredValue>;
  /// Typed equality; `false` when `other` holds a different type.
  fn same_value(&self, other: &dyn StoredValue) -> bool;
}

impl<T: Any + Send + Clone + PartialEq> StoredValue for T {
  fn as_any(&self) -> &dyn Any {
    self
  }

  fn clone_boxed(&self) -> Box<dyn StoredValue> {
    Box::new(self.clone())
  }

  fn same_value(&self, other: &dyn StoredValue) -> bool {
    other
      .as_any()
      .downcast_ref::<T>()
      .is_some_and(|other| other == self)
  }
}

/// The typed value of a field plus its JSON view.
///
/// Reads of the stored type return the exact value. The JSON view feeds
/// change events and dumps, and serves reads under a different type; it is
/// `null` for values JSON cannot represent.
pub(crate) struct Slot {
  value: Box<dyn StoredValue>,
  json: Value,
}

impl Slot {
  pub(crate) fn new<T>(field: &str, value: T) -> Self
  where
    T: Serialize + Clone + PartialEq + Send + 'static,
  {
    let json = match serde_json::to_value(&value) {
      Ok(json) => json,
      Err(e) => {
        debug!(field, error = %e, "field value has no JSON form");
        Value::Null
      }
    };

    Self {
      value: Box::new(value),
      json,
    }
  }

  pub(crate) fn from_json(json: Value) -> Self {
    Self {
      value: Box::new(json.clone()),
      json,
    }
  }

  pub(crate) fn json(&self) -> &Value {
    &self.json
  }

  pub(crate) fn into_json(self) -> Value {
    self.json
  }

  /// Read as `T`, directly when stored as `T`, otherwise through JSON.
  pub(crate) fn read<T: DeserializeOwned + Clone + 'static>(&self) -> Result<T, serde_json::Error> {
    match self.value.as_ref().as_any().downcast_ref::<T>() {
      Some(value) => Ok(value.clone()),
      None => T::deserialize(&self.json),
    }
  }

  /// Whether two slots hold the same value.
  ///
  /// Values of different types compare by their JSON views, and only when
  /// both have one.
  pub(crate) fn same_as(&self, other: &Slot) -> bool {
    if self.value.as_ref().same_value(other.value.as_ref()) {
      return true;
    }
    let same_type = self.value.as_ref().as_any().type_id() == other.value.as_ref().as_any().type_id();
    !same_type && !self.json.is_null() && self.json == other.json
  }
}

impl Clone for Slot {
  fn clone(&self) -> Self {
    Self {
      value: self.value.as_ref().clone_boxed(),
      json: self.json.clone(),
    }
  }
}

impl fmt::Debug for Slot {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Slot({})", self.json)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::HashMap;

  #[test]
  fn test_non_finite_floats_keep_exact_value() {
    let slot = Slot::new("ratio", f64::NEG_INFINITY);

    assert_eq!(slot.read::<f64>().unwrap(), f64::NEG_INFINITY);
    assert_eq!(slot.json(), &Value::Null);
  }

  #[test]
  fn test_same_as() {
    assert!(Slot::new("n", 3_i64).same_as(&Slot::new("n", 3_i64)));
    assert!(!Slot::new("n", 3_i64).same_as(&Slot::new("n", 4_i64)));
    assert!(Slot::from_json(Value::from(3)).same_as(&Slot::new("n", 3_i64)));
    assert!(!Slot::new("x", f64::NAN).same_as(&Slot::new("x", f64::NAN)));
  }

  #[test]
  fn test_clone_keeps_type() {
    let mut grid = HashMap::new();
    grid.insert((1, 2), 3);
    let slot = Slot::new("grid", grid.clone());

    assert_eq!(slot.clone().read::<HashMap<(i32, i32), i32>>().unwrap(), grid);
  }
}
