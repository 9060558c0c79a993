use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use switchyard_keys::{KeyedCollection, SymbolicKey};
use tracing::warn;

use crate::error::ContextError;
use crate::field::Field;
use crate::publisher::{EventPublisher, FIELD_CHANGED, NoopPublisher};
use crate::slot::Slot;

/// Typed, change-tracked key/value store for one execution.
///
/// A context is owned by exactly one driver at a time; it is `Send` but has
/// no internal locking.
pub struct Context {
  /// Caller name attached to published events.
  name: String,
  values: KeyedCollection<Slot>,
  /// Incremented on every store or removal that changes a value.
  revision: u64,
  publisher: Arc<dyn EventPublisher>,
}

/// A point-in-time copy of a context's values.
///
/// Restoring a snapshot publishes a change event for every field whose
/// value it puts back.
#[derive(Debug, Clone)]
pub struct ContextSnapshot {
  values: KeyedCollection<Slot>,
  revision: u64,
}

impl ContextSnapshot {
  pub fn revision(&self) -> u64 {
    self.revision
  }
}

impl Context {
  /// Create an empty context that publishes nowhere.
  pub fn new(name: impl Into<String>) -> Self {
    Self::with_publisher(name, Arc::new(NoopPublisher))
  }

  pub fn with_publisher(name: impl Into<String>, publisher: Arc<dyn EventPublisher>) -> Self {
    Self {
      name: name.into(),
      values: KeyedCollection::new(),
      revision: 0,
      publisher,
    }
  }

  /// Create a context pre-populated from a JSON object.
  ///
  /// Seeding does not publish events and leaves the revision at zero.
  pub fn from_json(
    name: impl Into<String>,
    seed: Value,
    publisher: Arc<dyn EventPublisher>,
  ) -> Result<Self, ContextError> {
    let mut context = Self::with_publisher(name, publisher);

    let object = match seed {
      Value::Object(object) => object,
      Value::Null => return Ok(context),
      other => {
        return Err(ContextError::InvalidSeed {
          message: format!("expected a JSON object, got {}", other),
        });
      }
    };

    for (name, value) in object {
      let key = SymbolicKey::new(&name).map_err(|e| ContextError::InvalidSeed {
        message: e.to_string(),
      })?;
      context.values.insert_or_replace(key, Slot::from_json(value));
    }

    Ok(context)
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  /// Store a value, overwriting any previous one.
  ///
  /// The value is kept as-is and reads back exactly, including values JSON
  /// cannot represent (non-finite floats, maps with non-string keys); those
  /// show up as `null` in events and [`to_json`](Self::to_json).
  ///
  /// Publishes [`FIELD_CHANGED`] when the stored value differs from the
  /// previous one.
  pub fn store<T>(&mut self, field: &Field<T>, value: T)
  where
    T: Serialize + Clone + PartialEq + Send + 'static,
  {
    let slot = Slot::new(field.name(), value);
    let changed = self
      .values
      .try_get(field.name())
      .is_none_or(|current| !current.same_as(&slot));

    let current = slot.json().clone();
    let previous = self
      .values
      .insert_or_replace(field.key().clone(), slot)
      .map(Slot::into_json)
      .unwrap_or(Value::Null);

    if changed {
      self.revision += 1;
      self.publish_change(field.name(), previous, current);
    }
  }

  /// Read a field as its declared type.
  ///
  /// Returns `T::default()` when the field was never stored. A stored value
  /// of a different shape is logged and also reads as the default.
  pub fn value<T: DeserializeOwned + Clone + Default + 'static>(&self, field: &Field<T>) -> T {
    match self.try_value(field) {
      Ok(Some(value)) => value,
      Ok(None) => T::default(),
      Err(e) => {
        warn!(context = %self.name, field = %field.name(), error = %e, "reading default for mismatched field");
        T::default()
      }
    }
  }

  /// Read a field, distinguishing absence and type mismatch.
  pub fn try_value<T: DeserializeOwned + Clone + 'static>(
    &self,
    field: &Field<T>,
  ) -> Result<Option<T>, ContextError> {
    match self.values.try_get(field.name()) {
      Some(slot) => slot
        .read::<T>()
        .map(Some)
        .map_err(|e| ContextError::TypeMismatch {
          field: field.name().to_string(),
          expected: std::any::type_name::<T>(),
          source: e,
        }),
      None => Ok(None),
    }
  }

  /// Whether a field has been stored, without materializing a default.
  pub fn has_item<T>(&self, field: &Field<T>) -> bool {
    self.values.contains_key(field.name())
  }

  /// Remove a field. Returns whether it was present.
  pub fn remove<T>(&mut self, field: &Field<T>) -> bool {
    match self.values.remove(field.name()) {
      Some(previous) => {
        self.revision += 1;
        self.publish_change(field.name(), previous.into_json(), Value::Null);
        true
      }
      None => false,
    }
  }

  /// JSON view of a field by name.
  pub fn get_raw(&self, name: &str) -> Option<&Value> {
    self.values.try_get(name).map(Slot::json)
  }

  /// Stored field names in first-store order.
  pub fn fields(&self) -> impl Iterator<Item = &SymbolicKey> + Clone + '_ {
    self.values.keys()
  }

  pub fn len(&self) -> usize {
    self.values.len()
  }

  pub fn is_empty(&self) -> bool {
    self.values.is_empty()
  }

  /// Number of value-changing writes so far.
  pub fn revision(&self) -> u64 {
    self.revision
  }

  pub fn snapshot(&self) -> ContextSnapshot {
    ContextSnapshot {
      values: self.values.clone(),
      revision: self.revision,
    }
  }

  /// Roll values and revision back to a snapshot.
  ///
  /// Every field the rollback changes is published as a [`FIELD_CHANGED`]
  /// event, so observers end up with the restored values.
  pub fn restore(&mut self, snapshot: ContextSnapshot) {
    let mut changes = Vec::new();
    for (key, current) in self.values.iter() {
      match snapshot.values.try_get(key) {
        Some(restored) if restored.same_as(current) => {}
        Some(restored) => changes.push((
          key.name().to_string(),
          current.json().clone(),
          restored.json().clone(),
        )),
        None => changes.push((key.name().to_string(), current.json().clone(), Value::Null)),
      }
    }
    for (key, restored) in snapshot.values.iter() {
      if !self.values.contains_key(key) {
        changes.push((key.name().to_string(), Value::Null, restored.json().clone()));
      }
    }

    self.values = snapshot.values;
    self.revision = snapshot.revision;

    for (field, previous, current) in changes {
      self.publish_change(&field, previous, current);
    }
  }

  /// All values as a JSON object.
  pub fn to_json(&self) -> Value {
    Value::Object(
      self
        .values
        .iter()
        .map(|(key, slot)| (key.name().to_string(), slot.json().clone()))
        .collect(),
    )
  }

  fn publish_change(&self, field: &str, previous: Value, current: Value) {
    self.publisher.publish(
      FIELD_CHANGED,
      &self.name,
      json!({
        "field": field,
        "previous": previous,
        "current": current,
      }),
    );
  }
}

impl fmt::Debug for Context {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Context")
      .field("name", &self.name)
      .field("values", &self.to_json())
      .field("revision", &self.revision)
      .finish()
  }
}
