use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::KeyError;

/// Immutable symbolic identity used to address nodes, links and fields.
///
/// Equality, ordering and hashing only look at the name. The optional
/// numeric id travels with the key for display and diagnostics but two keys
/// with the same name and different ids are still equal.
///
/// Cloning is cheap: the name is reference counted.
#[derive(Clone)]
pub struct SymbolicKey {
  id: Option<i64>,
  name: Arc<str>,
}

impl SymbolicKey {
  /// Create a key from a name.
  ///
  /// # Errors
  /// Returns [`KeyError::InvalidArgument`] if the name is empty or only
  /// whitespace.
  pub fn new(name: impl AsRef<str>) -> Result<Self, KeyError> {
    let name = name.as_ref();
    if name.trim().is_empty() {
      return Err(KeyError::invalid_argument(
        "symbolic key name must not be empty",
      ));
    }

    Ok(Self {
      id: None,
      name: Arc::from(name),
    })
  }

  /// Create a key carrying a numeric id alongside its name.
  pub fn with_id(id: i64, name: impl AsRef<str>) -> Result<Self, KeyError> {
    let mut key = Self::new(name)?;
    key.id = Some(id);
    Ok(key)
  }

  /// The numeric id, if one was assigned.
  pub fn id(&self) -> Option<i64> {
    self.id
  }

  /// The key name.
  pub fn name(&self) -> &str {
    &self.name
  }
}

impl PartialEq for SymbolicKey {
  fn eq(&self, other: &Self) -> bool {
    self.name == other.name
  }
}

impl Eq for SymbolicKey {}

impl Hash for SymbolicKey {
  // Must agree with `str`'s hash so `Borrow<str>` lookups work.
  fn hash<H: Hasher>(&self, state: &mut H) {
    self.name().hash(state);
  }
}

impl PartialOrd for SymbolicKey {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
    Some(self.cmp(other))
  }
}

impl Ord for SymbolicKey {
  fn cmp(&self, other: &Self) -> Ordering {
    self.name().cmp(other.name())
  }
}

impl Borrow<str> for SymbolicKey {
  fn borrow(&self) -> &str {
    self.name()
  }
}

impl AsRef<str> for SymbolicKey {
  fn as_ref(&self) -> &str {
    self.name()
  }
}

impl fmt::Debug for SymbolicKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self.id {
      Some(id) => write!(f, "SymbolicKey({}#{})", self.name, id),
      None => write!(f, "SymbolicKey({})", self.name),
    }
  }
}

impl fmt::Display for SymbolicKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.name)
  }
}

impl TryFrom<&str> for SymbolicKey {
  type Error = KeyError;

  fn try_from(value: &str) -> Result<Self, Self::Error> {
    Self::new(value)
  }
}

impl TryFrom<String> for SymbolicKey {
  type Error = KeyError;

  fn try_from(value: String) -> Result<Self, Self::Error> {
    Self::new(value)
  }
}

/// Conversion into a [`SymbolicKey`], validating names on the way.
///
/// Lets graph-building APIs accept either ready-made keys or plain names.
pub trait IntoKey {
  fn into_key(self) -> Result<SymbolicKey, KeyError>;
}

impl IntoKey for SymbolicKey {
  fn into_key(self) -> Result<SymbolicKey, KeyError> {
    Ok(self)
  }
}

impl IntoKey for &SymbolicKey {
  fn into_key(self) -> Result<SymbolicKey, KeyError> {
    Ok(self.clone())
  }
}

impl IntoKey for &str {
  fn into_key(self) -> Result<SymbolicKey, KeyError> {
    SymbolicKey::new(self)
  }
}

impl IntoKey for String {
  fn into_key(self) -> Result<SymbolicKey, KeyError> {
    SymbolicKey::new(self)
  }
}

impl IntoKey for &String {
  fn into_key(self) -> Result<SymbolicKey, KeyError> {
    SymbolicKey::new(self)
  }
}

impl Serialize for SymbolicKey {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(self.name())
  }
}

impl<'de> Deserialize<'de> for SymbolicKey {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    let name = String::deserialize(deserializer)?;
    Self::new(name).map_err(serde::de::Error::custom)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::HashSet;

  #[test]
  fn test_empty_name_rejected() {
    assert!(matches!(
      SymbolicKey::new(""),
      Err(KeyError::InvalidArgument { .. })
    ));
    assert!(matches!(
      SymbolicKey::new("   "),
      Err(KeyError::InvalidArgument { .. })
    ));
  }

  #[test]
  fn test_equality_ignores_id() {
    let a = SymbolicKey::with_id(1, "Init").unwrap();
    let b = SymbolicKey::with_id(2, "Init").unwrap();
    let c = SymbolicKey::new("Init").unwrap();

    assert_eq!(a, b);
    assert_eq!(a, c);
    assert_eq!(a.id(), Some(1));
    assert_eq!(c.id(), None);

    let set: HashSet<SymbolicKey> = [a, b, c].into_iter().collect();
    assert_eq!(set.len(), 1);
  }

  #[test]
  fn test_lookup_by_str() {
    let set: HashSet<SymbolicKey> = [SymbolicKey::new("Working").unwrap()].into_iter().collect();
    assert!(set.contains("Working"));
    assert!(!set.contains("Missing"));
  }

  #[test]
  fn test_serde_as_plain_string() {
    let key = SymbolicKey::with_id(7, "Done").unwrap();
    assert_eq!(serde_json::to_string(&key).unwrap(), "\"Done\"");

    let parsed: SymbolicKey = serde_json::from_str("\"Done\"").unwrap();
    assert_eq!(parsed, key);

    let empty: Result<SymbolicKey, _> = serde_json::from_str("\"\"");
    assert!(empty.is_err());
  }

  #[test]
  fn test_display_and_debug() {
    let key = SymbolicKey::with_id(3, "Approve").unwrap();
    assert_eq!(key.to_string(), "Approve");
    assert_eq!(format!("{:?}", key), "SymbolicKey(Approve#3)");
  }
}
