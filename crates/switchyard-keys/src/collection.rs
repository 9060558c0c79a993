use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use crate::error::KeyError;
use crate::key::SymbolicKey;

/// Ordered mapping from [`SymbolicKey`] to `V` with unique keys.
///
/// Entries enumerate in insertion order. Lookups accept anything the key
/// borrows as, so both `&SymbolicKey` and `&str` work.
#[derive(Debug, Clone)]
pub struct KeyedCollection<V> {
  entries: Vec<(SymbolicKey, V)>,
  /// Position of each key in `entries`.
  index: HashMap<SymbolicKey, usize>,
}

impl<V> KeyedCollection<V> {
  pub fn new() -> Self {
    Self {
      entries: Vec::new(),
      index: HashMap::new(),
    }
  }

  pub fn with_capacity(capacity: usize) -> Self {
    Self {
      entries: Vec::with_capacity(capacity),
      index: HashMap::with_capacity(capacity),
    }
  }

  /// Add a new entry.
  ///
  /// # Errors
  /// Returns [`KeyError::DuplicateKey`] if the key is already present. The
  /// collection is left unchanged.
  pub fn add(&mut self, key: SymbolicKey, value: V) -> Result<(), KeyError> {
    if self.index.contains_key(&key) {
      return Err(KeyError::DuplicateKey {
        key: key.name().to_string(),
      });
    }

    self.index.insert(key.clone(), self.entries.len());
    self.entries.push((key, value));
    Ok(())
  }

  /// Insert a value, replacing and returning any existing value for the key.
  ///
  /// A replaced entry keeps its original position.
  pub fn insert_or_replace(&mut self, key: SymbolicKey, value: V) -> Option<V> {
    match self.index.get(&key) {
      Some(&pos) => Some(std::mem::replace(&mut self.entries[pos].1, value)),
      None => {
        self.index.insert(key.clone(), self.entries.len());
        self.entries.push((key, value));
        None
      }
    }
  }

  /// Get the value for a key.
  ///
  /// # Errors
  /// Returns [`KeyError::KeyNotFound`] if the key is absent.
  pub fn get<Q>(&self, key: &Q) -> Result<&V, KeyError>
  where
    SymbolicKey: Borrow<Q>,
    Q: Hash + Eq + fmt::Display + ?Sized,
  {
    self.try_get(key).ok_or_else(|| KeyError::KeyNotFound {
      key: key.to_string(),
    })
  }

  /// Get the value for a key, or `None` if absent.
  pub fn try_get<Q>(&self, key: &Q) -> Option<&V>
  where
    SymbolicKey: Borrow<Q>,
    Q: Hash + Eq + ?Sized,
  {
    self.index.get(key).map(|&pos| &self.entries[pos].1)
  }

  pub fn try_get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
  where
    SymbolicKey: Borrow<Q>,
    Q: Hash + Eq + ?Sized,
  {
    match self.index.get(key) {
      Some(&pos) => Some(&mut self.entries[pos].1),
      None => None,
    }
  }

  /// Get the stored key (with its id) for a lookup key.
  pub fn key_of<Q>(&self, key: &Q) -> Option<&SymbolicKey>
  where
    SymbolicKey: Borrow<Q>,
    Q: Hash + Eq + ?Sized,
  {
    self.index.get(key).map(|&pos| &self.entries[pos].0)
  }

  pub fn contains_key<Q>(&self, key: &Q) -> bool
  where
    SymbolicKey: Borrow<Q>,
    Q: Hash + Eq + ?Sized,
  {
    self.index.contains_key(key)
  }

  /// Remove an entry, preserving the order of the remaining ones.
  pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
  where
    SymbolicKey: Borrow<Q>,
    Q: Hash + Eq + ?Sized,
  {
    let pos = self.index.remove(key)?;
    let (_, value) = self.entries.remove(pos);

    for (key, _) in &self.entries[pos..] {
      if let Some(slot) = self.index.get_mut::<SymbolicKey>(key) {
        *slot -= 1;
      }
    }

    Some(value)
  }

  /// Keys in insertion order.
  ///
  /// The iterator is lazy and `Clone`, so it can be restarted.
  pub fn keys(&self) -> impl Iterator<Item = &SymbolicKey> + Clone + '_ {
    self.entries.iter().map(|(key, _)| key)
  }

  /// Values in insertion order.
  pub fn values(&self) -> impl Iterator<Item = &V> + Clone + '_ {
    self.entries.iter().map(|(_, value)| value)
  }

  /// Entries in insertion order.
  pub fn iter(&self) -> impl Iterator<Item = (&SymbolicKey, &V)> + Clone + '_ {
    self.entries.iter().map(|(key, value)| (key, value))
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }
}

impl<V: Clone + Default> KeyedCollection<V> {
  /// Get a copy of the value for a key, or `V::default()` if absent.
  pub fn get_or_default<Q>(&self, key: &Q) -> V
  where
    SymbolicKey: Borrow<Q>,
    Q: Hash + Eq + ?Sized,
  {
    self.try_get(key).cloned().unwrap_or_default()
  }
}

impl<V> Default for KeyedCollection<V> {
  fn default() -> Self {
    Self::new()
  }
}
