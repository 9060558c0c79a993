use std::collections::HashSet;

use switchyard_keys::{IntoKey, KeyedCollection, SymbolicKey};
use tracing::{debug, warn};

use crate::code::{BehaviorType, ExitCode};
use crate::definition::Definition;
use crate::error::DefinitionError;
use crate::link::LinkDefinition;
use crate::node::NodeDefinition;

/// Fluent, order-independent assembly of a [`Definition`].
///
/// Uniqueness (node keys, `(from, code)` pairs) is checked on every call.
/// Structural checks that depend on the whole graph (endpoints exist,
/// initial node exists) are deferred to [`build`](Self::build), so links
/// may reference nodes that are added later.
///
/// ```
/// use switchyard_definition::{Definition, ExitCode};
///
/// let mut builder = Definition::builder("order");
/// builder
///   .add_link("Init", ExitCode::START, "Working")?
///   .add_node("Init", "init")?
///   .add_node("Working", "work")?
///   .set_initial("Init")?;
/// let definition = builder.build()?;
/// assert_eq!(definition.initial().name(), "Init");
/// # Ok::<(), switchyard_definition::DefinitionError>(())
/// ```
#[derive(Debug)]
pub struct DefinitionBuilder {
  name: String,
  nodes: KeyedCollection<NodeDefinition>,
  links: KeyedCollection<LinkDefinition>,
  routes: HashSet<(SymbolicKey, ExitCode)>,
  initial: Option<SymbolicKey>,
  next_link_id: i64,
}

impl DefinitionBuilder {
  /// Create an empty builder for a definition called `name`.
  pub fn create(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      nodes: KeyedCollection::new(),
      links: KeyedCollection::new(),
      routes: HashSet::new(),
      initial: None,
      next_link_id: 0,
    }
  }

  /// Add a node run by the given behavior variant.
  ///
  /// # Errors
  /// - [`DefinitionError::InvalidArgument`] if the key name is empty
  /// - [`DefinitionError::DuplicateNode`] if the key is already used
  pub fn add_node(
    &mut self,
    key: impl IntoKey,
    behavior: impl Into<BehaviorType>,
  ) -> Result<&mut Self, DefinitionError> {
    let key = key.into_key()?;
    if self.nodes.contains_key(&key) {
      return Err(DefinitionError::DuplicateNode {
        node: key.name().to_string(),
      });
    }

    let node = NodeDefinition::new(key.clone(), behavior.into());
    self.nodes.add(key, node)?;
    Ok(self)
  }

  /// Add a link taken when `from` produces `code`.
  ///
  /// The link key is derived from its endpoints and code, as
  /// `from-[code]->to`. When that name is already taken by a named link, a
  /// `#n` suffix picks the first free one.
  ///
  /// # Errors
  /// - [`DefinitionError::InvalidArgument`] if a key name or the code is empty
  /// - [`DefinitionError::DuplicateLink`] if `from` already has a link for `code`
  pub fn add_link(
    &mut self,
    from: impl IntoKey,
    code: impl Into<ExitCode>,
    to: impl IntoKey,
  ) -> Result<&mut Self, DefinitionError> {
    let from = from.into_key()?;
    let code = code.into();
    let to = to.into_key()?;
    let base = format!("{}-[{}]->{}", from, code, to);
    let mut name = base.clone();
    let mut suffix = 0;
    while self.links.contains_key(name.as_str()) {
      suffix += 1;
      name = format!("{}#{}", base, suffix);
    }
    let key = SymbolicKey::new(name)?;
    self.insert_link(key, from, code, to)
  }

  /// Add a link with an explicit key.
  ///
  /// # Errors
  /// As [`add_link`](Self::add_link), plus [`DefinitionError::DuplicateKey`]
  /// if the link key is already used.
  pub fn add_named_link(
    &mut self,
    key: impl IntoKey,
    from: impl IntoKey,
    code: impl Into<ExitCode>,
    to: impl IntoKey,
  ) -> Result<&mut Self, DefinitionError> {
    let key = key.into_key()?;
    let from = from.into_key()?;
    let to = to.into_key()?;
    self.insert_link(key, from, code.into(), to)
  }

  /// Designate the node every driver starts from.
  ///
  /// Existence is checked at build time.
  ///
  /// # Errors
  /// Returns [`DefinitionError::InvalidArgument`] if the key name is empty.
  pub fn set_initial(&mut self, key: impl IntoKey) -> Result<&mut Self, DefinitionError> {
    self.initial = Some(key.into_key()?);
    Ok(self)
  }

  /// Validate the assembled graph and seal it.
  ///
  /// Checks run in a fixed order and the first violation is returned:
  /// 1. the initial node is set and exists
  /// 2. every link, in insertion order, has an existing source and target
  ///
  /// Nodes not reachable from the initial node are allowed and only logged.
  ///
  /// # Errors
  /// Returns [`DefinitionError::InvalidDefinition`] naming the offending keys.
  pub fn build(self) -> Result<Definition, DefinitionError> {
    let initial = self.initial.ok_or_else(|| {
      DefinitionError::invalid_definition(
        format!("definition '{}' has no initial node", self.name),
        Vec::new(),
      )
    })?;

    if !self.nodes.contains_key(&initial) {
      return Err(DefinitionError::invalid_definition(
        format!("initial node '{}' is not defined", initial),
        vec![initial.name().to_string()],
      ));
    }

    for link in self.links.values() {
      for endpoint in [link.from(), link.to()] {
        if !self.nodes.contains_key(endpoint) {
          return Err(DefinitionError::invalid_definition(
            format!(
              "link '{}' references unknown node '{}'",
              link.key(),
              endpoint
            ),
            vec![endpoint.name().to_string(), link.key().name().to_string()],
          ));
        }
      }
    }

    let definition = Definition::new(self.name, initial, self.nodes, self.links);

    let reachable: HashSet<SymbolicKey> = definition.reachable_from_initial().into_iter().collect();
    for key in definition.nodes().keys() {
      if !reachable.contains(key) {
        warn!(
          definition = %definition.name(),
          node = %key,
          "node is not reachable from the initial node"
        );
      }
    }

    debug!(
      definition = %definition.name(),
      nodes = definition.nodes().len(),
      links = definition.links().len(),
      "definition built"
    );

    Ok(definition)
  }

  fn insert_link(
    &mut self,
    key: SymbolicKey,
    from: SymbolicKey,
    code: ExitCode,
    to: SymbolicKey,
  ) -> Result<&mut Self, DefinitionError> {
    if code.is_empty() {
      return Err(DefinitionError::InvalidArgument {
        message: format!("link from '{}' must have a non-empty code", from),
      });
    }

    let route = (from.clone(), code.clone());
    if self.routes.contains(&route) {
      return Err(DefinitionError::DuplicateLink {
        from: from.name().to_string(),
        code: code.to_string(),
      });
    }

    let key = match key.id() {
      Some(_) => key,
      None => SymbolicKey::with_id(self.next_link_id, key.name())?,
    };

    self
      .links
      .add(key.clone(), LinkDefinition::new(key, from, code, to))?;
    self.routes.insert(route);
    self.next_link_id += 1;
    Ok(self)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn three_node_builder() -> DefinitionBuilder {
    let mut builder = DefinitionBuilder::create("three");
    builder
      .add_node("Init", "init")
      .unwrap()
      .add_node("Working", "work")
      .unwrap()
      .add_node("Finished", "finish")
      .unwrap()
      .add_link("Init", ExitCode::START, "Working")
      .unwrap()
      .add_link("Working", ExitCode::DONE, "Finished")
      .unwrap();
    builder
  }

  #[test]
  fn test_build_valid_definition() {
    let mut builder = three_node_builder();
    builder.set_initial("Init").unwrap();
    let definition = builder.build().unwrap();

    assert_eq!(definition.name(), "three");
    assert_eq!(definition.nodes().len(), 3);
    assert_eq!(definition.links().len(), 2);
    assert_eq!(
      definition.get_link("Init", "Start").unwrap().to().name(),
      "Working"
    );
  }

  #[test]
  fn test_duplicate_node() {
    let mut builder = three_node_builder();
    let err = builder.add_node("Init", "other").unwrap_err();

    assert!(matches!(err, DefinitionError::DuplicateNode { node } if node == "Init"));
  }

  #[test]
  fn test_duplicate_link_same_source_and_code() {
    let mut builder = three_node_builder();
    let err = builder
      .add_link("Init", ExitCode::START, "Finished")
      .unwrap_err();

    assert!(matches!(
      err,
      DefinitionError::DuplicateLink { from, code } if from == "Init" && code == "Start"
    ));
  }

  #[test]
  fn test_same_code_from_different_sources_allowed() {
    let mut builder = three_node_builder();
    builder
      .add_link("Finished", ExitCode::START, "Init")
      .unwrap();
  }

  #[test]
  fn test_named_link_duplicate_key() {
    let mut builder = three_node_builder();
    builder
      .add_named_link("retry", "Working", "Retry", "Init")
      .unwrap();
    let err = builder
      .add_named_link("retry", "Finished", "Retry", "Init")
      .unwrap_err();

    assert!(matches!(err, DefinitionError::DuplicateKey { key } if key == "retry"));
  }

  #[test]
  fn test_derived_link_key_skips_taken_name() {
    let mut builder = three_node_builder();
    builder
      .add_named_link("Finished-[Done]->Init", "Init", "Retry", "Finished")
      .unwrap()
      .add_link("Finished", ExitCode::DONE, "Init")
      .unwrap()
      .set_initial("Init")
      .unwrap();

    let definition = builder.build().unwrap();
    let derived = definition.links().try_get("Finished-[Done]->Init#1").unwrap();
    assert_eq!(derived.from().name(), "Finished");
    assert_eq!(derived.to().name(), "Init");
    assert_eq!(definition.links().len(), 4);
  }

  #[test]
  fn test_empty_inputs_rejected() {
    let mut builder = three_node_builder();

    assert!(matches!(
      builder.set_initial(""),
      Err(DefinitionError::InvalidArgument { .. })
    ));
    assert!(matches!(
      builder.add_node("", "init"),
      Err(DefinitionError::InvalidArgument { .. })
    ));
    assert!(matches!(
      builder.add_link("Init", ExitCode::new(""), "Working"),
      Err(DefinitionError::InvalidArgument { .. })
    ));
  }

  #[test]
  fn test_missing_initial() {
    let err = three_node_builder().build().unwrap_err();
    assert!(matches!(err, DefinitionError::InvalidDefinition { .. }));
  }

  #[test]
  fn test_unknown_initial() {
    let mut builder = three_node_builder();
    builder.set_initial("Nowhere").unwrap();

    let err = builder.build().unwrap_err();
    assert!(matches!(
      err,
      DefinitionError::InvalidDefinition { keys, .. } if keys == vec!["Nowhere".to_string()]
    ));
  }

  #[test]
  fn test_dangling_link_names_missing_node() {
    let mut builder = DefinitionBuilder::create("dangling");
    builder
      .add_node("Init", "init")
      .unwrap()
      .add_link("Init", ExitCode::START, "Missing")
      .unwrap()
      .set_initial("Init")
      .unwrap();

    let err = builder.build().unwrap_err();
    match err {
      DefinitionError::InvalidDefinition { message, keys } => {
        assert!(message.contains("Missing"));
        assert_eq!(keys[0], "Missing");
      }
      other => panic!("expected InvalidDefinition, got {:?}", other),
    }
  }

  #[test]
  fn test_first_violation_in_link_order() {
    let mut builder = DefinitionBuilder::create("two-bad");
    builder
      .add_node("A", "a")
      .unwrap()
      .add_link("A", "x", "Ghost1")
      .unwrap()
      .add_link("A", "y", "Ghost2")
      .unwrap()
      .set_initial("A")
      .unwrap();

    let err = builder.build().unwrap_err();
    assert!(matches!(
      err,
      DefinitionError::InvalidDefinition { keys, .. } if keys[0] == "Ghost1"
    ));
  }

  #[test]
  fn test_forward_references_resolve_at_build() {
    let mut builder = DefinitionBuilder::create("forward");
    builder
      .set_initial("A")
      .unwrap()
      .add_link("A", ExitCode::NEXT, "B")
      .unwrap()
      .add_node("B", "b")
      .unwrap()
      .add_node("A", "a")
      .unwrap();

    let definition = builder.build().unwrap();
    assert_eq!(definition.initial().name(), "A");
  }

  #[test]
  fn test_link_keys_carry_sequential_ids() {
    let mut builder = three_node_builder();
    builder.set_initial("Init").unwrap();
    let definition = builder.build().unwrap();

    let ids: Vec<Option<i64>> = definition.links().keys().map(|k| k.id()).collect();
    assert_eq!(ids, vec![Some(0), Some(1)]);
  }
}
