//! Serializable definition format.
//!
//! A [`DefinitionDef`] is the file/database shape of a definition. It is not
//! validated on its own; [`DefinitionDef::build`] replays it through a
//! [`DefinitionBuilder`] so loaded definitions get exactly the same checks
//! as hand-built ones.

use std::path::Path;

use serde::{Deserialize, Serialize};
use switchyard_keys::SymbolicKey;

use crate::builder::DefinitionBuilder;
use crate::code::{BehaviorType, ExitCode};
use crate::definition::Definition;
use crate::error::DefinitionError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefinitionDef {
  pub name: String,
  pub initial: String,
  pub nodes: Vec<NodeDef>,
  #[serde(default)]
  pub links: Vec<LinkDef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDef {
  pub key: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub id: Option<i64>,
  pub behavior: BehaviorType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkDef {
  pub from: String,
  pub code: ExitCode,
  pub to: String,
  /// Explicit link key; derived from the endpoints when absent.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub key: Option<String>,
}

impl DefinitionDef {
  pub fn from_json_str(json: &str) -> Result<Self, DefinitionError> {
    Ok(serde_json::from_str(json)?)
  }

  pub fn from_path(path: impl AsRef<Path>) -> Result<Self, DefinitionError> {
    let content = std::fs::read_to_string(path)?;
    Self::from_json_str(&content)
  }

  pub fn to_json_pretty(&self) -> Result<String, DefinitionError> {
    Ok(serde_json::to_string_pretty(self)?)
  }

  /// Replay this description through a builder.
  pub fn build(&self) -> Result<Definition, DefinitionError> {
    let mut builder = DefinitionBuilder::create(&self.name);

    for node in &self.nodes {
      let key = match node.id {
        Some(id) => SymbolicKey::with_id(id, &node.key)?,
        None => SymbolicKey::new(&node.key)?,
      };
      builder.add_node(key, node.behavior.clone())?;
    }

    for link in &self.links {
      match &link.key {
        Some(key) => builder.add_named_link(key, &link.from, link.code.clone(), &link.to)?,
        None => builder.add_link(&link.from, link.code.clone(), &link.to)?,
      };
    }

    builder.set_initial(&self.initial)?;
    builder.build()
  }
}

impl From<&Definition> for DefinitionDef {
  fn from(definition: &Definition) -> Self {
    Self {
      name: definition.name().to_string(),
      initial: definition.initial().name().to_string(),
      nodes: definition
        .nodes()
        .values()
        .map(|node| NodeDef {
          key: node.key().name().to_string(),
          id: node.key().id(),
          behavior: node.behavior().clone(),
        })
        .collect(),
      links: definition
        .links()
        .values()
        .map(|link| LinkDef {
          from: link.from().name().to_string(),
          code: link.code().clone(),
          to: link.to().name().to_string(),
          key: Some(link.key().name().to_string()),
        })
        .collect(),
    }
  }
}

#[cfg(test)]
mod tests {
  use std::io::Write;

  use super::*;

  const ORDER_FLOW: &str = r#"{
    "name": "order",
    "initial": "Init",
    "nodes": [
      { "key": "Init", "id": 1, "behavior": "init" },
      { "key": "Working", "behavior": "work" },
      { "key": "Finished", "behavior": "finish" }
    ],
    "links": [
      { "from": "Init", "code": "Start", "to": "Working" },
      { "from": "Working", "code": "Done", "to": "Finished", "key": "complete" }
    ]
  }"#;

  #[test]
  fn test_parse_and_build() {
    let def = DefinitionDef::from_json_str(ORDER_FLOW).unwrap();
    let definition = def.build().unwrap();

    assert_eq!(definition.name(), "order");
    assert_eq!(definition.nodes().key_of("Init").unwrap().id(), Some(1));
    assert!(definition.links().contains_key("complete"));
    assert_eq!(
      definition.get_link("Working", "Done").unwrap().key().name(),
      "complete"
    );
  }

  #[test]
  fn test_links_default_to_empty() {
    let def = DefinitionDef::from_json_str(
      r#"{ "name": "single", "initial": "Only", "nodes": [{ "key": "Only", "behavior": "noop" }] }"#,
    )
    .unwrap();

    let definition = def.build().unwrap();
    assert!(definition.is_terminal("Only"));
  }

  #[test]
  fn test_build_surfaces_builder_errors() {
    let mut def = DefinitionDef::from_json_str(ORDER_FLOW).unwrap();
    def.links.push(LinkDef {
      from: "Init".to_string(),
      code: ExitCode::START,
      to: "Finished".to_string(),
      key: None,
    });

    assert!(matches!(
      def.build(),
      Err(DefinitionError::DuplicateLink { .. })
    ));
  }

  #[test]
  fn test_invalid_json() {
    assert!(matches!(
      DefinitionDef::from_json_str("{ not json"),
      Err(DefinitionError::Parse(_))
    ));
  }

  #[test]
  fn test_from_path() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(ORDER_FLOW.as_bytes()).unwrap();

    let def = DefinitionDef::from_path(file.path()).unwrap();
    assert_eq!(def.nodes.len(), 3);

    let missing = DefinitionDef::from_path(file.path().with_extension("missing"));
    assert!(matches!(missing, Err(DefinitionError::Io(_))));
  }

  #[test]
  fn test_definition_to_def_round_trip() {
    let definition = DefinitionDef::from_json_str(ORDER_FLOW)
      .unwrap()
      .build()
      .unwrap();

    let def = DefinitionDef::from(&definition);
    let rebuilt = def.build().unwrap();

    assert_eq!(rebuilt.to_dot(), definition.to_dot());
  }
}
