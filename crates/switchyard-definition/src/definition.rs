use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt::Write;

use switchyard_keys::{KeyedCollection, SymbolicKey};

use crate::builder::DefinitionBuilder;
use crate::link::LinkDefinition;
use crate::node::NodeDefinition;

/// An immutable, validated state-machine graph.
///
/// Definitions hold no interior mutability, so a single `Arc<Definition>`
/// can back any number of concurrent drivers.
#[derive(Debug, Clone)]
pub struct Definition {
  name: String,
  initial: SymbolicKey,
  nodes: KeyedCollection<NodeDefinition>,
  links: KeyedCollection<LinkDefinition>,
  /// Outgoing link keys per node, in link insertion order.
  outgoing: HashMap<SymbolicKey, Vec<SymbolicKey>>,
}

impl Definition {
  /// Start assembling a new definition.
  pub fn builder(name: impl Into<String>) -> DefinitionBuilder {
    DefinitionBuilder::create(name)
  }

  /// Seal validated parts into a definition. Only called by the builder.
  pub(crate) fn new(
    name: String,
    initial: SymbolicKey,
    nodes: KeyedCollection<NodeDefinition>,
    links: KeyedCollection<LinkDefinition>,
  ) -> Self {
    let mut outgoing: HashMap<SymbolicKey, Vec<SymbolicKey>> = HashMap::new();
    for link in links.values() {
      outgoing
        .entry(link.from().clone())
        .or_default()
        .push(link.key().clone());
    }

    Self {
      name,
      initial,
      nodes,
      links,
      outgoing,
    }
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  /// The node every driver starts from.
  pub fn initial(&self) -> &SymbolicKey {
    &self.initial
  }

  pub fn nodes(&self) -> &KeyedCollection<NodeDefinition> {
    &self.nodes
  }

  pub fn links(&self) -> &KeyedCollection<LinkDefinition> {
    &self.links
  }

  /// Look up a node definition by key.
  pub fn node(&self, key: &str) -> Option<&NodeDefinition> {
    self.nodes.try_get(key)
  }

  /// Links leaving `from`, in the order they were added.
  pub fn links_from(&self, from: &str) -> impl Iterator<Item = &LinkDefinition> {
    self
      .outgoing
      .get(from)
      .into_iter()
      .flatten()
      .filter_map(|key| self.links.try_get(key))
  }

  /// The link taken when `from` produces `code`, if any.
  ///
  /// At most one link matches: `(from, code)` pairs are unique.
  pub fn get_link(&self, from: &str, code: &str) -> Option<&LinkDefinition> {
    self.links_from(from).find(|link| link.code() == code)
  }

  /// Whether a node has no outgoing links at all.
  pub fn is_terminal(&self, node: &str) -> bool {
    self.outgoing.get(node).is_none_or(|links| links.is_empty())
  }

  /// Node keys reachable from the initial node, in breadth-first order.
  pub fn reachable_from_initial(&self) -> Vec<SymbolicKey> {
    let mut seen: HashSet<&SymbolicKey> = HashSet::new();
    let mut queue: VecDeque<&SymbolicKey> = VecDeque::new();
    let mut order = Vec::new();

    seen.insert(&self.initial);
    queue.push_back(&self.initial);

    while let Some(node) = queue.pop_front() {
      order.push(node.clone());
      for link in self.links_from(node.name()) {
        if seen.insert(link.to()) {
          queue.push_back(link.to());
        }
      }
    }

    order
  }

  /// Render the graph in Graphviz DOT format.
  pub fn to_dot(&self) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "digraph \"{}\" {{", escape(&self.name));
    let _ = writeln!(out, "  \"__start\" [shape=point];");

    for node in self.nodes.values() {
      let shape = if self.is_terminal(node.key().name()) {
        "doublecircle"
      } else {
        "circle"
      };
      let _ = writeln!(
        out,
        "  \"{}\" [shape={}, tooltip=\"{}\"];",
        escape(node.key().name()),
        shape,
        escape(node.behavior().as_str())
      );
    }

    let _ = writeln!(out, "  \"__start\" -> \"{}\";", escape(self.initial.name()));
    for link in self.links.values() {
      let _ = writeln!(
        out,
        "  \"{}\" -> \"{}\" [label=\"{}\"];",
        escape(link.from().name()),
        escape(link.to().name()),
        escape(link.code().as_str())
      );
    }

    out.push_str("}\n");
    out
  }
}

fn escape(value: &str) -> String {
  value.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
  use crate::{Definition, ExitCode};

  fn approval_flow() -> Definition {
    let mut builder = Definition::builder("approval");
    builder
      .add_node("Draft", "form")
      .unwrap()
      .add_node("Review", "review")
      .unwrap()
      .add_node("Approved", "notify")
      .unwrap()
      .add_node("Rejected", "notify")
      .unwrap()
      .add_node("Archive", "archive")
      .unwrap()
      .add_link("Draft", ExitCode::NEXT, "Review")
      .unwrap()
      .add_link("Review", "Approve", "Approved")
      .unwrap()
      .add_link("Review", "Reject", "Rejected")
      .unwrap()
      .set_initial("Draft")
      .unwrap();
    builder.build().unwrap()
  }

  #[test]
  fn test_get_link_selects_by_code() {
    let definition = approval_flow();

    let link = definition.get_link("Review", "Reject").unwrap();
    assert_eq!(link.to().name(), "Rejected");
    assert!(definition.get_link("Review", "Escalate").is_none());
    assert!(definition.get_link("Approved", "Ok").is_none());
  }

  #[test]
  fn test_links_from_preserves_order() {
    let definition = approval_flow();

    let codes: Vec<&str> = definition
      .links_from("Review")
      .map(|link| link.code().as_str())
      .collect();
    assert_eq!(codes, vec!["Approve", "Reject"]);
  }

  #[test]
  fn test_terminal_nodes() {
    let definition = approval_flow();

    assert!(!definition.is_terminal("Draft"));
    assert!(definition.is_terminal("Approved"));
    assert!(definition.is_terminal("Archive"));
  }

  #[test]
  fn test_reachability_skips_orphans() {
    let definition = approval_flow();

    let reachable: Vec<String> = definition
      .reachable_from_initial()
      .iter()
      .map(|key| key.name().to_string())
      .collect();
    assert_eq!(reachable, vec!["Draft", "Review", "Approved", "Rejected"]);
  }

  #[test]
  fn test_to_dot_lists_nodes_and_links() {
    let dot = approval_flow().to_dot();

    assert!(dot.starts_with("digraph \"approval\" {"));
    assert!(dot.contains("\"__start\" -> \"Draft\";"));
    assert!(dot.contains("\"Review\" -> \"Rejected\" [label=\"Reject\"];"));
    assert!(dot.contains("\"Approved\" [shape=doublecircle"));
  }
}
