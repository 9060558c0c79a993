//! Switchyard Definition
//!
//! This crate provides the immutable graph model executed by the switchyard
//! runtime. A [`Definition`] is a set of named nodes, a set of code-labeled
//! links between them and a designated initial node.
//!
//! Definitions are only ever produced by [`DefinitionBuilder::build`], which
//! validates the whole graph at once:
//! - the initial node is set and exists
//! - every link's endpoints exist
//! - no two links leave the same node with the same exit code
//!
//! Nodes and links may be declared in any order; forward references are
//! resolved at build time.
//!
//! [`DefinitionDef`] is the serializable form (JSON) that replays into a
//! builder, for definitions loaded from files.

mod builder;
mod code;
mod config;
mod definition;
mod error;
mod link;
mod node;

pub use builder::DefinitionBuilder;
pub use code::{BehaviorType, ExitCode};
pub use config::{DefinitionDef, LinkDef, NodeDef};
pub use definition::Definition;
pub use error::DefinitionError;
pub use link::LinkDefinition;
pub use node::NodeDefinition;
pub use switchyard_keys::{IntoKey, KeyedCollection, SymbolicKey};
