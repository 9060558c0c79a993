//! Switchyard Keys
//!
//! Identity primitives shared by every other switchyard crate.
//!
//! - [`SymbolicKey`] names a node, a link or a context field. Keys compare
//!   and hash by name only, so two keys built from the same name are
//!   interchangeable.
//! - [`KeyedCollection`] is the ordered, unique-key map that backs every
//!   named collection in a definition and in the context vault.

mod collection;
mod error;
mod key;

pub use collection::KeyedCollection;
pub use error::KeyError;
pub use key::{IntoKey, SymbolicKey};
