//! Switchyard Context
//!
//! The per-run data store handed to every node behavior.
//!
//! Values are addressed by typed [`Field`]s and kept as the exact value
//! stored, next to a JSON view used for change events and dumps. A context
//! can be snapshotted and restored without knowing the concrete field types.
//! Reads always come back as the field's declared type; absent fields read
//! as the type's default.
//!
//! Every store that changes a value is reported to an [`EventPublisher`].
//! Publishing is fire-and-forget and never affects the store itself.

mod context;
mod error;
mod field;
mod publisher;
mod slot;

pub use context::{Context, ContextSnapshot};
pub use error::ContextError;
pub use field::Field;
pub use publisher::{
  ChannelPublisher, EventPublisher, FIELD_CHANGED, NoopPublisher, PublishedEvent, TracingPublisher,
};
