//! Switchyard Runtime
//!
//! Executes [`Definition`](switchyard_definition::Definition)s one node at a
//! time.
//!
//! # Architecture
//!
//! ```text
//! NodeFactory (behavior type -> constructor)
//!        │ materializes
//!        ▼
//! RuntimeGraph (live nodes for one driver, created on first visit)
//!        │ owned by
//!        ▼
//! Driver / AsyncDriver
//! ├── step() - execute current node, follow the link for its exit code
//! └── run()  - step until no link matches (Finished) or an error (Failed)
//! ```
//!
//! Exactly one node is current at any time. A step either moves to the
//! link target, finishes the driver, or fails it. Failed steps roll the
//! context back to its state before the step, so callers only ever observe
//! the effects of completed steps.
//!
//! # Usage
//!
//! ```ignore
//! let mut factory = SyncNodeFactory::new();
//! factory.register::<Approve>().register::<Notify>();
//!
//! let mut driver = Driver::new(definition, Arc::new(factory), Context::new("run"))?;
//! let outcome = driver.run()?;
//! println!("finished at {} with {}", outcome.node, outcome.code);
//! ```

mod async_driver;
mod behavior;
mod config;
mod cursor;
mod driver;
mod error;
mod events;
mod factory;
mod graph;
mod outcome;

pub use async_driver::AsyncDriver;
pub use behavior::{AsyncNodeBehavior, Blocking, KeyedBehavior, NodeBehavior};
pub use config::DriverConfig;
pub use driver::Driver;
pub use error::{BehaviorError, RuntimeError};
pub use events::{ChannelNotifier, DriverEvent, DriverNotifier, NoopNotifier};
pub use factory::{AsyncNodeFactory, BoundBehavior, NodeFactory, SyncNodeFactory};
pub use graph::{RuntimeGraph, RuntimeNode};
pub use outcome::{DriverStatus, RunOutcome, StepOutcome, Visit};
