//! Switchyard Engine
//!
//! Runs a definition repeatedly in response to triggers.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        FlowRunner                           │
//! │  - owns mpsc channel of initial contexts                    │
//! │  - run(context) queues an execution                         │
//! │  - start(cancel) runs the execution loop                    │
//! └─────────────────────────────────────────────────────────────┘
//!                               │ one per trigger
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        AsyncDriver                          │
//! │  - shares Arc<Definition> + Arc<AsyncNodeFactory>           │
//! │  - owns its Context and node cursor                         │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use switchyard_engine::FlowRunner;
//! use tokio_util::sync::CancellationToken;
//!
//! let runner = FlowRunner::new(definition, Arc::new(factory));
//! let sender = runner.sender();
//!
//! let cancel = CancellationToken::new();
//! tokio::spawn(runner.start(cancel.clone()));
//!
//! sender.send(Context::new("order-42")).await?;
//! ```

mod error;
mod runner;

pub use error::EngineError;
pub use runner::FlowRunner;
