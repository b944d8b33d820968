//! Specflow Kernel
//!
//! Dependency-ordered stage execution.
//!
//! # Core Concepts
//!
//! - [`StageGraph`]: validated DAG of [`StageSpec`]s (petgraph)
//! - [`StageExecutor`]: dispatches ready stages concurrently, bounded
//! - [`EventSink`]: progress channel ([`ProgressEvent`])
//! - [`RunRegistry`]: single-flight gate per unit of work
//!
//! # Architecture
//!
//! ```text
//! StageSpec* → StageGraphBuilder::build → StageGraph
//!                                             │
//!        Gateway ← StageExecutor::execute ────┘──→ OutputMap
//!                          │
//!                          └──→ EventSink → mpsc receiver
//! ```

#![warn(unreachable_pub)]

pub mod error;
pub mod events;
pub mod executor;
pub mod graph;
pub mod registry;

pub use error::{ExecutionError, GraphError, RunError};
pub use events::{EventSink, ProgressEvent};
pub use executor::{ExecutionReport, StageExecutor, StageInput};
pub use graph::{Stage, StageGraph, StageGraphBuilder, StageSpec};
pub use registry::{RunGuard, RunRegistry};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
