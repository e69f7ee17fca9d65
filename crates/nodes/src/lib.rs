//! `nodes` crate — the `NodeExecutor` trait and a mock implementation.
//!
//! Concrete connector implementations (HTTP, Slack, database adapters, AI
//! models) are external collaborators out of scope for this crate; it
//! defines the boundary contract the scheduler dispatches through.

pub mod error;
pub mod traits;
pub mod mock;

pub use error::NodeError;
pub use traits::{CancelHandle, DeterministicContext, ExecutionContext, Fixture, NodeExecutor, NodeMetrics, NodeResult};
pub use mock::MockNode;
