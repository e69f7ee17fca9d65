//! `engine` crate — core domain models, DAG validation, contract
//! compilation, policy evaluation, and the scheduler.

pub mod catalog;
pub mod config;
pub mod contract;
pub mod dag;
pub mod error;
pub mod glue;
pub mod models;
pub mod policy;
pub mod scheduler;

pub use catalog::default_catalog;
pub use config::Config;
pub use contract::{compile, ContractSnapshot, ContractStatus};
pub use dag::Dag;
pub use error::EngineError;
pub use glue::{estimate_execution_cost, synthesize_runbook, AttemptCost, Runbook};
pub use models::{CatalogEntry, Edge, NodeCatalog, NodeDefinition, NodeKind, TriggerType, Workflow};
pub use policy::{violations, Violation, WorkspacePolicy};
pub use scheduler::{ExecutionOutcome, ExecutionState, ExecutionStatus, NodeStatus, Scheduler};
