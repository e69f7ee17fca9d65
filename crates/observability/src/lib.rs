//! `observability` crate — metrics primitives and tracing bootstrap.
//!
//! Every other crate in the workspace records through the [`Registry`]
//! rather than rolling its own counters. The registry is the one
//! process-wide mutable singleton permitted by the design: metrics need a
//! single point of truth to expose over `/metrics`, everything else is
//! constructed and threaded through explicitly.

pub mod counter;
pub mod gauge;
pub mod histogram;
pub mod registry;
pub mod tracing_init;

pub use counter::Counter;
pub use gauge::Gauge;
pub use histogram::Histogram;
pub use registry::Registry;
pub use tracing_init::{init_tracing, TracingConfig};
