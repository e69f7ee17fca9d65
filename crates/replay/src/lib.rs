//! `replay` crate — the Replay Pack (spec C8): capture, fixture merge, and
//! deterministic rerun.

pub mod capture;
pub mod error;
pub mod fixture;
pub mod rerun;

pub use capture::{append_fixtures, capture, get_fixtures};
pub use error::ReplayError;
pub use fixture::{merge_fixtures, request_fingerprint, Fixture};
pub use rerun::{rerun, RerunRequest};
