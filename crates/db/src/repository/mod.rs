//! Repository functions — one function per database operation.
//!
//! Every function takes a `&DbPool` and returns a `Result<T, DbError>`.
//! No business logic, no domain types — pure SQL, built with `sqlx`'s
//! runtime-checked query builder (`sqlx::query_as::<_, T>`) rather than
//! the `query_as!` compile-time macro, so the workspace builds without a
//! live database reachable at compile time.

pub mod workflows;
pub mod credentials;
pub mod executions;
pub mod connector_attempts;
pub mod replay_packs;
pub mod contract_snapshots;
pub mod policies;
pub mod billing;
pub mod jobs;
pub mod runbooks;
