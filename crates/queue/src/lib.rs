//! `queue` crate — the job queue between Dispatch (C7) and the Scheduler's
//! worker fleet, partitioned by `hash(workspace_id) mod N` with three
//! priority tiers.

pub mod error;
pub mod payload;
pub mod postgres;
pub mod priority;
pub mod traits;

pub use error::QueueError;
pub use payload::{partition_for, JobPayload, ReplayContext};
pub use postgres::PostgresJobQueue;
pub use priority::Priority;
pub use traits::JobQueue;

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn partition_is_deterministic_and_bounded() {
        let ws = Uuid::new_v4();
        let p1 = partition_for(ws, 16);
        let p2 = partition_for(ws, 16);
        assert_eq!(p1, p2);
        assert!((0..16).contains(&p1));
    }
}
