//! `reliability` crate — connector reliability (spec C9): per-attempt
//! ingestion, live metrics, and daily percentile rollups.

pub mod error;
pub mod ingest;
pub mod metrics;
pub mod percentile;
pub mod rollup;

pub use error::ReliabilityError;
pub use ingest::{ingest, AttemptRecord};
pub use metrics::{group_metrics, live_metrics, quality_score, GroupMetrics};
pub use percentile::nearest_rank;
pub use rollup::rollup_daily;
