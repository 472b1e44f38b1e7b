//! Feature computation for the matchday pipeline.
//!
//! This crate handles:
//! - Rolling means over a team's recent matches
//! - Running per-team aggregation with pre-match snapshots
//! - Historical season-points averages
//! - Team name encoding
//! - Training table assembly, pruning and CSV export

pub mod rolling;
pub mod aggregator;
pub mod historical;
pub mod encoding;
pub mod assembler;
pub mod export;

pub use rolling::RollingMean;
pub use aggregator::{PreMatch, RunningAggregator, TeamRunningState};
pub use historical::HistoricalAverager;
pub use encoding::EncodingTable;
pub use assembler::{export_data, prune, AssembledTable, FeatureTable, TableAssembler};
pub use export::{read_exports, write_exports, write_named_csv};
