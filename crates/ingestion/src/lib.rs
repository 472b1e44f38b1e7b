//! Data ingestion for the matchday feature pipeline.
//!
//! This crate handles:
//! - Per-season CSV loading and validation
//! - Chronological per-team event streams

pub mod event_stream;
pub mod store;

pub use event_stream::EventStreamBuilder;
pub use store::{CsvDirectory, MatchStore, SeasonSource, SeasonTable};
