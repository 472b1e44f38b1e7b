//! Inference-time lookups over an assembled feature table.
//!
//! Training rows carry strictly pre-match figures. Lookups answer "as of
//! today": the team's last row plus that row's own goals and points, since
//! the match has already been played.

pub mod service;

pub use service::{LookupService, PredictionFeatures, RecentForm, TeamKey, TeamStats};
