//! Core types and configuration for the matchday feature pipeline.
//!
//! This crate provides shared types used across all other crates:
//! - Season and match data types
//! - Per-team participation events and feature rows
//! - Configuration structures
//! - Common error types

pub mod config;
pub mod error;
pub mod season;
pub mod types;

pub use config::Config;
pub use error::{Error, Result};
pub use season::{Season, SeasonRange};
pub use types::*;
