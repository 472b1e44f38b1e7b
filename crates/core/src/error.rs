//! Error types for the matchday feature pipeline.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the matchday feature pipeline.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed or missing columns, result codes or season codes.
    #[error("Data integrity error: {0}")]
    DataIntegrity(String),

    /// Season data file is not available.
    #[error("Season {0} unavailable: {1}")]
    SeasonUnavailable(String, String),

    /// Team name or code absent from the encoding table.
    #[error("Unknown team: {0}")]
    UnknownTeam(String),

    /// Team is known but has no rows in the feature table.
    #[error("No match data for team {0}")]
    NoMatchData(String),

    /// Strict last-N request for a team with fewer than N matches.
    #[error("Insufficient history for {team}: {available} matches, {required} required")]
    InsufficientHistory {
        team: String,
        available: usize,
        required: usize,
    },

    /// Invalid argument passed by the caller.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV reading/writing error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Create a data integrity error.
    pub fn data_integrity(msg: impl Into<String>) -> Self {
        Error::DataIntegrity(msg.into())
    }

    /// Create a season unavailable error.
    pub fn season_unavailable(season: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::SeasonUnavailable(season.into(), reason.into())
    }

    /// Create an unknown team error.
    pub fn unknown_team(team: impl Into<String>) -> Self {
        Error::UnknownTeam(team.into())
    }

    /// Create a no match data error.
    pub fn no_match_data(team: impl Into<String>) -> Self {
        Error::NoMatchData(team.into())
    }

    /// Create an invalid argument error.
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }

    /// Whether this error means the season's data could not be read or trusted.
    ///
    /// The store uses this to decide between skipping a season and aborting.
    pub fn is_season_failure(&self) -> bool {
        matches!(
            self,
            Error::DataIntegrity(_) | Error::SeasonUnavailable(..) | Error::Io(_) | Error::Csv(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_history_message() {
        let err = Error::InsufficientHistory {
            team: "Arsenal".to_string(),
            available: 3,
            required: 6,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient history for Arsenal: 3 matches, 6 required"
        );
    }

    #[test]
    fn test_season_failure_classification() {
        assert!(Error::data_integrity("bad FTR").is_season_failure());
        assert!(Error::season_unavailable("1415", "missing").is_season_failure());
        assert!(!Error::unknown_team("Nowhere FC").is_season_failure());
        assert!(!Error::config("bad window").is_season_failure());
    }
}
