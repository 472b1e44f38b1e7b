//! Season identifiers.
//!
//! Seasons are keyed by a four-digit code made of the two-digit start and end
//! years (`"1415"` is 2014/15, `"9900"` is 1999/2000). Codes are resolved into
//! the window 1950/51 ..= 2049/50 so that ordering is chronological.

use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Earliest representable season start year.
const FIRST_START_YEAR: u16 = 1950;
/// Latest representable season start year.
const LAST_START_YEAR: u16 = 2049;

/// A football season, totally ordered by start year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Season {
    start_year: u16,
}

impl Season {
    /// Create a season from its full start year (e.g. 2014 for 2014/15).
    pub fn from_start_year(start_year: u16) -> Result<Self> {
        if !(FIRST_START_YEAR..=LAST_START_YEAR).contains(&start_year) {
            return Err(Error::data_integrity(format!(
                "season start year {} outside {}..={}",
                start_year, FIRST_START_YEAR, LAST_START_YEAR
            )));
        }
        Ok(Self { start_year })
    }

    /// Create a season from a start year known to be in range.
    pub(crate) const fn new_unchecked(start_year: u16) -> Self {
        Self { start_year }
    }

    /// The season that ends in the given calendar year.
    pub fn ending_in(year: i32) -> Result<Self> {
        let start = u16::try_from(year - 1)
            .map_err(|_| Error::data_integrity(format!("invalid season end year {}", year)))?;
        Self::from_start_year(start)
    }

    /// The season ending in the current calendar year.
    pub fn current() -> Result<Self> {
        Self::ending_in(Utc::now().year())
    }

    /// Full start year.
    #[inline]
    pub fn start_year(self) -> u16 {
        self.start_year
    }

    /// Full end year.
    #[inline]
    pub fn end_year(self) -> u16 {
        self.start_year + 1
    }

    /// Four-digit season code, used as the data file stem.
    pub fn code(self) -> String {
        format!("{:02}{:02}", self.start_year % 100, self.end_year() % 100)
    }

    /// The following season, if representable.
    pub fn next(self) -> Option<Season> {
        Self::from_start_year(self.start_year + 1).ok()
    }

    /// The preceding season, if representable.
    pub fn prior(self) -> Option<Season> {
        Self::from_start_year(self.start_year.checked_sub(1)?).ok()
    }

    /// Iterate seasons from `first` to `last`, both inclusive.
    pub fn range_inclusive(first: Season, last: Season) -> SeasonRange {
        SeasonRange {
            next: (first <= last).then_some(first),
            last,
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.code())
    }
}

impl FromStr for Season {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let code = s.trim();
        if code.len() != 4 || !code.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::data_integrity(format!(
                "season code must be four digits, got {:?}",
                s
            )));
        }

        // Both halves are two ASCII digits, checked above.
        let start: u16 = code[..2]
            .parse()
            .map_err(|_| Error::data_integrity(format!("bad season code {:?}", s)))?;
        let end: u16 = code[2..]
            .parse()
            .map_err(|_| Error::data_integrity(format!("bad season code {:?}", s)))?;

        if end != (start + 1) % 100 {
            return Err(Error::data_integrity(format!(
                "season code {:?} does not span consecutive years",
                s
            )));
        }

        let start_year = if start >= FIRST_START_YEAR % 100 {
            1900 + start
        } else {
            2000 + start
        };
        Self::from_start_year(start_year)
    }
}

impl TryFrom<String> for Season {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Season> for String {
    fn from(season: Season) -> Self {
        season.code()
    }
}

/// Inclusive chronological iterator over seasons.
#[derive(Debug, Clone)]
pub struct SeasonRange {
    next: Option<Season>,
    last: Season,
}

impl Iterator for SeasonRange {
    type Item = Season;

    fn next(&mut self) -> Option<Season> {
        let current = self.next?;
        self.next = current.next().filter(|s| *s <= self.last);
        Some(current)
    }
}
