//! Team name encoding.
//!
//! Names are sorted lexicographically and assigned dense codes `0..n` in that
//! order, so the same set of names always yields the same mapping.

use matchday_core::{Error, Result, TeamCode};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

/// One row of the encoding CSV.
#[derive(Debug, Serialize, Deserialize)]
struct EncodingRecord {
    #[serde(rename = "Team")]
    team: String,
    #[serde(rename = "Code")]
    code: TeamCode,
}

/// Bijection between team names and dense integer codes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncodingTable {
    by_name: BTreeMap<String, TeamCode>,
    by_code: Vec<String>,
}

impl EncodingTable {
    /// Fit the encoding to the distinct names in `names`.
    pub fn fit<'a, I>(names: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let distinct: BTreeSet<&str> = names.into_iter().collect();
        let by_code: Vec<String> = distinct.into_iter().map(String::from).collect();
        let by_name = by_code
            .iter()
            .enumerate()
            .map(|(code, name)| (name.clone(), code as TeamCode))
            .collect();
        Self { by_name, by_code }
    }

    /// Rebuild from `(name, code)` pairs, checking that they form a dense bijection.
    pub fn from_pairs<I>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, TeamCode)>,
    {
        let pairs: Vec<(String, TeamCode)> = pairs.into_iter().collect();
        let mut by_name = BTreeMap::new();
        let mut slots: Vec<Option<String>> = vec![None; pairs.len()];

        for (name, code) in pairs {
            let idx = code as usize;
            if idx >= slots.len() {
                return Err(Error::data_integrity(format!(
                    "team code {} out of range for {} teams",
                    code,
                    slots.len()
                )));
            }
            if slots[idx].is_some() {
                return Err(Error::data_integrity(format!("duplicate team code {}", code)));
            }
            if by_name.insert(name.clone(), code).is_some() {
                return Err(Error::data_integrity(format!("duplicate team name {:?}", name)));
            }
            slots[idx] = Some(name);
        }

        let by_code = slots
            .into_iter()
            .enumerate()
            .map(|(code, name)| {
                name.ok_or_else(|| {
                    Error::data_integrity(format!("team code {} is unassigned", code))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { by_name, by_code })
    }

    /// Code of `name`, if known.
    pub fn code(&self, name: &str) -> Option<TeamCode> {
        self.by_name.get(name).copied()
    }

    /// Name behind `code`, if assigned.
    pub fn name(&self, code: TeamCode) -> Option<&str> {
        self.by_code.get(code as usize).map(String::as_str)
    }

    /// Code of `name`, failing with `UnknownTeam`.
    pub fn encode(&self, name: &str) -> Result<TeamCode> {
        self.code(name).ok_or_else(|| Error::unknown_team(name))
    }

    /// Name behind `code`, failing with `UnknownTeam`.
    pub fn decode(&self, code: TeamCode) -> Result<&str> {
        self.name(code)
            .ok_or_else(|| Error::unknown_team(format!("code {}", code)))
    }

    /// `(name, code)` pairs in code order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, TeamCode)> {
        self.by_code
            .iter()
            .enumerate()
            .map(|(code, name)| (name.as_str(), code as TeamCode))
    }

    pub fn len(&self) -> usize {
        self.by_code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_code.is_empty()
    }

    /// Write as `Team,Code` CSV in code order.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        for (team, code) in self.iter() {
            wtr.serialize(EncodingRecord {
                team: team.to_string(),
                code,
            })?;
        }
        wtr.flush()?;
        Ok(())
    }

    /// Read a `Team,Code` CSV.
    pub fn read_csv<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::Reader::from_reader(reader);
        let mut pairs = Vec::new();
        for record in rdr.deserialize() {
            let record: EncodingRecord = record?;
            pairs.push((record.team, record.code));
        }
        Self::from_pairs(pairs)
    }

    pub fn write_csv_file(&self, path: impl AsRef<Path>) -> Result<()> {
        self.write_csv(File::create(path)?)
    }

    pub fn read_csv_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::read_csv(File::open(path)?)
    }
}
