//! CSV export and re-import of assembled tables.

use matchday_core::config::ExportConfig;
use matchday_core::{Error, FeatureColumn, FeatureRow, MatchFeatures, Result};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;
use tracing::info;

use crate::assembler::{AssembledTable, FeatureTable};
use crate::encoding::EncodingTable;

/// Leading columns of the named export.
const NAMED_PREFIX: [&str; 3] = ["Season", "HomeTeam", "AwayTeam"];

impl FeatureTable {
    /// Write the encoded table as CSV, one column per [`FeatureColumn`].
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(FeatureColumn::ALL.iter().map(|c| c.name(self.window())))?;
        for row in self.rows() {
            wtr.write_record(FeatureColumn::ALL.iter().map(|&c| row.cell(c)))?;
        }
        wtr.flush()?;
        Ok(())
    }

    /// Read an encoded table written by [`FeatureTable::write_csv`].
    ///
    /// Columns may appear in any order; extra columns are ignored. Every team
    /// code must be present in `encoding`.
    pub fn read_csv<R: Read>(reader: R, encoding: EncodingTable) -> Result<Self> {
        let mut rdr = csv::Reader::from_reader(reader);
        let (positions, window) = resolve_header(rdr.headers()?)?;

        let mut rows = Vec::new();
        for (line, record) in rdr.records().enumerate() {
            let record = record?;
            let row = FeatureRow::from_cells(|column| {
                positions
                    .get(&column)
                    .and_then(|&i| record.get(i))
                    .ok_or_else(|| {
                        Error::data_integrity(format!("row {}: missing {:?}", line + 1, column))
                    })
            })?;
            for code in [row.home_team_enc, row.away_team_enc] {
                if encoding.name(code).is_none() {
                    return Err(Error::data_integrity(format!(
                        "row {}: team code {} not in encoding table",
                        line + 1,
                        code
                    )));
                }
            }
            rows.push(row);
        }

        Ok(FeatureTable::new(window, rows, encoding))
    }

    pub fn write_csv_file(&self, path: impl AsRef<Path>) -> Result<()> {
        self.write_csv(create_file(path.as_ref())?)
    }

    pub fn read_csv_file(path: impl AsRef<Path>, encoding: EncodingTable) -> Result<Self> {
        Self::read_csv(File::open(path)?, encoding)
    }
}

/// Map each column to its position and recover the rolling window.
fn resolve_header(headers: &csv::StringRecord) -> Result<(HashMap<FeatureColumn, usize>, usize)> {
    let mut positions = HashMap::new();
    let mut window: Option<usize> = None;

    for (i, name) in headers.iter().enumerate() {
        let Some((column, suffix)) = FeatureColumn::from_name(name) else {
            continue;
        };
        if let Some(n) = suffix {
            match window {
                Some(w) if w != n => {
                    return Err(Error::data_integrity(format!(
                        "column {} disagrees with rolling window {}",
                        name, w
                    )));
                }
                _ => window = Some(n),
            }
        }
        positions.insert(column, i);
    }

    if let Some(missing) = FeatureColumn::ALL.iter().find(|c| !positions.contains_key(c)) {
        return Err(Error::data_integrity(format!(
            "feature table lacks column {:?}",
            missing
        )));
    }
    let window = window.ok_or_else(|| Error::data_integrity("feature table has no LastN columns"))?;
    Ok((positions, window))
}

/// Write merged rows with team names in place of codes.
pub fn write_named_csv<W: Write>(rows: &[MatchFeatures], window: usize, writer: W) -> Result<()> {
    let columns: Vec<FeatureColumn> = FeatureColumn::ALL
        .iter()
        .copied()
        .filter(|c| !matches!(c, FeatureColumn::HomeTeamEnc | FeatureColumn::AwayTeamEnc))
        .collect();

    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(
        NAMED_PREFIX
            .iter()
            .map(|s| s.to_string())
            .chain(columns.iter().map(|c| c.name(window))),
    )?;
    for m in rows {
        let row = m.encode(0, 0);
        wtr.write_record(
            [m.season.code(), m.home_team.clone(), m.away_team.clone()]
                .into_iter()
                .chain(columns.iter().map(|&c| row.cell(c))),
        )?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write every configured output of an assembly run.
pub fn write_exports(assembled: &AssembledTable, export: &ExportConfig) -> Result<()> {
    let table = &assembled.table;

    if let Some(path) = &export.named_output_path {
        write_named_csv(&assembled.named, table.window(), create_file(path)?)?;
        info!(path = %path.display(), rows = assembled.named.len(), "wrote named table");
    }

    table.write_csv_file(&export.output_path)?;
    info!(path = %export.output_path.display(), rows = table.len(), "wrote feature table");

    table.encoding().write_csv_file(&export.encoding_path)?;
    info!(
        path = %export.encoding_path.display(),
        teams = table.encoding().len(),
        "wrote encoding table"
    );
    Ok(())
}

/// Read the feature and encoding tables written by [`write_exports`].
pub fn read_exports(export: &ExportConfig) -> Result<FeatureTable> {
    let encoding = EncodingTable::read_csv_file(&export.encoding_path)?;
    FeatureTable::read_csv_file(&export.output_path, encoding)
}

fn create_file(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(File::create(path)?)
}
