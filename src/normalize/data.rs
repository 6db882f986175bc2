//! CSV-backed examples tables and feature-level data records.

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

use crate::ast::{Examples, Row, Scenario, Step, StepKeyword, Tag};
use crate::eval::escape;

use super::NormalizeError;

/// File extension accepted for examples and data sources.
pub const CSV_EXTENSION: &str = "csv";
/// Name of the synthetic scenario binding a data record.
pub const DATA_BINDER_NAME: &str = "Bind data attributes";

/// One record of a feature-level data file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataRecord {
    /// CSV file the record was read from.
    pub file: Utf8PathBuf,
    /// One-based record number, excluding the header row.
    pub record: usize,
    /// Column name and value pairs in header order.
    pub columns: Vec<(String, String)>,
}

fn checked_csv_path(path: &Utf8Path) -> Result<(), NormalizeError> {
    if path.extension() != Some(CSV_EXTENSION) {
        return Err(NormalizeError::UnsupportedExamples {
            path: path.to_owned(),
        });
    }
    if !path.is_file() {
        return Err(NormalizeError::MissingData {
            path: path.to_owned(),
        });
    }
    Ok(())
}

fn read_rows(path: &Utf8Path) -> Result<Vec<Row>, NormalizeError> {
    checked_csv_path(path)?;
    let csv_error = |source| NormalizeError::Csv {
        path: path.to_owned(),
        source,
    };
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(csv_error)?;
    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(csv_error)?;
        let line = record
            .position()
            .and_then(|pos| usize::try_from(pos.line()).ok())
            .unwrap_or_default();
        rows.push(Row::new(line, record.iter().map(str::to_owned).collect()));
    }
    Ok(rows)
}

/// Load an examples table from a CSV file; the first row names the
/// placeholders.
///
/// # Errors
///
/// Returns an error when the path is not a CSV file, does not exist, or
/// cannot be decoded.
pub fn load_examples(path: &Utf8Path) -> Result<Examples, NormalizeError> {
    let table = read_rows(path)?;
    tracing::debug!(csv = %path, rows = table.len(), "loaded examples");
    Ok(Examples {
        name: path.to_string(),
        description: Vec::new(),
        table,
        scenarios: Vec::new(),
    })
}

/// Load every data record of a CSV file.
///
/// # Errors
///
/// Returns an error when the path is not a CSV file, does not exist, cannot
/// be decoded, or a record's width differs from the header's.
pub fn load_records(path: &Utf8Path) -> Result<Vec<DataRecord>, NormalizeError> {
    let mut records_iter = read_rows(path)?.into_iter();
    let Some(header) = records_iter.next() else {
        return Ok(Vec::new());
    };
    records_iter
        .enumerate()
        .map(|(index, row)| {
            if row.cells.len() != header.cells.len() {
                return Err(NormalizeError::ExamplesShape {
                    examples: path.to_string(),
                    line: row.line,
                    expected: header.cells.len(),
                    found: row.cells.len(),
                });
            }
            Ok(DataRecord {
                file: path.to_owned(),
                record: index + 1,
                columns: header.cells.iter().cloned().zip(row.cells).collect(),
            })
        })
        .collect()
}

/// Synthesise the scenario that binds one attribute per data column.
#[must_use]
pub fn binder_scenario(record: &DataRecord) -> Scenario {
    let steps = record
        .columns
        .iter()
        .enumerate()
        .map(|(index, (name, value))| {
            let keyword = if index == 0 {
                StepKeyword::Given
            } else {
                StepKeyword::And
            };
            Step::new(keyword, format!("{} is \"{}\"", escape(name), escape(value)))
        })
        .collect();
    let mut scenario = Scenario::new(DATA_BINDER_NAME, steps);
    scenario.tags.push(Tag::Data {
        file: record.file.clone(),
        record: record.record,
    });
    scenario
}
