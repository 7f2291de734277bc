//! Recipe import from the spreadsheet layout.
//!
//! Six fixed columns: `mode, test_type, voltage, current, power, time_limit_h`.
//! Empty cells are absent values. A leading header row whose first cell is
//! `mode` is skipped. CP ramps and CCCV settings are not part of the sheet and
//! must be attached afterwards.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use thiserror::Error;

use crate::recipe::{Mode, Step, TestType};

const COLUMNS: usize = 6;

/// Failure while importing a recipe sheet.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("cannot read recipe file: {0}")]
    Io(#[from] io::Error),
    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("row {row}: {message}")]
    Row { row: usize, message: String },
}

/// Reads a recipe from a CSV file.
///
/// # Errors
///
/// Returns an [`ImportError`] if the file cannot be opened or a row is malformed.
pub fn import_recipe_csv(path: &Path) -> Result<Vec<Step>, ImportError> {
    let file = File::open(path)?;
    read_recipe_csv(file)
}

/// Reads a recipe from any CSV source.
///
/// # Errors
///
/// Returns an [`ImportError`] on CSV syntax errors, on rows without exactly
/// six columns and on unparseable cells. Row numbers in errors are 1-based
/// and count the header row if present.
pub fn read_recipe_csv(reader: impl Read) -> Result<Vec<Step>, ImportError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut steps = Vec::new();
    for (i, record) in rdr.records().enumerate() {
        let record = record?;
        let row = i + 1;
        if i == 0 && record.get(0).is_some_and(|c| c.eq_ignore_ascii_case("mode")) {
            continue;
        }
        if record.iter().all(str::is_empty) {
            continue;
        }
        if record.len() != COLUMNS {
            return Err(ImportError::Row {
                row,
                message: format!("expected {COLUMNS} columns, found {}", record.len()),
            });
        }
        steps.push(parse_row(&record).map_err(|message| ImportError::Row { row, message })?);
    }
    Ok(steps)
}

fn parse_row(record: &csv::StringRecord) -> Result<Step, String> {
    let mode = parse_mode(&record[0])?;
    let test_type = parse_test_type(&record[1])?;
    Ok(Step {
        mode,
        test_type,
        voltage: parse_number(&record[2], "voltage")?,
        current: parse_number(&record[3], "current")?,
        power: parse_number(&record[4], "power")?,
        time_limit_hours: parse_number(&record[5], "time_limit_h")?,
        detail: None,
    })
}

fn parse_mode(cell: &str) -> Result<Mode, String> {
    match cell.to_ascii_lowercase().as_str() {
        "rest" => Ok(Mode::Rest),
        "charge" => Ok(Mode::Charge),
        "discharge" => Ok(Mode::Discharge),
        _ => Err(format!("unknown mode \"{cell}\"")),
    }
}

fn parse_test_type(cell: &str) -> Result<TestType, String> {
    match cell.to_ascii_uppercase().as_str() {
        "" | "-" | "NONE" => Ok(TestType::None),
        "CC" => Ok(TestType::Cc),
        "CP" => Ok(TestType::Cp),
        "CCCV" => Ok(TestType::Cccv),
        _ => Err(format!("unknown test type \"{cell}\"")),
    }
}

fn parse_number(cell: &str, column: &str) -> Result<Option<f64>, String> {
    if cell.is_empty() {
        return Ok(None);
    }
    cell.parse::<f64>()
        .map(Some)
        .map_err(|_| format!("{column}: \"{cell}\" is not a number"))
}
