use std::io::Cursor;

use calamine::{Data, Range, Reader, open_workbook_auto_from_rs};
use chrono::NaiveDate;

use crate::domain::repository::SpreadsheetReader;
use crate::domain::types::{CellDate, ImportRow};
use crate::error::ClinicServiceError;

pub const NAME_COLUMN: &str = "Patient Name";
pub const RELATIVE_COLUMN: &str = "Relative";
pub const RELATIVE_NAME_COLUMN: &str = "Relative Name";
pub const PHONE_COLUMN: &str = "Phone Number";
pub const BIRTH_DATE_COLUMN: &str = "Birth Date";

/// Reads the first worksheet of an xlsx, xls or ods upload.
#[derive(Debug, Clone, Copy, Default)]
pub struct CalamineReader;

impl SpreadsheetReader for CalamineReader {
    fn read_rows(&self, bytes: &[u8]) -> Result<Vec<ImportRow>, ClinicServiceError> {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
            .map_err(|e| ClinicServiceError::InvalidImport(e.to_string()))?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| ClinicServiceError::InvalidImport("workbook has no sheets".into()))?
            .map_err(|e| ClinicServiceError::InvalidImport(e.to_string()))?;
        rows_from_range(&range)
    }
}

struct Columns {
    name: usize,
    relative: Option<usize>,
    relative_name: Option<usize>,
    phone_number: usize,
    birth_date: usize,
}

impl Columns {
    /// Header lookup is case-insensitive. The relative columns may be absent.
    fn from_header(header: &[Data]) -> Result<Self, ClinicServiceError> {
        let find = |label: &str| {
            header
                .iter()
                .position(|cell| cell_text(cell).eq_ignore_ascii_case(label))
        };
        let mut missing = Vec::new();
        let mut require = |label: &'static str| {
            let index = find(label);
            if index.is_none() {
                missing.push(label);
            }
            index.unwrap_or_default()
        };
        let name = require(NAME_COLUMN);
        let phone_number = require(PHONE_COLUMN);
        let birth_date = require(BIRTH_DATE_COLUMN);
        if !missing.is_empty() {
            return Err(ClinicServiceError::InvalidImport(format!(
                "missing column {}",
                missing.join(", ")
            )));
        }
        Ok(Self {
            name,
            relative: find(RELATIVE_COLUMN),
            relative_name: find(RELATIVE_NAME_COLUMN),
            phone_number,
            birth_date,
        })
    }
}

/// First row is the header. Fully blank rows are dropped.
pub fn rows_from_range(range: &Range<Data>) -> Result<Vec<ImportRow>, ClinicServiceError> {
    let first_line = range.start().map_or(0, |(row, _)| row as usize) + 1;
    let mut rows = range.rows();
    let header = rows
        .next()
        .ok_or_else(|| ClinicServiceError::InvalidImport("sheet is empty".into()))?;
    let columns = Columns::from_header(header)?;

    let cell = |row: &[Data], index: usize| row.get(index).cloned().unwrap_or(Data::Empty);
    let optional_text = |row: &[Data], index: Option<usize>| {
        index
            .map(|i| cell_text(&cell(row, i)))
            .filter(|text| !text.is_empty())
    };

    Ok(rows
        .enumerate()
        .filter(|(_, row)| row.iter().any(|c| !cell_text(c).is_empty()))
        .map(|(offset, row)| ImportRow {
            line: first_line + offset + 1,
            name: cell_text(&cell(row, columns.name)),
            relative: optional_text(row, columns.relative),
            relative_name: optional_text(row, columns.relative_name),
            phone_number: cell_text(&cell(row, columns.phone_number)),
            birth_date: cell_date(&cell(row, columns.birth_date)),
        })
        .collect())
}

/// Numeric cells are rendered without a fractional part, so a phone number
/// typed as a number keeps its digits.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_owned(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        other => other.to_string().trim().to_owned(),
    }
}

fn cell_date(cell: &Data) -> CellDate {
    match cell {
        Data::Empty => CellDate::Missing,
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(datetime) => CellDate::Date(datetime.date()),
            None => CellDate::Invalid(cell.to_string()),
        },
        Data::DateTimeIso(s) | Data::String(s) => parse_date_text(s),
        other => CellDate::Invalid(other.to_string()),
    }
}

/// `YYYY-MM-DD`, optionally followed by a time part.
fn parse_date_text(text: &str) -> CellDate {
    let text = text.trim();
    if text.is_empty() {
        return CellDate::Missing;
    }
    let date_part = text.split(['T', ' ']).next().unwrap_or(text);
    match NaiveDate::parse_from_str(date_part, "%Y-%m-%d") {
        Ok(date) => CellDate::Date(date),
        Err(_) => CellDate::Invalid(text.to_owned()),
    }
}
