//! Cell grid decoding — the calamine boundary.
//!
//! Turns an uploaded workbook buffer into a rectangular grid of typed
//! cells. Everything downstream (row normalization, station mapping)
//! operates on `Cell` values and never sees calamine types.
//!
//! Whole-file failures (empty payload, oversized payload, no sheets,
//! undecodable workbook) abort here, before any store access.

use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use chrono::NaiveDate;

use crate::error::RosterError;

/// Upload size cap. Roster sheets are a few hundred KB at most.
pub const MAX_WORKBOOK_BYTES: usize = 10 * 1024 * 1024;

/// One typed spreadsheet cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Number(f64),
    Text(String),
    Date(NaiveDate),
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    /// Text content, if this is a non-empty text cell.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

/// Decode an uploaded workbook into the grid of its first sheet.
pub fn decode_workbook(bytes: &[u8]) -> Result<Vec<Vec<Cell>>, RosterError> {
    if bytes.is_empty() {
        return Err(RosterError::EmptyFile);
    }
    if bytes.len() > MAX_WORKBOOK_BYTES {
        return Err(RosterError::FileTooLarge {
            got: bytes.len(),
            max: MAX_WORKBOOK_BYTES,
        });
    }

    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| RosterError::Workbook(e.to_string()))?;

    let sheet_names = workbook.sheet_names().to_vec();
    let first = sheet_names.first().ok_or(RosterError::NoSheets)?;

    let range = workbook
        .worksheet_range(first)
        .map_err(|e| RosterError::Workbook(e.to_string()))?;

    let grid = range
        .rows()
        .map(|row| row.iter().map(convert_cell).collect())
        .collect();

    log::debug!("decoded workbook sheet '{}'", first);
    Ok(grid)
}

/// Map a calamine cell onto the engine's cell type.
///
/// Text is trimmed; whitespace-only text collapses to `Empty`. Error cells
/// also collapse to `Empty` — a broken formula cell contributes nothing.
fn convert_cell(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                Cell::Empty
            } else {
                Cell::Text(trimmed.to_string())
            }
        }
        Data::Int(n) => Cell::Number(*n as f64),
        Data::Float(f) => Cell::Number(*f),
        Data::Bool(b) => Cell::Text(b.to_string()),
        Data::Error(_) => Cell::Empty,
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(ndt) => Cell::Date(ndt.date()),
            None => Cell::Number(dt.as_f64()),
        },
        Data::DateTimeIso(s) => match NaiveDate::parse_from_str(&s[..s.len().min(10)], "%Y-%m-%d") {
            Ok(d) => Cell::Date(d),
            Err(_) => Cell::Text(s.clone()),
        },
        Data::DurationIso(s) => Cell::Text(s.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_payload_rejected() {
        assert!(matches!(decode_workbook(&[]), Err(RosterError::EmptyFile)));
    }

    #[test]
    fn test_oversized_payload_rejected() {
        let bytes = vec![0u8; MAX_WORKBOOK_BYTES + 1];
        match decode_workbook(&bytes) {
            Err(RosterError::FileTooLarge { got, max }) => {
                assert_eq!(got, MAX_WORKBOOK_BYTES + 1);
                assert_eq!(max, MAX_WORKBOOK_BYTES);
            }
            other => panic!("expected FileTooLarge, got {:?}", other.map(|g| g.len())),
        }
    }

    #[test]
    fn test_garbage_payload_rejected() {
        let bytes = b"this is not a spreadsheet".to_vec();
        assert!(matches!(
            decode_workbook(&bytes),
            Err(RosterError::Workbook(_))
        ));
    }

    #[test]
    fn test_convert_cell_trims_and_collapses() {
        assert_eq!(convert_cell(&Data::String("  ".to_string())), Cell::Empty);
        assert_eq!(
            convert_cell(&Data::String("  משה כהן ".to_string())),
            Cell::Text("משה כהן".to_string())
        );
        assert_eq!(convert_cell(&Data::Int(45962)), Cell::Number(45962.0));
        assert_eq!(convert_cell(&Data::Empty), Cell::Empty);
    }

    #[test]
    fn test_convert_iso_date_cell() {
        assert_eq!(
            convert_cell(&Data::DateTimeIso("2025-11-01T00:00:00".to_string())),
            Cell::Date(NaiveDate::from_ymd_opt(2025, 11, 1).unwrap())
        );
    }
}
