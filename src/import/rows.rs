//! Row normalization: cell grid → `ImportRow` list + row-level errors.
//!
//! The sheet layout is fixed: row 0 is the header block (date column,
//! day-of-week column, then one column per station label); data starts at
//! row 1. A row with no date cell is a spacer, skipped without error — this
//! also covers trailing blank rows. A row whose date cell is present but
//! unparseable is recorded as a row error and excluded; the batch continues.

use chrono::{Duration, NaiveDate};
use regex::Regex;

use crate::sheet::Cell;
use crate::types::{ImportRow, RowError};

/// Column layout of the source sheet.
const DATE_COL: usize = 0;
const DAY_LABEL_COL: usize = 1;
const FIRST_STATION_COL: usize = 2;

/// First data row; row 0 carries the column labels.
pub const DATA_START_ROW: usize = 1;

/// Sanity bounds for spreadsheet serial day numbers (1900..~2100).
const MIN_SERIAL: f64 = 1.0;
const MAX_SERIAL: f64 = 80_000.0;

/// Walk the grid and produce normalized rows plus per-row errors.
pub fn normalize_rows(grid: &[Vec<Cell>]) -> (Vec<ImportRow>, Vec<RowError>) {
    let labels = header_labels(grid);
    let date_re = Regex::new(r"^(\d{1,2})/(\d{1,2})/(\d{2,4})$").unwrap();

    let mut rows = Vec::new();
    let mut errors = Vec::new();

    for (idx, cells) in grid.iter().enumerate().skip(DATA_START_ROW) {
        let row_number = idx + 1;
        let date_cell = cells.get(DATE_COL).unwrap_or(&Cell::Empty);

        if date_cell.is_empty() {
            // Spacer row — not a defect
            continue;
        }

        let date = match parse_date_cell(date_cell, &date_re) {
            Ok(d) => d,
            Err(message) => {
                errors.push(RowError { row_number, message });
                continue;
            }
        };

        let day_of_week_label = cells
            .get(DAY_LABEL_COL)
            .and_then(|c| c.as_text())
            .map(|s| s.to_string());

        let mut station_raw = Vec::new();
        for (col, label) in &labels {
            if let Some(text) = cells.get(*col).and_then(|c| c.as_text()) {
                station_raw.push((label.clone(), text.to_string()));
            }
        }

        rows.push(ImportRow {
            date,
            day_of_week_label,
            station_raw,
        });
    }

    log::info!(
        "normalized {} rows ({} row errors) from {} grid rows",
        rows.len(),
        errors.len(),
        grid.len().saturating_sub(DATA_START_ROW)
    );
    (rows, errors)
}

/// Station column labels from the header row, keyed by column index.
fn header_labels(grid: &[Vec<Cell>]) -> Vec<(usize, String)> {
    let Some(header) = grid.first() else {
        return Vec::new();
    };
    header
        .iter()
        .enumerate()
        .skip(FIRST_STATION_COL)
        .filter_map(|(col, cell)| cell.as_text().map(|s| (col, s.to_string())))
        .collect()
}

/// Parse a date cell in any of its three accepted shapes.
///
/// All three must converge on the same `NaiveDate` for semantically equal
/// inputs: a serial day number (epoch 1899-12-30), a native date cell, and
/// a `D/M/Y` slash string.
fn parse_date_cell(cell: &Cell, date_re: &Regex) -> Result<NaiveDate, String> {
    match cell {
        Cell::Date(d) => Ok(*d),
        Cell::Number(serial) => serial_to_date(*serial),
        Cell::Text(s) => {
            let caps = date_re
                .captures(s)
                .ok_or_else(|| format!("unrecognized date text: {}", s))?;
            let day: u32 = caps[1].parse().map_err(|_| "bad day component".to_string())?;
            let month: u32 = caps[2].parse().map_err(|_| "bad month component".to_string())?;
            let mut year: i32 = caps[3].parse().map_err(|_| "bad year component".to_string())?;
            if year < 100 {
                year += 2000;
            }
            NaiveDate::from_ymd_opt(year, month, day)
                .ok_or_else(|| format!("no such date: {}", s))
        }
        Cell::Empty => Err("empty date cell".to_string()),
    }
}

/// Spreadsheet serial day number → date, via the 1899-12-30 epoch.
/// Fractional time-of-day components are truncated.
fn serial_to_date(serial: f64) -> Result<NaiveDate, String> {
    if !serial.is_finite() || !(MIN_SERIAL..=MAX_SERIAL).contains(&serial) {
        return Err(format!("serial day number out of range: {}", serial));
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30).unwrap();
    Ok(epoch + Duration::days(serial.trunc() as i64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::date_key;

    fn text(s: &str) -> Cell {
        Cell::Text(s.to_string())
    }

    fn header() -> Vec<Cell> {
        vec![
            text("תאריך"),
            text("יום"),
            text("מיון"),
            text("טיפול נמרץ"),
        ]
    }

    #[test]
    fn test_three_date_shapes_are_equivalent() {
        let native = NaiveDate::from_ymd_opt(2025, 11, 1).unwrap();
        let grid = vec![
            header(),
            vec![Cell::Number(45962.0), text("שבת"), text("משה כהן")],
            vec![Cell::Date(native), text("שבת"), text("משה כהן")],
            vec![text("01/11/2025"), text("שבת"), text("משה כהן")],
            vec![text("1/11/25"), text("שבת"), text("משה כהן")],
        ];

        let (rows, errors) = normalize_rows(&grid);
        assert!(errors.is_empty());
        assert_eq!(rows.len(), 4);
        for row in &rows {
            assert_eq!(date_key(row.date), "2025-11-01");
        }
    }

    #[test]
    fn test_spacer_and_trailing_blank_rows_skipped_silently() {
        let grid = vec![
            header(),
            vec![Cell::Empty, Cell::Empty, Cell::Empty],
            vec![text("02/11/2025"), text("ראשון"), text("דנה לוי")],
            vec![Cell::Empty],
            vec![],
        ];

        let (rows, errors) = normalize_rows(&grid);
        assert!(errors.is_empty());
        assert_eq!(rows.len(), 1);
        assert_eq!(date_key(rows[0].date), "2025-11-02");
    }

    #[test]
    fn test_bad_date_recorded_but_batch_continues() {
        let grid = vec![
            header(),
            vec![text("not a date"), text("שבת"), text("משה כהן")],
            vec![text("31/02/2025"), text("שבת"), text("משה כהן")],
            vec![Cell::Number(9_999_999.0)],
            vec![text("02/11/2025"), text("ראשון"), text("דנה לוי")],
        ];

        let (rows, errors) = normalize_rows(&grid);
        assert_eq!(rows.len(), 1);
        assert_eq!(errors.len(), 3);
        // 1-based spreadsheet row numbers
        assert_eq!(errors[0].row_number, 2);
        assert_eq!(errors[1].row_number, 3);
        assert_eq!(errors[2].row_number, 4);
        assert!(errors[0].message.contains("not a date"));
    }

    #[test]
    fn test_station_cells_collected_by_header_label() {
        let grid = vec![
            header(),
            vec![
                text("01/11/2025"),
                text("שבת"),
                text("משה כהן"),
                text("דנה לוי"),
            ],
        ];

        let (rows, errors) = normalize_rows(&grid);
        assert!(errors.is_empty());
        assert_eq!(
            rows[0].station_raw,
            vec![
                ("מיון".to_string(), "משה כהן".to_string()),
                ("טיפול נמרץ".to_string(), "דנה לוי".to_string()),
            ]
        );
        assert_eq!(rows[0].day_of_week_label.as_deref(), Some("שבת"));
    }

    #[test]
    fn test_empty_occupant_cells_contribute_nothing() {
        let grid = vec![
            header(),
            vec![text("01/11/2025"), Cell::Empty, Cell::Empty, text("דנה לוי")],
        ];

        let (rows, _) = normalize_rows(&grid);
        assert_eq!(rows[0].station_raw.len(), 1);
        assert_eq!(rows[0].day_of_week_label, None);
    }

    #[test]
    fn test_serial_epoch() {
        assert_eq!(
            serial_to_date(45962.0).unwrap(),
            NaiveDate::from_ymd_opt(2025, 11, 1).unwrap()
        );
        // Fractional time-of-day truncates
        assert_eq!(
            serial_to_date(45962.75).unwrap(),
            NaiveDate::from_ymd_opt(2025, 11, 1).unwrap()
        );
        assert!(serial_to_date(0.0).is_err());
        assert!(serial_to_date(-3.0).is_err());
        assert!(serial_to_date(f64::NAN).is_err());
    }
}
