// Excel import (calamine) and reconciliation workbook export (rust_xlsxwriter)

use std::path::Path;

use calamine::{open_workbook_auto, Data, Range, Reader};
use chrono::{Duration, NaiveDate};
use ledgerpair_recon::{OutputRow, RawTable, ReconResult, OUTPUT_COLUMNS};
use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};

use crate::error::IoError;
use crate::{EDW_SHEET, JOURNAL_SHEET, RECONCILIATION_SHEET};

// ============================================================================
// Import
// ============================================================================

/// Read the `EDW` and `Journal` sheets of a workbook (xlsx, xls, xlsb, ods).
pub fn read_workbook_tables(path: &Path) -> Result<(RawTable, RawTable), IoError> {
    let mut workbook = open_workbook_auto(path).map_err(|e| IoError::Workbook {
        path: path.to_path_buf(),
        message: format!("failed to open workbook: {e}"),
    })?;

    let mut read_sheet = |name: &str| -> Result<RawTable, IoError> {
        if !workbook.sheet_names().iter().any(|s| s == name) {
            return Err(IoError::MissingSheet {
                path: path.to_path_buf(),
                sheet: name.into(),
            });
        }
        let range = workbook.worksheet_range(name).map_err(|e| IoError::Workbook {
            path: path.to_path_buf(),
            message: format!("failed to read sheet '{name}': {e}"),
        })?;
        Ok(range_to_table(name, &range))
    };

    let edw = read_sheet(EDW_SHEET)?;
    let journal = read_sheet(JOURNAL_SHEET)?;
    log::debug!(
        "read {}: {} EDW rows, {} Journal rows",
        path.display(),
        edw.rows.len(),
        journal.rows.len()
    );
    Ok((edw, journal))
}

/// First row is the header; every later row becomes string cells.
fn range_to_table(name: &str, range: &Range<Data>) -> RawTable {
    let mut rows = range.rows();
    let headers = rows
        .next()
        .map(|r| r.iter().map(|c| cell_text(c).trim().to_string()).collect())
        .unwrap_or_default();
    let body = rows.map(|r| r.iter().map(cell_text).collect()).collect();
    RawTable::new(name, headers, body)
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        // Integers without decimals, so "100" and 100.0 key the same account
        Data::Float(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
        Data::Float(n) => format!("{n}"),
        Data::Int(n) => format!("{n}"),
        Data::Bool(b) => (if *b { "TRUE" } else { "FALSE" }).to_string(),
        Data::Error(e) => format!("#{e:?}"),
        Data::DateTime(dt) => serial_to_date(dt.as_f64())
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| format!("{}", dt.as_f64())),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
    }
}

/// Excel 1900 date system. Serials before 61 predate the fake 1900-02-29 and
/// are not supported.
fn serial_to_date(serial: f64) -> Option<NaiveDate> {
    if serial < 61.0 {
        return None;
    }
    NaiveDate::from_ymd_opt(1899, 12, 30)?.checked_add_signed(Duration::days(serial.floor() as i64))
}

// ============================================================================
// Export
// ============================================================================

/// Write the reconciliation rows plus both input tables to one workbook.
pub fn write_workbook(
    result: &ReconResult,
    edw: &RawTable,
    journal: &RawTable,
    path: &Path,
) -> Result<(), IoError> {
    let xlsx_err = |e: XlsxError| IoError::Workbook {
        path: path.to_path_buf(),
        message: e.to_string(),
    };

    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();

    let sheet = workbook
        .add_worksheet()
        .set_name(RECONCILIATION_SHEET)
        .map_err(xlsx_err)?;
    write_rows(sheet, &result.rows, result.meta.minor_unit_digits, &header).map_err(xlsx_err)?;

    for table in [edw, journal] {
        let sheet = workbook.add_worksheet().set_name(&table.name).map_err(xlsx_err)?;
        write_table(sheet, table, &header).map_err(xlsx_err)?;
    }

    workbook.save(path).map_err(xlsx_err)?;
    log::info!("wrote {} rows to {}", result.rows.len(), path.display());
    Ok(())
}

fn write_rows(
    sheet: &mut Worksheet,
    rows: &[OutputRow],
    minor_unit_digits: u32,
    header: &Format,
) -> Result<(), XlsxError> {
    for (col, name) in OUTPUT_COLUMNS.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *name, header)?;
    }

    let amount_format = Format::new().set_num_format(amount_num_format(minor_unit_digits));
    let scale = 10f64.powi(minor_unit_digits as i32);

    for (i, row) in rows.iter().enumerate() {
        let r = (i + 1) as u32;
        for (col, cell) in row.to_record(minor_unit_digits).iter().enumerate() {
            match col {
                0 => sheet.write_number(r, 0, row.no as f64)?,
                6 => sheet.write_number_with_format(r, 6, row.amount_minor as f64 / scale, &amount_format)?,
                _ => sheet.write_string(r, col as u16, cell)?,
            };
        }
    }

    sheet.set_freeze_panes(1, 0)?;
    Ok(())
}

fn write_table(sheet: &mut Worksheet, table: &RawTable, header: &Format) -> Result<(), XlsxError> {
    for (col, name) in table.headers.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, name, header)?;
    }
    for (i, cells) in table.rows.iter().enumerate() {
        for (col, cell) in cells.iter().enumerate() {
            if !cell.is_empty() {
                sheet.write_string((i + 1) as u32, col as u16, cell)?;
            }
        }
    }
    sheet.set_freeze_panes(1, 0)?;
    Ok(())
}

fn amount_num_format(minor_unit_digits: u32) -> String {
    if minor_unit_digits == 0 {
        "#,##0".to_string()
    } else {
        format!("#,##0.{}", "0".repeat(minor_unit_digits as usize))
    }
}
