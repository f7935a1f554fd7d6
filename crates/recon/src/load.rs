//! Raw tables in, typed records out.
//!
//! The surrounding application owns spreadsheet and file handling; it hands
//! over each table as a header row plus string cells. Everything structural
//! (missing columns, unparseable dates or amounts, duplicate ids) fails here,
//! before any matching starts.

use std::collections::HashMap;

use chrono::{NaiveDate, NaiveDateTime};

use crate::amount::parse_minor_units;
use crate::config::ReconConfig;
use crate::error::ReconError;
use crate::model::{LedgerEntry, RawTransaction, ReconInput};

/// A table as delivered by the I/O collaborator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(name: impl Into<String>, headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            name: name.into(),
            headers,
            rows,
        }
    }

    /// Parse CSV text whose first record is the header row.
    pub fn from_csv_str(name: &str, csv_data: &str) -> Result<Self, ReconError> {
        Self::from_csv_str_with_delimiter(name, csv_data, b',')
    }

    pub fn from_csv_str_with_delimiter(
        name: &str,
        csv_data: &str,
        delimiter: u8,
    ) -> Result<Self, ReconError> {
        let table_err = |e: csv::Error| ReconError::Table {
            table: name.into(),
            message: e.to_string(),
        };

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .delimiter(delimiter)
            .flexible(true)
            .from_reader(csv_data.as_bytes());

        let headers: Vec<String> = reader
            .headers()
            .map_err(table_err)?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(table_err)?;
            rows.push(record.iter().map(|f| f.to_string()).collect());
        }

        Ok(Self::new(name, headers, rows))
    }

    /// Index of a header, compared after trimming.
    pub fn column(&self, name: &str) -> Result<usize, ReconError> {
        self.headers
            .iter()
            .position(|h| h.trim() == name.trim())
            .ok_or_else(|| ReconError::MissingColumn {
                table: self.name.clone(),
                column: name.into(),
            })
    }

    fn is_blank_row(row: &[String]) -> bool {
        row.iter().all(|c| c.trim().is_empty())
    }
}

/// Load both tables into a typed input.
pub fn load_input(
    edw: &RawTable,
    journal: &RawTable,
    config: &ReconConfig,
) -> Result<ReconInput, ReconError> {
    let transactions = load_transactions(edw, config)?;
    let entries = load_ledger(journal, config)?;
    log::info!(
        "loaded {} EDW transactions and {} journal entries",
        transactions.len(),
        entries.len()
    );
    Ok(ReconInput {
        transactions,
        entries,
    })
}

/// Map the EDW table into `RawTransaction`s.
pub fn load_transactions(
    table: &RawTable,
    config: &ReconConfig,
) -> Result<Vec<RawTransaction>, ReconError> {
    let col = &config.edw.columns;
    let id_idx = table.column(&col.id)?;
    let account_idx = table.column(&col.account)?;
    let code_idx = table.column(&col.code)?;
    let date_idx = table.column(&col.date)?;
    let amount_idx = table.column(&col.amount)?;
    let ref_idx = table.column(&col.ref_code)?;
    let desc_idx = table.column(&col.description)?;

    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut out = Vec::with_capacity(table.rows.len());

    for (row_idx, row) in table.rows.iter().enumerate() {
        if RawTable::is_blank_row(row) {
            continue;
        }
        let cells = Cells { table, row, row_idx };

        let id = cells.required(id_idx, &col.id)?;
        if let Some(&first_row) = seen.get(&id) {
            return Err(ReconError::DuplicateTransactionId {
                table: table.name.clone(),
                row: row_idx,
                first_row,
                id,
            });
        }
        seen.insert(id.clone(), row_idx);

        let date_str = cells.required(date_idx, &col.date)?;
        let date = parse_date(&date_str, &config.date_formats).ok_or_else(|| {
            ReconError::DateParse {
                table: table.name.clone(),
                row: row_idx,
                value: date_str.clone(),
            }
        })?;

        let amount_str = cells.required(amount_idx, &col.amount)?;
        let amount_minor = parse_minor_units(&amount_str, config.minor_unit_digits).ok_or_else(|| {
            ReconError::AmountParse {
                table: table.name.clone(),
                row: row_idx,
                value: amount_str.clone(),
            }
        })?;

        out.push(RawTransaction {
            row: row_idx,
            id,
            account: cells.required(account_idx, &col.account)?,
            code: cells.required(code_idx, &col.code)?,
            date,
            amount_minor,
            ref_code: cells.optional(ref_idx),
            description: cells.optional(desc_idx),
        });
    }

    Ok(out)
}

/// Map the Journal table into `LedgerEntry`s.
pub fn load_ledger(table: &RawTable, config: &ReconConfig) -> Result<Vec<LedgerEntry>, ReconError> {
    let col = &config.journal.columns;
    let account_idx = table.column(&col.account)?;
    let code_idx = table.column(&col.code)?;
    let date_idx = table.column(&col.date)?;
    let debit_idx = table.column(&col.debit)?;
    let desc_idx = table.column(&col.description)?;
    let gl_idx = table.column(&col.gl_code)?;

    let mut out = Vec::with_capacity(table.rows.len());

    for (row_idx, row) in table.rows.iter().enumerate() {
        if RawTable::is_blank_row(row) {
            continue;
        }
        let cells = Cells { table, row, row_idx };

        let date_str = cells.required(date_idx, &col.date)?;
        let date = parse_date(&date_str, &config.date_formats).ok_or_else(|| {
            ReconError::DateParse {
                table: table.name.clone(),
                row: row_idx,
                value: date_str.clone(),
            }
        })?;

        let debit_str = cells.required(debit_idx, &col.debit)?;
        let debit_minor = parse_minor_units(&debit_str, config.minor_unit_digits).ok_or_else(|| {
            ReconError::AmountParse {
                table: table.name.clone(),
                row: row_idx,
                value: debit_str.clone(),
            }
        })?;
        if debit_minor <= 0 {
            return Err(ReconError::NonPositiveDebit {
                table: table.name.clone(),
                row: row_idx,
                value: debit_str,
            });
        }

        out.push(LedgerEntry {
            row: row_idx,
            account: cells.required(account_idx, &col.account)?,
            code: cells.required(code_idx, &col.code)?,
            date,
            debit_minor,
            description: cells.optional(desc_idx),
            gl_code: cells.optional(gl_idx),
        });
    }

    Ok(out)
}

struct Cells<'a> {
    table: &'a RawTable,
    row: &'a [String],
    row_idx: usize,
}

impl Cells<'_> {
    fn optional(&self, idx: usize) -> String {
        self.row.get(idx).map(|c| c.trim().to_string()).unwrap_or_default()
    }

    fn required(&self, idx: usize, column: &str) -> Result<String, ReconError> {
        let value = self.optional(idx);
        if value.is_empty() {
            return Err(ReconError::EmptyField {
                table: self.table.name.clone(),
                row: self.row_idx,
                column: column.into(),
            });
        }
        Ok(value)
    }
}

/// Try each format in order; a midnight time suffix (`2024-01-05 00:00:00`,
/// as spreadsheet exports often write) is accepted too.
pub fn parse_date(value: &str, formats: &[String]) -> Option<NaiveDate> {
    let value = value.trim();
    for fmt in formats {
        if let Ok(d) = NaiveDate::parse_from_str(value, fmt) {
            return Some(d);
        }
        let with_time = format!("{fmt} %H:%M:%S");
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, &with_time) {
            return Some(dt.date());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const EDW_CSV: &str = "\
Transaction ID,Account Number,Tran Code,Process Date,Amount (INR),Ref Code,Description
T1,100,42,2024-01-05,-1000.00,R1,ATM withdrawal
T2,100,42,2024-01-05,-500,R2,POS purchase
,,,,,,
T3,200,42,05/01/2024,\"-1,250.50\",,Transfer
";

    const JOURNAL_CSV: &str = "\
Account Number,Tran Code,Journal Date,Debit Amount,Description,GL Code
100,42,2024-01-05,1500,Cash out,GL-100
200,42,2024-01-05 00:00:00,1250.5,Transfer out,GL-200
";

    fn cfg() -> ReconConfig {
        ReconConfig::default()
    }

    #[test]
    fn load_edw_basic() {
        let table = RawTable::from_csv_str("EDW", EDW_CSV).unwrap();
        let txns = load_transactions(&table, &cfg()).unwrap();
        assert_eq!(txns.len(), 3, "blank row is skipped");
        assert_eq!(txns[0].id, "T1");
        assert_eq!(txns[0].amount_minor, -100_000);
        assert_eq!(txns[1].amount_minor, -50_000);
        assert_eq!(txns[2].amount_minor, -125_050);
        assert_eq!(txns[2].date, NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());
        assert_eq!(txns[2].ref_code, "");
        // Row index is the data row, blank rows included
        assert_eq!(txns[2].row, 3);
    }

    #[test]
    fn load_journal_basic() {
        let table = RawTable::from_csv_str("Journal", JOURNAL_CSV).unwrap();
        let entries = load_ledger(&table, &cfg()).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].debit_minor, 150_000);
        assert_eq!(entries[0].gl_code, "GL-100");
        assert_eq!(entries[1].date, NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());
        assert_eq!(entries[1].debit_minor, 125_050);
    }

    #[test]
    fn missing_column_is_structural() {
        let csv = "Account Number,Tran Code,Journal Date,Description,GL Code\n100,42,2024-01-05,x,GL\n";
        let table = RawTable::from_csv_str("Journal", csv).unwrap();
        let err = load_ledger(&table, &cfg()).unwrap_err();
        assert!(err.is_structural());
        assert_eq!(err.to_string(), "table 'Journal': missing column 'Debit Amount'");
    }

    #[test]
    fn duplicate_id_rejected() {
        let csv = "\
Transaction ID,Account Number,Tran Code,Process Date,Amount (INR),Ref Code,Description
T1,100,42,2024-01-05,-10,,a
T1,100,42,2024-01-05,-20,,b
";
        let table = RawTable::from_csv_str("EDW", csv).unwrap();
        let err = load_transactions(&table, &cfg()).unwrap_err();
        assert!(matches!(
            err,
            ReconError::DuplicateTransactionId { row: 1, first_row: 0, .. }
        ));
    }

    #[test]
    fn non_positive_debit_rejected() {
        let csv = "\
Account Number,Tran Code,Journal Date,Debit Amount,Description,GL Code
100,42,2024-01-05,-15,x,GL
";
        let table = RawTable::from_csv_str("Journal", csv).unwrap();
        let err = load_ledger(&table, &cfg()).unwrap_err();
        assert!(matches!(err, ReconError::NonPositiveDebit { row: 0, .. }));
        assert!(err.to_string().contains("row 2:"), "{err}");
    }

    #[test]
    fn bad_amount_and_date_rejected() {
        let csv = "\
Transaction ID,Account Number,Tran Code,Process Date,Amount (INR),Ref Code,Description
T1,100,42,2024-01-05,ten,,a
";
        let table = RawTable::from_csv_str("EDW", csv).unwrap();
        assert!(matches!(
            load_transactions(&table, &cfg()),
            Err(ReconError::AmountParse { .. })
        ));

        let csv = "\
Transaction ID,Account Number,Tran Code,Process Date,Amount (INR),Ref Code,Description
T1,100,42,Jan 5th,-10,,a
";
        let table = RawTable::from_csv_str("EDW", csv).unwrap();
        assert!(matches!(
            load_transactions(&table, &cfg()),
            Err(ReconError::DateParse { .. })
        ));
    }

    #[test]
    fn empty_required_cell_rejected() {
        let csv = "\
Transaction ID,Account Number,Tran Code,Process Date,Amount (INR),Ref Code,Description
T1,,42,2024-01-05,-10,,a
";
        let table = RawTable::from_csv_str("EDW", csv).unwrap();
        let err = load_transactions(&table, &cfg()).unwrap_err();
        assert!(matches!(err, ReconError::EmptyField { ref column, .. } if column == "Account Number"));
    }

    #[test]
    fn custom_column_mapping() {
        let mut config = cfg();
        config.journal.columns.debit = "Dr".into();
        let csv = "Account Number,Tran Code,Journal Date,Dr,Description,GL Code\n1,2,2024-02-01,3,d,g\n";
        let table = RawTable::from_csv_str("Journal", csv).unwrap();
        let entries = load_ledger(&table, &config).unwrap();
        assert_eq!(entries[0].debit_minor, 300);
    }
}
