use crate::config::ReconConfig;
use crate::model::{LedgerEntry, MatchResult, OutputRow, RawTransaction, RowStatus, Side};

pub const ITEM_TYPE_JOURNAL: &str = "Journal";
pub const ITEM_TYPE_EDW: &str = "EDW";

/// Turns match results into output rows, numbering them 1.. across the run.
pub struct RowEmitter<'a> {
    config: &'a ReconConfig,
    next_no: u64,
}

impl<'a> RowEmitter<'a> {
    pub fn new(config: &'a ReconConfig) -> Self {
        Self { config, next_no: 1 }
    }

    /// Emit rows for every result in order.
    pub fn emit_all(mut self, results: &[MatchResult]) -> Vec<OutputRow> {
        let mut rows = Vec::new();
        for result in results {
            rows.extend(self.emit(result));
        }
        rows
    }

    /// One CR row, then one DR row per chosen transaction when matched.
    pub fn emit(&mut self, result: &MatchResult) -> Vec<OutputRow> {
        match result {
            MatchResult::Matched { entry, chosen, .. } => {
                let mut rows = Vec::with_capacity(chosen.len() + 1);
                rows.push(self.credit_row(entry, RowStatus::Matched));
                for txn in chosen {
                    rows.push(self.debit_row(entry, txn));
                }
                rows
            }
            MatchResult::Unmatched { entry, .. } => vec![self.credit_row(entry, RowStatus::Unmatched)],
        }
    }

    fn take_no(&mut self) -> u64 {
        let no = self.next_no;
        self.next_no += 1;
        no
    }

    fn reconciliation_id(&self, entry: &LedgerEntry) -> String {
        format!("{}{:06}", self.config.recon_id_prefix, entry.row + 1)
    }

    fn credit_row(&mut self, entry: &LedgerEntry, status: RowStatus) -> OutputRow {
        OutputRow {
            no: self.take_no(),
            item_type: ITEM_TYPE_JOURNAL.into(),
            reconciliation: self.reconciliation_id(entry),
            side: Side::Credit,
            value_date: entry.date,
            ref1: String::new(),
            amount_minor: entry.debit_minor,
            currency: self.config.currency.clone(),
            business_entity: self.config.business_entity.clone(),
            statement_date: self.config.statement_date.unwrap_or(entry.date),
            rule: self.config.rule_label(&entry.code),
            entry_date: self.config.entry_date.unwrap_or(entry.date),
            ref2: String::new(),
            ref3: entry.description.clone(),
            ref4: entry.gl_code.clone(),
            tran_code: entry.code.clone(),
            status,
        }
    }

    fn debit_row(&mut self, entry: &LedgerEntry, txn: &RawTransaction) -> OutputRow {
        OutputRow {
            no: self.take_no(),
            item_type: ITEM_TYPE_EDW.into(),
            reconciliation: self.reconciliation_id(entry),
            side: Side::Debit,
            value_date: txn.date,
            ref1: txn.id.clone(),
            amount_minor: txn.amount_minor,
            currency: self.config.currency.clone(),
            business_entity: self.config.business_entity.clone(),
            statement_date: self.config.statement_date.unwrap_or(txn.date),
            rule: self.config.rule_label(&entry.code),
            entry_date: self.config.entry_date.unwrap_or(entry.date),
            ref2: txn.ref_code.clone(),
            ref3: txn.description.clone(),
            ref4: String::new(),
            tran_code: txn.code.clone(),
            status: RowStatus::Matched,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MatchProof, UnmatchedReason};
    use chrono::NaiveDate;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn entry(row: usize, debit: i64) -> LedgerEntry {
        LedgerEntry {
            row,
            account: "100".into(),
            code: "42".into(),
            date: date("2024-01-05"),
            debit_minor: debit,
            description: "Cash out".into(),
            gl_code: "GL-100".into(),
        }
    }

    fn txn(id: &str, amount: i64) -> RawTransaction {
        RawTransaction {
            row: 0,
            id: id.into(),
            account: "100".into(),
            code: "42".into(),
            date: date("2024-01-05"),
            amount_minor: amount,
            ref_code: format!("ref-{id}"),
            description: format!("desc {id}"),
        }
    }

    fn proof() -> MatchProof {
        MatchProof {
            group: "100/42/2024-01-05".into(),
            candidates: 2,
            exact_covers: 1,
            dp_cells: 4,
            nodes_visited: 3,
            cap_hit: false,
            ambiguous: false,
            ambiguity_reason: None,
            tie_break_reason: None,
        }
    }

    #[test]
    fn matched_rows() {
        let config = ReconConfig::default();
        let result = MatchResult::Matched {
            entry: entry(0, 1500),
            chosen: vec![txn("T1", -1000), txn("T2", -500)],
            proof: proof(),
        };
        let rows = RowEmitter::new(&config).emit_all(&[result]);
        assert_eq!(rows.len(), 3);

        let cr = &rows[0];
        assert_eq!(cr.no, 1);
        assert_eq!(cr.side, Side::Credit);
        assert_eq!(cr.item_type, "Journal");
        assert_eq!(cr.reconciliation, "RC000001");
        assert_eq!(cr.amount_minor, 1500);
        assert_eq!(cr.ref3, "Cash out");
        assert_eq!(cr.ref4, "GL-100");
        assert_eq!(cr.rule, "AutoRule 42");
        assert_eq!(cr.currency, "INR");
        assert_eq!(cr.business_entity, "India_BU");
        assert_eq!(cr.status, RowStatus::Matched);

        let dr = &rows[1];
        assert_eq!(dr.no, 2);
        assert_eq!(dr.side, Side::Debit);
        assert_eq!(dr.item_type, "EDW");
        assert_eq!(dr.reconciliation, "RC000001");
        assert_eq!(dr.amount_minor, -1000);
        assert_eq!(dr.ref1, "T1");
        assert_eq!(dr.ref2, "ref-T1");
        assert_eq!(dr.ref3, "desc T1");
        assert_eq!(dr.ref4, "");
        assert_eq!(dr.rule, "AutoRule 42");
        assert_eq!(rows[2].no, 3);
        assert_eq!(rows[2].amount_minor, -500);
    }

    #[test]
    fn unmatched_is_credit_only() {
        let config = ReconConfig::default();
        let result = MatchResult::Unmatched {
            entry: entry(4, 1500),
            candidates_considered: 2,
            reason: UnmatchedReason::NoExactCover,
        };
        let rows = RowEmitter::new(&config).emit_all(&[result]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].side, Side::Credit);
        assert_eq!(rows[0].amount_minor, 1500);
        assert_eq!(rows[0].status, RowStatus::Unmatched);
        assert_eq!(rows[0].reconciliation, "RC000005");
    }

    #[test]
    fn sequence_spans_results_and_dates_follow_config() {
        let mut config = ReconConfig::default();
        config.statement_date = Some(date("2024-01-31"));
        config.entry_date = Some(date("2024-02-01"));
        config.currency = "USD".into();
        let results = vec![
            MatchResult::Unmatched {
                entry: entry(0, 10),
                candidates_considered: 0,
                reason: UnmatchedReason::NoCandidates,
            },
            MatchResult::Matched {
                entry: entry(1, 1000),
                chosen: vec![txn("T9", -1000)],
                proof: proof(),
            },
        ];
        let rows = RowEmitter::new(&config).emit_all(&results);
        let numbers: Vec<u64> = rows.iter().map(|r| r.no).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert!(rows.iter().all(|r| r.statement_date == date("2024-01-31")));
        assert!(rows.iter().all(|r| r.entry_date == date("2024-02-01")));
        assert!(rows.iter().all(|r| r.currency == "USD"));
    }

    #[test]
    fn record_has_seventeen_cells_in_header_order() {
        let config = ReconConfig::default();
        let result = MatchResult::Matched {
            entry: entry(0, 150_000),
            chosen: vec![txn("T1", -150_000)],
            proof: proof(),
        };
        let rows = RowEmitter::new(&config).emit_all(&[result]);
        let dr = rows[1].to_record(config.minor_unit_digits);
        assert_eq!(
            dr,
            [
                "2", "EDW", "RC000001", "DR", "2024-01-05", "T1", "-1500.00", "INR", "India_BU",
                "2024-01-05", "AutoRule 42", "2024-01-05", "ref-T1", "desc T1", "", "42", "Matched",
            ]
            .map(String::from)
        );
    }
}
