use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// One EDW record. `row` is the 0-based data row in the source table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawTransaction {
    pub row: usize,
    pub id: String,
    pub account: String,
    pub code: String,
    pub date: NaiveDate,
    pub amount_minor: i64,
    pub ref_code: String,
    pub description: String,
}

impl RawTransaction {
    pub fn key(&self) -> GroupKey {
        GroupKey {
            account: self.account.clone(),
            code: self.code.clone(),
            date: self.date,
        }
    }

    pub fn magnitude(&self) -> i64 {
        self.amount_minor.abs()
    }
}

/// One Journal debit line. `debit_minor` is always positive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerEntry {
    pub row: usize,
    pub account: String,
    pub code: String,
    pub date: NaiveDate,
    pub debit_minor: i64,
    pub description: String,
    pub gl_code: String,
}

impl LedgerEntry {
    pub fn key(&self) -> GroupKey {
        GroupKey {
            account: self.account.clone(),
            code: self.code.clone(),
            date: self.date,
        }
    }
}

/// Both tables, already typed.
#[derive(Debug, Clone, Default)]
pub struct ReconInput {
    pub transactions: Vec<RawTransaction>,
    pub entries: Vec<LedgerEntry>,
}

// ---------------------------------------------------------------------------
// Grouping
// ---------------------------------------------------------------------------

/// Exact-match key = (account, code, date). Never matches across any of the three.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct GroupKey {
    pub account: String,
    pub code: String,
    pub date: NaiveDate,
}

impl std::fmt::Display for GroupKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.account, self.code, self.date)
    }
}

// ---------------------------------------------------------------------------
// Match results
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AmbiguityReason {
    /// Two or more covers of the winning size.
    TiedSolutions,
    /// Enumeration stopped at a node or cover cap.
    SearchCapHit,
    TiedAndCapHit,
}

/// Which bound stopped a search before it produced a cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetLimit {
    GroupTooLarge,
    DpCells,
    Nodes,
    Deadline,
}

impl std::fmt::Display for BudgetLimit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::GroupTooLarge => write!(f, "group_too_large"),
            Self::DpCells => write!(f, "dp_cells"),
            Self::Nodes => write!(f, "nodes"),
            Self::Deadline => write!(f, "deadline"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "limit")]
pub enum UnmatchedReason {
    NoCandidates,
    NoExactCover,
    SearchBudgetExceeded(BudgetLimit),
}

impl std::fmt::Display for UnmatchedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoCandidates => write!(f, "no_candidates"),
            Self::NoExactCover => write!(f, "no_exact_cover"),
            Self::SearchBudgetExceeded(limit) => write!(f, "search_budget_exceeded:{limit}"),
        }
    }
}

/// Audit trail for one matched entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MatchProof {
    pub group: String,
    pub candidates: usize,
    pub exact_covers: usize,
    pub dp_cells: u64,
    pub nodes_visited: u64,
    pub cap_hit: bool,
    pub ambiguous: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ambiguity_reason: Option<AmbiguityReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tie_break_reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MatchResult {
    Matched {
        entry: LedgerEntry,
        /// Ordered by transaction id.
        chosen: Vec<RawTransaction>,
        proof: MatchProof,
    },
    Unmatched {
        entry: LedgerEntry,
        candidates_considered: usize,
        reason: UnmatchedReason,
    },
}

impl MatchResult {
    pub fn entry(&self) -> &LedgerEntry {
        match self {
            Self::Matched { entry, .. } | Self::Unmatched { entry, .. } => entry,
        }
    }

    pub fn is_matched(&self) -> bool {
        matches!(self, Self::Matched { .. })
    }
}

// ---------------------------------------------------------------------------
// Output rows
// ---------------------------------------------------------------------------

/// Output header, in column order.
pub const OUTPUT_COLUMNS: [&str; 17] = [
    "No",
    "Item Type",
    "Reconciliation",
    "SIDE",
    "Value Date",
    "Ref 1",
    "Amount",
    "Amt CCY",
    "Bus Entity",
    "Stmt Date",
    "Rule",
    "ENTRY DATE",
    "Ref 2",
    "Ref 3",
    "Ref 4",
    "Tran Code",
    "Status",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Side {
    #[serde(rename = "CR")]
    Credit,
    #[serde(rename = "DR")]
    Debit,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Credit => write!(f, "CR"),
            Self::Debit => write!(f, "DR"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RowStatus {
    Matched,
    Unmatched,
}

impl std::fmt::Display for RowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Matched => write!(f, "Matched"),
            Self::Unmatched => write!(f, "Unmatched"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputRow {
    pub no: u64,
    pub item_type: String,
    pub reconciliation: String,
    pub side: Side,
    pub value_date: NaiveDate,
    pub ref1: String,
    pub amount_minor: i64,
    pub currency: String,
    pub business_entity: String,
    pub statement_date: NaiveDate,
    pub rule: String,
    pub entry_date: NaiveDate,
    pub ref2: String,
    pub ref3: String,
    pub ref4: String,
    pub tran_code: String,
    pub status: RowStatus,
}

impl OutputRow {
    /// Render as 17 text cells in `OUTPUT_COLUMNS` order.
    pub fn to_record(&self, minor_unit_digits: u32) -> [String; 17] {
        [
            self.no.to_string(),
            self.item_type.clone(),
            self.reconciliation.clone(),
            self.side.to_string(),
            self.value_date.format("%Y-%m-%d").to_string(),
            self.ref1.clone(),
            crate::amount::format_minor_units(self.amount_minor, minor_unit_digits),
            self.currency.clone(),
            self.business_entity.clone(),
            self.statement_date.format("%Y-%m-%d").to_string(),
            self.rule.clone(),
            self.entry_date.format("%Y-%m-%d").to_string(),
            self.ref2.clone(),
            self.ref3.clone(),
            self.ref4.clone(),
            self.tran_code.clone(),
            self.status.to_string(),
        ]
    }
}

// ---------------------------------------------------------------------------
// Summary + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconSummary {
    pub total_entries: usize,
    pub matched_count: usize,
    pub unmatched_count: usize,
    /// Sums of journal debits in minor units; wider than a single amount.
    pub total_matched_amount: i128,
    pub total_unmatched_amount: i128,
    pub transactions_total: usize,
    pub transactions_consumed: usize,
    pub ambiguous: usize,
    pub reason_counts: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconResult {
    pub meta: ReconMeta,
    pub summary: ReconSummary,
    pub results: Vec<MatchResult>,
    pub rows: Vec<OutputRow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconMeta {
    pub config_name: String,
    pub engine_version: String,
    pub currency: String,
    pub minor_unit_digits: u32,
    pub workers: usize,
}
