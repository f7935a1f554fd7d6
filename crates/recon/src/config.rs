use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ReconError;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Deployment constants and search bounds for a run. Every field has a
/// default, so an empty TOML document is a valid config.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ReconConfig {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default = "default_business_entity")]
    pub business_entity: String,
    /// Rule label is `"{rule_prefix} {tran_code}"`.
    #[serde(default = "default_rule_prefix")]
    pub rule_prefix: String,
    #[serde(default = "default_recon_id_prefix")]
    pub recon_id_prefix: String,
    /// Fractional digits of the currency (2 for INR paise).
    #[serde(default = "default_minor_unit_digits")]
    pub minor_unit_digits: u32,
    /// Fixed statement date for every row; falls back to the row's value date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statement_date: Option<NaiveDate>,
    /// Fixed entry date for every row; falls back to the journal date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_date: Option<NaiveDate>,
    /// chrono formats tried in order when parsing input dates.
    #[serde(default = "default_date_formats")]
    pub date_formats: Vec<String>,
    #[serde(default)]
    pub edw: EdwConfig,
    #[serde(default)]
    pub journal: JournalConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub parallel: ParallelConfig,
}

fn default_name() -> String {
    "reconciliation".into()
}

fn default_currency() -> String {
    "INR".into()
}

fn default_business_entity() -> String {
    "India_BU".into()
}

fn default_rule_prefix() -> String {
    "AutoRule".into()
}

fn default_recon_id_prefix() -> String {
    "RC".into()
}

fn default_minor_unit_digits() -> u32 {
    2
}

fn default_date_formats() -> Vec<String> {
    vec!["%Y-%m-%d".into(), "%d-%m-%Y".into(), "%d/%m/%Y".into()]
}

impl Default for ReconConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            currency: default_currency(),
            business_entity: default_business_entity(),
            rule_prefix: default_rule_prefix(),
            recon_id_prefix: default_recon_id_prefix(),
            minor_unit_digits: default_minor_unit_digits(),
            statement_date: None,
            entry_date: None,
            date_formats: default_date_formats(),
            edw: EdwConfig::default(),
            journal: JournalConfig::default(),
            search: SearchConfig::default(),
            parallel: ParallelConfig::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Column mapping
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct EdwConfig {
    #[serde(default)]
    pub columns: EdwColumns,
}

/// EDW header names. Defaults are the sheet headers of the source workbook.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct EdwColumns {
    pub id: String,
    pub account: String,
    pub code: String,
    pub date: String,
    pub amount: String,
    pub ref_code: String,
    pub description: String,
}

impl Default for EdwColumns {
    fn default() -> Self {
        Self {
            id: "Transaction ID".into(),
            account: "Account Number".into(),
            code: "Tran Code".into(),
            date: "Process Date".into(),
            amount: "Amount (INR)".into(),
            ref_code: "Ref Code".into(),
            description: "Description".into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct JournalConfig {
    #[serde(default)]
    pub columns: JournalColumns,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct JournalColumns {
    pub account: String,
    pub code: String,
    pub date: String,
    pub debit: String,
    pub description: String,
    pub gl_code: String,
}

impl Default for JournalColumns {
    fn default() -> Self {
        Self {
            account: "Account Number".into(),
            code: "Tran Code".into(),
            date: "Journal Date".into(),
            debit: "Debit Amount".into(),
            description: "Description".into(),
            gl_code: "GL Code".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Search bounds
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Candidate groups larger than this are not searched.
    pub max_group_size: usize,
    /// Largest cover (number of transactions) the matcher will return.
    pub max_cover_size: usize,
    /// Covers up to `min_size + cover_size_slack` are reported.
    pub cover_size_slack: usize,
    /// Cap on covers returned per entry.
    pub max_covers: usize,
    /// Cap on (prefix, sum) cells in the reachability table.
    pub max_dp_cells: u64,
    /// Cap on backtracking nodes while enumerating covers.
    pub max_nodes: u64,
    /// Admit positive EDW amounts as candidates. Off by default so every
    /// debit row carries the negative sign of its source record.
    pub allow_mixed_sign: bool,
    /// Wall-clock budget for the whole matching phase, in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline_ms: Option<u64>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_group_size: 64,
            max_cover_size: 32,
            cover_size_slack: 1,
            max_covers: 16,
            max_dp_cells: 2_000_000,
            max_nodes: 200_000,
            allow_mixed_sign: false,
            deadline_ms: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ParallelConfig {
    /// Worker threads for the matching phase; 0 = one per core.
    pub workers: usize,
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ReconConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: ReconConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ReconError> {
        toml::to_string_pretty(self).map_err(|e| ReconError::ConfigParse(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        if self.currency.trim().is_empty() {
            return Err(ReconError::ConfigValidation("currency must not be empty".into()));
        }
        if self.business_entity.trim().is_empty() {
            return Err(ReconError::ConfigValidation(
                "business_entity must not be empty".into(),
            ));
        }
        if self.minor_unit_digits > 6 {
            return Err(ReconError::ConfigValidation(format!(
                "minor_unit_digits must be 0..=6, got {}",
                self.minor_unit_digits
            )));
        }
        if self.date_formats.is_empty() {
            return Err(ReconError::ConfigValidation(
                "date_formats must list at least one format".into(),
            ));
        }

        let s = &self.search;
        if s.max_group_size == 0 {
            return Err(ReconError::ConfigValidation(
                "search.max_group_size must be at least 1".into(),
            ));
        }
        // Cardinalities are tracked in a u64 bitmask.
        if s.max_cover_size == 0 || s.max_cover_size > 63 {
            return Err(ReconError::ConfigValidation(format!(
                "search.max_cover_size must be 1..=63, got {}",
                s.max_cover_size
            )));
        }
        if s.max_covers == 0 {
            return Err(ReconError::ConfigValidation(
                "search.max_covers must be at least 1".into(),
            ));
        }
        if s.max_dp_cells == 0 || s.max_nodes == 0 {
            return Err(ReconError::ConfigValidation(
                "search.max_dp_cells and search.max_nodes must be positive".into(),
            ));
        }

        let edw = &self.edw.columns;
        let journal = &self.journal.columns;
        let mapped = [
            &edw.id, &edw.account, &edw.code, &edw.date, &edw.amount, &edw.ref_code,
            &edw.description, &journal.account, &journal.code, &journal.date,
            &journal.debit, &journal.description, &journal.gl_code,
        ];
        if mapped.iter().any(|c| c.trim().is_empty()) {
            return Err(ReconError::ConfigValidation(
                "column mappings must not be empty".into(),
            ));
        }

        Ok(())
    }

    /// Render a rule label for a transaction code.
    pub fn rule_label(&self, code: &str) -> String {
        format!("{} {}", self.rule_prefix, code)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
