use std::path::PathBuf;

use ledgerpair_recon::config::ReconConfig;
use ledgerpair_recon::engine::{run, run_with_options, RunOptions};
use ledgerpair_recon::load::{load_input, RawTable};
use ledgerpair_recon::model::{
    MatchResult, OutputRow, ReconInput, ReconResult, RowStatus, Side, UnmatchedReason,
};

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn fixture_table(name: &str, file: &str) -> RawTable {
    let path = fixtures_dir().join(file);
    let data = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("cannot read {}: {e}", path.display()));
    RawTable::from_csv_str(name, &data).unwrap()
}

fn fixture_input(config: &ReconConfig) -> ReconInput {
    let edw = fixture_table("EDW", "edw.csv");
    let journal = fixture_table("Journal", "journal.csv");
    load_input(&edw, &journal, config).unwrap()
}

fn load_and_run(config_toml: &str) -> ReconResult {
    let config = ReconConfig::from_toml(config_toml).unwrap();
    let input = fixture_input(&config);
    run(&config, &input).unwrap()
}

fn chosen_ids(result: &MatchResult) -> Vec<&str> {
    match result {
        MatchResult::Matched { chosen, .. } => chosen.iter().map(|t| t.id.as_str()).collect(),
        MatchResult::Unmatched { .. } => Vec::new(),
    }
}

fn rows_for<'a>(result: &'a ReconResult, recon_id: &str) -> Vec<&'a OutputRow> {
    result.rows.iter().filter(|r| r.reconciliation == recon_id).collect()
}

// -------------------------------------------------------------------------
// Worked scenarios
// -------------------------------------------------------------------------

#[test]
fn split_settlement_matches_two_transactions() {
    let result = load_and_run("");
    assert!(result.results[0].is_matched());
    assert_eq!(chosen_ids(&result.results[0]), vec!["T1", "T2"]);

    let rows = rows_for(&result, "RC000001");
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].side, Side::Credit);
    assert_eq!(rows[0].amount_minor, 150_000);
    assert_eq!(rows[1].side, Side::Debit);
    assert_eq!(rows[1].amount_minor, -100_000);
    assert_eq!(rows[2].amount_minor, -50_000);
    assert!(rows.iter().all(|r| r.status == RowStatus::Matched));
}

#[test]
fn short_candidates_leave_entry_unmatched() {
    let result = load_and_run("");
    assert!(matches!(
        result.results[1],
        MatchResult::Unmatched {
            reason: UnmatchedReason::NoExactCover,
            candidates_considered: 2,
            ..
        }
    ));
    let rows = rows_for(&result, "RC000002");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].side, Side::Credit);
    assert_eq!(rows[0].amount_minor, 150_000);
    assert_eq!(rows[0].status, RowStatus::Unmatched);
}

#[test]
fn fewer_transactions_win_between_covers() {
    let result = load_and_run("");
    assert_eq!(chosen_ids(&result.results[2]), vec!["T9"]);
    let MatchResult::Matched { proof, .. } = &result.results[2] else {
        panic!("expected a match");
    };
    assert_eq!(proof.exact_covers, 2);
    assert!(!proof.ambiguous);
}

#[test]
fn other_accounts_are_never_candidates() {
    let result = load_and_run("");
    // T11 (account 401) would complete 1500 but is outside the key
    assert!(matches!(
        result.results[3],
        MatchResult::Unmatched {
            reason: UnmatchedReason::NoExactCover,
            candidates_considered: 1,
            ..
        }
    ));
    assert_eq!(chosen_ids(&result.results[4]), vec!["T10"]);
    assert!(matches!(
        result.results[5],
        MatchResult::Unmatched { reason: UnmatchedReason::NoCandidates, .. }
    ));
}

// -------------------------------------------------------------------------
// Output shape
// -------------------------------------------------------------------------

#[test]
fn rows_follow_ledger_order_and_are_numbered() {
    let result = load_and_run("");
    assert_eq!(result.rows.len(), 10);
    let numbers: Vec<u64> = result.rows.iter().map(|r| r.no).collect();
    assert_eq!(numbers, (1..=10).collect::<Vec<u64>>());

    let credits: Vec<&str> = result
        .rows
        .iter()
        .filter(|r| r.side == Side::Credit)
        .map(|r| r.reconciliation.as_str())
        .collect();
    assert_eq!(
        credits,
        vec!["RC000001", "RC000002", "RC000003", "RC000004", "RC000005", "RC000006"]
    );
}

#[test]
fn record_fields_use_config_labels() {
    let result = load_and_run(
        r#"
currency = "USD"
business_entity = "US_BU"
rule_prefix = "Auto"
recon_id_prefix = "BR"
statement_date = "2024-01-31"
"#,
    );
    let record = result.rows[1].to_record(2);
    assert_eq!(record[1], "EDW");
    assert_eq!(record[2], "BR000001");
    assert_eq!(record[3], "DR");
    assert_eq!(record[4], "2024-01-05");
    assert_eq!(record[5], "T1");
    assert_eq!(record[6], "-1000.00");
    assert_eq!(record[7], "USD");
    assert_eq!(record[8], "US_BU");
    assert_eq!(record[9], "2024-01-31");
    assert_eq!(record[10], "Auto 42");
    assert_eq!(record[16], "Matched");
}

#[test]
fn summary_totals() {
    let result = load_and_run("");
    let s = &result.summary;
    assert_eq!(s.total_entries, 6);
    assert_eq!(s.matched_count, 3);
    assert_eq!(s.unmatched_count, 3);
    assert_eq!(s.total_matched_amount, 400_000);
    assert_eq!(s.total_unmatched_amount, 310_000);
    assert_eq!(s.transactions_total, 9);
    assert_eq!(s.transactions_consumed, 4);
    assert_eq!(s.reason_counts["no_exact_cover"], 2);
    assert_eq!(s.reason_counts["no_candidates"], 1);
}

// -------------------------------------------------------------------------
// Determinism
// -------------------------------------------------------------------------

#[test]
fn worker_count_does_not_change_output() {
    let config = ReconConfig::default();
    let input = fixture_input(&config);
    let one = run_with_options(&config, &input, &RunOptions { workers: Some(1), ..Default::default() }).unwrap();
    let four = run_with_options(&config, &input, &RunOptions { workers: Some(4), ..Default::default() }).unwrap();
    assert_eq!(one.rows, four.rows);
    assert_eq!(one.results, four.results);
    assert_eq!(one.summary, four.summary);
}

#[test]
fn result_json_is_stable() {
    let config = ReconConfig::default();
    let input = fixture_input(&config);
    let mut first = run(&config, &input).unwrap();
    let mut second = run(&config, &input).unwrap();
    first.meta.workers = 0;
    second.meta.workers = 0;
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}
