// Property-based tests for the matching invariants.
// CI: 256 cases (default). Soak: PROPTEST_CASES=10000 cargo test --release

use std::collections::HashSet;

use chrono::NaiveDate;
use proptest::prelude::*;
use ledgerpair_recon::config::ReconConfig;
use ledgerpair_recon::engine::{consumption_is_exclusive, run_with_options, RunOptions};
use ledgerpair_recon::model::{
    LedgerEntry, MatchResult, RawTransaction, ReconInput, ReconResult, Side,
};

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

fn config_256() -> ProptestConfig {
    ProptestConfig {
        cases: std::env::var("PROPTEST_CASES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(256),
        failure_persistence: None,
        ..ProptestConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Generators
// ---------------------------------------------------------------------------

/// Four keys: two accounts by two dates, one code.
fn key(idx: usize) -> (String, String, NaiveDate) {
    let account = if idx % 2 == 0 { "100" } else { "200" };
    let day = if idx < 2 { 5 } else { 6 };
    (
        account.to_string(),
        "42".to_string(),
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
    )
}

/// Mostly negative withdrawals, occasionally a positive reversal.
fn arb_amount() -> impl Strategy<Value = i64> {
    prop_oneof![
        7 => (1i64..=500).prop_map(|a| -a),
        1 => 1i64..=500,
    ]
}

fn arb_input() -> impl Strategy<Value = ReconInput> {
    let txns = proptest::collection::vec((0usize..4, arb_amount()), 0..30);
    let entries = proptest::collection::vec((0usize..4, 1i64..=1200), 0..12);
    (txns, entries).prop_map(|(txns, entries)| {
        let transactions = txns
            .into_iter()
            .enumerate()
            .map(|(i, (k, amount))| {
                let (account, code, date) = key(k);
                RawTransaction {
                    row: i,
                    id: format!("T{i:03}"),
                    account,
                    code,
                    date,
                    amount_minor: amount,
                    ref_code: String::new(),
                    description: String::new(),
                }
            })
            .collect();
        let entries = entries
            .into_iter()
            .enumerate()
            .map(|(i, (k, debit))| {
                let (account, code, date) = key(k);
                LedgerEntry {
                    row: i,
                    account,
                    code,
                    date,
                    debit_minor: debit,
                    description: String::new(),
                    gl_code: String::new(),
                }
            })
            .collect();
        ReconInput {
            transactions,
            entries,
        }
    })
}

fn run_workers(input: &ReconInput, workers: usize) -> ReconResult {
    let options = RunOptions {
        workers: Some(workers),
        ..RunOptions::default()
    };
    run_with_options(&ReconConfig::default(), input, &options).unwrap()
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(config_256())]

    #[test]
    fn matched_entries_balance(input in arb_input()) {
        let result = run_workers(&input, 2);
        for r in &result.results {
            if let MatchResult::Matched { entry, chosen, .. } = r {
                let total: i64 = chosen.iter().map(|t| t.amount_minor.abs()).sum();
                prop_assert_eq!(total, entry.debit_minor, "row {} does not balance", entry.row);
                prop_assert!(chosen.iter().all(|t| t.amount_minor < 0));
                prop_assert!(chosen.iter().all(|t| t.key() == entry.key()));
            }
        }
        for row in &result.rows {
            match row.side {
                Side::Credit => prop_assert!(row.amount_minor > 0),
                Side::Debit => prop_assert!(row.amount_minor < 0),
            }
        }
    }

    #[test]
    fn transactions_used_at_most_once(input in arb_input()) {
        let result = run_workers(&input, 2);
        prop_assert!(consumption_is_exclusive(&result.results));

        let mut seen = HashSet::new();
        for row in result.rows.iter().filter(|r| r.side == Side::Debit) {
            prop_assert!(seen.insert(row.ref1.clone()), "{} emitted twice", row.ref1);
        }
        prop_assert_eq!(seen.len(), result.summary.transactions_consumed);
    }

    #[test]
    fn every_entry_gets_one_credit_row(input in arb_input()) {
        let result = run_workers(&input, 2);
        prop_assert_eq!(result.results.len(), input.entries.len());
        prop_assert_eq!(
            result.summary.matched_count + result.summary.unmatched_count,
            input.entries.len()
        );
        let credits = result.rows.iter().filter(|r| r.side == Side::Credit).count();
        prop_assert_eq!(credits, input.entries.len());
        for (r, entry) in result.results.iter().zip(&input.entries) {
            prop_assert_eq!(r.entry(), entry);
        }
    }

    #[test]
    fn output_independent_of_workers(input in arb_input()) {
        let one = run_workers(&input, 1);
        let three = run_workers(&input, 3);
        prop_assert_eq!(&one.rows, &three.rows);
        prop_assert_eq!(&one.results, &three.results);
        prop_assert_eq!(&one.summary, &three.summary);
    }
}
