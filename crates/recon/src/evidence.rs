use std::collections::{BTreeMap, HashSet};

use crate::model::{MatchResult, ReconSummary};

/// Compute summary statistics from per-entry results.
pub fn compute_summary(results: &[MatchResult], transactions_total: usize) -> ReconSummary {
    let mut reason_counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut consumed: HashSet<&str> = HashSet::new();
    let mut summary = ReconSummary {
        total_entries: results.len(),
        transactions_total,
        ..ReconSummary::default()
    };

    for r in results {
        match r {
            MatchResult::Matched { entry, chosen, proof } => {
                summary.matched_count += 1;
                summary.total_matched_amount += i128::from(entry.debit_minor);
                if proof.ambiguous {
                    summary.ambiguous += 1;
                }
                consumed.extend(chosen.iter().map(|t| t.id.as_str()));
            }
            MatchResult::Unmatched { entry, reason, .. } => {
                summary.unmatched_count += 1;
                summary.total_unmatched_amount += i128::from(entry.debit_minor);
                *reason_counts.entry(reason.to_string()).or_insert(0) += 1;
            }
        }
    }

    summary.transactions_consumed = consumed.len();
    summary.reason_counts = reason_counts;
    summary
}
