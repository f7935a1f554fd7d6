use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

use rayon::prelude::*;

use crate::config::ReconConfig;
use crate::emitter::RowEmitter;
use crate::error::ReconError;
use crate::evidence::compute_summary;
use crate::grouper::{available_candidates, partition_entries, KeyIndex};
use crate::model::{
    BudgetLimit, GroupKey, LedgerEntry, MatchProof, MatchResult, RawTransaction, ReconInput,
    ReconMeta, ReconResult, UnmatchedReason,
};
use crate::subset_sum::{find_exact_covers, SearchLimits};
use crate::tiebreak::resolve;

/// Per-call overrides on top of the config.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Absolute deadline for the matching phase. Wins over `search.deadline_ms`.
    pub deadline: Option<Instant>,
    /// Worker count. Wins over `parallel.workers`.
    pub workers: Option<usize>,
}

/// Run reconciliation with the config's own deadline and worker settings.
pub fn run(config: &ReconConfig, input: &ReconInput) -> Result<ReconResult, ReconError> {
    run_with_options(config, input, &RunOptions::default())
}

/// Run reconciliation. Returns every entry's result, the output rows and a summary.
///
/// Entries sharing a (account, code, date) key are matched one after another
/// in ledger order; distinct keys run in parallel. Results are put back in
/// ledger order before rows are numbered, so the output does not depend on
/// scheduling.
pub fn run_with_options(
    config: &ReconConfig,
    input: &ReconInput,
    options: &RunOptions,
) -> Result<ReconResult, ReconError> {
    validate_input(input)?;

    let deadline = options.deadline.or_else(|| {
        config
            .search
            .deadline_ms
            .map(|ms| Instant::now() + Duration::from_millis(ms))
    });
    let limits = SearchLimits::from_config(&config.search, deadline);
    let index = KeyIndex::build(&input.transactions);
    let partitions = partition_entries(&input.entries);

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(options.workers.unwrap_or(config.parallel.workers))
        .build()
        .map_err(|e| ReconError::Pool(e.to_string()))?;
    let workers = pool.current_num_threads();

    log::info!(
        "reconciling {} journal entries against {} EDW transactions ({} keys, {} partitions, {} workers)",
        input.entries.len(),
        input.transactions.len(),
        index.bucket_count(),
        partitions.len(),
        workers
    );

    let per_partition: Vec<Vec<(usize, MatchResult)>> = pool.install(|| {
        partitions
            .par_iter()
            .map(|(key, positions)| match_partition(key, positions, &input.entries, &index, config, &limits))
            .collect()
    });

    let mut ordered: Vec<(usize, MatchResult)> = per_partition.into_iter().flatten().collect();
    ordered.sort_by_key(|(pos, _)| *pos);
    let results: Vec<MatchResult> = ordered.into_iter().map(|(_, r)| r).collect();
    debug_assert!(consumption_is_exclusive(&results));

    let rows = RowEmitter::new(config).emit_all(&results);
    let summary = compute_summary(&results, input.transactions.len());

    log::info!(
        "reconciliation finished: {} matched, {} unmatched, {} output rows",
        summary.matched_count,
        summary.unmatched_count,
        rows.len()
    );

    Ok(ReconResult {
        meta: ReconMeta {
            config_name: config.name.clone(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            currency: config.currency.clone(),
            minor_unit_digits: config.minor_unit_digits,
            workers,
        },
        summary,
        results,
        rows,
    })
}

/// Typed input built outside `load` still has to be structurally sound.
fn validate_input(input: &ReconInput) -> Result<(), ReconError> {
    let mut seen: HashMap<&str, usize> = HashMap::new();
    for txn in &input.transactions {
        if let Some(&first_row) = seen.get(txn.id.as_str()) {
            return Err(ReconError::DuplicateTransactionId {
                table: "EDW".into(),
                row: txn.row,
                first_row,
                id: txn.id.clone(),
            });
        }
        seen.insert(&txn.id, txn.row);
    }
    for entry in &input.entries {
        if entry.debit_minor <= 0 {
            return Err(ReconError::NonPositiveDebit {
                table: "Journal".into(),
                row: entry.row,
                value: entry.debit_minor.to_string(),
            });
        }
    }
    Ok(())
}

/// Match one key's entries in ledger order, committing each match before the
/// next entry looks at the bucket.
fn match_partition(
    key: &GroupKey,
    positions: &[usize],
    entries: &[LedgerEntry],
    index: &KeyIndex<'_>,
    config: &ReconConfig,
    limits: &SearchLimits,
) -> Vec<(usize, MatchResult)> {
    let bucket = index.bucket(key);
    let mut consumed: HashSet<usize> = HashSet::new();
    let mut out = Vec::with_capacity(positions.len());

    for &pos in positions {
        let proposal = propose(&entries[pos], key, bucket, index.transactions(), &consumed, config, limits);
        consumed.extend(proposal.consumes);
        out.push((pos, proposal.result));
    }

    out
}

/// A result plus the transaction positions it would consume. The driver
/// decides whether to commit; the search never touches consumption state.
struct Proposal {
    result: MatchResult,
    consumes: Vec<usize>,
}

impl Proposal {
    fn unmatched(entry: &LedgerEntry, candidates_considered: usize, reason: UnmatchedReason) -> Self {
        Self {
            result: MatchResult::Unmatched {
                entry: entry.clone(),
                candidates_considered,
                reason,
            },
            consumes: Vec::new(),
        }
    }
}

fn propose(
    entry: &LedgerEntry,
    key: &GroupKey,
    bucket: &[usize],
    transactions: &[RawTransaction],
    consumed: &HashSet<usize>,
    config: &ReconConfig,
    limits: &SearchLimits,
) -> Proposal {
    let mut candidates = available_candidates(bucket, transactions, consumed, config.search.allow_mixed_sign);
    if candidates.is_empty() {
        log::debug!("journal data row {}: no candidates for {key}", entry.row);
        return Proposal::unmatched(entry, 0, UnmatchedReason::NoCandidates);
    }
    candidates.sort_by(|&a, &b| transactions[a].id.cmp(&transactions[b].id));

    if candidates.len() > config.search.max_group_size {
        log::warn!(
            "journal data row {}: {} candidates for {key} exceed max_group_size={}, not searched",
            entry.row,
            candidates.len(),
            config.search.max_group_size
        );
        return Proposal::unmatched(
            entry,
            candidates.len(),
            UnmatchedReason::SearchBudgetExceeded(BudgetLimit::GroupTooLarge),
        );
    }

    let magnitudes: Vec<i64> = candidates.iter().map(|&p| transactions[p].magnitude()).collect();
    let search = find_exact_covers(&magnitudes, entry.debit_minor, limits);

    if let Some(limit) = search.aborted {
        log::warn!(
            "journal data row {}: search over {} candidates for {key} stopped ({limit})",
            entry.row,
            candidates.len()
        );
        return Proposal::unmatched(
            entry,
            candidates.len(),
            UnmatchedReason::SearchBudgetExceeded(limit),
        );
    }

    let ids: Vec<&str> = candidates.iter().map(|&p| transactions[p].id.as_str()).collect();
    let Some(resolution) = resolve(&search.covers, &ids, search.cap_hit) else {
        log::debug!(
            "journal data row {}: no exact cover of {} among {} candidates",
            entry.row,
            entry.debit_minor,
            candidates.len()
        );
        return Proposal::unmatched(entry, candidates.len(), UnmatchedReason::NoExactCover);
    };

    let consumes: Vec<usize> = resolution.chosen.iter().map(|&i| candidates[i]).collect();
    let chosen: Vec<RawTransaction> = consumes.iter().map(|&p| transactions[p].clone()).collect();

    if search.covers.len() > 1 {
        let chosen_ids: Vec<&str> = chosen.iter().map(|t| t.id.as_str()).collect();
        log::warn!(
            "journal data row {}: {} exact covers for {key}, chose [{}] by {}",
            entry.row,
            search.covers.len(),
            chosen_ids.join(", "),
            resolution.tie_break_reason.as_deref().unwrap_or("fewest_transactions")
        );
    } else {
        log::debug!("journal data row {}: matched {} transaction(s)", entry.row, chosen.len());
    }

    Proposal {
        result: MatchResult::Matched {
            entry: entry.clone(),
            chosen,
            proof: MatchProof {
                group: key.to_string(),
                candidates: candidates.len(),
                exact_covers: search.covers.len(),
                dp_cells: search.dp_cells,
                nodes_visited: search.nodes_visited,
                cap_hit: search.cap_hit,
                ambiguous: resolution.ambiguous,
                ambiguity_reason: resolution.ambiguity_reason,
                tie_break_reason: resolution.tie_break_reason,
            },
        },
        consumes,
    }
}

/// No transaction id appears in two matched results.
pub fn consumption_is_exclusive(results: &[MatchResult]) -> bool {
    let mut seen: HashSet<&str> = HashSet::new();
    results.iter().all(|r| match r {
        MatchResult::Matched { chosen, .. } => chosen.iter().all(|t| seen.insert(t.id.as_str())),
        MatchResult::Unmatched { .. } => true,
    })
}
