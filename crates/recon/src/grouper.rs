use std::collections::{BTreeMap, HashSet};

use crate::model::{GroupKey, LedgerEntry, RawTransaction};

/// Transactions bucketed by (account, code, process date), built once per run.
///
/// Buckets hold positions into the transaction slice, in input order.
#[derive(Debug)]
pub struct KeyIndex<'a> {
    transactions: &'a [RawTransaction],
    buckets: BTreeMap<GroupKey, Vec<usize>>,
}

impl<'a> KeyIndex<'a> {
    pub fn build(transactions: &'a [RawTransaction]) -> Self {
        let mut buckets: BTreeMap<GroupKey, Vec<usize>> = BTreeMap::new();
        for (pos, txn) in transactions.iter().enumerate() {
            buckets.entry(txn.key()).or_default().push(pos);
        }
        Self {
            transactions,
            buckets,
        }
    }

    pub fn transactions(&self) -> &'a [RawTransaction] {
        self.transactions
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Positions of every transaction sharing `key`. Empty when none do.
    pub fn bucket(&self, key: &GroupKey) -> &[usize] {
        self.buckets.get(key).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// The full candidate group for an entry: same account, same code,
    /// process date equal to the journal date. Pure lookup.
    pub fn candidate_group(&self, entry: &LedgerEntry) -> Vec<&'a RawTransaction> {
        self.bucket(&entry.key())
            .iter()
            .map(|&pos| &self.transactions[pos])
            .collect()
    }
}

/// Whether a transaction may take part in a cover at all.
///
/// Zero amounts never can. Positive amounts only when mixed signs are allowed.
pub fn is_eligible(txn: &RawTransaction, allow_mixed_sign: bool) -> bool {
    if txn.amount_minor == 0 {
        return false;
    }
    allow_mixed_sign || txn.amount_minor < 0
}

/// Eligible, not-yet-consumed positions from one bucket.
pub fn available_candidates(
    bucket: &[usize],
    transactions: &[RawTransaction],
    consumed: &HashSet<usize>,
    allow_mixed_sign: bool,
) -> Vec<usize> {
    bucket
        .iter()
        .copied()
        .filter(|pos| !consumed.contains(pos))
        .filter(|&pos| is_eligible(&transactions[pos], allow_mixed_sign))
        .collect()
}

/// Ledger entries grouped by key, each partition in ledger order. Entries in
/// different partitions can never compete for the same transaction.
pub fn partition_entries(entries: &[LedgerEntry]) -> Vec<(GroupKey, Vec<usize>)> {
    let mut parts: BTreeMap<GroupKey, Vec<usize>> = BTreeMap::new();
    for (pos, entry) in entries.iter().enumerate() {
        parts.entry(entry.key()).or_default().push(pos);
    }
    parts.into_iter().collect()
}
