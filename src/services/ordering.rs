//! Per-attempt question ordering. A random-order exam is shuffled once,
//! on the first view of an attempt; the permutation is persisted on the
//! attempt row and replayed verbatim on every later view.

use rand::seq::SliceRandom;

pub(crate) fn shuffle_ids(ids: &[i64]) -> Vec<i64> {
    let mut shuffled = ids.to_vec();
    shuffled.shuffle(&mut rand::thread_rng());
    shuffled
}

pub(crate) fn encode_order(ids: &[i64]) -> String {
    ids.iter().map(|id| id.to_string()).collect::<Vec<_>>().join(",")
}

pub(crate) fn decode_order(raw: &str) -> Vec<i64> {
    raw.split(',').filter_map(|item| item.trim().parse::<i64>().ok()).collect()
}

/// Reorders `items` (keyed by `key`) to match a persisted permutation.
/// Ids missing from the permutation keep their relative order at the end;
/// ids with no matching item are skipped.
pub(crate) fn apply_order<T, F>(order: &[i64], mut items: Vec<T>, key: F) -> Vec<T>
where
    F: Fn(&T) -> i64,
{
    let mut reordered = Vec::with_capacity(items.len());
    for id in order {
        if let Some(index) = items.iter().position(|item| key(item) == *id) {
            reordered.push(items.remove(index));
        }
    }
    reordered.extend(items);
    reordered
}
