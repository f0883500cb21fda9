//! Merge-diff of sorted output-hash sets.
//!
//! Given the output hashes already baked and the output hashes now required,
//! both ascending, [`compare`] walks them with two cursors and reports which
//! required hashes must be added and which baked hashes must be removed.

use probebake_common::Hash128;

/// Edits that turn the baked set into the required set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BakeDiff {
    /// Indices into the required (new) hashes that are not yet baked.
    pub add_indices: Vec<usize>,
    /// Indices into the baked (old) hashes that are no longer required.
    pub remove_indices: Vec<usize>,
}

impl BakeDiff {
    /// Total number of edits.
    pub fn op_count(&self) -> usize {
        self.add_indices.len() + self.remove_indices.len()
    }

    /// Returns `true` if the two sets were equal.
    pub fn is_empty(&self) -> bool {
        self.op_count() == 0
    }
}

/// Diffs two ascending hash sequences.
///
/// Both slices must be sorted ascending and should hold each value at most
/// once; unsorted input is a caller bug, checked only in debug builds. A hash
/// present in both is always left alone, even if a different entity produced
/// it, so byte-identical content is never rebaked.
///
/// When the lengths match, the two sequences are first folded with
/// [`Hash128::combine`]; equal summaries short-circuit to an empty diff.
pub fn compare(old: &[Hash128], new: &[Hash128]) -> BakeDiff {
    debug_assert!(is_ascending(old), "baked hashes must be sorted");
    debug_assert!(is_ascending(new), "required hashes must be sorted");

    if old.len() == new.len()
        && Hash128::combine(old.iter().copied()) == Hash128::combine(new.iter().copied())
    {
        return BakeDiff::default();
    }

    let mut diff = BakeDiff::default();
    let (mut i, mut j) = (0, 0);
    loop {
        match (old.get(i), new.get(j)) {
            (None, None) => break,
            (None, Some(_)) => {
                diff.add_indices.extend(j..new.len());
                break;
            }
            (Some(_), None) => {
                diff.remove_indices.extend(i..old.len());
                break;
            }
            (Some(o), Some(n)) => match n.cmp(o) {
                std::cmp::Ordering::Equal => {
                    i += 1;
                    j += 1;
                }
                std::cmp::Ordering::Less => {
                    diff.add_indices.push(j);
                    j += 1;
                }
                std::cmp::Ordering::Greater => {
                    diff.remove_indices.push(i);
                    i += 1;
                }
            },
        }
    }
    diff
}

fn is_ascending(hashes: &[Hash128]) -> bool {
    hashes.windows(2).all(|w| w[0] <= w[1])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn h(n: u128) -> Hash128 {
        Hash128::from_u128(n)
    }

    #[test]
    fn replaces_middle_element() {
        let old = [h(1), h(2), h(3)];
        let new = [h(1), h(3), h(4)];
        let diff = compare(&old, &new);
        assert_eq!(diff.remove_indices, vec![1]);
        assert_eq!(diff.add_indices, vec![2]);
        assert_eq!(diff.op_count(), 2);
    }

    #[test]
    fn identical_sets_are_empty() {
        let set = [h(1), h(2)];
        let diff = compare(&set, &set);
        assert!(diff.is_empty());
        assert_eq!(diff.op_count(), 0);
    }

    #[test]
    fn empty_old_adds_everything() {
        let diff = compare(&[], &[h(10), h(20)]);
        assert_eq!(diff.add_indices, vec![0, 1]);
        assert!(diff.remove_indices.is_empty());
    }

    #[test]
    fn empty_new_removes_everything() {
        let diff = compare(&[h(10), h(20)], &[]);
        assert!(diff.add_indices.is_empty());
        assert_eq!(diff.remove_indices, vec![0, 1]);
    }

    #[test]
    fn both_empty() {
        assert!(compare(&[], &[]).is_empty());
    }

    #[test]
    fn equal_length_disjoint_sets() {
        let diff = compare(&[h(1), h(3)], &[h(2), h(4)]);
        assert_eq!(diff.add_indices, vec![0, 1]);
        assert_eq!(diff.remove_indices, vec![0, 1]);
    }

    #[test]
    fn interleaved_runs() {
        let old = [h(5), h(6), h(7), h(20)];
        let new = [h(1), h(2), h(6), h(30), h(40)];
        let diff = compare(&old, &new);
        assert_eq!(diff.add_indices, vec![0, 1, 3, 4]);
        assert_eq!(diff.remove_indices, vec![0, 2, 3]);
    }

    #[test]
    fn matches_set_difference() {
        // Small LCG so every run checks the same sets.
        let mut seed: u64 = 0x9e37_79b9_7f4a_7c15;
        let mut next = move || {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            seed >> 33
        };

        for _ in 0..300 {
            let old: BTreeSet<u128> = (0..next() % 24).map(|_| u128::from(next() % 40)).collect();
            let new: BTreeSet<u128> = (0..next() % 24).map(|_| u128::from(next() % 40)).collect();
            let old_v: Vec<Hash128> = old.iter().map(|&n| h(n)).collect();
            let new_v: Vec<Hash128> = new.iter().map(|&n| h(n)).collect();

            let diff = compare(&old_v, &new_v);
            let removed: BTreeSet<u128> =
                diff.remove_indices.iter().map(|&i| old_v[i].as_u128()).collect();
            let added: BTreeSet<u128> =
                diff.add_indices.iter().map(|&j| new_v[j].as_u128()).collect();

            assert_eq!(removed, old.difference(&new).copied().collect());
            assert_eq!(added, new.difference(&old).copied().collect());
            assert_eq!(diff.op_count(), removed.len() + added.len());
        }
    }
}
