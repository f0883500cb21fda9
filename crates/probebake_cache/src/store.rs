//! Sorted record of baked probe outputs.
//!
//! The store is the authoritative answer to "which outputs are already baked".
//! Records are kept ordered by output hash at all times so the reconciler can
//! walk them alongside a freshly sorted list of required outputs.

use probebake_common::{EntityId, Hash128};
use serde::{Deserialize, Serialize};

/// One successfully baked output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BakedRecord {
    /// Entity that owns the baked texture.
    pub id: EntityId,
    /// Hash of the entity's own settings at bake time.
    pub state_hash: Hash128,
    /// Content address of the baked texture.
    pub output_hash: Hash128,
}

/// Baked records ordered ascending by output hash.
///
/// Invariant: `records[i].output_hash <= records[i + 1].output_hash` for every `i`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BakedStateStore {
    records: Vec<BakedRecord>,
}

impl BakedStateStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a store from persisted records.
    ///
    /// Records handed back out of order are re-sorted rather than rejected.
    /// Only the first record for each output hash is kept, since one texture
    /// file backs every record with that hash.
    pub fn from_records(mut records: Vec<BakedRecord>) -> Self {
        if !is_sorted(&records) {
            tracing::warn!(
                count = records.len(),
                "persisted bake records were out of order, re-sorting"
            );
            records.sort_by_key(|r| r.output_hash);
        }
        let before = records.len();
        records.dedup_by_key(|r| r.output_hash);
        if records.len() != before {
            tracing::warn!(
                dropped = before - records.len(),
                "persisted bake records repeated an output hash, keeping the first"
            );
        }
        Self { records }
    }

    /// Inserts a record at its sorted position and returns that position.
    ///
    /// Records with an equal output hash keep their insertion order.
    pub fn insert(&mut self, id: EntityId, state_hash: Hash128, output_hash: Hash128) -> usize {
        let pos = self
            .records
            .partition_point(|r| r.output_hash <= output_hash);
        self.records.insert(
            pos,
            BakedRecord {
                id,
                state_hash,
                output_hash,
            },
        );
        pos
    }

    /// Removes the records at the given indices and returns them in ascending index order.
    ///
    /// Indices are processed from highest to lowest so earlier removals do not
    /// shift later ones. Duplicate indices are removed once; out-of-range indices
    /// are a caller bug and are skipped.
    pub fn remove_at(&mut self, indices: &[usize]) -> Vec<BakedRecord> {
        let mut order = indices.to_vec();
        order.sort_unstable_by(|a, b| b.cmp(a));
        order.dedup();

        let mut removed = Vec::with_capacity(order.len());
        for index in order {
            debug_assert!(index < self.records.len(), "remove index {index} out of range");
            if index < self.records.len() {
                removed.push(self.records.remove(index));
            }
        }
        removed.reverse();
        removed
    }

    /// Folds every stored output hash, in store order, into one summary value.
    pub fn combined_hash(&self) -> Hash128 {
        Hash128::combine(self.records.iter().map(|r| r.output_hash))
    }

    /// Returns the stored output hashes in ascending order.
    pub fn output_hashes(&self) -> Vec<Hash128> {
        self.records.iter().map(|r| r.output_hash).collect()
    }

    /// Returns all records in ascending output-hash order.
    pub fn records(&self) -> &[BakedRecord] {
        &self.records
    }

    /// Returns the record at `index`.
    pub fn get(&self, index: usize) -> Option<&BakedRecord> {
        self.records.get(index)
    }

    /// Moves the record at `index` to a new owning entity.
    ///
    /// The output hash is unchanged, so the ordering is preserved. Returns
    /// `false` if `index` is out of range.
    pub fn set_id(&mut self, index: usize, id: EntityId) -> bool {
        match self.records.get_mut(index) {
            Some(record) => {
                record.id = id;
                true
            }
            None => false,
        }
    }

    /// Returns the index of a record with the given output hash.
    pub fn find_by_output(&self, output_hash: Hash128) -> Option<usize> {
        self.records
            .binary_search_by_key(&output_hash, |r| r.output_hash)
            .ok()
    }

    /// Returns the first record owned by `id`.
    pub fn find_by_id(&self, id: EntityId) -> Option<&BakedRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Returns the number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if nothing is baked.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Consumes the store and returns its records.
    pub fn into_records(self) -> Vec<BakedRecord> {
        self.records
    }
}

fn is_sorted(records: &[BakedRecord]) -> bool {
    records
        .windows(2)
        .all(|w| w[0].output_hash <= w[1].output_hash)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn h(n: u128) -> Hash128 {
        Hash128::from_u128(n)
    }

    fn assert_sorted(store: &BakedStateStore) {
        assert!(is_sorted(store.records()), "store lost its ordering");
    }

    #[test]
    fn insert_keeps_order() {
        let mut store = BakedStateStore::new();
        store.insert(EntityId(1), h(100), h(30));
        store.insert(EntityId(2), h(200), h(10));
        store.insert(EntityId(3), h(300), h(20));
        assert_eq!(store.output_hashes(), vec![h(10), h(20), h(30)]);
        assert_sorted(&store);
    }

    #[test]
    fn insert_returns_position() {
        let mut store = BakedStateStore::new();
        assert_eq!(store.insert(EntityId(1), h(0), h(5)), 0);
        assert_eq!(store.insert(EntityId(2), h(0), h(1)), 0);
        assert_eq!(store.insert(EntityId(3), h(0), h(9)), 2);
    }

    #[test]
    fn equal_hashes_keep_insertion_order() {
        let mut store = BakedStateStore::new();
        store.insert(EntityId(1), h(0), h(5));
        store.insert(EntityId(2), h(0), h(5));
        assert_eq!(store.records()[0].id, EntityId(1));
        assert_eq!(store.records()[1].id, EntityId(2));
    }

    #[test]
    fn remove_at_handles_any_index_order() {
        let mut store = BakedStateStore::new();
        for n in 0..5u64 {
            store.insert(EntityId(n), h(0), h(u128::from(n)));
        }
        let removed = store.remove_at(&[1, 3, 1]);
        assert_eq!(removed.len(), 2);
        assert_eq!(removed[0].output_hash, h(1));
        assert_eq!(removed[1].output_hash, h(3));
        assert_eq!(store.output_hashes(), vec![h(0), h(2), h(4)]);
    }

    #[test]
    fn remove_nothing() {
        let mut store = BakedStateStore::new();
        store.insert(EntityId(1), h(0), h(1));
        assert!(store.remove_at(&[]).is_empty());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn combined_hash_tracks_content() {
        let mut store = BakedStateStore::new();
        assert_eq!(store.combined_hash(), Hash128::EMPTY);
        store.insert(EntityId(1), h(0), h(1));
        let one = store.combined_hash();
        store.insert(EntityId(2), h(0), h(2));
        assert_ne!(store.combined_hash(), one);
        assert_eq!(store.combined_hash(), Hash128::combine([h(1), h(2)]));
    }

    #[test]
    fn find_by_output_and_id() {
        let mut store = BakedStateStore::new();
        store.insert(EntityId(7), h(70), h(3));
        store.insert(EntityId(8), h(80), h(1));
        assert_eq!(store.find_by_output(h(3)), Some(1));
        assert_eq!(store.find_by_output(h(2)), None);
        assert_eq!(store.find_by_id(EntityId(8)).unwrap().state_hash, h(80));
        assert!(store.find_by_id(EntityId(9)).is_none());
    }

    #[test]
    fn from_records_resorts() {
        let records = vec![
            BakedRecord {
                id: EntityId(1),
                state_hash: h(0),
                output_hash: h(9),
            },
            BakedRecord {
                id: EntityId(2),
                state_hash: h(0),
                output_hash: h(4),
            },
        ];
        let store = BakedStateStore::from_records(records);
        assert_eq!(store.output_hashes(), vec![h(4), h(9)]);
    }

    #[test]
    fn from_records_keeps_first_record_per_output() {
        let record = |id: u64, output: u128| BakedRecord {
            id: EntityId(id),
            state_hash: h(0),
            output_hash: h(output),
        };
        let store =
            BakedStateStore::from_records(vec![record(3, 7), record(1, 2), record(5, 7), record(4, 2)]);
        assert_eq!(store.output_hashes(), vec![h(2), h(7)]);
        assert_eq!(store.records()[0].id, EntityId(1));
        assert_eq!(store.records()[1].id, EntityId(3));
    }

    #[test]
    fn set_id_moves_ownership() {
        let mut store = BakedStateStore::new();
        store.insert(EntityId(4), h(40), h(5));
        assert!(store.set_id(0, EntityId(2)));
        assert_eq!(store.records()[0].id, EntityId(2));
        assert_eq!(store.records()[0].output_hash, h(5));
        assert!(!store.set_id(1, EntityId(9)));
    }

    #[test]
    fn ordering_survives_mixed_operations() {
        // Small LCG so the sequence is reproducible without extra dependencies.
        let mut seed: u64 = 0x2545_f491_4f6c_dd1d;
        let mut next = move || {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            seed >> 33
        };

        let mut store = BakedStateStore::new();
        for round in 0..200u64 {
            if next() % 3 == 0 && !store.is_empty() {
                let len = store.len() as u64;
                let picks: Vec<usize> = (0..(next() % 4)).map(|_| (next() % len) as usize).collect();
                store.remove_at(&picks);
            } else {
                store.insert(EntityId(round), h(0), h(u128::from(next() % 64)));
            }
            assert_sorted(&store);
        }
    }
}
