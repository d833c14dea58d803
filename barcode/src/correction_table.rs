//!
//! Lookup table from every sequence within one edit of a whitelist barcode to
//! that barcode.
//!
use crate::whitelist::Whitelist;
use fastq_set::sseq::{HammingIterOpt, InsertionIterOpt, SSeq, SSeqChars};
use fxhash::FxHashMap;
use itertools::chain;
use log::info;
use std::collections::hash_map::Entry;

const SSEQ_CHARS: &[u8] = b"ACGTN";

/// Capacity of an [`SSeq`].
pub(crate) const SSEQ_CAPACITY: usize = 23;

/// `seq` as an [`SSeq`], or `None` if it does not fit or is not made of `ACGTN`.
fn to_sseq(seq: &[u8]) -> Option<SSeq> {
    if seq.len() > SSEQ_CAPACITY || !seq.iter().all(|b| SSEQ_CHARS.contains(b)) {
        return None;
    }
    Some(SSeq::from_bytes_unchecked(seq))
}

/// Maps a whitelist barcode, or any sequence one substitution, insertion or
/// deletion away from one, to the position of that barcode in the whitelist.
/// Substitutions and insertions include `N`.
///
/// Sequences that are one edit away from two different barcodes are ambiguous
/// and left out. Whitelist barcodes always map to themselves, even when they
/// are also a neighbour of another barcode.
#[derive(Debug, Clone)]
pub struct CorrectionTable {
    table: FxHashMap<SSeq, u32>,
    ambiguous: usize,
}

impl CorrectionTable {
    pub fn build(whitelist: &Whitelist) -> Self {
        let substitution = HammingIterOpt::Custom {
            skip_chars: SSeqChars::none(),
            mutation_chars: SSeqChars::actgn(),
        };
        let barcodes: Vec<SSeq> = whitelist.iter().map(SSeq::from_bytes).collect();

        // None marks a neighbour shared by two barcodes
        let mut neighbours: FxHashMap<SSeq, Option<u32>> = FxHashMap::default();
        for (idx, barcode) in barcodes.iter().enumerate() {
            let idx = idx as u32;
            let variants = chain!(
                barcode.one_hamming_iter(substitution),
                barcode.one_deletion_iter(),
                barcode.one_insertion_iter(InsertionIterOpt::IncludeNBase),
            );
            for variant in variants {
                match neighbours.entry(variant) {
                    Entry::Vacant(e) => {
                        e.insert(Some(idx));
                    }
                    Entry::Occupied(mut e) => {
                        if *e.get() != Some(idx) {
                            e.insert(None);
                        }
                    }
                }
            }
        }
        for (idx, barcode) in barcodes.into_iter().enumerate() {
            neighbours.insert(barcode, Some(idx as u32));
        }

        let total = neighbours.len();
        let table: FxHashMap<SSeq, u32> = neighbours
            .into_iter()
            .filter_map(|(seq, idx)| idx.map(|idx| (seq, idx)))
            .collect();
        let ambiguous = total - table.len();
        info!(
            "correction table for {} barcodes: {} entries, {} ambiguous neighbours dropped",
            whitelist.len(),
            table.len(),
            ambiguous
        );
        CorrectionTable { table, ambiguous }
    }

    /// Whitelist position of the barcode `observed` corrects to, if any.
    pub fn get(&self, observed: &[u8]) -> Option<u32> {
        self.table.get(&to_sseq(observed)?).copied()
    }

    pub fn contains(&self, observed: &[u8]) -> bool {
        self.get(observed).is_some()
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Number of one-edit neighbours dropped because they are shared.
    pub fn ambiguous(&self) -> usize {
        self.ambiguous
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bio::alignment::distance::simd::hamming;
    use proptest::collection::hash_set;
    use proptest::{prop_assert, prop_assert_eq, proptest};

    #[test]
    fn test_unambiguous_neighbours() {
        let wl = Whitelist::new(["ACGT", "ACTT"]).unwrap();
        let table = CorrectionTable::build(&wl);
        assert_eq!(table.get(b"CCTT"), Some(1));
        assert_eq!(table.get(b"ACGTA"), Some(0));
        assert_eq!(table.get(b"AGT"), Some(0));
        assert_eq!(table.get(b"ACGN"), Some(0));
        // one substitution from both barcodes
        assert!(!table.contains(b"ACAT"));
        assert!(table.ambiguous() > 0);
    }

    #[test]
    fn test_shared_neighbour_is_dropped() {
        let wl = Whitelist::new(["AAAA", "CCAA"]).unwrap();
        let table = CorrectionTable::build(&wl);
        assert_eq!(table.get(b"CAAA"), None);
        assert_eq!(table.get(b"AAAA"), Some(0));
        assert_eq!(table.get(b"CCAA"), Some(1));
    }

    #[test]
    fn test_exact_wins_over_neighbour() {
        // each barcode is one substitution away from the other
        let wl = Whitelist::new(["AAAA", "AAAC"]).unwrap();
        let table = CorrectionTable::build(&wl);
        assert_eq!(table.get(b"AAAA"), Some(0));
        assert_eq!(table.get(b"AAAC"), Some(1));
        assert_eq!(table.get(b"AAAG"), None);
    }

    #[test]
    fn test_neighbourhood_size() {
        let wl = Whitelist::new(["ACGT"]).unwrap();
        let table = CorrectionTable::build(&wl);
        // 4 * 4 substitutions, 4 deletions and 5 * 5 insertions, 4 of which
        // repeat a neighbouring base and are duplicates
        assert_eq!(table.len(), 1 + 16 + 4 + 21);
        assert_eq!(table.ambiguous(), 0);
    }

    #[test]
    fn test_unrepresentable_lookup() {
        let wl = Whitelist::new(["ACGT"]).unwrap();
        let table = CorrectionTable::build(&wl);
        assert_eq!(table.get(b"AC-T"), None);
        assert_eq!(table.get(b"acgt"), None);
        assert_eq!(table.get(&[b'A'; SSEQ_CAPACITY + 1]), None);
    }

    proptest! {
        #[test]
        fn prop_test_table_entries_are_one_edit_away(
            barcodes in hash_set("[ACGT]{8}", 1..12usize),
        ) {
            let wl = Whitelist::new(&barcodes).unwrap();
            let table = CorrectionTable::build(&wl);
            for bc in wl.iter() {
                prop_assert_eq!(table.get(bc), wl.index_of(bc));
            }
            for (seq, &idx) in &table.table {
                let (seq, target) = (seq.as_bytes(), wl.get(idx));
                if seq.len() == target.len() {
                    prop_assert!(hamming(seq, target) <= 1);
                } else {
                    prop_assert_eq!(seq.len().abs_diff(target.len()), 1);
                }
            }
        }
    }
}
