//!
//! Corrects sequencing errors in barcodes. Single edits are resolved through the
//! correction table; larger distances fall back to a quality-weighted scan of
//! the whitelist.
//!
use crate::correction_table::CorrectionTable;
use crate::whitelist::Whitelist;
use fxhash::FxHashSet;
use read_seq::qual::phred;
use thiserror::Error;

type Of64 = ordered_float::NotNan<f64>;

// Mismatches at bases with quality at or below this carry the minimum weight
const WEIGHT_QUALITY_FLOOR: f64 = 15.0;
const WEIGHT_QUALITY_SCALE: f64 = 15.0;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum CorrectionError {
    #[error(
        "barcode correction up to distance {max_dist} requires the whitelist character matrix"
    )]
    MissingWhitelistMatrix { max_dist: usize },
    #[error("minimum weighted margin must be a non-negative number, got {0}")]
    InvalidMargin(f64),
    #[error("whitelist matrix has {matrix} rows but the whitelist has {whitelist} barcodes")]
    MatrixMismatch { matrix: usize, whitelist: usize },
}

/// Knobs of the barcode corrector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CorrectionParams {
    /// Maximum Hamming distance of a correction. Up to one edit is handled by the
    /// correction table alone.
    pub max_dist: usize,
    /// The best whitelist candidate must beat the runner-up weighted distance
    /// by more than this.
    pub min_margin: f64,
}

impl Default for CorrectionParams {
    fn default() -> Self {
        CorrectionParams {
            max_dist: 1,
            min_margin: 0.5,
        }
    }
}

/// The whitelist laid out as a row-major character matrix, one row per barcode.
#[derive(Debug, Clone)]
pub struct WhitelistMatrix {
    width: usize,
    chars: Vec<u8>,
}

impl WhitelistMatrix {
    pub fn new(whitelist: &Whitelist) -> Self {
        WhitelistMatrix {
            width: whitelist.barcode_len(),
            chars: whitelist.iter().flatten().copied().collect(),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn rows(&self) -> usize {
        self.chars.len() / self.width.max(1)
    }

    fn iter_rows(&self) -> impl Iterator<Item = &[u8]> + '_ {
        self.chars.chunks_exact(self.width.max(1))
    }
}

/// Outcome of a correction attempt. The whitelist position is carried for
/// valid barcodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Correction {
    /// The observed barcode is on the whitelist.
    Exact(u32),
    /// The observed barcode was corrected onto the whitelist.
    Corrected(u32),
    /// No whitelist barcode is close enough.
    Uncorrectable,
    /// Several whitelist barcodes are about equally close.
    Ambiguous,
}

impl Correction {
    pub fn index(self) -> Option<u32> {
        match self {
            Correction::Exact(idx) | Correction::Corrected(idx) => Some(idx),
            Correction::Uncorrectable | Correction::Ambiguous => None,
        }
    }

    pub fn is_valid(self) -> bool {
        self.index().is_some()
    }
}

/// Weight of a mismatch at a base with quality character `c`: mismatches at
/// confident bases cost more.
fn mismatch_weight(c: u8) -> f64 {
    1.0 + ((f64::from(phred(c)) - WEIGHT_QUALITY_FLOOR) / WEIGHT_QUALITY_SCALE).max(0.0)
}

/// Barcode corrector over shared, read-only tables.
///
/// The corrector remembers barcodes that are too far from every whitelist
/// entry, so that repeated offenders skip the whitelist scan. It is meant to be
/// owned by a single worker.
pub struct BarcodeCorrector<'a> {
    whitelist: &'a Whitelist,
    table: &'a CorrectionTable,
    matrix: Option<&'a WhitelistMatrix>,
    params: CorrectionParams,
    uncorrectable: FxHashSet<Vec<u8>>,
}

impl<'a> BarcodeCorrector<'a> {
    /// Create a corrector. Distances above one require `matrix`.
    pub fn new(
        whitelist: &'a Whitelist,
        table: &'a CorrectionTable,
        matrix: Option<&'a WhitelistMatrix>,
        params: CorrectionParams,
    ) -> Result<Self, CorrectionError> {
        if Of64::new(params.min_margin).is_err() || params.min_margin < 0.0 {
            return Err(CorrectionError::InvalidMargin(params.min_margin));
        }
        if params.max_dist > 1 {
            let Some(matrix) = matrix else {
                return Err(CorrectionError::MissingWhitelistMatrix {
                    max_dist: params.max_dist,
                });
            };
            if matrix.rows() != whitelist.len() {
                return Err(CorrectionError::MatrixMismatch {
                    matrix: matrix.rows(),
                    whitelist: whitelist.len(),
                });
            }
        }
        Ok(BarcodeCorrector {
            whitelist,
            table,
            matrix,
            params,
            uncorrectable: FxHashSet::default(),
        })
    }

    pub fn whitelist(&self) -> &'a Whitelist {
        self.whitelist
    }

    /// Attempt to correct `observed`, whose base qualities are `qual`.
    pub fn correct(&mut self, observed: &[u8], qual: &[u8]) -> Correction {
        if let Some(idx) = self.table.get(observed) {
            return if self.whitelist.get(idx) == observed {
                Correction::Exact(idx)
            } else {
                Correction::Corrected(idx)
            };
        }
        if self.params.max_dist <= 1 || self.uncorrectable.contains(observed) {
            return Correction::Uncorrectable;
        }
        let Some(matrix) = self.matrix else {
            return Correction::Uncorrectable;
        };

        let correction = self.weighted_nearest(matrix, observed, qual);
        if correction == Correction::Uncorrectable {
            self.uncorrectable.insert(observed.to_vec());
        }
        correction
    }

    /// Corrected barcode sequence, or None.
    pub fn correct_barcode(&mut self, observed: &[u8], qual: &[u8]) -> Option<&'a [u8]> {
        let whitelist = self.whitelist;
        self.correct(observed, qual)
            .index()
            .map(|idx| whitelist.get(idx))
    }

    // Nearest whitelist barcode by quality-weighted Hamming distance.
    fn weighted_nearest(
        &self,
        matrix: &WhitelistMatrix,
        observed: &[u8],
        qual: &[u8],
    ) -> Correction {
        if observed.len() != matrix.width() || qual.len() != observed.len() {
            return Correction::Uncorrectable;
        }
        let weights: Vec<f64> = qual.iter().map(|&c| mismatch_weight(c)).collect();

        // (weighted distance, plain distance, whitelist position)
        let mut best: Option<(Of64, usize, u32)> = None;
        let mut runner_up: Option<Of64> = None;
        for (idx, row) in matrix.iter_rows().enumerate() {
            let mut weighted = 0.0;
            let mut plain = 0;
            for ((&o, &w), &weight) in observed.iter().zip(row).zip(&weights) {
                if o != w {
                    weighted += weight;
                    plain += 1;
                }
            }
            let Ok(weighted) = Of64::new(weighted) else {
                continue;
            };
            match best {
                Some((best_weighted, _, _)) if weighted >= best_weighted => {
                    runner_up = Some(runner_up.map_or(weighted, |r| r.min(weighted)));
                }
                _ => {
                    runner_up = best.map(|(b, _, _)| b);
                    best = Some((weighted, plain, idx as u32));
                }
            }
        }

        let Some((best_weighted, best_plain, best_idx)) = best else {
            return Correction::Uncorrectable;
        };
        if best_plain > self.params.max_dist {
            return Correction::Uncorrectable;
        }
        match runner_up {
            Some(second) if best_weighted.into_inner() >= second.into_inner() - self.params.min_margin => {
                Correction::Ambiguous
            }
            _ => Correction::Corrected(best_idx),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use bio::alignment::distance::simd::hamming;
    use proptest::collection::hash_set;
    use proptest::sample::select;
    use proptest::{prop_assert_eq, proptest};

    const HIGH: u8 = b'?'; // Q30
    const LOW: u8 = b'0'; // Q15

    fn matrix_params(max_dist: usize, min_margin: f64) -> CorrectionParams {
        CorrectionParams {
            max_dist,
            min_margin,
        }
    }

    #[test]
    fn test_mismatch_weight() {
        assert_eq!(mismatch_weight(b'!'), 1.0);
        assert_eq!(mismatch_weight(LOW), 1.0);
        assert_eq!(mismatch_weight(HIGH), 2.0);
        assert_eq!(mismatch_weight(b'N'), 3.0); // Q45
    }

    #[test]
    fn test_table_lookup() {
        let wl = Whitelist::new(["ACGTACGT", "TTGGCCAA"]).unwrap();
        let table = CorrectionTable::build(&wl);
        let mut corrector =
            BarcodeCorrector::new(&wl, &table, None, CorrectionParams::default()).unwrap();
        let qual = [HIGH; 8];
        assert_eq!(corrector.correct(b"ACGTACGT", &qual), Correction::Exact(0));
        assert_eq!(corrector.correct(b"ACGTTCGT", &qual), Correction::Corrected(0));
        assert_eq!(corrector.correct(b"TTGCCAA", &qual[..7]), Correction::Corrected(1));
        assert_eq!(
            corrector.correct_barcode(b"TTGGCCAAA", &[HIGH; 9]),
            Some(b"TTGGCCAA".as_slice())
        );
        // two edits and no fallback
        assert_eq!(corrector.correct(b"ACGTTTGT", &qual), Correction::Uncorrectable);
    }

    #[test]
    fn test_missing_matrix_is_a_configuration_error() {
        let wl = Whitelist::new(["ACGTACGT"]).unwrap();
        let table = CorrectionTable::build(&wl);
        assert_eq!(
            BarcodeCorrector::new(&wl, &table, None, matrix_params(2, 0.5)).err(),
            Some(CorrectionError::MissingWhitelistMatrix { max_dist: 2 })
        );
        let matrix = WhitelistMatrix::new(&wl);
        assert!(BarcodeCorrector::new(&wl, &table, Some(&matrix), matrix_params(2, 0.5)).is_ok());
        assert_eq!(
            BarcodeCorrector::new(&wl, &table, Some(&matrix), matrix_params(2, -1.0)).err(),
            Some(CorrectionError::InvalidMargin(-1.0))
        );
    }

    #[test]
    fn test_weighted_correction() {
        // TCGTACGT is one substitution from both barcodes, at position 0 and 7
        let wl = Whitelist::new(["ACGTACGT", "TCGTACGA", "GGGGGGGG"]).unwrap();
        let table = CorrectionTable::build(&wl);
        let matrix = WhitelistMatrix::new(&wl);
        let mut corrector =
            BarcodeCorrector::new(&wl, &table, Some(&matrix), matrix_params(2, 0.5)).unwrap();
        assert!(!table.contains(b"TCGTACGT"));

        // the confident first base is believed, the last base is the error
        let qual = [HIGH, HIGH, HIGH, HIGH, HIGH, HIGH, HIGH, LOW];
        assert_eq!(corrector.correct(b"TCGTACGT", &qual), Correction::Corrected(1));

        let qual = [LOW, HIGH, HIGH, HIGH, HIGH, HIGH, HIGH, HIGH];
        assert_eq!(corrector.correct(b"TCGTACGT", &qual), Correction::Corrected(0));

        // equal confidence gives equal weighted distances
        assert_eq!(corrector.correct(b"TCGTACGT", &[HIGH; 8]), Correction::Ambiguous);
    }

    #[test]
    fn test_weighted_margin_boundary() {
        let wl = Whitelist::new(["ACGTACGT", "TCGTACGA", "GGGGGGGG"]).unwrap();
        let table = CorrectionTable::build(&wl);
        let matrix = WhitelistMatrix::new(&wl);
        let qual = [HIGH, HIGH, HIGH, HIGH, HIGH, HIGH, HIGH, LOW];

        // weighted distances are 2.0 and 1.0, a margin of exactly 1.0 is not enough
        let mut corrector =
            BarcodeCorrector::new(&wl, &table, Some(&matrix), matrix_params(2, 1.0)).unwrap();
        assert_eq!(corrector.correct(b"TCGTACGT", &qual), Correction::Ambiguous);

        let mut corrector =
            BarcodeCorrector::new(&wl, &table, Some(&matrix), matrix_params(2, 0.99)).unwrap();
        assert_eq!(corrector.correct(b"TCGTACGT", &qual), Correction::Corrected(1));
    }

    #[test]
    fn test_uncorrectable_is_remembered() {
        let wl = Whitelist::new(["ACGTACGT", "TCGTACGA"]).unwrap();
        let table = CorrectionTable::build(&wl);
        let matrix = WhitelistMatrix::new(&wl);
        let mut corrector =
            BarcodeCorrector::new(&wl, &table, Some(&matrix), matrix_params(2, 0.5)).unwrap();

        assert_eq!(corrector.correct(b"GGGGGGGG", &[HIGH; 8]), Correction::Uncorrectable);
        assert!(corrector.uncorrectable.contains(b"GGGGGGGG".as_slice()));
        assert_eq!(corrector.correct(b"GGGGGGGG", &[HIGH; 8]), Correction::Uncorrectable);

        // wrong length cannot be scanned
        assert_eq!(corrector.correct(b"GGGGGGG", &[HIGH; 7]), Correction::Uncorrectable);

        // two substitutions, within max_dist
        assert_eq!(corrector.correct(b"TCGTTTGA", &[HIGH; 8]), Correction::Corrected(1));
        assert_eq!(corrector.uncorrectable.len(), 2);
    }

    #[test]
    fn test_single_barcode_whitelist() {
        let wl = Whitelist::new(["ACGTACGT"]).unwrap();
        let table = CorrectionTable::build(&wl);
        let matrix = WhitelistMatrix::new(&wl);
        let mut corrector =
            BarcodeCorrector::new(&wl, &table, Some(&matrix), matrix_params(2, 0.5)).unwrap();
        assert_eq!(corrector.correct(b"ACTTACTT", &[HIGH; 8]), Correction::Corrected(0));
        assert_eq!(corrector.correct(b"TTTTACTT", &[HIGH; 8]), Correction::Uncorrectable);
    }

    proptest! {
        #[test]
        fn prop_test_whitelist_corrects_to_itself(
            barcodes in hash_set("[ACGT]{16}", 1..20usize),
        ) {
            let wl = Whitelist::new(&barcodes).unwrap();
            let table = CorrectionTable::build(&wl);
            let mut corrector =
                BarcodeCorrector::new(&wl, &table, None, CorrectionParams::default()).unwrap();
            for (idx, bc) in wl.iter().enumerate() {
                prop_assert_eq!(corrector.correct(bc, &[HIGH; 16]), Correction::Exact(idx as u32));
            }
        }

        #[test]
        fn prop_test_isolated_substitution_corrects(
            barcodes in hash_set("[ACGT]{16}", 1..20usize),
            pos in 0..16usize,
            base in select(vec![b'A', b'C', b'G', b'T', b'N']),
            qual in select(vec![b'!', LOW, HIGH, b'I']),
        ) {
            let wl = Whitelist::new(&barcodes).unwrap();
            let table = CorrectionTable::build(&wl);
            let mut corrector =
                BarcodeCorrector::new(&wl, &table, None, CorrectionParams::default()).unwrap();
            let target = wl.get(0).to_vec();
            let mut observed = target.clone();
            observed[pos] = base;
            let isolated = wl
                .iter()
                .skip(1)
                .all(|other| hamming(other, &observed) > 1);
            if observed != target && isolated {
                prop_assert_eq!(corrector.correct(&observed, &[qual; 16]), Correction::Corrected(0));
            }
        }
    }
}
