//! Smith-Waterman alignment of an adapter hit against a masked adapter template,
//! and recovery of the barcode from the traceback.

use bio::alignment::pairwise::Aligner;
use bio::alignment::AlignmentOperation;
use std::fmt;

//------------------ CONSTANTS -----------------------//
/// Gap character of the traceback strings.
pub const GAP: u8 = b'-';
/// Placeholder masking the barcode in an adapter template.
pub const PLACEHOLDER: u8 = b'N';

const MATCH_SCORE: i32 = 5;
// an N on either side matches anything at a slight discount
const WILDCARD_SCORE: i32 = 4;
const MISMATCH_SCORE: i32 = -1;
// a gap of length k scores GAP_OPEN + k * GAP_EXTEND, i.e. -2 for the first column
const GAP_OPEN: i32 = -1;
const GAP_EXTEND: i32 = -1;
//----------------END OF CONSTANTS--------------------//

/// Scoring scheme of the local aligner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalAligner {
    pub match_score: i32,
    pub wildcard_score: i32,
    pub mismatch_score: i32,
    pub gap_open: i32,
    pub gap_extend: i32,
}

impl Default for LocalAligner {
    fn default() -> Self {
        LocalAligner {
            match_score: MATCH_SCORE,
            wildcard_score: WILDCARD_SCORE,
            mismatch_score: MISMATCH_SCORE,
            gap_open: GAP_OPEN,
            gap_extend: GAP_EXTEND,
        }
    }
}

impl LocalAligner {
    fn score(&self, a: u8, b: u8) -> i32 {
        if a == b {
            self.match_score
        } else if a == PLACEHOLDER || b == PLACEHOLDER {
            self.wildcard_score
        } else {
            self.mismatch_score
        }
    }

    /// Locally align `query` (a slice of a read) against `reference`.
    pub fn align(&self, query: &[u8], reference: &[u8]) -> AlignmentResult {
        if query.is_empty() || reference.is_empty() {
            return AlignmentResult::default();
        }
        let score = |a: u8, b: u8| self.score(a, b);
        let mut aligner = Aligner::with_capacity(
            query.len(),
            reference.len(),
            self.gap_open,
            self.gap_extend,
            &score,
        );
        let alignment = aligner.local(query, reference);

        let mut aligned_query = Vec::with_capacity(alignment.operations.len());
        let mut aligned_reference = Vec::with_capacity(alignment.operations.len());
        let (mut x, mut y) = (alignment.xstart, alignment.ystart);
        for op in &alignment.operations {
            match op {
                AlignmentOperation::Match | AlignmentOperation::Subst => {
                    aligned_query.push(query[x]);
                    aligned_reference.push(reference[y]);
                    x += 1;
                    y += 1;
                }
                AlignmentOperation::Ins => {
                    aligned_query.push(query[x]);
                    aligned_reference.push(GAP);
                    x += 1;
                }
                AlignmentOperation::Del => {
                    aligned_query.push(GAP);
                    aligned_reference.push(reference[y]);
                    y += 1;
                }
                AlignmentOperation::Xclip(_) | AlignmentOperation::Yclip(_) => {}
            }
        }

        AlignmentResult {
            score: alignment.score,
            query_start: alignment.xstart,
            reference_start: alignment.ystart,
            aligned_query,
            aligned_reference,
        }
    }
}

/// Gapped traceback of a local alignment.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct AlignmentResult {
    pub score: i32,
    /// Offset of the first aligned query base within the query.
    pub query_start: usize,
    /// Offset of the first aligned reference base within the reference.
    pub reference_start: usize,
    pub aligned_query: Vec<u8>,
    pub aligned_reference: Vec<u8>,
}

impl fmt::Debug for AlignmentResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlignmentResult")
            .field("score", &self.score)
            .field("query_start", &self.query_start)
            .field("reference_start", &self.reference_start)
            .field("query", &String::from_utf8_lossy(&self.aligned_query))
            .field("reference", &String::from_utf8_lossy(&self.aligned_reference))
            .finish()
    }
}

impl AlignmentResult {
    /// Recover the barcode masked by the first run of placeholders in the reference.
    ///
    /// `region_qual` is the quality string of the aligned query and
    /// `region_offset` the position of the query within the searched read, so
    /// that the returned position is in read coordinates.
    ///
    /// A gap right before the first placeholder column, or right after it, is
    /// taken as an extra base inserted into the barcode and the expected length
    /// grows by one. A gap deeper inside the placeholder run is not, so the two
    /// boundary cases are not symmetric.
    ///
    /// A query gap in the first placeholder column together with a query gap one
    /// column past the run is a deletion in the anchor that scored the same as
    /// keeping the last barcode base inside the run. The window grows by one to
    /// take that base back. A call that lost more than one base to deletions is
    /// rejected.
    pub fn call_barcode(
        &self,
        region_qual: &[u8],
        expected_len: usize,
        region_offset: usize,
    ) -> BarcodeCall {
        let query = &self.aligned_query;
        let reference = &self.aligned_reference;
        let Some(first) = reference.iter().position(|&c| c == PLACEHOLDER) else {
            return BarcodeCall::NotFound;
        };

        let run_end = first
            + reference[first..]
                .iter()
                .take_while(|&&c| c == PLACEHOLDER)
                .count();

        let mut start = first;
        let mut len = expected_len;
        if first > 0 && reference[first - 1] == GAP {
            start = first - 1;
            len += 1;
        } else if reference.get(first + 1) == Some(&GAP) {
            len += 1;
        } else if query[first] == GAP && query.get(run_end + 1) == Some(&GAP) {
            len += 1;
        }

        let end = (start + len).min(query.len());
        let sequence: Vec<u8> = query[start..end]
            .iter()
            .copied()
            .filter(|&c| c != GAP)
            .collect();
        if sequence.len() + 1 < len {
            return BarcodeCall::NotFound;
        }

        // read bases consumed by the alignment before the barcode
        let leading = query[..start].iter().filter(|&&c| c != GAP).count();
        let qual_start = self.query_start + leading;
        let Some(quality) = region_qual.get(qual_start..qual_start + sequence.len()) else {
            return BarcodeCall::NotFound;
        };

        BarcodeCall::Found(CalledBarcode {
            sequence,
            quality: quality.to_vec(),
            position: region_offset + qual_start,
        })
    }
}

/// A barcode read off an alignment.
#[derive(Clone, PartialEq, Eq)]
pub struct CalledBarcode {
    pub sequence: Vec<u8>,
    pub quality: Vec<u8>,
    /// Start of the barcode in the coordinates of the searched sequence.
    pub position: usize,
}

impl CalledBarcode {
    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    /// First position after the barcode.
    pub fn end(&self) -> usize {
        self.position + self.sequence.len()
    }
}

impl fmt::Debug for CalledBarcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@{} ({})",
            String::from_utf8_lossy(&self.sequence),
            self.position,
            String::from_utf8_lossy(&self.quality)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BarcodeCall {
    Found(CalledBarcode),
    NotFound,
}

impl BarcodeCall {
    pub fn is_found(&self) -> bool {
        matches!(self, BarcodeCall::Found(_))
    }

    pub fn found(self) -> Option<CalledBarcode> {
        match self {
            BarcodeCall::Found(bc) => Some(bc),
            BarcodeCall::NotFound => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn traceback(query: &str, reference: &str, query_start: usize) -> AlignmentResult {
        assert_eq!(query.len(), reference.len());
        AlignmentResult {
            score: 0,
            query_start,
            reference_start: 0,
            aligned_query: query.as_bytes().to_vec(),
            aligned_reference: reference.as_bytes().to_vec(),
        }
    }

    fn found(sequence: &str, quality: &str, position: usize) -> BarcodeCall {
        BarcodeCall::Found(CalledBarcode {
            sequence: sequence.as_bytes().to_vec(),
            quality: quality.as_bytes().to_vec(),
            position,
        })
    }

    #[test]
    fn test_align_exact() {
        let aln = LocalAligner::default().align(b"TACACGGTTCGCG", b"TCTACACNNNNCGCGTC");
        assert_eq!(aln.aligned_query, b"TACACGGTTCGCG");
        assert_eq!(aln.aligned_reference, b"TACACNNNNCGCG");
        assert_eq!((aln.query_start, aln.reference_start), (0, 2));
        assert_eq!(aln.score, 9 * 5 + 4 * 4);
    }

    #[test]
    fn test_align_gap_in_query() {
        // one base of the reference flank is missing from the query
        let aln = LocalAligner::default().align(b"GGATCCAAACCTT", b"GGATCCTAAACCTT");
        assert_eq!(aln.aligned_query, b"GGATCC-AAACCTT");
        assert_eq!(aln.aligned_reference, b"GGATCCTAAACCTT");
        assert_eq!(aln.score, 13 * 5 - 2);
    }

    #[test]
    fn test_call_plain() {
        let aln = traceback("CACGGTTCG", "CACNNNNCG", 2);
        let qual = b"!!abcdefghi";
        assert_eq!(aln.call_barcode(qual, 4, 100), found("GGTT", "defg", 105));
    }

    #[test]
    fn test_call_gap_before_placeholder() {
        // inserted base right before the masked run belongs to the barcode
        let aln = traceback("CACAGGTTCG", "CAC-NNNNCG", 0);
        let qual = b"0123456789";
        assert_eq!(aln.call_barcode(qual, 4, 0), found("AGGTT", "34567", 3));
    }

    #[test]
    fn test_call_gap_after_first_placeholder() {
        let aln = traceback("CACGAGTTCG", "CACN-NNNCG", 0);
        let qual = b"0123456789";
        assert_eq!(aln.call_barcode(qual, 4, 0), found("GAGTT", "34567", 3));
    }

    #[test]
    fn test_call_gap_inside_run_is_not_extended() {
        let aln = traceback("CACGGATTCG", "CACNN-NNCG", 0);
        let qual = b"0123456789";
        assert_eq!(aln.call_barcode(qual, 4, 0), found("GGAT", "3456", 3));
    }

    #[test]
    fn test_call_one_deletion() {
        let aln = traceback("CACG-TTCG", "CACNNNNCG", 0);
        let qual = b"01234567";
        assert_eq!(aln.call_barcode(qual, 4, 10), found("GTT", "345", 13));
    }

    #[test]
    fn test_call_leading_gap_with_anchor_deletion() {
        // the anchor lost its second base, and the aligner moved the barcode's
        // last base onto the first anchor column
        let aln = traceback("CAC-GGTC-CG", "CACNNNNCGCG", 0);
        let qual = b"0123456789";
        assert_eq!(aln.call_barcode(qual, 4, 0), found("GGTC", "3456", 3));
    }

    #[test]
    fn test_call_leading_gap_with_intact_anchor() {
        // a plain deletion inside the barcode, placed at the first column
        let aln = traceback("CAC-GGTCGCG", "CACNNNNCGCG", 0);
        let qual = b"0123456789";
        assert_eq!(aln.call_barcode(qual, 4, 0), found("GGT", "345", 3));
    }

    #[test]
    fn test_call_two_deletions_rejected() {
        let aln = traceback("CACG--TCG", "CACNNNNCG", 0);
        assert_eq!(aln.call_barcode(b"0123456", 4, 0), BarcodeCall::NotFound);
    }

    #[test]
    fn test_call_leading_query_gap() {
        // gaps before the barcode do not shift its read position
        let aln = traceback("C-CGGTTCG", "CACNNNNCG", 0);
        let qual = b"01234567";
        assert_eq!(aln.call_barcode(qual, 4, 0), found("GGTT", "2345", 2));
    }

    #[test]
    fn test_call_without_placeholder() {
        let aln = traceback("CACGG", "CACGG", 0);
        assert_eq!(aln.call_barcode(b"01234", 4, 0), BarcodeCall::NotFound);
        assert!(!AlignmentResult::default()
            .call_barcode(b"", 4, 0)
            .is_found());
    }
}
