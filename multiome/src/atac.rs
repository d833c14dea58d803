//!
//! ATAC fragments. The cell barcode sits inside the P5 adapter, and the genomic
//! insert is bracketed by the two Tn5 mosaic ends.
//!
use crate::locate::{GeometryError, LocateOutcome};
use anchor::{
    AdapterAnchor, AdapterTemplate, AnchorMatch, CalledBarcode, FuzzyPattern, PatternElement,
    PatternError, PatternSet, StrandedCall,
};
use parameters_toml::MultiomeParameters;
use read_seq::{revcomp, Read, Strand};

//------------------ CONSTANTS -----------------------//
/// Adapter sequence in front of the barcode.
pub const ATAC_ADAPTER_PREFIX: &[u8] = b"AATGATACGGCGACCACCGAGATCTACAC";
/// Adapter sequence behind the barcode, ending in the mosaic end.
pub const ATAC_ADAPTER_SUFFIX: &[u8] = b"CGCGTCTGTCGTCGGCAGCGTCAGATGTGTATAAGAGACAG";
/// Tn5 mosaic end.
pub const MOSAIC_END: &[u8] = b"AGATGTGTATAAGAGACAG";

const ADAPTER_CORE: &[u8] = b"AGATCTACAC";
const ADAPTER_ANCHOR: &[u8] = b"CGCGTCTGTCGTCGGCAGCG";
// both mosaic ends of a complete fragment
const MOSAIC_ENDS_LEN: usize = 2 * MOSAIC_END.len();
//----------------END OF CONSTANTS--------------------//

/// A located ATAC fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtacLocation {
    /// Raw barcode, oriented and positioned on `strand`.
    pub barcode: CalledBarcode,
    pub strand: Strand,
    /// Ordered fragment boundaries `[l0, l1, l2, l3]` on the forward read. The
    /// genomic insert is `[l1, l2)`.
    pub bounds: [usize; 4],
}

impl AtacLocation {
    pub fn insert(&self) -> (usize, usize) {
        (self.bounds[1], self.bounds[2])
    }
}

/// Finds the ATAC barcode and the insert boundaries of a read.
#[derive(Debug, Clone)]
pub struct AtacAnchorLocator {
    adapter: AdapterAnchor,
    mosaic_ends: PatternSet,
    min_insert: usize,
    keep_runoff: bool,
}

impl AtacAnchorLocator {
    pub fn new(params: &MultiomeParameters) -> Result<Self, PatternError> {
        let pattern = FuzzyPattern::new(vec![
            PatternElement::fuzzy(ADAPTER_CORE, params.adapter_core_max_edits),
            PatternElement::wildcard(params.barcode_length),
            PatternElement::fuzzy(ADAPTER_ANCHOR, params.adapter_anchor_max_edits),
        ])?;
        let template = AdapterTemplate::new(
            ATAC_ADAPTER_PREFIX,
            params.barcode_length,
            ATAC_ADAPTER_SUFFIX,
        );
        let mosaic_ends = PatternSet::new(vec![
            FuzzyPattern::literal(MOSAIC_END, params.tn5_max_edits)?,
            FuzzyPattern::literal(&revcomp(MOSAIC_END), params.tn5_max_edits)?,
        ]);
        Ok(AtacAnchorLocator {
            adapter: AdapterAnchor::new(pattern, template),
            mosaic_ends,
            min_insert: params.atac_min_insert_length,
            keep_runoff: params.keep_runoff,
        })
    }

    pub fn locate(&self, read: &Read) -> LocateOutcome<AtacLocation> {
        let Some(call) = self.adapter.locate_stranded(read) else {
            return LocateOutcome::NoAnchor;
        };
        // mosaic ends are searched in both orientations on the forward read
        let forward = read.oriented(Strand::Forward);
        let signatures = self.mosaic_ends.find_all(&forward.seq);
        self.fragment_bounds(&call, &signatures, read.len())
            .map(|bounds| AtacLocation {
                barcode: call.barcode,
                strand: call.strand,
                bounds,
            })
            .into()
    }

    fn fragment_bounds(
        &self,
        call: &StrandedCall,
        signatures: &[AnchorMatch],
        read_len: usize,
    ) -> Result<[usize; 4], GeometryError> {
        let bounds = match signatures {
            [a, b] => {
                let mut bounds = [a.start, a.end, b.start, b.end];
                bounds.sort_unstable();
                bounds
            }
            [sig] if self.keep_runoff => {
                // the fragment runs off the end of the read that is away from
                // the barcode
                let signature_end = match call.strand {
                    Strand::Forward => sig.end,
                    Strand::Reverse => read_len - sig.start,
                };
                if call.barcode.position >= signature_end {
                    return Err(GeometryError::BarcodeAfterSignature {
                        barcode: call.barcode.position,
                        signature_end,
                    });
                }
                match call.strand {
                    Strand::Forward => [0, sig.end, read_len, read_len],
                    Strand::Reverse => [0, 0, sig.start, read_len],
                }
            }
            [_] => return Err(GeometryError::RunoffNotKept),
            _ => return Err(GeometryError::SignatureCount(signatures.len())),
        };

        let insert = bounds[2].saturating_sub(bounds[1]);
        let min = self.min_insert.max(1);
        if insert < min {
            return Err(GeometryError::InsertTooShort { len: insert, min });
        }
        if signatures.len() == 2 {
            let fragment = bounds[3] - bounds[0];
            let min = MOSAIC_ENDS_LEN + self.min_insert;
            if fragment < min {
                return Err(GeometryError::FragmentTooShort { len: fragment, min });
            }
        }
        Ok(bounds)
    }
}
