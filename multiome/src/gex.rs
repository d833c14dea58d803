//! Gene expression reads: Read 1 adapter, cell barcode, UMI and the start of the
//! poly(dT) tail, followed by the cDNA.

use crate::locate::{GeometryError, LocateOutcome};
use anchor::{AdapterAnchor, AdapterTemplate, FuzzyPattern, PatternElement, PatternError};
use parameters_toml::MultiomeParameters;
use read_seq::{Read, Strand};

//------------------ CONSTANTS -----------------------//
/// Read 1 adapter in front of the barcode.
pub const GEX_ADAPTER_PREFIX: &[u8] = b"ACACTCTTTCCCTACACGACGCTCTTCCGATCT";
/// First bases of the poly(dT) capture sequence behind the UMI.
pub const POLY_T_START: &[u8] = b"TTT";

const ADAPTER_CORE: &[u8] = b"CTACACGACGCTCTTCCGA";
const ADAPTER_END: &[u8] = b"TCT";
//----------------END OF CONSTANTS--------------------//

/// A located gene expression read. Barcode and UMI are oriented on `strand`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GexLocation {
    pub barcode: Vec<u8>,
    pub barcode_qual: Vec<u8>,
    pub umi: Vec<u8>,
    pub umi_qual: Vec<u8>,
    pub strand: Strand,
    /// Start of the barcode on `strand`.
    pub position: usize,
    /// Half-open genomic region on the forward read.
    pub genomic: (usize, usize),
}

/// Finds the barcode, UMI and cDNA of a gene expression read.
#[derive(Debug, Clone)]
pub struct GexAnchorLocator {
    adapter: AdapterAnchor,
    barcode_len: usize,
    min_insert: usize,
}

impl GexAnchorLocator {
    pub fn new(params: &MultiomeParameters) -> Result<Self, PatternError> {
        let block_len = params.barcode_length + params.umi_length;
        let pattern = FuzzyPattern::new(vec![
            PatternElement::fuzzy(ADAPTER_CORE, params.gex_adapter_max_edits),
            PatternElement::exact(ADAPTER_END),
            PatternElement::wildcard(block_len),
            PatternElement::exact(POLY_T_START),
        ])?;
        let template = AdapterTemplate::new(GEX_ADAPTER_PREFIX, block_len, POLY_T_START);
        Ok(GexAnchorLocator {
            adapter: AdapterAnchor::new(pattern, template),
            barcode_len: params.barcode_length,
            min_insert: params.gex_min_insert_length,
        })
    }

    /// The called barcode and UMI block is split at the barcode length, any
    /// indel in the block shows up in the UMI.
    pub fn locate(&self, read: &Read) -> LocateOutcome<GexLocation> {
        let Some(call) = self.adapter.locate_stranded(read) else {
            return LocateOutcome::NoAnchor;
        };
        let n = read.len();
        let block_end = call.barcode.end().min(n);
        let genomic = match call.strand {
            Strand::Forward => (block_end, n),
            Strand::Reverse => (0, n - block_end),
        };
        let len = genomic.1 - genomic.0;
        let min = self.min_insert.max(1);
        if len < min {
            return LocateOutcome::InvalidGeometry(GeometryError::InsertTooShort { len, min });
        }

        let mut barcode = call.barcode.sequence;
        let mut barcode_qual = call.barcode.quality;
        let split = self.barcode_len.min(barcode.len());
        let umi = barcode.split_off(split);
        let umi_qual = barcode_qual.split_off(split);
        LocateOutcome::Located(GexLocation {
            barcode,
            barcode_qual,
            umi,
            umi_qual,
            strand: call.strand,
            position: call.barcode.position,
            genomic,
        })
    }
}
