//! Masked adapter templates and the two-stage barcode search built on them.

use crate::align::{BarcodeCall, CalledBarcode, LocalAligner, PLACEHOLDER};
use crate::pattern::{search_strands, FuzzyPattern};
use read_seq::{Read, Strand};

/// Reference sequence of an adapter with the barcode replaced by a run of
/// placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterTemplate {
    reference: Vec<u8>,
    masked_len: usize,
}

impl AdapterTemplate {
    /// `prefix`, then `masked_len` placeholders, then `suffix`.
    pub fn new(prefix: &[u8], masked_len: usize, suffix: &[u8]) -> Self {
        let mut reference = Vec::with_capacity(prefix.len() + masked_len + suffix.len());
        reference.extend_from_slice(prefix);
        reference.resize(prefix.len() + masked_len, PLACEHOLDER);
        reference.extend_from_slice(suffix);
        AdapterTemplate {
            reference,
            masked_len,
        }
    }

    pub fn reference(&self) -> &[u8] {
        &self.reference
    }

    /// Length of the masked region, which is the expected barcode length.
    pub fn masked_len(&self) -> usize {
        self.masked_len
    }
}

/// An adapter hit found on one strand of a read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrandedCall {
    pub strand: Strand,
    /// Barcode with its position on `strand`.
    pub barcode: CalledBarcode,
}

/// Fuzzy pattern plus template: the pattern finds the adapter, the alignment of
/// the hit against the template pins down the barcode.
#[derive(Debug, Clone)]
pub struct AdapterAnchor {
    pattern: FuzzyPattern,
    template: AdapterTemplate,
    aligner: LocalAligner,
}

impl AdapterAnchor {
    pub fn new(pattern: FuzzyPattern, template: AdapterTemplate) -> Self {
        AdapterAnchor {
            pattern,
            template,
            aligner: LocalAligner::default(),
        }
    }

    pub fn template(&self) -> &AdapterTemplate {
        &self.template
    }

    /// Search one upper-case sequence and its quality.
    pub fn locate(&self, seq: &[u8], qual: &[u8]) -> BarcodeCall {
        let Some(hit) = self.pattern.find(seq) else {
            return BarcodeCall::NotFound;
        };
        let aln = self
            .aligner
            .align(&seq[hit.start..hit.end], self.template.reference());
        aln.call_barcode(
            &qual[hit.start..hit.end],
            self.template.masked_len(),
            hit.start,
        )
    }

    /// Search the forward strand, then the reverse complement.
    pub fn locate_stranded(&self, read: &Read) -> Option<StrandedCall> {
        search_strands(read, |oriented| {
            self.locate(&oriented.seq, &oriented.qual).found()
        })
        .map(|(oriented, barcode)| StrandedCall {
            strand: oriented.strand,
            barcode,
        })
    }
}
