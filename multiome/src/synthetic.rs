//! Synthetic multiome reads for tests.
//!
//! Genomic sequence is drawn from `A` and `C` only, so neither it nor its
//! reverse complement can contain an adapter or a mosaic end.

use crate::atac::{ATAC_ADAPTER_PREFIX, ATAC_ADAPTER_SUFFIX, MOSAIC_END};
use crate::gex::{GEX_ADAPTER_PREFIX, POLY_T_START};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use read_seq::{revcomp, Read, Strand};
use std::ops::Range;

pub const ATAC_BARCODE: &[u8] = b"ATGCATGCATGCATGC";
pub const RNA_BARCODE: &[u8] = b"GGTTCAGTCAAGTCCA";
pub const UMI: &[u8] = b"TTGACAGTCGAT";

/// Offset of the barcode in a forward construct.
pub const ATAC_BARCODE_POS: usize = 29;
pub const GEX_BARCODE_POS: usize = 33;

pub fn genomic(len: usize, seed: u64) -> Vec<u8> {
    let mut rng = ChaCha20Rng::seed_from_u64(seed);
    (0..len)
        .map(|_| if rng.gen_bool(0.5) { b'A' } else { b'C' })
        .collect()
}

/// Adapter, barcode and the leading mosaic end, followed by `parts`.
pub fn atac_construct(barcode: &[u8], parts: &[&[u8]]) -> Vec<u8> {
    let mut seq = [ATAC_ADAPTER_PREFIX, barcode, ATAC_ADAPTER_SUFFIX].concat();
    for part in parts {
        seq.extend_from_slice(part);
    }
    seq
}

/// The closing mosaic end of a fragment, as read on the forward strand.
pub fn closing_mosaic_end() -> Vec<u8> {
    revcomp(MOSAIC_END)
}

pub fn gex_construct(barcode: &[u8], umi: &[u8], genomic: &[u8]) -> Vec<u8> {
    [GEX_ADAPTER_PREFIX, barcode, umi, POLY_T_START, genomic].concat()
}

pub fn read(id: &str, seq: &[u8]) -> Read {
    Read::new(id, seq, vec![b'I'; seq.len()]).unwrap()
}

/// A read with distinct quality characters, so that slices of the quality
/// identify their position.
pub fn read_with_ramp(id: &str, seq: &[u8]) -> Read {
    let qual: Vec<u8> = (0..seq.len()).map(|i| b'#' + (i % 40) as u8).collect();
    Read::new(id, seq, qual).unwrap()
}

/// Quality `I` everywhere except `A` over `barcode` and `B` over the `umi_len`
/// bases behind it, so a called quality string shows where it was cut from.
pub fn marked_qual(len: usize, barcode: Range<usize>, umi_len: usize) -> Vec<u8> {
    let mut qual = vec![b'I'; len];
    let umi = barcode.end..barcode.end + umi_len;
    qual[barcode].fill(b'A');
    qual[umi].fill(b'B');
    qual
}

/// A read of the forward construct `seq` with quality `qual`, as sequenced
/// from `strand`.
pub fn oriented_read(id: &str, seq: &[u8], qual: &[u8], strand: Strand) -> Read {
    let (seq, qual) = strand.orient(seq, qual);
    Read::new(id, seq.into_owned(), qual.into_owned()).unwrap()
}
