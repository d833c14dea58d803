//! Barcode whitelists, and the positional pairing of the ATAC and RNA whitelists.

use crate::correction_table::SSEQ_CAPACITY;
use fxhash::FxHashMap;
use std::fmt;
use thiserror::Error;

const BARCODE_BASES: &[u8] = b"ACGT";

/// Longest supported barcode. One-insertion neighbours must still fit an `SSeq`.
pub const MAX_BARCODE_LEN: usize = SSEQ_CAPACITY - 1;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WhitelistError {
    #[error("whitelist is empty")]
    Empty,
    #[error("barcode {barcode} has length {len}, expected {expected}")]
    LengthMismatch {
        barcode: String,
        len: usize,
        expected: usize,
    },
    #[error("barcodes of length {0} are longer than the supported {MAX_BARCODE_LEN}")]
    TooLong(usize),
    #[error("barcode {0} contains characters other than ACGT")]
    InvalidBarcode(String),
    #[error("barcode {0} appears more than once")]
    Duplicate(String),
    #[error("whitelists have different sizes: {atac} ATAC vs {rna} RNA barcodes")]
    SizeMismatch { atac: usize, rna: usize },
}

/// An ordered set of fixed-length barcodes. The position of a barcode in the
/// whitelist identifies the gel bead.
#[derive(Clone)]
pub struct Whitelist {
    barcodes: Vec<Vec<u8>>,
    index: FxHashMap<Vec<u8>, u32>,
    barcode_len: usize,
}

impl fmt::Debug for Whitelist {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Whitelist")
            .field("barcodes", &self.barcodes.len())
            .field("barcode_len", &self.barcode_len)
            .finish()
    }
}

impl Whitelist {
    /// Build a whitelist, upper-casing the barcodes. All barcodes must be distinct,
    /// of equal length and made of ACGT.
    pub fn new<I, B>(barcodes: I) -> Result<Self, WhitelistError>
    where
        I: IntoIterator<Item = B>,
        B: AsRef<[u8]>,
    {
        let barcodes: Vec<Vec<u8>> = barcodes
            .into_iter()
            .map(|b| b.as_ref().to_ascii_uppercase())
            .collect();
        let barcode_len = barcodes.first().ok_or(WhitelistError::Empty)?.len();
        if barcode_len > MAX_BARCODE_LEN {
            return Err(WhitelistError::TooLong(barcode_len));
        }

        let mut index = FxHashMap::default();
        index.reserve(barcodes.len());
        for (i, bc) in barcodes.iter().enumerate() {
            let text = || String::from_utf8_lossy(bc).into_owned();
            if bc.len() != barcode_len {
                return Err(WhitelistError::LengthMismatch {
                    barcode: text(),
                    len: bc.len(),
                    expected: barcode_len,
                });
            }
            if bc.is_empty() || !bc.iter().all(|b| BARCODE_BASES.contains(b)) {
                return Err(WhitelistError::InvalidBarcode(text()));
            }
            if index.insert(bc.clone(), i as u32).is_some() {
                return Err(WhitelistError::Duplicate(text()));
            }
        }
        Ok(Whitelist {
            barcodes,
            index,
            barcode_len,
        })
    }

    pub fn len(&self) -> usize {
        self.barcodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.barcodes.is_empty()
    }

    pub fn barcode_len(&self) -> usize {
        self.barcode_len
    }

    /// Barcode at position `idx`.
    pub fn get(&self, idx: u32) -> &[u8] {
        &self.barcodes[idx as usize]
    }

    pub fn index_of(&self, barcode: &[u8]) -> Option<u32> {
        self.index.get(barcode).copied()
    }

    pub fn contains(&self, barcode: &[u8]) -> bool {
        self.index.contains_key(barcode)
    }

    pub fn iter(&self) -> impl Iterator<Item = &[u8]> + '_ {
        self.barcodes.iter().map(Vec::as_slice)
    }
}

/// Maps ATAC barcodes to the RNA barcode of the same gel bead, which sits at the
/// same position of the RNA whitelist.
#[derive(Debug, Clone)]
pub struct TranslationTable {
    atac: Whitelist,
    rna: Whitelist,
}

impl TranslationTable {
    pub fn new(atac: Whitelist, rna: Whitelist) -> Result<Self, WhitelistError> {
        if atac.len() != rna.len() {
            return Err(WhitelistError::SizeMismatch {
                atac: atac.len(),
                rna: rna.len(),
            });
        }
        Ok(TranslationTable { atac, rna })
    }

    pub fn atac(&self) -> &Whitelist {
        &self.atac
    }

    pub fn rna(&self) -> &Whitelist {
        &self.rna
    }

    /// RNA barcode paired with `barcode`. Barcodes missing from the ATAC
    /// whitelist are returned unchanged.
    pub fn translate<'a>(&'a self, barcode: &'a [u8]) -> &'a [u8] {
        match self.atac.index_of(barcode) {
            Some(idx) => self.rna.get(idx),
            None => barcode,
        }
    }

    pub fn translate_opt<'a>(&'a self, barcode: Option<&'a [u8]>) -> Option<&'a [u8]> {
        barcode.map(|bc| self.translate(bc))
    }
}
