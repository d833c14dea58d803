//! Per-read classification into ATAC fragments, gene expression reads and
//! unclassified reads.

use crate::atac::AtacLocation;
use crate::context::MultiomeContext;
use crate::gex::GexLocation;
use crate::locate::LocateOutcome;
use barcode::BarcodeCorrector;
use log::debug;
use read_seq::{Read, Strand};

/// Stands in for the genomic insert of the technical read.
pub const TECHNICAL_GAP: &[u8] = b"----";

/// Cell barcode annotation of a classified read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BarcodeTags {
    /// Whitelist barcode in RNA space, if the raw barcode could be corrected.
    pub corrected: Option<Vec<u8>>,
    pub raw: Vec<u8>,
    pub raw_qual: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UmiTags {
    pub raw: Vec<u8>,
    pub qual: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtacRead {
    /// The genomic insert.
    pub insert: Read,
    /// The read with the insert replaced by [`TECHNICAL_GAP`], if requested.
    pub technical: Option<Read>,
    pub strand: Strand,
    pub bounds: [usize; 4],
    pub barcode: BarcodeTags,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GexRead {
    /// The cDNA part of the read.
    pub genomic: Read,
    pub strand: Strand,
    pub barcode: BarcodeTags,
    pub umi: UmiTags,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassifiedRead {
    Atac(AtacRead),
    Gex(GexRead),
    Other(Read),
}

impl ClassifiedRead {
    /// The sequence to write out: insert, cDNA or the whole read.
    pub fn read(&self) -> &Read {
        match self {
            ClassifiedRead::Atac(atac) => &atac.insert,
            ClassifiedRead::Gex(gex) => &gex.genomic,
            ClassifiedRead::Other(read) => read,
        }
    }

    pub fn barcode(&self) -> Option<&BarcodeTags> {
        match self {
            ClassifiedRead::Atac(atac) => Some(&atac.barcode),
            ClassifiedRead::Gex(gex) => Some(&gex.barcode),
            ClassifiedRead::Other(_) => None,
        }
    }

    /// Annotation tags in `CB, CR, CY, UB, UR, UY` order. Tags without a value
    /// are left out.
    pub fn tags(&self) -> Vec<(&'static str, &[u8])> {
        let mut tags = Vec::with_capacity(6);
        if let Some(bc) = self.barcode() {
            if let Some(corrected) = &bc.corrected {
                tags.push(("CB", corrected.as_slice()));
            }
            tags.push(("CR", bc.raw.as_slice()));
            tags.push(("CY", bc.raw_qual.as_slice()));
        }
        if let ClassifiedRead::Gex(gex) = self {
            // UMIs are not corrected
            tags.push(("UB", gex.umi.raw.as_slice()));
            tags.push(("UR", gex.umi.raw.as_slice()));
            tags.push(("UY", gex.umi.qual.as_slice()));
        }
        tags
    }
}

/// Classifies reads against a shared [`MultiomeContext`]. Owns the barcode
/// correctors and their caches, so every thread needs its own.
pub struct ReadClassifier<'a> {
    ctx: &'a MultiomeContext,
    atac: BarcodeCorrector<'a>,
    rna: BarcodeCorrector<'a>,
}

impl<'a> ReadClassifier<'a> {
    pub(crate) fn new(
        ctx: &'a MultiomeContext,
        atac: BarcodeCorrector<'a>,
        rna: BarcodeCorrector<'a>,
    ) -> Self {
        ReadClassifier { ctx, atac, rna }
    }

    /// ATAC takes precedence over gene expression.
    pub fn classify(&mut self, read: &Read) -> ClassifiedRead {
        match self.ctx.atac.locate(read) {
            LocateOutcome::Located(loc) => {
                if let Some(atac) = self.atac_read(read, loc) {
                    return ClassifiedRead::Atac(atac);
                }
            }
            LocateOutcome::NoAnchor => {}
            LocateOutcome::InvalidGeometry(reason) => {
                debug!("{}: rejected as ATAC, {}", read.id(), reason);
            }
        }
        match self.ctx.gex.locate(read) {
            LocateOutcome::Located(loc) => {
                if let Some(gex) = self.gex_read(read, loc) {
                    return ClassifiedRead::Gex(gex);
                }
            }
            LocateOutcome::NoAnchor => {}
            LocateOutcome::InvalidGeometry(reason) => {
                debug!("{}: rejected as GEX, {}", read.id(), reason);
            }
        }
        ClassifiedRead::Other(read.clone())
    }

    fn atac_read(&mut self, read: &Read, loc: AtacLocation) -> Option<AtacRead> {
        let (start, end) = loc.insert();
        let insert = read.subread(start, end)?;
        let technical = if self.ctx.params.write_technical {
            read.replace_range(start, end, TECHNICAL_GAP).ok()
        } else {
            None
        };
        let translation = &self.ctx.translation;
        let corrected = self
            .atac
            .correct_barcode(&loc.barcode.sequence, &loc.barcode.quality)
            .map(|bc| translation.translate(bc).to_vec());
        Some(AtacRead {
            insert,
            technical,
            strand: loc.strand,
            bounds: loc.bounds,
            barcode: BarcodeTags {
                corrected,
                raw: loc.barcode.sequence,
                raw_qual: loc.barcode.quality,
            },
        })
    }

    fn gex_read(&mut self, read: &Read, loc: GexLocation) -> Option<GexRead> {
        let genomic = read.subread(loc.genomic.0, loc.genomic.1)?;
        let corrected = self
            .rna
            .correct_barcode(&loc.barcode, &loc.barcode_qual)
            .map(<[u8]>::to_vec);
        Some(GexRead {
            genomic,
            strand: loc.strand,
            barcode: BarcodeTags {
                corrected,
                raw: loc.barcode,
                raw_qual: loc.barcode_qual,
            },
            umi: UmiTags {
                raw: loc.umi,
                qual: loc.umi_qual,
            },
        })
    }
}
