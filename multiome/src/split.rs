//! Parallel classification of a batch of reads.

use crate::classify::ClassifiedRead;
use crate::context::MultiomeContext;
use anyhow::Result;
use barcode::CorrectionError;
use log::info;
use rayon::prelude::*;
use read_seq::Read;
use serde::{Deserialize, Serialize};

/// Number of reads per output bucket.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitCounts {
    pub atac: usize,
    pub gex: usize,
    pub other: usize,
    /// Classified reads dropped for lack of a corrected barcode.
    pub invalid_barcode: usize,
}

impl SplitCounts {
    pub fn total(&self) -> usize {
        self.atac + self.gex + self.other + self.invalid_barcode
    }

    fn record(&mut self, read: &ClassifiedRead) {
        match read {
            ClassifiedRead::Atac(_) => self.atac += 1,
            ClassifiedRead::Gex(_) => self.gex += 1,
            ClassifiedRead::Other(_) => self.other += 1,
        }
    }
}

/// Classify `reads` on the current rayon pool. The output keeps the input order.
pub fn split_reads(
    ctx: &MultiomeContext,
    reads: &[Read],
) -> Result<(Vec<ClassifiedRead>, SplitCounts)> {
    let classified: Vec<ClassifiedRead> = reads
        .par_iter()
        .map_init(
            || ctx.worker(),
            |worker, read| -> Result<ClassifiedRead, CorrectionError> {
                let worker = worker.as_mut().map_err(|e| e.clone())?;
                Ok(worker.classify(read))
            },
        )
        .collect::<Result<Vec<_>, CorrectionError>>()?;

    let only_valid = ctx.params().write_only_valid_barcodes;
    let mut counts = SplitCounts::default();
    let mut kept = Vec::with_capacity(classified.len());
    for read in classified {
        if only_valid && read.barcode().is_some_and(|bc| bc.corrected.is_none()) {
            counts.invalid_barcode += 1;
            continue;
        }
        counts.record(&read);
        kept.push(read);
    }
    info!(
        "split {} reads: {} ATAC, {} GEX, {} other, {} without a valid barcode",
        reads.len(),
        counts.atac,
        counts.gex,
        counts.other,
        counts.invalid_barcode
    );
    Ok((kept, counts))
}

/// [`split_reads`] on a dedicated pool of `threads` threads.
pub fn split_reads_with_threads(
    ctx: &MultiomeContext,
    reads: &[Read],
    threads: usize,
) -> Result<(Vec<ClassifiedRead>, SplitCounts)> {
    let pool = rayon::ThreadPoolBuilder::new().num_threads(threads).build()?;
    pool.install(|| split_reads(ctx, reads))
}
