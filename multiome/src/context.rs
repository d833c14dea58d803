//!
//! Everything that is built once per run and shared by all workers.
//!
use crate::atac::AtacAnchorLocator;
use crate::classify::ReadClassifier;
use crate::gex::GexAnchorLocator;
use anyhow::{bail, Context, Result};
use barcode::{
    BarcodeCorrector, CorrectionError, CorrectionParams, CorrectionTable, TranslationTable,
    Whitelist, WhitelistMatrix,
};
use log::info;
use parameters_toml::MultiomeParameters;

/// Compiled patterns, correction tables and parameters of a run. Immutable once
/// built, classification goes through the per-worker [`ReadClassifier`].
pub struct MultiomeContext {
    pub(crate) params: MultiomeParameters,
    pub(crate) atac: AtacAnchorLocator,
    pub(crate) gex: GexAnchorLocator,
    pub(crate) translation: TranslationTable,
    atac_table: CorrectionTable,
    rna_table: CorrectionTable,
    atac_matrix: Option<WhitelistMatrix>,
    rna_matrix: Option<WhitelistMatrix>,
    correction: CorrectionParams,
}

impl MultiomeContext {
    /// Build the context from the positionally paired ATAC and RNA whitelists.
    pub fn new(
        params: MultiomeParameters,
        atac_whitelist: Whitelist,
        rna_whitelist: Whitelist,
    ) -> Result<Self> {
        params.validate()?;
        for (name, whitelist) in [("ATAC", &atac_whitelist), ("RNA", &rna_whitelist)] {
            if whitelist.barcode_len() != params.barcode_length {
                bail!(
                    "{} whitelist has barcodes of length {}, expected {}",
                    name,
                    whitelist.barcode_len(),
                    params.barcode_length
                );
            }
        }

        let atac = AtacAnchorLocator::new(&params).context("compiling ATAC adapter patterns")?;
        let gex = GexAnchorLocator::new(&params).context("compiling GEX adapter patterns")?;

        let atac_table = CorrectionTable::build(&atac_whitelist);
        let rna_table = CorrectionTable::build(&rna_whitelist);
        let (atac_matrix, rna_matrix) = if params.max_correction_distance > 1 {
            (
                Some(WhitelistMatrix::new(&atac_whitelist)),
                Some(WhitelistMatrix::new(&rna_whitelist)),
            )
        } else {
            (None, None)
        };
        let translation = TranslationTable::new(atac_whitelist, rna_whitelist)?;
        let correction = CorrectionParams {
            max_dist: params.max_correction_distance,
            min_margin: params.min_weighted_margin,
        };

        let ctx = MultiomeContext {
            params,
            atac,
            gex,
            translation,
            atac_table,
            rna_table,
            atac_matrix,
            rna_matrix,
            correction,
        };
        // surface corrector misconfiguration before any read is seen
        ctx.worker()?;
        info!(
            "multiome context: {} barcode pairs, correction up to distance {}",
            ctx.translation.atac().len(),
            ctx.correction.max_dist
        );
        Ok(ctx)
    }

    pub fn params(&self) -> &MultiomeParameters {
        &self.params
    }

    pub fn translation(&self) -> &TranslationTable {
        &self.translation
    }

    /// A classifier with its own correctors, for use by a single thread.
    pub fn worker(&self) -> Result<ReadClassifier<'_>, CorrectionError> {
        let atac = BarcodeCorrector::new(
            self.translation.atac(),
            &self.atac_table,
            self.atac_matrix.as_ref(),
            self.correction,
        )?;
        let rna = BarcodeCorrector::new(
            self.translation.rna(),
            &self.rna_table,
            self.rna_matrix.as_ref(),
            self.correction,
        )?;
        Ok(ReadClassifier::new(self, atac, rna))
    }
}
