// Warning groups (as of rust 1.55)
#![deny(
    future_incompatible,
    nonstandard_style,
    rust_2018_compatibility,
    rust_2021_compatibility,
    rust_2018_idioms,
    unused
)]
// Other warnings (as of rust 1.55)
#![deny(
    bindings_with_variant_name,
    const_item_mutation,
    deprecated,
    elided_lifetimes_in_paths,
    irrefutable_let_patterns,
    non_shorthand_field_patterns,
    overlapping_range_endpoints,
    renamed_and_removed_lints,
    stable_features,
    unconditional_recursion,
    unknown_lints,
    unused_comparisons,
    while_true
)]

//! Tunable parameters of the multiome read splitter, read from a
//! `parameters.toml` file. Every field may be omitted and falls back to its
//! default.

use anyhow::{bail, Context, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct MultiomeParameters {
    /// Edit budget of the ATAC adapter core in front of the barcode.
    pub adapter_core_max_edits: u8,
    /// Edit budget of the ATAC adapter anchor behind the barcode.
    pub adapter_anchor_max_edits: u8,
    /// Edit budget of each Tn5 mosaic end signature.
    pub tn5_max_edits: u8,
    /// Edit budget of the gene expression adapter.
    pub gex_adapter_max_edits: u8,
    /// Minimum length of an ATAC genomic insert.
    pub atac_min_insert_length: usize,
    /// Minimum length of the genomic part of a gene expression read.
    pub gex_min_insert_length: usize,
    /// Cell barcode length.
    pub barcode_length: usize,
    /// UMI length of gene expression reads.
    pub umi_length: usize,
    /// Keep ATAC reads with a single Tn5 signature, running off the read end.
    pub keep_runoff: bool,
    /// Maximum distance of a barcode correction. Above one, whitelist barcodes
    /// are searched by quality-weighted Hamming distance.
    pub max_correction_distance: usize,
    /// Margin by which the best weighted distance must beat the second best.
    pub min_weighted_margin: f64,
    /// Drop classified reads whose barcode could not be corrected.
    pub write_only_valid_barcodes: bool,
    /// Also produce the ATAC technical read, with the insert cut out.
    pub write_technical: bool,
}

pub const DEFAULT_PARAMETERS: MultiomeParameters = MultiomeParameters {
    adapter_core_max_edits: 2,
    adapter_anchor_max_edits: 3,
    tn5_max_edits: 3,
    gex_adapter_max_edits: 3,
    atac_min_insert_length: 10,
    gex_min_insert_length: 25,
    barcode_length: 16,
    umi_length: 12,
    keep_runoff: false,
    max_correction_distance: 1,
    min_weighted_margin: 0.5,
    write_only_valid_barcodes: false,
    write_technical: false,
};

impl Default for MultiomeParameters {
    fn default() -> Self {
        DEFAULT_PARAMETERS
    }
}

macro_rules! warn_non_default {
    ($params:ident, $($a:ident),+ $(,)?) => {
        $(
            if DEFAULT_PARAMETERS.$a != $params.$a {
                warn!("using non-default {} = {:?}", stringify!($a), $params.$a);
            }
        )+
    };
}

impl MultiomeParameters {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let params: MultiomeParameters = toml::from_str(s)?;
        params.validate()?;
        Ok(params)
    }

    /// Load parameters from `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let s = std::fs::read_to_string(path).with_context(|| path.display().to_string())?;
        let params = Self::from_toml_str(&s).with_context(|| path.display().to_string())?;
        info!("loaded parameters from {}", path.display());
        params.log_non_defaults();
        Ok(params)
    }

    /// Load parameters from `path`, or use the defaults if there is no such file.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            warn!(
                "could not find parameters at {}, falling back to defaults",
                path.display()
            );
            return Ok(DEFAULT_PARAMETERS);
        }
        Self::load(path)
    }

    /// Reject settings no run can work with.
    pub fn validate(&self) -> Result<()> {
        if self.barcode_length == 0 {
            bail!("barcode_length must be positive");
        }
        if self.umi_length == 0 {
            bail!("umi_length must be positive");
        }
        if !(self.min_weighted_margin >= 0.0) {
            bail!(
                "min_weighted_margin must be a non-negative number, got {}",
                self.min_weighted_margin
            );
        }
        if self.max_correction_distance >= self.barcode_length {
            bail!(
                "max_correction_distance {} must be below barcode_length {}",
                self.max_correction_distance,
                self.barcode_length
            );
        }
        Ok(())
    }

    fn log_non_defaults(&self) {
        warn_non_default!(
            self,
            adapter_core_max_edits,
            adapter_anchor_max_edits,
            tn5_max_edits,
            gex_adapter_max_edits,
            atac_min_insert_length,
            gex_min_insert_length,
            barcode_length,
            umi_length,
            keep_runoff,
            max_correction_distance,
            min_weighted_margin,
            write_only_valid_barcodes,
            write_technical,
        );
    }
}
