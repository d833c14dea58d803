//! Crate for dealing with 10x barcodes.
//!
//! Contains the barcode whitelists of the multiome kit, the one-edit correction
//! table built from a whitelist and the corrector that queries it.

pub mod correction_table;
pub mod corrector;
pub mod whitelist;

pub use correction_table::CorrectionTable;
pub use corrector::{BarcodeCorrector, Correction, CorrectionError, CorrectionParams, WhitelistMatrix};
pub use whitelist::{TranslationTable, Whitelist, WhitelistError, MAX_BARCODE_LEN};
