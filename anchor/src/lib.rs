//! Locating adapters and barcodes in noisy long reads.
//!
//! The search is done in two stages. A [`FuzzyPattern`] finds the adapter with a
//! bounded number of edits, then the hit is aligned against an
//! [`AdapterTemplate`] whose barcode is masked with `N`s and the barcode is read
//! off the traceback.

pub mod align;
pub mod pattern;
pub mod template;

pub use align::{AlignmentResult, BarcodeCall, CalledBarcode, LocalAligner};
pub use pattern::{search_strands, AnchorMatch, FuzzyPattern, PatternElement, PatternError, PatternSet};
pub use template::{AdapterAnchor, AdapterTemplate, StrandedCall};
