//! Splitting nanopore reads of a 10x multiome library into ATAC fragments, gene
//! expression reads and everything else.
//!
//! All tables and patterns live in a [`MultiomeContext`] that is built once and
//! shared by reference. Each worker thread classifies reads through its own
//! [`ReadClassifier`].

pub mod atac;
pub mod classify;
pub mod context;
pub mod gex;
pub mod locate;
pub mod split;

#[cfg(test)]
mod synthetic;

pub use atac::{AtacAnchorLocator, AtacLocation};
pub use classify::{AtacRead, BarcodeTags, ClassifiedRead, GexRead, ReadClassifier, UmiTags};
pub use context::MultiomeContext;
pub use gex::{GexAnchorLocator, GexLocation};
pub use locate::{GeometryError, LocateOutcome};
pub use split::{split_reads, split_reads_with_threads, SplitCounts};
