// Copyright (c) 2018 10x Genomics, Inc. All rights reserved.

//! Plain in-memory long reads and the sequence utilities shared by the
//! adapter search and barcode correction crates.

pub mod qual;
pub mod read;
pub mod seq;

pub use read::{OrientedRead, Read, ReadError};
pub use seq::{revcomp, reverse, Strand};
