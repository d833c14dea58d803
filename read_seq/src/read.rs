// Copyright (c) 2018 10x Genomics, Inc. All rights reserved.

//! A single long read as handed over by the record reader.

use crate::seq::{to_upper, Strand};
use std::borrow::Cow;
use std::fmt;
use thiserror::Error;

/// A malformed input record. These indicate a framing bug upstream and are
/// never skipped silently.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReadError {
    #[error("read {id}: sequence length {seq_len} does not match quality length {qual_len}")]
    LengthMismatch {
        id: String,
        seq_len: usize,
        qual_len: usize,
    },
    #[error("read {id}: empty sequence")]
    EmptySequence { id: String },
}

/// An (identifier, sequence, quality) triple with `seq.len() == qual.len()`.
#[derive(Clone, PartialEq, Eq)]
pub struct Read {
    id: String,
    seq: Vec<u8>,
    qual: Vec<u8>,
}

impl Read {
    pub fn new(
        id: impl Into<String>,
        seq: impl Into<Vec<u8>>,
        qual: impl Into<Vec<u8>>,
    ) -> Result<Self, ReadError> {
        let id = id.into();
        let seq = seq.into();
        let qual = qual.into();
        if seq.is_empty() {
            return Err(ReadError::EmptySequence { id });
        }
        if seq.len() != qual.len() {
            return Err(ReadError::LengthMismatch {
                id,
                seq_len: seq.len(),
                qual_len: qual.len(),
            });
        }
        Ok(Read { id, seq, qual })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn seq(&self) -> &[u8] {
        &self.seq
    }

    pub fn qual(&self) -> &[u8] {
        &self.qual
    }

    pub fn len(&self) -> usize {
        self.seq.len()
    }

    /// Always false, a `Read` cannot be constructed with an empty sequence.
    pub fn is_empty(&self) -> bool {
        self.seq.is_empty()
    }

    /// The bases in `[start, end)` under the same id, or None for an empty or
    /// out of bounds range.
    pub fn subread(&self, start: usize, end: usize) -> Option<Read> {
        if start >= end || end > self.len() {
            return None;
        }
        Some(Read {
            id: self.id.clone(),
            seq: self.seq[start..end].to_vec(),
            qual: self.qual[start..end].to_vec(),
        })
    }

    /// Replace `[start, end)` by `filler`, in the sequence and the quality alike.
    pub fn replace_range(&self, start: usize, end: usize, filler: &[u8]) -> Result<Read, ReadError> {
        let splice = |s: &[u8]| [&s[..start], filler, &s[end..]].concat();
        Read::new(self.id.clone(), splice(&self.seq), splice(&self.qual))
    }

    /// The sequence upper-cased and the quality, both oriented onto `strand`.
    pub fn oriented(&self, strand: Strand) -> OrientedRead<'_> {
        let upper = to_upper(&self.seq);
        let (seq, qual) = match upper {
            Cow::Borrowed(s) => strand.orient(s, &self.qual),
            Cow::Owned(s) => {
                let (oriented, qual) = strand.orient(&s, &self.qual);
                (Cow::Owned(oriented.into_owned()), Cow::Owned(qual.into_owned()))
            }
        };
        OrientedRead { strand, seq, qual }
    }
}

impl fmt::Debug for Read {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Read")
            .field("id", &self.id)
            .field("seq", &String::from_utf8_lossy(&self.seq))
            .field("qual", &String::from_utf8_lossy(&self.qual))
            .finish()
    }
}

/// A read viewed from one strand. Coordinates into `seq` are strand-local.
#[derive(Debug, Clone)]
pub struct OrientedRead<'a> {
    pub strand: Strand,
    pub seq: Cow<'a, [u8]>,
    pub qual: Cow<'a, [u8]>,
}

impl OrientedRead<'_> {
    /// Map a strand-local half-open range back to forward read coordinates.
    pub fn to_forward(&self, start: usize, end: usize) -> (usize, usize) {
        match self.strand {
            Strand::Forward => (start, end),
            Strand::Reverse => (self.seq.len() - end, self.seq.len() - start),
        }
    }
}
